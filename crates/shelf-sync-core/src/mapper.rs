//! Source item to normalized record fields. Pure, no I/O.

use chrono::{DateTime, Utc};
use shelf_sync_models::{ArchiveLabel, AuthorRef, ItemKind, MappedRecord, RecordStatus, SourceItem};
use std::collections::HashSet;

/// Progress above which a book on no particular shelf counts as started
const STARTED_THRESHOLD: u8 = 3;

/// Thumbnail path fragments and their full-size replacements, most specific
/// first: Douban poster paths also contain "/s_".
const COVER_UPSCALES: &[(&str, &str)] = &[
    ("/s_ratio_poster/", "/l_ratio_poster/"), // Douban posters
    ("/s_", "/t7_"),                          // WeRead covers
];

/// Outcome of the status table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDecision {
    pub status: RecordStatus,
    pub progress: u8,
    pub lock: bool,
}

/// Status from the archive label and progress.
///
/// "Done" (or full progress) always wins, forcing progress to 100 and
/// locking the record. Otherwise "Later" is backlog, "Dropped" is dropped,
/// and anything else is in progress once past the start threshold.
pub fn derive_status(archive: Option<&str>, progress: u8) -> StatusDecision {
    if archive == Some(ArchiveLabel::DONE) || progress >= 100 {
        return StatusDecision {
            status: RecordStatus::Done,
            progress: 100,
            lock: true,
        };
    }
    let status = match archive {
        Some(ArchiveLabel::LATER) => RecordStatus::Backlog,
        Some(ArchiveLabel::DROPPED) => RecordStatus::Dropped,
        _ if progress > STARTED_THRESHOLD => RecordStatus::InProgress,
        _ => RecordStatus::Scheduled,
    };
    StatusDecision {
        status,
        progress,
        lock: false,
    }
}

/// Split hyphenated compound tags and dedupe, keeping first-seen order
pub fn split_categories(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .flat_map(|tag| tag.split('-'))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

/// Drop bracketed role/nationality prefixes such as "[美]" or "（译）"
pub fn strip_bracket_prefix(name: &str) -> String {
    const PAIRS: &[(char, char)] = &[('[', ']'), ('【', '】'), ('(', ')'), ('（', '）'), ('〔', '〕')];

    let mut rest = name.trim();
    loop {
        let Some(first) = rest.chars().next() else {
            break;
        };
        let Some((_, close)) = PAIRS.iter().find(|(open, _)| *open == first) else {
            break;
        };
        let Some(end) = rest.find(*close) else {
            break;
        };
        rest = rest[end + close.len_utf8()..].trim_start();
    }
    rest.trim().to_string()
}

/// Author names with a stable id, prefixes stripped, deduplicated
pub fn clean_authors(authors: &[AuthorRef]) -> Vec<String> {
    let mut seen = HashSet::new();
    authors
        .iter()
        .filter(|a| a.author_id.as_deref().map_or(false, |id| !id.trim().is_empty()))
        .map(|a| strip_bracket_prefix(&a.name))
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Full-size variant of a thumbnail URL
pub fn upscale_cover(url: &str) -> String {
    for (thumb, full) in COVER_UPSCALES {
        if url.contains(thumb) {
            return url.replacen(thumb, full, 1);
        }
    }
    url.to_string()
}

/// Normalize an assembled source item. `tag` is the source's distribution
/// tag; `now` stands in for completion time when a watch-only source marks
/// something done without saying when.
pub fn map_item(item: &SourceItem, tag: Option<&str>, now: DateTime<Utc>) -> MappedRecord {
    let decision = derive_status(item.archive.as_deref(), item.progress);
    let is_book = item.kind == ItemKind::Book;

    let completed = if decision.status == RecordStatus::Done {
        item.finished_at.or(if is_book { None } else { Some(now) })
    } else {
        None
    };

    let mut sources: Vec<String> = Vec::new();
    for source in tag.map(str::to_string).into_iter().chain(item.sources.iter().cloned()) {
        let source = source.trim().to_string();
        if !source.is_empty() && !sources.contains(&source) {
            sources.push(source);
        }
    }

    MappedRecord {
        uid: item.id.clone(),
        title: item.name.trim().to_string(),
        kind: item.kind,
        status: decision.status,
        progress: is_book.then_some(decision.progress),
        rating: item.rating.normalized(),
        categories: split_categories(&item.categories),
        authors: clean_authors(&item.authors),
        sources,
        cover: item.cover.as_deref().filter(|c| !c.is_empty()).map(upscale_cover),
        intro: item.intro.trim().to_string(),
        link: item.link.clone(),
        completed,
        lock: decision.lock,
        archive: item.archive.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shelf_sync_models::{RatingScale, RawRating};

    fn book(archive: Option<&str>, progress: u8) -> SourceItem {
        SourceItem {
            id: "695233".to_string(),
            name: " 三体 ".to_string(),
            cover: Some("https://cdn.weread.qq.com/weread/cover/80/YueWen_695233/s_YueWen_695233.jpg".to_string()),
            categories: vec!["精品小说-科幻经典".to_string(), "科幻经典".to_string()],
            intro: "intro".to_string(),
            rating: RawRating::new(913.0, RatingScale::Thousand),
            authors: vec![
                AuthorRef { name: "刘慈欣".to_string(), author_id: Some("刘慈欣".to_string()) },
                AuthorRef { name: "出版社".to_string(), author_id: None },
            ],
            kind: ItemKind::Book,
            sources: vec![],
            progress,
            archive: archive.map(str::to_string),
            finished_at: None,
            link: "https://weread.qq.com/web/reader/ce032b305a9bc1ce0b0dd2a".to_string(),
        }
    }

    #[test]
    fn test_status_table() {
        assert_eq!(derive_status(Some("Later"), 0).status, RecordStatus::Backlog);
        assert_eq!(derive_status(Some("Reading"), 50).status, RecordStatus::InProgress);
        assert_eq!(derive_status(Some("Dropped"), 40).status, RecordStatus::Dropped);
        assert_eq!(derive_status(None, 3).status, RecordStatus::Scheduled);
        assert_eq!(derive_status(None, 4).status, RecordStatus::InProgress);
    }

    #[test]
    fn test_done_forces_progress_and_lock() {
        let done = derive_status(Some("Done"), 0);
        assert_eq!(done, StatusDecision { status: RecordStatus::Done, progress: 100, lock: true });

        // Full progress wins over any shelf
        let finished = derive_status(Some("Later"), 100);
        assert_eq!(finished.status, RecordStatus::Done);
        assert!(finished.lock);
    }

    #[test]
    fn test_split_categories() {
        let raw = vec!["文学-小说".to_string(), "小说-悬疑".to_string(), " - ".to_string()];
        assert_eq!(split_categories(&raw), vec!["文学", "小说", "悬疑"]);
    }

    #[test]
    fn test_strip_bracket_prefix() {
        assert_eq!(strip_bracket_prefix("[美] 卡尔·萨根"), "卡尔·萨根");
        assert_eq!(strip_bracket_prefix("【英】（译）某人"), "某人");
        assert_eq!(strip_bracket_prefix("(unclosed"), "(unclosed");
        assert_eq!(strip_bracket_prefix("余华"), "余华");
    }

    #[test]
    fn test_upscale_cover() {
        assert_eq!(
            upscale_cover("https://cdn.weread.qq.com/weread/cover/80/YueWen_695233/s_YueWen_695233.jpg"),
            "https://cdn.weread.qq.com/weread/cover/80/YueWen_695233/t7_YueWen_695233.jpg"
        );
        assert_eq!(
            upscale_cover("https://img2.doubanio.com/view/photo/s_ratio_poster/public/p1.jpg"),
            "https://img2.doubanio.com/view/photo/l_ratio_poster/public/p1.jpg"
        );
        assert_eq!(upscale_cover("https://example.com/a.jpg"), "https://example.com/a.jpg");
    }

    #[test]
    fn test_douban_poster_is_not_rewritten_as_weread_cover() {
        let cover = upscale_cover("https://img9.doubanio.com/view/photo/s_ratio_poster/public/p480747492.jpg");
        assert_eq!(cover, "https://img9.doubanio.com/view/photo/l_ratio_poster/public/p480747492.jpg");
        assert!(!cover.contains("t7_"));
    }

    #[test]
    fn test_map_book_in_progress() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mapped = map_item(&book(Some("Reading"), 10), Some("微信读书"), now);
        assert_eq!(mapped.title, "三体");
        assert_eq!(mapped.status, RecordStatus::InProgress);
        assert_eq!(mapped.progress, Some(10));
        assert!(!mapped.lock);
        assert_eq!(mapped.rating, 9.13);
        assert_eq!(mapped.categories, vec!["精品小说", "科幻经典"]);
        assert_eq!(mapped.authors, vec!["刘慈欣"]);
        assert_eq!(mapped.sources, vec!["微信读书"]);
        assert!(mapped.cover.unwrap().contains("/t7_"));
        assert!(mapped.completed.is_none());
    }

    #[test]
    fn test_map_done_book_uses_finish_time_only() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut item = book(Some("Done"), 0);
        let mapped = map_item(&item, None, now);
        assert_eq!(mapped.progress, Some(100));
        assert!(mapped.lock);
        assert!(mapped.completed.is_none());

        let finished = Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap();
        item.finished_at = Some(finished);
        assert_eq!(map_item(&item, None, now).completed, Some(finished));
    }

    #[test]
    fn test_map_done_movie_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut item = book(Some("Done"), 0);
        item.kind = ItemKind::Movie;
        item.sources = vec!["腾讯".to_string(), "腾讯".to_string()];
        let mapped = map_item(&item, None, now);
        assert_eq!(mapped.progress, None);
        assert_eq!(mapped.completed, Some(now));
        assert_eq!(mapped.sources, vec!["腾讯"]);
    }
}
