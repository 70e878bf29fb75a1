use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use shelf_sync_models::{
    Annotation, AnnotationSet, AuthorRef, Chapter, ItemDetail, ItemKind, RatingScale, RawRating,
    ReadProgress, ShelfEntry,
};
use std::collections::HashMap;
use tracing::debug;

use crate::error::SourceError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShelfBook {
    book_id: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShelfProgress {
    book_id: String,
    #[serde(default)]
    progress: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShelfArchive {
    name: String,
    #[serde(default)]
    book_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShelfResponse {
    #[serde(default)]
    books: Vec<ShelfBook>,
    #[serde(default)]
    book_progress: Vec<ShelfProgress>,
    #[serde(default)]
    archive: Vec<ShelfArchive>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorSegment {
    #[serde(default)]
    words: String,
    #[serde(default)]
    author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookInfo {
    book_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    intro: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    new_rating: Option<f64>,
    #[serde(default)]
    author_seg: Vec<AuthorSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadInfo {
    #[serde(default)]
    reading_progress: Option<u8>,
    #[serde(default)]
    finished_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Bookmark {
    #[serde(default)]
    bookmark_id: Option<String>,
    chapter_uid: u64,
    #[serde(default)]
    mark_text: String,
    create_time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkChapter {
    chapter_uid: u64,
    #[serde(default)]
    chapter_idx: u32,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct BookmarkList {
    #[serde(default)]
    updated: Vec<Bookmark>,
    #[serde(default)]
    chapters: Vec<BookmarkChapter>,
}

/// GET a WeRead endpoint. WeRead reports session errors as `errcode` in an
/// otherwise normal body, so that is checked before decoding.
async fn get_json<T: DeserializeOwned>(
    client: &Client,
    base_url: &str,
    cookie: &str,
    endpoint: &str,
    query: &[(&str, &str)],
) -> Result<T, SourceError> {
    let url = format!("{}{}", base_url, endpoint);
    debug!(operation = "weread_get", endpoint = %endpoint, "GET {}", url);

    let response = client
        .get(&url)
        .header("Cookie", cookie)
        .header("Accept", "application/json")
        .query(query)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text).map_err(|e| {
        if status.is_success() {
            SourceError::Json(e)
        } else {
            SourceError::Status {
                status: status.as_u16(),
                url: url.clone(),
                body: text.clone(),
            }
        }
    })?;

    if let Some(code) = body.get("errcode").and_then(Value::as_i64).filter(|c| *c != 0) {
        let message = body
            .get("errmsg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(SourceError::Api {
            platform: "weread",
            code,
            message,
        });
    }
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url,
            body: text,
        });
    }

    Ok(serde_json::from_value(body)?)
}

pub async fn get_shelf(
    client: &Client,
    base_url: &str,
    cookie: &str,
    vid: &str,
) -> Result<Vec<ShelfEntry>, SourceError> {
    let shelf: ShelfResponse = get_json(client, base_url, cookie, "/shelf/sync", &[("vid", vid)]).await?;

    let progress: HashMap<&str, u8> = shelf
        .book_progress
        .iter()
        .map(|p| (p.book_id.as_str(), p.progress))
        .collect();
    let archive_of: HashMap<&str, &str> = shelf
        .archive
        .iter()
        .flat_map(|group| group.book_ids.iter().map(move |id| (id.as_str(), group.name.as_str())))
        .collect();

    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();
    for book in &shelf.books {
        if !seen.insert(book.book_id.as_str()) {
            continue;
        }
        let mut entry = ShelfEntry::new(book.book_id.clone())
            .with_progress(progress.get(book.book_id.as_str()).copied().unwrap_or(0));
        entry.title = book.title.clone();
        if let Some(label) = archive_of.get(book.book_id.as_str()) {
            entry = entry.with_archive(*label);
        }
        entries.push(entry);
    }

    debug!(
        operation = "get_shelf",
        books = entries.len(),
        archives = shelf.archive.len(),
        "Fetched WeRead shelf"
    );
    Ok(entries)
}

pub async fn get_book_info(
    client: &Client,
    base_url: &str,
    cookie: &str,
    book_id: &str,
) -> Result<ItemDetail, SourceError> {
    let info: BookInfo = get_json(client, base_url, cookie, "/book/info", &[("bookId", book_id)]).await?;

    let authors: Vec<AuthorRef> = info
        .author_seg
        .into_iter()
        .filter(|seg| !seg.words.trim().is_empty())
        .map(|seg| AuthorRef {
            name: seg.words,
            author_id: seg.author_id.filter(|id| !id.is_empty()),
        })
        .collect();

    Ok(ItemDetail {
        id: info.book_id,
        title: info.title,
        cover: info.cover.filter(|c| !c.is_empty()),
        categories: info.category.into_iter().filter(|c| !c.is_empty()).collect(),
        intro: info.intro,
        rating: RawRating::new(info.new_rating.unwrap_or(0.0), RatingScale::Thousand),
        authors,
        kind: ItemKind::Book,
        sources: Vec::new(),
    })
}

pub async fn get_read_info(
    client: &Client,
    base_url: &str,
    cookie: &str,
    book_id: &str,
) -> Result<ReadProgress, SourceError> {
    let info: ReadInfo = get_json(
        client,
        base_url,
        cookie,
        "/book/readinfo",
        &[("bookId", book_id), ("readingDetail", "1"), ("finishedDate", "1")],
    )
    .await?;

    Ok(ReadProgress {
        progress: info.reading_progress.unwrap_or(0).min(100),
        finished_at: info
            .finished_date
            .filter(|ts| *ts > 0)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
    })
}

pub async fn get_bookmarks(
    client: &Client,
    base_url: &str,
    cookie: &str,
    book_id: &str,
) -> Result<AnnotationSet, SourceError> {
    let list: BookmarkList = get_json(client, base_url, cookie, "/book/bookmarklist", &[("bookId", book_id)]).await?;

    let annotations = list
        .updated
        .into_iter()
        .filter(|mark| !mark.mark_text.trim().is_empty())
        .filter_map(|mark| {
            let created_at = Utc.timestamp_opt(mark.create_time, 0).single()?;
            Some(Annotation {
                id: mark
                    .bookmark_id
                    .unwrap_or_else(|| format!("{}_{}", mark.chapter_uid, mark.create_time)),
                chapter_uid: mark.chapter_uid,
                text: mark.mark_text,
                created_at,
            })
        })
        .collect();
    let chapters = list
        .chapters
        .into_iter()
        .map(|c| Chapter {
            uid: c.chapter_uid,
            index: c.chapter_idx,
            title: c.title,
        })
        .collect();

    Ok(AnnotationSet { annotations, chapters })
}
