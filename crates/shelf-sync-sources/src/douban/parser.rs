use serde_json::Value;
use shelf_sync_models::{AuthorRef, ItemDetail, ItemKind, RatingScale, RawRating};
use std::collections::HashSet;
use tracing::debug;

use crate::error::SourceError;

const LD_JSON_OPEN: &str = r#"<script type="application/ld+json">"#;
const SUMMARY_MARKER: &str = r#"property="v:summary""#;
const SOURCES_MARKER: &str = r#"<ul class="bs"#;

/// Subject ids linked from a wish/collect page, in first-seen order
pub fn extract_subject_ids(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (pos, _) in html.match_indices("/subject/") {
        let digits: String = html[pos + "/subject/".len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() && seen.insert(digits.clone()) {
            ids.push(digits);
        }
    }
    ids
}

/// Build an item from a subject page. The JSON-LD block is required; the
/// long summary and the streaming list are optional extras.
pub fn parse_subject(id: &str, html: &str) -> Result<ItemDetail, SourceError> {
    let raw = between(html, LD_JSON_OPEN, "</script>")
        .ok_or_else(|| SourceError::parse(format!("subject {} has no JSON-LD block", id)))?;
    let schema: Value = serde_json::from_str(&strip_control_chars(raw))?;

    let text = |key: &str| {
        schema
            .get(key)
            .and_then(Value::as_str)
            .map(decode_entities)
            .unwrap_or_default()
    };

    let mut intro = text("description");
    if let Some(summary) = long_summary(html) {
        if summary.chars().count() > intro.chars().count() {
            intro = summary;
        }
    }

    let kind = match schema.get("@type").and_then(Value::as_str) {
        Some("TVSeries") => ItemKind::Series,
        _ => ItemKind::Movie,
    };

    let detail = ItemDetail {
        id: id.to_string(),
        title: text("name"),
        cover: schema
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        categories: string_list(schema.get("genre")),
        intro,
        rating: RawRating::new(rating_value(&schema), RatingScale::Ten),
        authors: directors(&schema),
        kind,
        sources: distribution_sources(html),
    };
    debug!(
        operation = "parse_subject",
        item_id = %id,
        title = %detail.title,
        sources = detail.sources.len(),
        "Parsed subject page"
    );
    Ok(detail)
}

fn between<'a>(haystack: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = haystack.find(open)? + open.len();
    let len = haystack[start..].find(close)?;
    Some(&haystack[start..start + len])
}

// JSON-LD on subject pages carries raw newlines and tabs inside strings
fn strip_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(*c as u32, 0x00..=0x1F | 0x7F..=0x9F))
        .collect()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn long_summary(html: &str) -> Option<String> {
    let start = html.find(SUMMARY_MARKER)?;
    let rest = &html[start..];
    let body = between(rest, ">", "</span>")?;
    let summary = collapse_whitespace(&decode_entities(&strip_tags(body)));
    (!summary.is_empty()).then_some(summary)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(decode_entities)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![decode_entities(s)],
        _ => Vec::new(),
    }
}

// ratingValue is a string ("9.7") on most pages, a number on some, "" when unrated
fn rating_value(schema: &Value) -> f64 {
    match schema.pointer("/aggregateRating/ratingValue") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn directors(schema: &Value) -> Vec<AuthorRef> {
    let Some(people) = schema.get("director").and_then(Value::as_array) else {
        return Vec::new();
    };
    people
        .iter()
        .filter_map(|person| {
            let name = person.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }
            let author_id = person
                .get("url")
                .and_then(Value::as_str)
                .and_then(|url| between(url, "/celebrity/", "/"))
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            Some(AuthorRef {
                name: decode_entities(name),
                author_id,
            })
        })
        .collect()
}

// Streaming sites listed under "在哪儿看这部剧集", e.g. "腾讯视频" -> "腾讯"
fn distribution_sources(html: &str) -> Vec<String> {
    let Some(list) = html
        .find(SOURCES_MARKER)
        .and_then(|start| between(&html[start..], ">", "</ul>"))
    else {
        return Vec::new();
    };

    let mut sources = Vec::new();
    for (pos, _) in list.match_indices("<a") {
        let Some(label) = between(&list[pos..], ">", "</a>") else {
            continue;
        };
        let label = collapse_whitespace(&decode_entities(&strip_tags(label)));
        let label = strip_first_suffix(&label).trim().to_string();
        if !label.is_empty() && !sources.contains(&label) {
            sources.push(label);
        }
    }
    sources
}

/// Remove the first "视频" or "TV", whichever appears first
fn strip_first_suffix(label: &str) -> String {
    let hit = ["视频", "TV"]
        .iter()
        .filter_map(|needle| label.find(needle).map(|pos| (pos, needle.len())))
        .min_by_key(|(pos, _)| *pos);
    match hit {
        Some((pos, len)) => format!("{}{}", &label[..pos], &label[pos + len..]),
        None => label.to_string(),
    }
}

#[cfg(test)]
mod tests;
