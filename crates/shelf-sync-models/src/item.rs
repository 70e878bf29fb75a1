use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::rating::RawRating;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemKind {
    Movie,
    Series,
    Book,
}

impl ItemKind {
    /// Label used for the record's `Type` select
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Series => "TV Series",
            ItemKind::Book => "Book",
        }
    }
}

/// One candidate from a source shelf/wishlist page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShelfEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>, // Shelf/archive label ("Later", "Done", "Dropped", custom)
    pub progress: u8, // 0-100 as reported by the shelf listing
}

impl ShelfEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            archive: None,
            progress: 0,
        }
    }

    pub fn with_archive(mut self, archive: impl Into<String>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>, // Stable platform id; entries without one are dropped by the mapper
}

/// Per-item metadata as fetched from the source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDetail {
    pub id: String,
    pub title: String,
    pub cover: Option<String>,
    pub categories: Vec<String>,
    pub intro: String,
    pub rating: RawRating,
    pub authors: Vec<AuthorRef>,
    pub kind: ItemKind,
    pub sources: Vec<String>, // Distribution channels (streaming sites, reading app)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadProgress {
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Everything the mapper needs about one item, assembled from the shelf
/// entry, its detail payload and (for books) its read progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceItem {
    pub id: String,
    pub name: String,
    pub cover: Option<String>,
    pub categories: Vec<String>,
    pub intro: String,
    pub rating: RawRating,
    pub authors: Vec<AuthorRef>,
    pub kind: ItemKind,
    pub sources: Vec<String>,
    pub progress: u8,
    pub archive: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
    pub link: String,
}

impl SourceItem {
    /// Combine shelf, detail and progress data. Read progress, when present,
    /// wins over the shelf listing since it is fetched per item.
    pub fn assemble(
        entry: &ShelfEntry,
        detail: ItemDetail,
        progress: Option<ReadProgress>,
        link: String,
    ) -> Self {
        let (progress, finished_at) = match progress {
            Some(p) => (p.progress.max(entry.progress).min(100), p.finished_at),
            None => (entry.progress.min(100), None),
        };

        let name = if detail.title.trim().is_empty() {
            entry.title.clone().unwrap_or_else(|| detail.id.clone())
        } else {
            detail.title
        };

        Self {
            id: entry.id.clone(),
            name,
            cover: detail.cover,
            categories: detail.categories,
            intro: detail.intro,
            rating: detail.rating,
            authors: detail.authors,
            kind: detail.kind,
            sources: detail.sources,
            progress,
            archive: entry.archive.clone(),
            finished_at,
            link,
        }
    }
}
