use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    pub uid: u64,
    pub index: u32, // Reading order within the item
    pub title: String,
}

/// A free-text highlight taken from the source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub chapter_uid: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationSet {
    pub annotations: Vec<Annotation>,
    pub chapters: Vec<Chapter>,
}

impl AnnotationSet {
    /// Chapter for an annotation. Highlights pointing at a chapter the source
    /// did not list are placed after every known chapter under a synthetic title.
    pub fn chapter_for(&self, chapter_uid: u64) -> Chapter {
        self.chapters
            .iter()
            .find(|c| c.uid == chapter_uid)
            .cloned()
            .unwrap_or_else(|| Chapter {
                uid: chapter_uid,
                index: u32::MAX,
                title: format!("Chapter {}", chapter_uid),
            })
    }
}
