use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::item::ItemKind;
use crate::status::RecordStatus;

/// Newest annotation creation time already written to a record.
/// Persisted as unix seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// True when `at` is strictly newer than this watermark
    pub fn is_before(&self, at: DateTime<Utc>) -> bool {
        at > self.0
    }

    /// Forward-only merge: never returns something older than `self`
    pub fn advance(self, candidate: Watermark) -> Watermark {
        self.max(candidate)
    }
}

/// A record as it currently exists in the target store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetRecord {
    pub handle: String, // Store-internal id (page id)
    pub uid: String,    // External identifier
    pub title: String,
    pub status: Option<RecordStatus>,
    pub progress: f64,
    pub rating: f64,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub completed: Option<DateTime<Utc>>,
    pub locked: bool,
    pub last_synced: Option<Watermark>,
}

/// Normalized record fields produced by the mapper from fresh source data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedRecord {
    pub uid: String,
    pub title: String,
    pub kind: ItemKind,
    pub status: RecordStatus,
    pub progress: Option<u8>, // None for sources without read progress
    pub rating: f64,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub sources: Vec<String>,
    pub cover: Option<String>,
    pub intro: String,
    pub link: String,
    pub completed: Option<DateTime<Utc>>,
    pub lock: bool,
    pub archive: Option<String>,
}
