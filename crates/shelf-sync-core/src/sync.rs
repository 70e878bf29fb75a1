use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use shelf_sync_config::Config;
use shelf_sync_models::{ArchiveLabel, ShelfEntry, SourceItem};
use shelf_sync_sources::{ContentSource, SourceError};
use shelf_sync_store::{RecordStore, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::annotations::AnnotationSyncer;
use crate::filter::filter_entries;
use crate::link::canonical_link;
use crate::mapper::map_item;
use crate::progress::ProgressTracker;
use crate::upsert::{lock_patch, reconcile, UpsertAction};

const PROGRESS_INTERVAL: usize = 25;

/// Failure of a single item. Never aborts the run.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("source request failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("store request failed: {0}")]
    Store(#[from] StoreError),
}

impl ItemError {
    fn category(&self) -> &'static str {
        match self {
            ItemError::Fetch(_) => "fetch",
            ItemError::Store(_) => "store",
        }
    }
}

/// Engine knobs taken from the loaded configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub sync_annotations: bool,
    /// Identifiers skipped for every source
    pub block_list: Vec<String>,
    /// Page size for listing page content
    pub page_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sync_annotations: true,
            block_list: Vec::new(),
            page_size: 100,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sync_annotations: config.sync.sync_annotations,
            block_list: config.sync.block_list.clone(),
            page_size: config.notion.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub source: String,
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    pub created: usize,
    pub updated: usize,
    /// Records left untouched because they are locked
    pub locked: usize,
    pub blocked: usize,
    pub failed: usize,
    pub annotations_appended: usize,
    /// Chapters whose new highlights wait for a later run
    pub deferred_chapters: usize,
    #[serde(rename = "duration_secs", serialize_with = "as_secs")]
    pub duration: Duration,
    pub failures: Vec<ItemFailure>,
    /// Sources whose collection could not be fetched at all
    pub failed_sources: Vec<SourceFailure>,
}

impl SyncResult {
    pub fn items_synced(&self) -> usize {
        self.created + self.updated
    }

    /// True when some source could not be enumerated. Item failures do not count.
    pub fn has_source_failures(&self) -> bool {
        !self.failed_sources.is_empty()
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64((duration.as_secs_f64() * 10.0).round() / 10.0)
}

/// What happened to one item
struct ItemReport {
    action: UpsertAction,
    annotations: usize,
    deferred: usize,
}

pub struct SyncOrchestrator {
    sources: Vec<Box<dyn ContentSource>>,
    store: Arc<dyn RecordStore>,
    options: EngineOptions,
    now: Option<DateTime<Utc>>,
}

impl SyncOrchestrator {
    pub fn new(sources: Vec<Box<dyn ContentSource>>, store: Arc<dyn RecordStore>, options: EngineOptions) -> Self {
        Self {
            sources,
            store,
            options,
            now: None,
        }
    }

    /// Pin the clock used for completion dates
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Run every source once. Only an empty source list is an error; a source
    /// whose collection cannot be fetched is recorded and the rest continue.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncResult> {
        if self.sources.is_empty() {
            bail!("No sources configured");
        }
        let start = Instant::now();
        let mut result = SyncResult::default();

        info!(
            operation = "sync_start",
            sources = ?self.source_names(),
            store = self.store.store_name(),
            "Starting sync"
        );

        for source in &self.sources {
            self.sync_source(source.as_ref(), &mut result).await;
        }

        result.duration = start.elapsed();
        info!(
            operation = "sync_complete",
            created = result.created,
            updated = result.updated,
            locked = result.locked,
            blocked = result.blocked,
            failed = result.failed,
            annotations = result.annotations_appended,
            duration_ms = result.duration.as_millis() as u64,
            "Sync finished"
        );
        Ok(result)
    }

    async fn sync_source(&self, source: &dyn ContentSource, result: &mut SyncResult) {
        let name = source.source_name().to_string();
        let entries = match source.fetch_collection().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    operation = "fetch_collection",
                    source = %name,
                    error = %e,
                    "Failed to fetch collection, skipping source"
                );
                result.failed_sources.push(SourceFailure {
                    source: name,
                    error: e.to_string(),
                });
                return;
            }
        };

        let filtered = filter_entries(entries, &self.options.block_list, source.block_list());
        for id in &filtered.blocked {
            info!(operation = "filter", source = %name, item_id = %id, "Skipping blocked item");
        }
        result.blocked += filtered.blocked.len();

        let mut tracker = ProgressTracker::new(&name, filtered.entries.len(), PROGRESS_INTERVAL);
        for (idx, entry) in filtered.entries.iter().enumerate() {
            let mut title = entry.title.clone();
            match self.sync_item(source, entry, &mut title).await {
                Ok(report) => {
                    match report.action {
                        UpsertAction::Created => {
                            result.created += 1;
                            tracker.record_created();
                        }
                        UpsertAction::Updated => {
                            result.updated += 1;
                            tracker.record_updated();
                        }
                        UpsertAction::SkippedLocked => {
                            result.locked += 1;
                            tracker.record_locked();
                        }
                    }
                    result.annotations_appended += report.annotations;
                    result.deferred_chapters += report.deferred;
                }
                Err(e) => {
                    error!(
                        operation = "sync_item",
                        source = %name,
                        item_id = %entry.id,
                        title = title.as_deref().unwrap_or(""),
                        error = %e,
                        "Failed to sync item"
                    );
                    tracker.record_failed(e.category());
                    result.failed += 1;
                    result.failures.push(ItemFailure {
                        source: name.clone(),
                        item_id: entry.id.clone(),
                        title,
                        error: e.to_string(),
                    });
                }
            }
            tracker.log_progress(idx + 1);
        }
        tracker.log_summary();
    }

    /// Fetch, map, reconcile, then bring highlights up to date. `title` is
    /// filled in as soon as it is known so failures can name the item.
    async fn sync_item(
        &self,
        source: &dyn ContentSource,
        entry: &ShelfEntry,
        title: &mut Option<String>,
    ) -> Result<ItemReport, ItemError> {
        let detail = source.fetch_item_detail(&entry.id).await?;
        if !detail.title.trim().is_empty() {
            *title = Some(detail.title.clone());
        }
        let progress = source.fetch_read_progress(&entry.id).await?;
        let link = canonical_link(&source.link_scheme(), &entry.id);

        let item = SourceItem::assemble(entry, detail, progress, link);
        let mapped = map_item(&item, source.source_tag(), self.now());
        debug!(
            operation = "map_item",
            item_id = %mapped.uid,
            status = %mapped.status,
            progress = ?mapped.progress,
            "Mapped item"
        );

        let outcome = reconcile(self.store.as_ref(), &mapped).await?;
        let mut report = ItemReport {
            action: outcome.action,
            annotations: 0,
            deferred: 0,
        };
        if outcome.action == UpsertAction::SkippedLocked {
            return Ok(report);
        }

        let wants_annotations = self.options.sync_annotations
            && mapped.archive.as_deref() != Some(ArchiveLabel::DROPPED)
            && mapped.progress.unwrap_or(0) > 0;
        if wants_annotations {
            if let Some(set) = source.fetch_annotations(&entry.id).await? {
                let last_synced = outcome.existing.as_ref().and_then(|r| r.last_synced);
                let synced = AnnotationSyncer::new(self.store.as_ref(), self.options.page_size)
                    .sync(&outcome.handle, last_synced, &set)
                    .await?;
                report.annotations = synced.appended;
                report.deferred = synced.deferred_chapters.len();
            }
        }

        // Last write for the item: once locked, the record is never touched again
        if outcome.lock_pending {
            self.store.update(&outcome.handle, &lock_patch()).await?;
            info!(operation = "lock", item_id = %mapped.uid, title = %mapped.title, "Locked finished record");
        } else if report.deferred > 0 {
            warn!(
                operation = "sync_annotations",
                item_id = %mapped.uid,
                deferred = report.deferred,
                "Some highlights wait for a later run"
            );
        }
        Ok(report)
    }
}
