pub mod annotations;
pub mod filter;
pub mod link;
pub mod mapper;
pub mod progress;
pub mod sync;
pub mod upsert;

pub use annotations::{AnnotationOutcome, AnnotationSyncer};
pub use filter::{filter_entries, FilteredEntries};
pub use link::{canonical_link, reader_token};
pub use mapper::{derive_status, map_item, StatusDecision};
pub use sync::{EngineOptions, ItemError, ItemFailure, SourceFailure, SyncOrchestrator, SyncResult};
pub use upsert::{reconcile, UpsertAction, UpsertOutcome};
