use async_trait::async_trait;
use shelf_sync_models::{AnnotationSet, ItemDetail, ReadProgress, ShelfEntry};

use crate::error::SourceError;

/// How a platform builds the canonical deep link for an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkScheme {
    /// `{base}{token}` where the token is derived from the id
    ReaderToken { base: String },
    /// `{base}{id}/`
    SubjectPath { base: String },
}

/// A platform the engine reads from. Implementations own their session and
/// pagination; one failed call must only fail the item it was made for.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Distribution tag written to every record from this source, if any
    fn source_tag(&self) -> Option<&str> {
        None
    }

    fn link_scheme(&self) -> LinkScheme;

    /// Identifiers to skip for this source only
    fn block_list(&self) -> &[String] {
        &[]
    }

    /// Shelf or wishlist entries, deduplicated, in collection order
    async fn fetch_collection(&self) -> Result<Vec<ShelfEntry>, SourceError>;

    async fn fetch_item_detail(&self, id: &str) -> Result<ItemDetail, SourceError>;

    /// Per-item read progress; sources without one return `None`
    async fn fetch_read_progress(&self, _id: &str) -> Result<Option<ReadProgress>, SourceError> {
        Ok(None)
    }

    /// Highlights with their chapters; sources without annotations return `None`
    async fn fetch_annotations(&self, _id: &str) -> Result<Option<AnnotationSet>, SourceError> {
        Ok(None)
    }
}
