use async_trait::async_trait;
use shelf_sync_models::TargetRecord;

use crate::blocks::{Block, ChildPage, StoredBlock};
use crate::error::StoreError;
use crate::record::RecordPatch;

/// Largest number of children one `append_children` call accepts
pub const APPEND_BATCH_LIMIT: usize = 100;

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn store_name(&self) -> &str;

    /// The record keyed by this external identifier. When the store holds
    /// more than one, the first is returned.
    async fn query(&self, uid: &str) -> Result<Option<TargetRecord>, StoreError>;

    /// Create a record and return its handle
    async fn create(&self, patch: &RecordPatch, icon: Option<&str>) -> Result<String, StoreError>;

    /// Overwrite the patched fields, leaving the rest alone
    async fn update(&self, handle: &str, patch: &RecordPatch) -> Result<(), StoreError>;

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage, StoreError>;

    /// Append at most [`APPEND_BATCH_LIMIT`] blocks; callers chunk larger batches
    async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> Result<Vec<StoredBlock>, StoreError>;
}
