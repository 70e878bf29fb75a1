//! In-memory [`RecordStore`] for engine tests and dry runs.
//!
//! Records are kept as encoded property maps so every write goes through the
//! same codec table as the HTTP store. Block trees are flat maps from parent
//! id to ordered children. Every trait call is counted in a [`CallLog`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use shelf_sync_models::TargetRecord;

use crate::blocks::{Block, ChildPage, StoredBlock};
use crate::error::StoreError;
use crate::record::{decode_record, RecordPatch};
use crate::traits::{RecordStore, APPEND_BATCH_LIMIT};

/// Number of calls made per operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub queries: usize,
    pub creates: usize,
    pub updates: usize,
    pub lists: usize,
    pub appends: usize,
    /// Children count of each append call, in order
    pub append_sizes: Vec<usize>,
}

impl CallLog {
    /// Calls that change store state
    pub fn writes(&self) -> usize {
        self.creates + self.updates + self.appends
    }
}

struct MemRecord {
    handle: String,
    properties: Map<String, Value>,
    icon: Option<String>,
}

pub struct MemoryStore {
    records: RwLock<Vec<MemRecord>>,
    children: RwLock<HashMap<String, Vec<StoredBlock>>>,
    calls: RwLock<CallLog>,
    next_id: AtomicU64,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            children: RwLock::new(HashMap::new()),
            calls: RwLock::new(CallLog::default()),
            next_id: AtomicU64::new(1),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every create, update and append fail with `StoreError::Rejected`
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallLog {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn reset_calls(&self) {
        *self.calls.write().unwrap_or_else(PoisonError::into_inner) = CallLog::default();
    }

    pub fn record_count(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Current state of the record with this identifier, without counting a call
    pub fn record(&self, uid: &str) -> Option<TargetRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| decode_record(&r.handle, &r.properties))
            .find(|r| r.uid == uid)
    }

    /// Raw property map of a record, for asserting on fields `TargetRecord` omits
    pub fn properties(&self, handle: &str) -> Option<Map<String, Value>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.handle == handle)
            .map(|r| r.properties.clone())
    }

    pub fn icon(&self, handle: &str) -> Option<String> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.handle == handle)
            .and_then(|r| r.icon.clone())
    }

    /// All children of a block, without counting a call
    pub fn children_of(&self, block_id: &str) -> Vec<StoredBlock> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(block_id)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn log<F: FnOnce(&mut CallLog)>(&self, f: F) {
        f(&mut self.calls.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn check_writable(&self, what: &str) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(format!("{} refused by memory store", what)));
        }
        Ok(())
    }

    /// Store a block and its nested children, returning the stored top block
    fn insert_block(&self, tree: &mut HashMap<String, Vec<StoredBlock>>, parent: &str, block: &Block) -> StoredBlock {
        let stored = StoredBlock {
            id: self.next_id("block"),
            block: block.shallow(),
            has_children: !block.children().is_empty(),
        };
        tree.entry(parent.to_string()).or_default().push(stored.clone());
        for child in block.children() {
            self.insert_block(tree, &stored.id, child);
        }
        stored
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn store_name(&self) -> &str {
        "memory"
    }

    async fn query(&self, uid: &str) -> Result<Option<TargetRecord>, StoreError> {
        self.log(|c| c.queries += 1);
        Ok(self.record(uid))
    }

    async fn create(&self, patch: &RecordPatch, icon: Option<&str>) -> Result<String, StoreError> {
        self.log(|c| c.creates += 1);
        self.check_writable("create")?;
        let properties = patch.to_properties()?;
        let handle = self.next_id("page");
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MemRecord {
                handle: handle.clone(),
                properties,
                icon: icon.map(str::to_string),
            });
        Ok(handle)
    }

    async fn update(&self, handle: &str, patch: &RecordPatch) -> Result<(), StoreError> {
        self.log(|c| c.updates += 1);
        self.check_writable("update")?;
        let properties = patch.to_properties()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .iter_mut()
            .find(|r| r.handle == handle)
            .ok_or_else(|| StoreError::NotFound(format!("page {}", handle)))?;
        record.properties.extend(properties);
        Ok(())
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage, StoreError> {
        self.log(|c| c.lists += 1);
        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| StoreError::Malformed(format!("bad cursor {}", c)))?,
            None => 0,
        };
        let all = self.children_of(block_id);
        let end = (start + page_size.max(1)).min(all.len());
        let results = all.get(start..end).map(<[StoredBlock]>::to_vec).unwrap_or_default();
        let has_more = end < all.len();
        Ok(ChildPage {
            results,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }

    async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> Result<Vec<StoredBlock>, StoreError> {
        self.log(|c| {
            c.appends += 1;
            c.append_sizes.push(children.len());
        });
        self.check_writable("append")?;
        if children.len() > APPEND_BATCH_LIMIT {
            return Err(StoreError::BatchTooLarge(children.len()));
        }
        let mut tree = self.children.write().unwrap_or_else(PoisonError::into_inner);
        Ok(children
            .iter()
            .map(|block| self.insert_block(&mut tree, block_id, block))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyValue;
    use crate::record::RecordField;

    fn patch(uid: &str, title: &str) -> RecordPatch {
        RecordPatch::new()
            .with(RecordField::Uid, PropertyValue::Text(uid.to_string()))
            .with(RecordField::Name, PropertyValue::Text(title.to_string()))
    }

    #[tokio::test]
    async fn test_update_merges_properties() {
        let store = MemoryStore::new();
        let handle = store.create(&patch("42", "Dune"), None).await.unwrap();
        let progress = RecordPatch::new().with(RecordField::Progress, PropertyValue::Number(30.0));
        store.update(&handle, &progress).await.unwrap();

        let record = store.record("42").unwrap();
        assert_eq!(record.title, "Dune");
        assert_eq!(record.progress, 30.0);
        assert_eq!(store.calls().writes(), 2);
    }

    #[tokio::test]
    async fn test_children_paginate_with_offset_cursor() {
        let store = MemoryStore::new();
        let items: Vec<Block> = (0..5).map(|i| Block::BulletedListItem(i.to_string())).collect();
        store.append_children("page-1", &items).await.unwrap();

        let first = store.list_children("page-1", None, 2).await.unwrap();
        assert_eq!(first.results.len(), 2);
        assert!(first.has_more);

        let last = store
            .list_children("page-1", Some("4"), 2)
            .await
            .unwrap();
        assert_eq!(last.results.len(), 1);
        assert!(!last.has_more);
        assert!(last.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_nested_children_are_addressable() {
        let store = MemoryStore::new();
        let layout = Block::ColumnList(vec![Block::Column(vec![Block::Divider]), Block::Column(vec![])]);
        let inserted = store.append_children("page-1", &[layout]).await.unwrap();

        let columns = store.children_of(&inserted[0].id);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].has_children);
        assert_eq!(store.children_of(&columns[0].id)[0].block, Block::Divider);
    }

    #[tokio::test]
    async fn test_oversized_append_is_rejected() {
        let store = MemoryStore::new();
        let items = vec![Block::Divider; APPEND_BATCH_LIMIT + 1];
        let err = store.append_children("page-1", &items).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(101)));
        assert!(store.children_of("page-1").is_empty());
    }

    #[tokio::test]
    async fn test_rejected_writes() {
        let store = MemoryStore::new();
        store.set_reject_writes(true);
        assert!(matches!(
            store.create(&patch("1", "x"), None).await,
            Err(StoreError::Rejected(_))
        ));
        assert_eq!(store.record_count(), 0);
    }
}
