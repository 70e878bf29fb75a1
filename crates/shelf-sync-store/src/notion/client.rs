use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use shelf_sync_models::TargetRecord;
use tracing::{debug, info};

use crate::blocks::{Block, ChildPage, StoredBlock};
use crate::error::StoreError;
use crate::notion::api;
use crate::record::{decode_record, RecordField, RecordPatch};
use crate::traits::{RecordStore, APPEND_BATCH_LIMIT};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";

/// Pages fetched per request when scanning the whole database
const SCAN_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct NotionStore {
    client: Arc<Client>,
    token: String,
    database_id: String,
    base_url: String,
}

/// Outcome of a multi-select cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub kept: usize,
    pub removed: usize,
}

impl NotionStore {
    pub fn new(token: String, database_id: String) -> Self {
        Self::with_base_url(token, database_id, DEFAULT_API_BASE.to_string())
    }

    pub fn with_base_url(token: String, database_id: String, base_url: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            token,
            database_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Rewrite a multi-select property's option list to only the options
    /// some record still uses.
    pub async fn prune_multi_select_options(&self, property: &str) -> Result<PruneReport, StoreError> {
        let schema = api::retrieve_database(&self.client, &self.base_url, &self.token, &self.database_id).await?;
        let declared = schema
            .pointer(&format!("/properties/{}/multi_select/options", property))
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| StoreError::NotFound(format!("multi-select property {}", property)))?;

        let mut seen = HashSet::new();
        let mut in_use: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = api::query_database(
                &self.client,
                &self.base_url,
                &self.token,
                &self.database_id,
                None,
                cursor.as_deref(),
                SCAN_PAGE_SIZE,
            )
            .await?;

            for record in &page.results {
                let options = record
                    .properties
                    .get(property)
                    .and_then(|p| p.get("multi_select"))
                    .and_then(Value::as_array);
                for option in options.into_iter().flatten() {
                    let key = option
                        .get("id")
                        .or_else(|| option.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    if seen.insert(key) {
                        in_use.push(option.clone());
                    }
                }
            }

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        let kept = in_use.len();
        let properties = json!({
            property: { "type": "multi_select", "multi_select": { "options": in_use } }
        });
        api::update_database(&self.client, &self.base_url, &self.token, &self.database_id, properties).await?;

        let report = PruneReport {
            kept,
            removed: declared.saturating_sub(kept),
        };
        info!(
            operation = "prune_multi_select_options",
            property = %property,
            kept = report.kept,
            removed = report.removed,
            "Pruned unused options"
        );
        Ok(report)
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    fn store_name(&self) -> &str {
        "notion"
    }

    async fn query(&self, uid: &str) -> Result<Option<TargetRecord>, StoreError> {
        let filter = json!({
            "property": RecordField::Uid.property_name(),
            "rich_text": { "equals": uid }
        });
        let page = api::query_database(
            &self.client,
            &self.base_url,
            &self.token,
            &self.database_id,
            Some(filter),
            None,
            2,
        )
        .await?;

        if page.results.len() > 1 {
            debug!(operation = "query", uid = %uid, matches = page.results.len(), "Ambiguous match, using first");
        }
        Ok(page
            .results
            .first()
            .map(|record| decode_record(&record.id, &record.properties)))
    }

    async fn create(&self, patch: &RecordPatch, icon: Option<&str>) -> Result<String, StoreError> {
        let properties = patch.to_properties()?;
        let page = api::create_page(
            &self.client,
            &self.base_url,
            &self.token,
            &self.database_id,
            properties,
            icon,
        )
        .await?;
        Ok(page.id)
    }

    async fn update(&self, handle: &str, patch: &RecordPatch) -> Result<(), StoreError> {
        let properties = patch.to_properties()?;
        api::update_page(&self.client, &self.base_url, &self.token, handle, properties).await
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage, StoreError> {
        api::list_block_children(&self.client, &self.base_url, &self.token, block_id, cursor, page_size).await
    }

    async fn append_children(
        &self,
        block_id: &str,
        children: &[Block],
    ) -> Result<Vec<StoredBlock>, StoreError> {
        if children.len() > APPEND_BATCH_LIMIT {
            return Err(StoreError::BatchTooLarge(children.len()));
        }
        api::append_block_children(&self.client, &self.base_url, &self.token, block_id, children).await
    }
}
