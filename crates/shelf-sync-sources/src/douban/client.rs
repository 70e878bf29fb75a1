use async_trait::async_trait;
use reqwest::Client;
use shelf_sync_models::{ArchiveLabel, ItemDetail, ShelfEntry};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::douban::parser;
use crate::error::SourceError;
use crate::traits::{ContentSource, LinkScheme};

pub const DOUBAN_SUBJECT_BASE: &str = "https://movie.douban.com/subject/";

/// Entries per wish/collect listing page
const PAGE_STEP: u32 = 15;

// Douban rejects the default client user agent
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Clone)]
pub struct DoubanClient {
    client: Arc<Client>,
    base_url: String,
    user_id: String,
    extra_ids: Vec<String>,
    block_list: Vec<String>,
    max_pages: u32,
}

impl DoubanClient {
    pub fn new(user_id: String, base_url: String) -> Result<Self, SourceError> {
        if user_id.trim().is_empty() {
            return Err(SourceError::MissingCredential("Douban user id (douban.user_id or DB_UID)".to_string()));
        }
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.trim().to_string(),
            extra_ids: Vec::new(),
            block_list: Vec::new(),
            max_pages: 10,
        })
    }

    /// Ids always added to the wishlist
    pub fn with_extra_ids(mut self, extra_ids: Vec<String>) -> Self {
        self.extra_ids = extra_ids;
        self
    }

    pub fn with_block_list(mut self, block_list: Vec<String>) -> Self {
        self.block_list = block_list;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    async fn get_html(&self, url: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        debug!(operation = "douban_get", "GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status,
                url: url.to_string(),
                body,
            });
        }
        Ok(response.text().await?)
    }

    /// Walk a people listing page by page until a page adds nothing new
    async fn fetch_listing(&self, list: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/people/{}/{}", self.base_url, self.user_id, list);
        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        for page in 0..self.max_pages {
            let html = self
                .get_html(&url, &[("start", (page * PAGE_STEP).to_string())])
                .await?;
            let before = ids.len();
            for id in parser::extract_subject_ids(&html) {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            if ids.len() == before {
                break;
            }
        }

        debug!(operation = "fetch_listing", list = %list, count = ids.len(), "Fetched Douban listing");
        Ok(ids)
    }
}

#[async_trait]
impl ContentSource for DoubanClient {
    fn source_name(&self) -> &str {
        "douban"
    }

    fn link_scheme(&self) -> LinkScheme {
        LinkScheme::SubjectPath {
            base: DOUBAN_SUBJECT_BASE.to_string(),
        }
    }

    fn block_list(&self) -> &[String] {
        &self.block_list
    }

    async fn fetch_collection(&self) -> Result<Vec<ShelfEntry>, SourceError> {
        let mut wish = self.fetch_listing("wish").await?;
        let done = self.fetch_listing("collect").await?;

        for id in &self.extra_ids {
            if !wish.contains(id) {
                wish.push(id.clone());
            }
        }
        // A watched item is no longer a wish
        let done_set: HashSet<&String> = done.iter().collect();
        wish.retain(|id| !done_set.contains(id));

        let entries: Vec<ShelfEntry> = wish
            .into_iter()
            .map(|id| ShelfEntry::new(id).with_archive(ArchiveLabel::LATER))
            .chain(
                done.into_iter()
                    .map(|id| ShelfEntry::new(id).with_archive(ArchiveLabel::DONE)),
            )
            .collect();

        info!(operation = "fetch_collection", source = "douban", count = entries.len(), "Fetched collection");
        Ok(entries)
    }

    async fn fetch_item_detail(&self, id: &str) -> Result<ItemDetail, SourceError> {
        let url = format!("{}/subject/{}/", self.base_url, id);
        let html = self.get_html(&url, &[]).await?;
        parser::parse_subject(id, &html)
    }
}
