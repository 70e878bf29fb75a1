use async_trait::async_trait;
use reqwest::Client;
use shelf_sync_models::{AnnotationSet, ItemDetail, ReadProgress, ShelfEntry};
use std::sync::Arc;
use tracing::info;

use crate::error::SourceError;
use crate::traits::{ContentSource, LinkScheme};
use crate::weread::{api, cookie};

pub const WEREAD_SOURCE_TAG: &str = "微信读书";
pub const WEREAD_READER_BASE: &str = "https://weread.qq.com/web/reader/";

#[derive(Clone)]
pub struct WereadClient {
    client: Arc<Client>,
    base_url: String,
    cookie: String,
    vid: String,
}

impl WereadClient {
    /// Build a client from the session cookie. The reader id comes from
    /// `vid` when given, otherwise from the cookie's `wr_vid`.
    pub fn new(cookie: String, vid: Option<String>, base_url: String) -> Result<Self, SourceError> {
        if cookie.trim().is_empty() {
            return Err(SourceError::MissingCredential(
                "WeRead cookie (weread_cookie or WEREAD_COOKIE)".to_string(),
            ));
        }
        let vid = vid
            .filter(|v| !v.trim().is_empty())
            .or_else(|| cookie::reader_id(&cookie))
            .ok_or_else(|| SourceError::MissingCredential("wr_vid cookie or weread.vid".to_string()))?;

        Ok(Self {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie,
            vid,
        })
    }

    pub fn vid(&self) -> &str {
        &self.vid
    }
}

#[async_trait]
impl ContentSource for WereadClient {
    fn source_name(&self) -> &str {
        "weread"
    }

    fn source_tag(&self) -> Option<&str> {
        Some(WEREAD_SOURCE_TAG)
    }

    fn link_scheme(&self) -> LinkScheme {
        LinkScheme::ReaderToken {
            base: WEREAD_READER_BASE.to_string(),
        }
    }

    async fn fetch_collection(&self) -> Result<Vec<ShelfEntry>, SourceError> {
        let entries = api::get_shelf(&self.client, &self.base_url, &self.cookie, &self.vid).await?;
        info!(operation = "fetch_collection", source = "weread", count = entries.len(), "Fetched shelf");
        Ok(entries)
    }

    async fn fetch_item_detail(&self, id: &str) -> Result<ItemDetail, SourceError> {
        api::get_book_info(&self.client, &self.base_url, &self.cookie, id).await
    }

    async fn fetch_read_progress(&self, id: &str) -> Result<Option<ReadProgress>, SourceError> {
        api::get_read_info(&self.client, &self.base_url, &self.cookie, id)
            .await
            .map(Some)
    }

    async fn fetch_annotations(&self, id: &str) -> Result<Option<AnnotationSet>, SourceError> {
        api::get_bookmarks(&self.client, &self.base_url, &self.cookie, id)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vid_from_cookie() {
        let client = WereadClient::new(
            "wr_skey=abc; wr_vid=31415".to_string(),
            None,
            "https://i.weread.qq.com/".to_string(),
        )
        .unwrap();
        assert_eq!(client.vid(), "31415");
    }

    #[test]
    fn test_explicit_vid_wins() {
        let client = WereadClient::new("wr_vid=1".to_string(), Some("2".to_string()), String::new()).unwrap();
        assert_eq!(client.vid(), "2");
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            WereadClient::new(" ".to_string(), None, String::new()),
            Err(SourceError::MissingCredential(_))
        ));
        assert!(matches!(
            WereadClient::new("wr_skey=abc".to_string(), None, String::new()),
            Err(SourceError::MissingCredential(_))
        ));
    }
}
