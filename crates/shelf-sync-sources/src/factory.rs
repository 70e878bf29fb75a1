//! Builds the configured sources from config and credentials.

use anyhow::Result;
use async_trait::async_trait;
use shelf_sync_config::{Config, CredentialStore};

use crate::ContentSource;

/// Creates one kind of source from configuration
#[async_trait]
pub trait SourceFactory: Send + Sync {
    fn source_name(&self) -> &str;

    /// `None` when the source is disabled or absent from the config
    async fn create_source(
        &self,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Option<Box<dyn ContentSource>>>;

    fn validate_config(&self, config: &Config, credentials: &CredentialStore) -> Result<()>;
}

/// Registry of source factories, kept in registration order so sources
/// always sync in the same sequence
pub struct SourceFactoryRegistry {
    factories: Vec<Box<dyn SourceFactory>>,
}

impl SourceFactoryRegistry {
    /// A registry with every built-in source
    pub fn new() -> Self {
        let mut registry = Self { factories: Vec::new() };
        registry.register(Box::new(weread::WereadSourceFactory));
        registry.register(Box::new(douban::DoubanSourceFactory));
        registry
    }

    /// Register a factory, replacing any existing one with the same name
    pub fn register(&mut self, factory: Box<dyn SourceFactory>) {
        self.factories.retain(|f| f.source_name() != factory.source_name());
        self.factories.push(factory);
    }

    pub async fn create_all_sources(
        &self,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Vec<Box<dyn ContentSource>>> {
        let mut sources = Vec::new();
        for factory in &self.factories {
            if let Some(source) = factory.create_source(config, credentials).await? {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    pub async fn create_source_by_name(
        &self,
        name: &str,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Option<Box<dyn ContentSource>>> {
        match self.factories.iter().find(|f| f.source_name() == name) {
            Some(factory) => factory.create_source(config, credentials).await,
            None => Ok(None),
        }
    }

    pub fn validate_all_configs(&self, config: &Config, credentials: &CredentialStore) -> Result<()> {
        for factory in &self.factories {
            factory.validate_config(config, credentials)?;
        }
        Ok(())
    }

    pub fn registered_sources(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.source_name()).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.iter().any(|f| f.source_name() == name)
    }
}

impl Default for SourceFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

mod weread {
    use super::*;
    use crate::weread::WereadClient;

    pub struct WereadSourceFactory;

    #[async_trait]
    impl SourceFactory for WereadSourceFactory {
        fn source_name(&self) -> &str {
            "weread"
        }

        async fn create_source(
            &self,
            config: &Config,
            credentials: &CredentialStore,
        ) -> Result<Option<Box<dyn ContentSource>>> {
            let Some(weread) = config.weread.as_ref().filter(|w| w.enabled) else {
                return Ok(None);
            };
            let cookie = credentials.get_weread_cookie().cloned().ok_or_else(|| {
                anyhow::anyhow!("WeRead cookie not found. Set WEREAD_COOKIE or weread_cookie in credentials.toml")
            })?;
            let client = WereadClient::new(cookie, weread.vid.clone(), weread.api_base.clone())?;
            Ok(Some(Box::new(client)))
        }

        fn validate_config(&self, config: &Config, credentials: &CredentialStore) -> Result<()> {
            if config.is_weread_enabled() && credentials.get_weread_cookie().is_none() {
                return Err(anyhow::anyhow!("WeRead is enabled but no cookie is configured (set WEREAD_COOKIE)"));
            }
            Ok(())
        }
    }
}

mod douban {
    use super::*;
    use crate::douban::DoubanClient;

    pub struct DoubanSourceFactory;

    #[async_trait]
    impl SourceFactory for DoubanSourceFactory {
        fn source_name(&self) -> &str {
            "douban"
        }

        async fn create_source(
            &self,
            config: &Config,
            _credentials: &CredentialStore,
        ) -> Result<Option<Box<dyn ContentSource>>> {
            let Some(douban) = config.douban.as_ref().filter(|d| d.enabled) else {
                return Ok(None);
            };
            let client = DoubanClient::new(douban.user_id.clone(), douban.base_url.clone())?
                .with_extra_ids(douban.extra_ids.clone())
                .with_block_list(douban.block_list.clone())
                .with_max_pages(douban.max_pages);
            Ok(Some(Box::new(client)))
        }

        fn validate_config(&self, config: &Config, _credentials: &CredentialStore) -> Result<()> {
            if let Some(douban) = &config.douban {
                if douban.enabled && douban.user_id.trim().is_empty() {
                    return Err(anyhow::anyhow!("Douban is enabled but user_id is not configured"));
                }
            }
            Ok(())
        }
    }
}
