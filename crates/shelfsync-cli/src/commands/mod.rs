pub mod config;
pub mod daemon;
pub mod link;
pub mod prune;
pub mod sync;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use shelf_sync_config::{Config, CredentialStore, PathManager};
use shelf_sync_store::NotionStore;

/// Config file plus environment overrides, and the secrets that go with it
pub(crate) fn load_settings() -> Result<(Config, CredentialStore)> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let config = Config::load(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let credentials_file = path_manager.credentials_file();
    let mut credentials = CredentialStore::new(credentials_file.clone());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    credentials.apply_overrides(|key| std::env::var(key).ok());

    Ok((config, credentials))
}

pub(crate) fn notion_store(config: &Config, credentials: &CredentialStore) -> Result<NotionStore> {
    let token = credentials
        .get_notion_token()
        .ok_or_else(|| eyre!("Notion token is not configured (set NOTION_TOKEN or notion_token in credentials.toml)"))?;
    if config.notion.database_id.trim().is_empty() {
        return Err(eyre!("notion.database_id is required (or set DATABASE_ID)"));
    }
    Ok(NotionStore::with_base_url(
        token.clone(),
        config.notion.database_id.clone(),
        config.notion.api_base.clone(),
    ))
}
