use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub weread: Option<WereadConfig>,
    #[serde(default)]
    pub douban: Option<DoubanConfig>,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotionConfig {
    #[serde(default)]
    pub database_id: String,
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    /// Page size used when listing block children (Notion caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WereadConfig {
    pub enabled: bool,
    /// Reader id; parsed from the `wr_vid` cookie when absent
    #[serde(default)]
    pub vid: Option<String>,
    #[serde(default = "default_weread_api_base")]
    pub api_base: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DoubanConfig {
    pub enabled: bool,
    #[serde(default)]
    pub user_id: String,
    /// Subject ids that are never synced
    #[serde(default)]
    pub block_list: Vec<String>,
    /// Subject ids always added to the wishlist
    #[serde(default)]
    pub extra_ids: Vec<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_douban_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub sync_annotations: bool,
    /// Identifiers skipped for every source
    #[serde(default)]
    pub block_list: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_true() -> bool {
    true
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_weread_api_base() -> String {
    "https://i.weread.qq.com".to_string()
}

fn default_douban_base_url() -> String {
    "https://movie.douban.com".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_schedule() -> String {
    "0 0 */6 * * *".to_string() // Every 6 hours (sec min hour dom mon dow)
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: default_true(),
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            database_id: String::new(),
            api_base: default_notion_api_base(),
            page_size: default_page_size(),
        }
    }
}

impl Default for WereadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vid: None,
            api_base: default_weread_api_base(),
        }
    }
}

impl Default for DoubanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_id: String::new(),
            block_list: Vec::new(),
            extra_ids: Vec::new(),
            max_pages: default_max_pages(),
            base_url: default_douban_base_url(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_annotations: default_true(),
            block_list: Vec::new(),
        }
    }
}

/// Split a comma separated list, trimming entries and dropping empties
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if it exists (defaults otherwise), then apply
    /// environment overrides. Scheduled jobs usually run on env alone.
    pub fn load(path: &PathBuf) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(database_id) = lookup("DATABASE_ID") {
            self.notion.database_id = database_id.trim().to_string();
        }

        // A cookie or reader id in the environment is enough to turn WeRead on
        let weread_vid = lookup("WEREAD_VID");
        if weread_vid.is_some() || lookup("WEREAD_COOKIE").is_some() {
            let weread = self.weread.get_or_insert_with(WereadConfig::default);
            weread.enabled = true;
            if let Some(vid) = weread_vid {
                weread.vid = Some(vid.trim().to_string());
            }
        }

        if let Some(user_id) = lookup("DB_UID") {
            let douban = self.douban.get_or_insert_with(DoubanConfig::default);
            douban.enabled = true;
            douban.user_id = user_id.trim().to_string();
        }
        // Id lists only refine a Douban config that exists; they never enable it
        if let Some(douban) = self.douban.as_mut() {
            if let Some(block_list) = lookup("DB_BLOCK_LIST") {
                douban.block_list = split_list(&block_list);
            }
            if let Some(extra_ids) = lookup("DB_MOVIE_LIST") {
                douban.extra_ids = split_list(&extra_ids);
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.notion.database_id.trim().is_empty() {
            return Err(anyhow::anyhow!("notion.database_id is required (or set DATABASE_ID)"));
        }

        if self.notion.page_size == 0 || self.notion.page_size > 100 {
            return Err(anyhow::anyhow!(
                "notion.page_size must be between 1 and 100, got {}",
                self.notion.page_size
            ));
        }

        if self.get_configured_sources().is_empty() {
            return Err(anyhow::anyhow!("No source is enabled; configure [weread] or [douban]"));
        }

        if let Some(douban) = &self.douban {
            if douban.enabled && douban.user_id.trim().is_empty() {
                return Err(anyhow::anyhow!("Douban is enabled but user_id is not configured (or set DB_UID)"));
            }
        }

        Ok(())
    }

    pub fn is_weread_enabled(&self) -> bool {
        self.weread.as_ref().map(|w| w.enabled).unwrap_or(false)
    }

    pub fn is_douban_enabled(&self) -> bool {
        self.douban.as_ref().map(|d| d.enabled).unwrap_or(false)
    }

    /// Get list of configured and enabled sources
    pub fn get_configured_sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        if self.is_weread_enabled() {
            sources.push("weread".to_string());
        }
        if self.is_douban_enabled() {
            sources.push("douban".to_string());
        }
        sources
    }
}
