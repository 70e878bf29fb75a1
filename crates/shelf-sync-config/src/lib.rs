pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, DoubanConfig, NotionConfig, SchedulerConfig, SyncOptions, WereadConfig, default_scheduler_config, split_list};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
