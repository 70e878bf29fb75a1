pub mod douban;
pub mod error;
pub mod factory;
pub mod traits;
pub mod weread;

pub use douban::DoubanClient;
pub use error::SourceError;
pub use factory::{SourceFactory, SourceFactoryRegistry};
pub use traits::{ContentSource, LinkScheme};
pub use weread::WereadClient;
