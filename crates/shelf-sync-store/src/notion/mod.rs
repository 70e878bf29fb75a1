pub mod api;
pub mod client;

pub use client::{NotionStore, PruneReport, DEFAULT_API_BASE};
