pub mod api;
pub mod client;
pub mod cookie;

pub use client::{WereadClient, WEREAD_READER_BASE, WEREAD_SOURCE_TAG};
pub use cookie::{parse_cookie, reader_id};
