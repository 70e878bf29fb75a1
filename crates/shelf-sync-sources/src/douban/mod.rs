pub mod client;
pub mod parser;

pub use client::{DoubanClient, DOUBAN_SUBJECT_BASE};
pub use parser::{extract_subject_ids, parse_subject};
