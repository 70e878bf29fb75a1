//! Integration tests for the Notion record store
//!
//! A wiremock server stands in for the Notion API.

mod common;

mod test_blocks;
mod test_records;
