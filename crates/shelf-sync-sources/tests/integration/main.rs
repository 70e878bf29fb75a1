//! Integration tests for the WeRead and Douban clients
//!
//! wiremock stands in for both platforms.

mod common;

mod test_douban;
mod test_weread;
