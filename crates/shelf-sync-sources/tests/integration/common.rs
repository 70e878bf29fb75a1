use shelf_sync_sources::{DoubanClient, WereadClient};
use wiremock::MockServer;

pub const COOKIE: &str = "wr_vid=31415; wr_skey=session-key";

pub async fn setup_weread_mock() -> (MockServer, WereadClient) {
    let server = MockServer::start().await;
    let client = WereadClient::new(COOKIE.to_string(), None, server.uri()).unwrap();
    (server, client)
}

pub async fn setup_douban_mock() -> (MockServer, DoubanClient) {
    let server = MockServer::start().await;
    let client = DoubanClient::new("cinephile".to_string(), server.uri())
        .unwrap()
        .with_max_pages(3);
    (server, client)
}

/// A listing page linking to the given subject ids
pub fn listing_page(ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<li><a href="https://movie.douban.com/subject/{}/">x</a></li>"#, id))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", links)
}
