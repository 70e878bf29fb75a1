use shelf_sync_store::NotionStore;
use wiremock::MockServer;

pub const TOKEN: &str = "secret_test";
pub const DATABASE_ID: &str = "db-test-001";

/// Starts a mock server and returns a store pointed at it
pub async fn setup_notion_mock() -> (MockServer, NotionStore) {
    let server = MockServer::start().await;
    let store = NotionStore::with_base_url(TOKEN.to_string(), DATABASE_ID.to_string(), server.uri());
    (server, store)
}

/// A page object with the given properties
pub fn page(id: &str, properties: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "object": "page", "id": id, "properties": properties })
}
