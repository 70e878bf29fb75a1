use serde_json::json;
use shelf_sync_store::{PropertyValue, RecordField, RecordPatch, RecordStore, StoreError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_query_filters_by_uid_and_decodes_first_match() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path(format!("/databases/{}/query", common::DATABASE_ID)))
        .and(header("Authorization", "Bearer secret_test"))
        .and(header("Notion-Version", "2022-06-28"))
        .and(body_partial_json(json!({
            "filter": { "property": "UID", "rich_text": { "equals": "695233" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [
                common::page("page-1", json!({
                    "Name": { "type": "title", "title": [{ "plain_text": "Dune" }] },
                    "UID": { "type": "rich_text", "rich_text": [{ "plain_text": "695233" }] },
                    "Status": { "type": "status", "status": { "name": "In progress" } },
                    "Progress": { "type": "number", "number": 42 },
                    "Locked": { "type": "checkbox", "checkbox": true },
                    "Last Synced": { "type": "number", "number": null }
                })),
                common::page("page-2", json!({}))
            ],
            "next_cursor": null,
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = store.query("695233").await.unwrap().unwrap();
    assert_eq!(record.handle, "page-1");
    assert_eq!(record.title, "Dune");
    assert_eq!(record.progress, 42.0);
    assert!(record.locked);
    assert!(record.last_synced.is_none());
}

#[tokio::test]
async fn test_query_without_match() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path(format!("/databases/{}/query", common::DATABASE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list", "results": [], "next_cursor": null, "has_more": false
        })))
        .mount(&server)
        .await;

    assert!(store.query("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_sends_parent_icon_and_properties() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(body_partial_json(json!({
            "parent": { "database_id": common::DATABASE_ID },
            "icon": { "type": "external", "external": { "url": "https://img.example/c.jpg" } },
            "properties": {
                "UID": { "rich_text": [{ "type": "text", "text": { "content": "42" } }] },
                "Type": { "select": { "name": "Book" } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page("page-new", json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let patch = RecordPatch::new()
        .with(RecordField::Uid, PropertyValue::Text("42".to_string()))
        .with(RecordField::Type, PropertyValue::Choice("Book".to_string()));
    let handle = store
        .create(&patch, Some("https://img.example/c.jpg"))
        .await
        .unwrap();
    assert_eq!(handle, "page-new");
}

#[tokio::test]
async fn test_update_patches_page() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/page-1"))
        .and(body_partial_json(json!({
            "properties": { "Progress": { "number": 15.0 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page("page-1", json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let patch = RecordPatch::new().with(RecordField::Progress, PropertyValue::Number(15.0));
    store.update("page-1", &patch).await.unwrap();
}

#[tokio::test]
async fn test_api_error_carries_code_and_message() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/page-1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "object": "error",
            "status": 400,
            "code": "validation_error",
            "message": "Locked is not a property that exists."
        })))
        .mount(&server)
        .await;

    let patch = RecordPatch::new().with(RecordField::Locked, PropertyValue::Flag(true));
    match store.update("page-1", &patch).await {
        Err(StoreError::Api { status, code, message }) => {
            assert_eq!(status, 400);
            assert_eq!(code, "validation_error");
            assert!(message.contains("Locked"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prune_keeps_only_used_options() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/databases/{}", common::DATABASE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": common::DATABASE_ID,
            "properties": {
                "Categories": { "type": "multi_select", "multi_select": { "options": [
                    { "id": "a", "name": "Fiction", "color": "red" },
                    { "id": "b", "name": "History", "color": "blue" },
                    { "id": "c", "name": "Poetry", "color": "green" }
                ] } }
            }
        })))
        .mount(&server)
        .await;

    let tag = |id: &str, name: &str| json!({ "id": id, "name": name, "color": "default" });
    Mock::given(method("POST"))
        .and(path(format!("/databases/{}/query", common::DATABASE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                common::page("p1", json!({ "Categories": { "multi_select": [tag("a", "Fiction")] } })),
                common::page("p2", json!({ "Categories": { "multi_select": [tag("a", "Fiction"), tag("b", "History")] } }))
            ],
            "next_cursor": null,
            "has_more": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/databases/{}", common::DATABASE_ID)))
        .and(body_partial_json(json!({
            "properties": { "Categories": { "multi_select": { "options": [
                { "id": "a", "name": "Fiction" },
                { "id": "b", "name": "History" }
            ] } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": common::DATABASE_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let report = store.prune_multi_select_options("Categories").await.unwrap();
    assert_eq!(report.kept, 2);
    assert_eq!(report.removed, 1);
}
