use serde_json::json;
use shelf_sync_store::{Block, RecordStore, StoreError, APPEND_BATCH_LIMIT};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_list_children_forwards_cursor() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("GET"))
        .and(path("/blocks/page-1/children"))
        .and(query_param("page_size", "100"))
        .and(query_param("start_cursor", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [
                { "id": "b-1", "type": "table_of_contents", "has_children": false, "table_of_contents": { "color": "default" } },
                { "id": "b-2", "type": "heading_1", "has_children": false, "heading_1": { "rich_text": [{ "plain_text": "Part One" }] } },
                { "id": "b-3", "type": "paragraph", "has_children": false, "paragraph": { "rich_text": [] } }
            ],
            "next_cursor": "cursor-3",
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = store
        .list_children("page-1", Some("cursor-2"), 100)
        .await
        .unwrap();
    assert_eq!(page.results.len(), 3);
    assert_eq!(page.results[0].block, Block::TableOfContents);
    assert_eq!(page.results[1].block.heading_text(), Some("Part One"));
    assert_eq!(page.results[2].block, Block::Unsupported("paragraph".to_string()));
    assert_eq!(page.next_cursor.as_deref(), Some("cursor-3"));
    assert!(page.has_more);
}

#[tokio::test]
async fn test_append_children_returns_stored_blocks() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/blocks/col-1/children"))
        .and(body_partial_json(json!({
            "children": [{ "type": "bulleted_list_item", "bulleted_list_item": {
                "rich_text": [{ "text": { "content": "A highlight" } }]
            } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [
                { "id": "b-9", "type": "bulleted_list_item", "has_children": false,
                  "bulleted_list_item": { "rich_text": [{ "plain_text": "A highlight" }] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stored = store
        .append_children("col-1", &[Block::BulletedListItem("A highlight".to_string())])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "b-9");
}

#[tokio::test]
async fn test_oversized_append_never_reaches_the_api() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let children = vec![Block::Divider; APPEND_BATCH_LIMIT + 1];
    let err = store.append_children("col-1", &children).await.unwrap_err();
    assert!(matches!(err, StoreError::BatchTooLarge(n) if n == APPEND_BATCH_LIMIT + 1));
}
