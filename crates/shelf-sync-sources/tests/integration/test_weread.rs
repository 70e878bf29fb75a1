use chrono::{TimeZone, Utc};
use serde_json::json;
use shelf_sync_sources::{ContentSource, SourceError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_shelf_assigns_archive_and_progress() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/shelf/sync"))
        .and(query_param("vid", "31415"))
        .and(header("Cookie", common::COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "books": [
                { "bookId": "695233", "title": "三体" },
                { "bookId": "3300045678", "title": "活着" },
                { "bookId": "695233", "title": "三体" }
            ],
            "bookProgress": [
                { "bookId": "695233", "progress": 42, "updateTime": 1700000000 }
            ],
            "archive": [
                { "archiveId": 1, "name": "Later", "bookIds": ["3300045678"] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client.fetch_collection().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "695233");
    assert_eq!(entries[0].progress, 42);
    assert_eq!(entries[0].archive, None);
    assert_eq!(entries[1].archive.as_deref(), Some("Later"));
    assert_eq!(entries[1].title.as_deref(), Some("活着"));
}

#[tokio::test]
async fn test_book_info_maps_detail() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/book/info"))
        .and(query_param("bookId", "695233"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookId": "695233",
            "title": "三体",
            "author": "刘慈欣",
            "cover": "https://cdn.weread.qq.com/weread/cover/80/YueWen_695233/s_YueWen_695233.jpg",
            "intro": "文化大革命如火如荼进行的同时……",
            "category": "精品小说-科幻经典",
            "newRating": 913,
            "authorSeg": [
                { "words": "刘慈欣", "highlight": 1, "authorId": "刘慈欣", "type": 1 },
                { "words": "（译者）某人", "highlight": 0, "type": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let detail = client.fetch_item_detail("695233").await.unwrap();
    assert_eq!(detail.title, "三体");
    assert_eq!(detail.categories, vec!["精品小说-科幻经典"]);
    assert_eq!(detail.rating.normalized(), 9.13);
    assert_eq!(detail.authors.len(), 2);
    assert_eq!(detail.authors[0].author_id.as_deref(), Some("刘慈欣"));
    assert_eq!(detail.authors[1].author_id, None);
}

#[tokio::test]
async fn test_read_info_finished_date() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/book/readinfo"))
        .and(query_param("bookId", "695233"))
        .and(query_param("finishedDate", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookId": "695233",
            "readingProgress": 100,
            "finishedDate": 1700000000,
            "markedStatus": 4
        })))
        .mount(&server)
        .await;

    let progress = client.fetch_read_progress("695233").await.unwrap().unwrap();
    assert_eq!(progress.progress, 100);
    assert_eq!(
        progress.finished_at,
        Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    );
}

#[tokio::test]
async fn test_bookmarks_with_chapters() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/book/bookmarklist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updated": [
                { "bookmarkId": "695233_12_1-5", "chapterUid": 12, "markText": "给岁月以文明", "createTime": 1700000100 },
                { "bookmarkId": "695233_12_9-12", "chapterUid": 12, "markText": "   ", "createTime": 1700000200 }
            ],
            "chapters": [
                { "bookId": "695233", "chapterUid": 12, "chapterIdx": 3, "title": "第三章" }
            ]
        })))
        .mount(&server)
        .await;

    let set = client.fetch_annotations("695233").await.unwrap().unwrap();
    assert_eq!(set.annotations.len(), 1);
    assert_eq!(set.annotations[0].text, "给岁月以文明");
    assert_eq!(set.chapter_for(12).title, "第三章");
}

#[tokio::test]
async fn test_expired_session_is_an_api_error() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/shelf/sync"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errcode": -2012,
            "errmsg": "登录超时"
        })))
        .mount(&server)
        .await;

    match client.fetch_collection().await {
        Err(SourceError::Api { code, message, .. }) => {
            assert_eq!(code, -2012);
            assert_eq!(message, "登录超时");
        }
        other => panic!("expected API error, got {:?}", other.map(|e| e.len())),
    }
}

#[tokio::test]
async fn test_non_json_failure_is_a_status_error() {
    let (server, client) = common::setup_weread_mock().await;

    Mock::given(method("GET"))
        .and(path("/book/info"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    assert!(matches!(
        client.fetch_item_detail("1").await,
        Err(SourceError::Status { status: 502, .. })
    ));
}
