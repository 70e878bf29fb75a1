use shelf_sync_sources::{ContentSource, SourceError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_collection_pages_until_nothing_new() {
    let (server, client) = common::setup_douban_mock().await;

    Mock::given(method("GET"))
        .and(path("/people/cinephile/wish"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/cinephile/wish"))
        .and(query_param("start", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&["2", "3"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/cinephile/wish"))
        .and(query_param("start", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/cinephile/collect"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&["3", "9"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/cinephile/collect"))
        .and(query_param("start", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&["3", "9"])))
        .mount(&server)
        .await;

    let entries = client.fetch_collection().await.unwrap();
    let summary: Vec<(&str, Option<&str>)> = entries
        .iter()
        .map(|e| (e.id.as_str(), e.archive.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("1", Some("Later")),
            ("2", Some("Later")),
            ("3", Some("Done")),
            ("9", Some("Done")),
        ]
    );
}

#[tokio::test]
async fn test_extra_ids_join_the_wishlist() {
    let server = wiremock::MockServer::start().await;
    let client = shelf_sync_sources::DoubanClient::new("cinephile".to_string(), server.uri())
        .unwrap()
        .with_max_pages(1)
        .with_extra_ids(vec!["77".to_string(), "1".to_string()]);

    Mock::given(method("GET"))
        .and(path("/people/cinephile/wish"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&["1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/cinephile/collect"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::listing_page(&[])))
        .mount(&server)
        .await;

    let ids: Vec<String> = client
        .fetch_collection()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["1", "77"]);
}

#[tokio::test]
async fn test_subject_detail_page() {
    let (server, client) = common::setup_douban_mock().await;

    Mock::given(method("GET"))
        .and(path("/subject/1292052/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<script type="application/ld+json">{"name":"肖申克的救赎","@type":"Movie","genre":["剧情"],"description":"d","aggregateRating":{"ratingValue":"9.7"}}</script>"#,
        ))
        .mount(&server)
        .await;

    let detail = client.fetch_item_detail("1292052").await.unwrap();
    assert_eq!(detail.title, "肖申克的救赎");
    assert_eq!(detail.rating.normalized(), 9.7);
}

#[tokio::test]
async fn test_blocked_page_is_a_status_error() {
    let (server, client) = common::setup_douban_mock().await;

    Mock::given(method("GET"))
        .and(path("/subject/1/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    assert!(matches!(
        client.fetch_item_detail("1").await,
        Err(SourceError::Status { status: 403, .. })
    ));
}
