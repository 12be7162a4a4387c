//! Integration tests for `RestStore` against a wiremock PostgREST stand-in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postsync_core::{CanonicalPost, Platform, WritePolicy};
use postsync_store::{PostStore, RestStore, StoreError, StoreWriter};

const KEY: &str = "service-role-key";

fn store(server: &MockServer) -> RestStore {
    RestStore::new(&server.uri(), KEY, "posts", 5).expect("failed to build RestStore")
}

fn post(url: &str) -> CanonicalPost {
    CanonicalPost {
        platform: Platform::Reddit,
        content: "hello".to_owned(),
        post_url: url.to_owned(),
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        media_urls: vec!["https://i.redd.it/a.png".to_owned()],
        likes: 5,
        comments: 1,
        shares: 0,
    }
}

#[tokio::test]
async fn upsert_sends_conflict_target_and_credentials() {
    let server = MockServer::start().await;
    let batch = vec![post("https://reddit.com/r/a/1"), post("https://reddit.com/r/a/2")];

    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .and(query_param("on_conflict", "platform,post_url"))
        .and(header("apikey", KEY))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(header(
            "prefer",
            "resolution=merge-duplicates,return=representation",
        ))
        .and(body_json(&batch))
        .respond_with(ResponseTemplate::new(201).set_body_json(&batch))
        .expect(1)
        .mount(&server)
        .await;

    let affected = store(&server).upsert(&batch).await.unwrap();
    assert_eq!(affected, 2);
}

#[tokio::test]
async fn upsert_body_uses_store_column_names() {
    let server = MockServer::start().await;
    let expected = json!([{
        "platform": "reddit",
        "content": "hello",
        "post_url": "https://reddit.com/r/a/1",
        "created_at": "2023-11-14T22:13:20Z",
        "media_urls": ["https://i.redd.it/a.png"],
        "likes": 5,
        "comments": 1,
        "shares": 0
    }]);

    Mock::given(method("POST"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(201).set_body_json(&expected))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .upsert(&[post("https://reddit.com/r/a/1")])
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_representation_reports_zero_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let affected = store(&server)
        .upsert(&[post("https://reddit.com/r/a/1")])
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn rejected_upsert_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"message":"Invalid API key"}"#),
        )
        .mount(&server)
        .await;

    let err = store(&server)
        .upsert(&[post("https://reddit.com/r/a/1")])
        .await
        .unwrap_err();

    match err {
        StoreError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = store(&server)
        .upsert(&[post("https://reddit.com/r/a/1")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Deserialize { .. }));
}

#[tokio::test]
async fn empty_upsert_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(store(&server).upsert(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn recent_orders_by_creation_and_limits() {
    let server = MockServer::start().await;
    let rows = json!([
        {
            "id": 7,
            "platform": "telegram",
            "content": "newest",
            "post_url": "https://t.me/chan/9",
            "created_at": "2024-05-01T10:00:00+00:00",
            "media_urls": [],
            "likes": 0,
            "comments": 0,
            "shares": 0
        },
        {
            "id": 3,
            "platform": "threads",
            "content": "older",
            "post_url": "https://www.threads.net/@someone/post/A",
            "created_at": "2024-04-01T10:00:00+00:00"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "2"))
        .and(header("apikey", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(&rows))
        .expect(1)
        .mount(&server)
        .await;

    let posts = store(&server).recent(2).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].platform, Platform::Telegram);
    assert_eq!(posts[0].content, "newest");
    assert_eq!(posts[1].platform, Platform::Threads);
    assert!(posts[1].media_urls.is_empty());
    assert_eq!(posts[1].likes, 0);
}

#[tokio::test]
async fn strict_writer_over_rest_flags_zero_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let writer = StoreWriter::new(Arc::new(store(&server)), WritePolicy::Strict);
    let batch = vec![
        post("https://reddit.com/r/a/1"),
        post("https://reddit.com/r/a/2"),
        post("https://reddit.com/r/a/3"),
    ];

    let err = writer.write(&batch).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::IntegrityAnomaly {
            expected: 3,
            affected: 0
        }
    ));
}
