use chrono::{DateTime, Utc};
use postsync_core::Platform;

use super::*;
use crate::memory::MemoryStore;

fn post(platform: Platform, url: &str, content: &str) -> CanonicalPost {
    CanonicalPost {
        platform,
        content: content.to_owned(),
        post_url: url.to_owned(),
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        media_urls: vec![],
        likes: 1,
        comments: 0,
        shares: 0,
    }
}

fn batch_of_three() -> Vec<CanonicalPost> {
    vec![
        post(Platform::Reddit, "https://reddit.com/r/a/1", "one"),
        post(Platform::Reddit, "https://reddit.com/r/a/2", "two"),
        post(Platform::Telegram, "https://t.me/chan/3", "three"),
    ]
}

fn writer(store: &Arc<MemoryStore>, policy: WritePolicy) -> StoreWriter {
    StoreWriter::new(Arc::clone(store) as Arc<dyn PostStore>, policy)
}

// ---------------------------------------------------------------------------
// Strict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn strict_writes_batch_and_reports_rows() {
    let store = Arc::new(MemoryStore::new());
    let outcome = writer(&store, WritePolicy::Strict)
        .write(&batch_of_three())
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.rows_affected, Some(3));
    assert_eq!(store.len(), 3);
    assert_eq!(store.upsert_calls(), 1);
}

#[tokio::test]
async fn strict_rejects_empty_batch_without_calling_store() {
    let store = Arc::new(MemoryStore::new());
    let err = writer(&store, WritePolicy::Strict).write(&[]).await.unwrap_err();

    assert!(matches!(err, StoreError::EmptyBatch));
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn strict_zero_affected_rows_is_an_integrity_anomaly() {
    let store = Arc::new(MemoryStore::reporting(0));
    let err = writer(&store, WritePolicy::Strict)
        .write(&batch_of_three())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::IntegrityAnomaly {
            expected: 3,
            affected: 0
        }
    ));
    assert!(err.to_string().contains("integrity"));
}

#[tokio::test]
async fn strict_propagates_store_failure() {
    let store = Arc::new(MemoryStore::unavailable());
    let err = writer(&store, WritePolicy::Strict)
        .write(&batch_of_three())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UnexpectedStatus { status: 503, .. }));
}

// ---------------------------------------------------------------------------
// Lenient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lenient_skips_empty_batch() {
    let store = Arc::new(MemoryStore::new());
    let outcome = writer(&store, WritePolicy::Lenient).write(&[]).await.unwrap();

    assert_eq!(outcome, WriteOutcome::skipped());
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn lenient_absorbs_store_failure() {
    let store = Arc::new(MemoryStore::unavailable());
    let outcome = writer(&store, WritePolicy::Lenient)
        .write(&batch_of_three())
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.rows_affected, None);
}

#[tokio::test]
async fn lenient_does_not_verify_affected_rows() {
    let store = Arc::new(MemoryStore::reporting(0));
    let outcome = writer(&store, WritePolicy::Lenient)
        .write(&batch_of_three())
        .await
        .unwrap();

    assert_eq!(outcome.rows_affected, Some(0));
}

// ---------------------------------------------------------------------------
// Upsert semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn writing_the_same_batch_twice_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let writer = writer(&store, WritePolicy::Strict);

    writer.write(&batch_of_three()).await.unwrap();
    let first = store.rows();
    writer.write(&batch_of_three()).await.unwrap();

    assert_eq!(store.rows(), first);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn rewrite_with_changed_fields_overwrites_by_natural_key() {
    let store = Arc::new(MemoryStore::new());
    let writer = writer(&store, WritePolicy::Strict);
    writer.write(&batch_of_three()).await.unwrap();

    let mut updated = post(Platform::Reddit, "https://reddit.com/r/a/1", "one, edited");
    updated.likes = 40;
    writer.write(&[updated]).await.unwrap();

    let rows = store.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].content, "one, edited");
    assert_eq!(rows[0].likes, 40);
}

#[test]
fn dedupe_keeps_last_value_at_first_position() {
    let batch = vec![
        post(Platform::Reddit, "https://reddit.com/r/a/1", "old"),
        post(Platform::Reddit, "https://reddit.com/r/a/2", "two"),
        post(Platform::Reddit, "https://reddit.com/r/a/1", "new"),
        post(Platform::Threads, "https://reddit.com/r/a/1", "other platform"),
    ];

    let rows = dedupe_by_natural_key(&batch);
    let contents: Vec<&str> = rows.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["new", "two", "other platform"]);
}

#[tokio::test]
async fn duplicate_keys_in_batch_are_collapsed_before_upsert() {
    let store = Arc::new(MemoryStore::new());
    let mut batch = batch_of_three();
    batch.push(post(Platform::Reddit, "https://reddit.com/r/a/2", "two again"));

    let outcome = writer(&store, WritePolicy::Strict).write(&batch).await.unwrap();

    assert_eq!(outcome.submitted, 4);
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.rows_affected, Some(3));
}
