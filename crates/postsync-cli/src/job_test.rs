use async_trait::async_trait;
use chrono::Utc;
use postsync_core::{CanonicalPost, Platform, WritePolicy};
use postsync_sources::SourceError;
use postsync_store::MemoryStore;

use super::*;

const LIMIT: Duration = Duration::from_millis(200);

/// Yields `count` posts, or fails with a 502 when `count` is `None`.
struct StubSource {
    platform: Platform,
    count: Option<usize>,
}

#[async_trait]
impl PostSource for StubSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn try_fetch(&self) -> Result<Vec<CanonicalPost>, SourceError> {
        let Some(count) = self.count else {
            return Err(SourceError::UnexpectedStatus {
                status: 502,
                url: format!("https://{}.example", self.platform),
            });
        };
        Ok((0..count)
            .map(|i| CanonicalPost {
                platform: self.platform,
                content: format!("post {i}"),
                post_url: format!("https://{}.example/p/{i}", self.platform),
                created_at: Utc::now(),
                media_urls: vec![],
                likes: 0,
                comments: 0,
                shares: 0,
            })
            .collect())
    }
}

fn sources(counts: [Option<usize>; 3]) -> Vec<Box<dyn PostSource>> {
    Platform::ALL
        .into_iter()
        .zip(counts)
        .map(|(platform, count)| Box::new(StubSource { platform, count }) as Box<dyn PostSource>)
        .collect()
}

fn writer(store: &Arc<MemoryStore>, policy: WritePolicy) -> StoreWriter {
    StoreWriter::new(Arc::clone(store) as Arc<dyn PostStore>, policy)
}

#[tokio::test]
async fn batch_of_three_is_upserted() {
    let store = Arc::new(MemoryStore::new());
    let summary = run_job(
        &sources([Some(0), Some(2), Some(1)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.failed_sources(), 0);
    assert_eq!(summary.write.and_then(|w| w.rows_affected), Some(3));
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn failed_source_is_recorded_but_job_succeeds() {
    let store = Arc::new(MemoryStore::new());
    let summary = run_job(
        &sources([None, Some(2), Some(1)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.failed_sources(), 1);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn empty_batch_skips_the_writer_even_when_strict() {
    let store = Arc::new(MemoryStore::new());
    let summary = run_job(
        &sources([Some(0), None, Some(0)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.fetched, 0);
    assert!(summary.write.is_none());
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn zero_affected_rows_under_strict_fails_the_job() {
    let store = Arc::new(MemoryStore::reporting(0));
    let err = run_job(
        &sources([Some(1), Some(1), Some(1)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        false,
    )
    .await
    .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.contains("failed to write 3 post(s)"), "{chain}");
    assert!(chain.contains("integrity anomaly"), "{chain}");
}

#[tokio::test]
async fn store_outage_under_lenient_does_not_fail_the_job() {
    let store = Arc::new(MemoryStore::unavailable());
    let summary = run_job(
        &sources([Some(1), Some(1), Some(1)]),
        &writer(&store, WritePolicy::Lenient),
        LIMIT,
        false,
    )
    .await
    .unwrap();

    let write = summary.write.expect("lenient write still reports an outcome");
    assert_eq!(write.attempted, 3);
    assert!(write.rows_affected.is_none());
}

#[tokio::test]
async fn store_outage_under_strict_fails_the_job() {
    let store = Arc::new(MemoryStore::unavailable());
    let result = run_job(
        &sources([Some(1), Some(0), Some(0)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        false,
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn dry_run_never_writes() {
    let store = Arc::new(MemoryStore::new());
    let summary = run_job(
        &sources([Some(1), Some(1), Some(1)]),
        &writer(&store, WritePolicy::Strict),
        LIMIT,
        true,
    )
    .await
    .unwrap();

    assert_eq!(summary.fetched, 3);
    assert!(summary.write.is_none());
    assert_eq!(store.upsert_calls(), 0);
}
