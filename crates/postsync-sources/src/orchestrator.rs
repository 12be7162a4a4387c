//! Concurrent fan-out over every source with per-source failure isolation.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use postsync_core::{CanonicalPost, Platform};

use crate::source::PostSource;

/// How one source's fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Succeeded { count: usize },
    Failed { reason: String },
}

/// Per-source diagnostic entry, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub platform: Platform,
    pub settlement: Settlement,
}

impl SourceOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.settlement, Settlement::Succeeded { .. })
    }
}

/// The merged result of one collection pass.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Posts from every successful source, concatenated in invocation order.
    pub posts: Vec<CanonicalPost>,
    pub outcomes: Vec<SourceOutcome>,
}

impl Collection {
    /// `true` when there is nothing to write. Not an error: every source may
    /// legitimately have nothing new.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn failed_sources(&self) -> Vec<Platform> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.platform)
            .collect()
    }
}

/// Run every source concurrently and merge the posts of those that succeed.
///
/// Waits for all sources to settle. A source that errors, exceeds
/// `per_source_timeout`, or panics is recorded as
/// [`Settlement::Failed`] and contributes no posts; it never prevents the
/// other sources from being collected.
pub async fn collect_posts(
    sources: &[Box<dyn PostSource>],
    per_source_timeout: Duration,
) -> Collection {
    let settled = join_all(
        sources
            .iter()
            .map(|source| settle(source.as_ref(), per_source_timeout)),
    )
    .await;

    let mut collection = Collection::default();

    for (platform, result) in settled {
        let settlement = match result {
            Ok(posts) => {
                tracing::info!(%platform, count = posts.len(), "source fetch succeeded");
                let count = posts.len();
                collection.posts.extend(posts);
                Settlement::Succeeded { count }
            }
            Err(reason) => {
                tracing::warn!(%platform, reason = %reason, "source fetch failed");
                Settlement::Failed { reason }
            }
        };
        collection.outcomes.push(SourceOutcome {
            platform,
            settlement,
        });
    }

    let failed = collection.failed_sources().len();
    tracing::info!(
        total = collection.posts.len(),
        sources = sources.len(),
        failed,
        "collection settled"
    );

    collection
}

async fn settle(
    source: &dyn PostSource,
    limit: Duration,
) -> (Platform, Result<Vec<CanonicalPost>, String>) {
    let platform = source.platform();
    let guarded = AssertUnwindSafe(source.try_fetch()).catch_unwind();

    let result = match tokio::time::timeout(limit, guarded).await {
        Err(_) => Err(format!("timed out after {}s", limit.as_secs_f64())),
        Ok(Err(_)) => Err("source panicked".to_string()),
        Ok(Ok(Err(e))) => Err(e.to_string()),
        Ok(Ok(Ok(posts))) => Ok(posts),
    };

    (platform, result)
}
