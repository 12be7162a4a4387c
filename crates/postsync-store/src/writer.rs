//! Policy-enforcing batch writer.

use std::collections::HashMap;
use std::sync::Arc;

use postsync_core::{CanonicalPost, NaturalKey, WritePolicy};

use crate::error::StoreError;
use crate::store::PostStore;

/// What one [`StoreWriter::write`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Posts handed to the writer.
    pub submitted: usize,
    /// Posts sent to the store after natural-key deduplication.
    pub attempted: usize,
    /// Rows the store reported as affected; `None` when nothing was written
    /// or a lenient write failed.
    pub rows_affected: Option<u64>,
}

impl WriteOutcome {
    /// The outcome of a write that never reached the store.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            submitted: 0,
            attempted: 0,
            rows_affected: None,
        }
    }
}

/// Upserts merged batches into a [`PostStore`] under one [`WritePolicy`].
pub struct StoreWriter {
    store: Arc<dyn PostStore>,
    policy: WritePolicy,
}

impl StoreWriter {
    #[must_use]
    pub fn new(store: Arc<dyn PostStore>, policy: WritePolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Upserts `batch` in a single store call.
    ///
    /// Duplicate natural keys within the batch collapse to their last
    /// occurrence.
    ///
    /// # Errors
    ///
    /// Under [`WritePolicy::Strict`]: [`StoreError::EmptyBatch`] for an empty
    /// batch, the store's own error if the upsert fails, and
    /// [`StoreError::IntegrityAnomaly`] if the store reports zero affected rows.
    /// Under [`WritePolicy::Lenient`] this never returns an error.
    pub async fn write(&self, batch: &[CanonicalPost]) -> Result<WriteOutcome, StoreError> {
        if batch.is_empty() {
            return match self.policy {
                WritePolicy::Strict => Err(StoreError::EmptyBatch),
                WritePolicy::Lenient => {
                    tracing::info!("empty batch; nothing to write");
                    Ok(WriteOutcome::skipped())
                }
            };
        }

        let rows = dedupe_by_natural_key(batch);
        if rows.len() < batch.len() {
            tracing::debug!(
                submitted = batch.len(),
                unique = rows.len(),
                "collapsed duplicate natural keys in batch"
            );
        }

        let mut outcome = WriteOutcome {
            submitted: batch.len(),
            attempted: rows.len(),
            rows_affected: None,
        };

        let affected = match self.store.upsert(&rows).await {
            Ok(affected) => affected,
            Err(e) => match self.policy {
                WritePolicy::Strict => return Err(e),
                WritePolicy::Lenient => {
                    tracing::error!(
                        error = %e,
                        attempted = outcome.attempted,
                        "store write failed; continuing under lenient policy"
                    );
                    return Ok(outcome);
                }
            },
        };

        let expected = outcome.attempted as u64;
        if affected == 0 {
            if self.policy == WritePolicy::Strict {
                return Err(StoreError::IntegrityAnomaly { expected, affected });
            }
            tracing::warn!(expected, "store reported no affected rows");
        } else if affected != expected {
            tracing::warn!(expected, affected, "affected row count differs from batch size");
        }

        tracing::info!(
            policy = %self.policy,
            attempted = outcome.attempted,
            affected,
            "batch written"
        );
        outcome.rows_affected = Some(affected);
        Ok(outcome)
    }
}

/// Keeps the last occurrence of each natural key at the position of its first.
fn dedupe_by_natural_key(batch: &[CanonicalPost]) -> Vec<CanonicalPost> {
    let mut slots: HashMap<NaturalKey, usize> = HashMap::with_capacity(batch.len());
    let mut rows: Vec<CanonicalPost> = Vec::with_capacity(batch.len());

    for post in batch {
        let key = post.natural_key();
        if let Some(&slot) = slots.get(&key) {
            rows[slot] = post.clone();
        } else {
            slots.insert(key, rows.len());
            rows.push(post.clone());
        }
    }

    rows
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
