//! In-process [`PostStore`] with the same upsert semantics as the REST store.
//!
//! Rows live only as long as the value does; the job and writer tests use it
//! in place of a live database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use postsync_core::{CanonicalPost, NaturalKey};

use crate::error::StoreError;
use crate::store::PostStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Apply writes but report this many affected rows.
    Reporting(u64),
    /// Reject every call with a 503.
    Unavailable,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<CanonicalPost>,
    index: HashMap<NaturalKey, usize>,
}

/// A [`PostStore`] held in memory, keyed on the natural key.
#[derive(Debug)]
pub struct MemoryStore {
    table: Mutex<Table>,
    mode: Mode,
    upsert_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_mode(Mode::Normal)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that applies writes but always reports `affected` rows.
    #[must_use]
    pub fn reporting(affected: u64) -> Self {
        Self::with_mode(Mode::Reporting(affected))
    }

    /// A store whose every call fails as if the service were down.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_mode(Mode::Unavailable)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            mode,
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the stored rows in first-insert order.
    #[must_use]
    pub fn rows(&self) -> Vec<CanonicalPost> {
        self.lock().rows.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times [`PostStore::upsert`] has been called.
    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        // Rows are plain values; a poisoned lock is still consistent.
        self.table
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.mode == Mode::Unavailable {
            return Err(StoreError::UnexpectedStatus {
                status: 503,
                body: "memory store marked unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn upsert(&self, posts: &[CanonicalPost]) -> Result<u64, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut table = self.lock();
        for post in posts {
            let key = post.natural_key();
            if let Some(&slot) = table.index.get(&key) {
                table.rows[slot] = post.clone();
            } else {
                let slot = table.rows.len();
                table.rows.push(post.clone());
                table.index.insert(key, slot);
            }
        }

        Ok(match self.mode {
            Mode::Reporting(affected) => affected,
            _ => posts.len() as u64,
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CanonicalPost>, StoreError> {
        self.check_available()?;

        let mut rows = self.rows();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }
}
