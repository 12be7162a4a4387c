use async_trait::async_trait;
use postsync_core::CanonicalPost;

use crate::error::StoreError;

/// Persistence seam for canonical posts.
///
/// Implementations upsert on the natural key `(platform, post_url)`: a post
/// whose key already exists overwrites every stored field.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts or overwrites `posts` in a single call.
    ///
    /// Returns the number of rows the store reports as affected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the write or cannot be
    /// reached.
    async fn upsert(&self, posts: &[CanonicalPost]) -> Result<u64, StoreError>;

    /// Reads the `limit` most recently created posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    async fn recent(&self, limit: usize) -> Result<Vec<CanonicalPost>, StoreError>;
}
