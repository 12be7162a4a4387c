use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream source a post was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Threads,
    Reddit,
    Telegram,
}

impl Platform {
    /// Every platform, in the order the job invokes its source.
    pub const ALL: [Platform; 3] = [Platform::Threads, Platform::Reddit, Platform::Telegram];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Threads => "threads",
            Platform::Reddit => "reddit",
            Platform::Telegram => "telegram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A social post normalized into the shape stored in the `posts` collection.
///
/// Field names match the store's column names, so the struct serializes
/// directly into an upsert body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPost {
    pub platform: Platform,
    /// Display text. Never empty for a post that left its source.
    pub content: String,
    /// Absolute link back to the post. Together with `platform` this is the
    /// natural key.
    pub post_url: String,
    /// Publish time reported upstream, or the run time when upstream omitted it.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
}

/// The `(platform, post_url)` pair that identifies a stored post.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub platform: Platform,
    pub post_url: String,
}

impl CanonicalPost {
    #[must_use]
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            platform: self.platform,
            post_url: self.post_url.clone(),
        }
    }

    /// Returns `true` if the post can be deduplicated and displayed: both
    /// `content` and `post_url` are non-empty.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        !self.content.trim().is_empty() && !self.post_url.trim().is_empty()
    }
}
