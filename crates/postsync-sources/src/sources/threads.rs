//! Threads profile scraper.
//!
//! Threads has no public API for profile timelines; the profile page embeds
//! its first page of posts as JSON under a `"thread_items"` key. Finding that
//! JSON is delegated to an [`ExtractionStrategy`].

use async_trait::async_trait;
use chrono::Utc;
use postsync_core::{CanonicalPost, Platform};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::extract::{ExtractionStrategy, MarkerArrayExtraction};
use crate::lenient;
use crate::normalize::{from_unix_seconds, normalize_all, RawPost};
use crate::source::{build_http_client, get_body, join_endpoint, PostSource};

const DEFAULT_BASE_URL: &str = "https://www.threads.net";
/// Post links always point at the public site, whatever base URL was fetched.
const CANONICAL_BASE_URL: &str = "https://www.threads.net";
/// The profile page only renders embedded data for browser-like agents.
const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Deserialize)]
struct ThreadItem {
    post: Option<ThreadPost>,
}

/// Nested objects stay untyped until mapped; a mistyped one is treated as
/// absent rather than rejecting the post.
#[derive(Debug, Deserialize)]
struct ThreadPost {
    #[serde(default, deserialize_with = "lenient::text")]
    code: Option<String>,
    #[serde(default, deserialize_with = "lenient::seconds")]
    taken_at: Option<f64>,
    caption: Option<Value>,
    #[serde(default, deserialize_with = "lenient::int")]
    like_count: Option<i64>,
    text_post_app_info: Option<Value>,
    image_versions2: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default, deserialize_with = "lenient::text")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextPostAppInfo {
    #[serde(default, deserialize_with = "lenient::int")]
    direct_reply_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    repost_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ImageVersions {
    #[serde(default)]
    candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Deserialize)]
struct ImageCandidate {
    url: Option<String>,
}

/// Scrapes a Threads profile page.
pub struct ThreadsSource {
    client: Client,
    endpoint: String,
    handle: String,
    strategy: Box<dyn ExtractionStrategy>,
}

impl ThreadsSource {
    /// Creates a source for `handle` against the public Threads site.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(handle: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(handle, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a source that fetches from `base_url` instead of the public site
    /// (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed,
    /// or [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        handle: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let handle = handle.trim_start_matches('@').to_owned();
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint: join_endpoint(base_url, &format!("@{handle}"))?,
            handle,
            strategy: Box::new(MarkerArrayExtraction::thread_items()),
        })
    }

    /// Replaces the strategy used to find embedded post data.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }
}

#[async_trait]
impl PostSource for ThreadsSource {
    fn platform(&self) -> Platform {
        Platform::Threads
    }

    async fn try_fetch(&self) -> Result<Vec<CanonicalPost>, SourceError> {
        let body = get_body(&self.client, &self.endpoint, USER_AGENT).await?;
        let html = String::from_utf8_lossy(&body);

        let Some(items) = self.strategy.extract(&html)? else {
            tracing::warn!(
                handle = %self.handle,
                strategy = self.strategy.name(),
                "no embedded post data found on Threads profile page"
            );
            return Ok(Vec::new());
        };

        let raws = parse_thread_items(items, &self.handle);
        Ok(normalize_all(Platform::Threads, raws, Utc::now()))
    }
}

/// Maps embedded `thread_items` entries to [`RawPost`]s.
///
/// Entries that do not match the expected shape are skipped.
fn parse_thread_items(items: Vec<Value>, handle: &str) -> Vec<RawPost> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ThreadItem>(item) {
            Ok(parsed) => parsed.post,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed thread item");
                None
            }
        })
        .map(|post| to_raw_post(post, handle))
        .collect()
}

fn to_raw_post(post: ThreadPost, handle: &str) -> RawPost {
    let post_url = post
        .code
        .filter(|code| !code.trim().is_empty())
        .map(|code| format!("{CANONICAL_BASE_URL}/@{handle}/post/{}", code.trim()));

    let created_at = post.taken_at.and_then(from_unix_seconds);

    let media_urls = nested::<ImageVersions>(post.image_versions2).map(|images| {
        images
            .candidates
            .into_iter()
            .filter_map(|c| c.url)
            .take(1)
            .collect()
    });

    let (comments, shares) = nested::<TextPostAppInfo>(post.text_post_app_info)
        .map_or((None, None), |info| (info.direct_reply_count, info.repost_count));

    RawPost {
        content: nested::<Caption>(post.caption).and_then(|c| c.text),
        post_url,
        created_at,
        media_urls,
        likes: post.like_count,
        comments,
        shares,
    }
}

fn nested<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}
