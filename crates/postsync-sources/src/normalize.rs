//! Normalization from adapter-specific payloads to [`CanonicalPost`].
//!
//! Adapters only translate their upstream shape into a [`RawPost`], leaving
//! anything upstream omitted as `None`. [`normalize`] then applies the
//! [`DEFAULTS`] table once and enforces the post-filter, so every adapter
//! fills gaps the same way.

use chrono::{DateTime, Utc};
use postsync_core::{CanonicalPost, Platform};

/// A post as an adapter understood it, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPost {
    pub content: Option<String>,
    pub post_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub media_urls: Option<Vec<String>>,
    /// Signed because some upstreams report negative scores; clamped to 0.
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub shares: Option<i64>,
}

/// Values substituted for fields an upstream omitted.
///
/// `created_at` has no static default: it falls back to the run time passed
/// to [`normalize`].
#[derive(Debug, Clone, Copy)]
pub struct Defaults {
    pub content: &'static str,
    pub post_url: &'static str,
    pub media_urls: &'static [&'static str],
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

pub const DEFAULTS: Defaults = Defaults {
    content: "",
    post_url: "",
    media_urls: &[],
    likes: 0,
    comments: 0,
    shares: 0,
};

/// Applies [`DEFAULTS`] to `raw` and returns the post if it passes the
/// post-filter.
///
/// Returns `None` when `content` is empty after trimming, or `post_url` is not
/// an absolute `http(s)` URL.
#[must_use]
pub fn normalize(platform: Platform, raw: RawPost, now: DateTime<Utc>) -> Option<CanonicalPost> {
    let content = raw
        .content
        .as_deref()
        .unwrap_or(DEFAULTS.content)
        .trim()
        .to_string();
    let post_url = raw
        .post_url
        .as_deref()
        .unwrap_or(DEFAULTS.post_url)
        .trim()
        .to_string();

    if content.is_empty() {
        tracing::debug!(%platform, post_url = %post_url, "dropping post with empty content");
        return None;
    }
    if !is_absolute_http_url(&post_url) {
        tracing::debug!(%platform, post_url = %post_url, "dropping post without an absolute URL");
        return None;
    }

    let media_urls = raw.media_urls.map_or_else(
        || DEFAULTS.media_urls.iter().map(|s| (*s).to_string()).collect(),
        |urls| {
            urls.into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| is_absolute_http_url(u))
                .collect()
        },
    );

    Some(CanonicalPost {
        platform,
        content,
        post_url,
        created_at: raw.created_at.unwrap_or(now),
        media_urls,
        likes: counter(raw.likes, DEFAULTS.likes),
        comments: counter(raw.comments, DEFAULTS.comments),
        shares: counter(raw.shares, DEFAULTS.shares),
    })
}

/// Normalizes a whole adapter payload, logging how many records were dropped.
pub(crate) fn normalize_all(
    platform: Platform,
    raws: Vec<RawPost>,
    now: DateTime<Utc>,
) -> Vec<CanonicalPost> {
    let received = raws.len();
    let posts: Vec<CanonicalPost> = raws
        .into_iter()
        .filter_map(|raw| normalize(platform, raw, now))
        .collect();

    let dropped = received - posts.len();
    if dropped > 0 {
        tracing::debug!(%platform, received, dropped, "post-filter dropped records");
    }
    posts
}

/// Converts a unix timestamp in seconds (possibly fractional) to UTC.
///
/// Returns `None` for non-finite or out-of-range values so callers fall back
/// to the run time.
#[must_use]
pub(crate) fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = secs.floor() as i64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = (((secs - secs.floor()) * 1e9) as u32).min(999_999_999);
    DateTime::from_timestamp(whole, nanos)
}

fn counter(value: Option<i64>, default: u64) -> u64 {
    value.map_or(default, |v| u64::try_from(v).unwrap_or(0))
}

fn is_absolute_http_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
