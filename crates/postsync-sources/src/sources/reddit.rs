//! Reddit user-submission collector (public JSON listing, no OAuth).

use async_trait::async_trait;
use chrono::Utc;
use postsync_core::{CanonicalPost, Platform};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::lenient;
use crate::normalize::{from_unix_seconds, normalize_all, RawPost};
use crate::source::{build_http_client, get_body, join_endpoint, PostSource};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
const PERMALINK_BASE_URL: &str = "https://reddit.com";
const USER_AGENT: &str = "portfolio-bot/1.0";
const MEDIA_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4"];
const MEDIA_HOSTS: [&str; 3] = ["i.redd.it", "v.redd.it", "i.imgur.com"];

/// Reddit listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

/// Children stay untyped so one malformed submission cannot reject the listing.
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default, deserialize_with = "lenient::text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    permalink: Option<String>,
    #[serde(default, deserialize_with = "lenient::seconds")]
    created_utc: Option<f64>,
    #[serde(default, deserialize_with = "lenient::int")]
    score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    ups: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    num_comments: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    url_overridden_by_dest: Option<String>,
    preview: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: Option<PreviewSource>,
}

#[derive(Debug, Deserialize)]
struct PreviewSource {
    url: Option<String>,
}

/// Collects a Reddit user's recent submissions.
pub struct RedditSource {
    client: Client,
    endpoint: String,
}

impl RedditSource {
    /// Creates a source for `user` against the public Reddit API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(user: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(user, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a source with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed,
    /// or [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(user: &str, timeout_secs: u64, base_url: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint: join_endpoint(base_url, &format!("user/{user}.json"))?,
        })
    }
}

#[async_trait]
impl PostSource for RedditSource {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn try_fetch(&self) -> Result<Vec<CanonicalPost>, SourceError> {
        let body = get_body(&self.client, &self.endpoint, USER_AGENT).await?;
        let raws = parse_listing(&body, &self.endpoint)?;
        Ok(normalize_all(Platform::Reddit, raws, Utc::now()))
    }
}

/// Parses a Reddit listing body into [`RawPost`]s.
///
/// # Errors
///
/// Returns [`SourceError::Deserialize`] if the body is not a listing.
fn parse_listing(body: &[u8], context: &str) -> Result<Vec<RawPost>, SourceError> {
    let listing: Listing =
        serde_json::from_slice(body).map_err(|e| SourceError::Deserialize {
            context: format!("Reddit listing from {context}"),
            source: e,
        })?;

    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|child| match serde_json::from_value::<Child>(child) {
            Ok(parsed) => Some(to_raw_post(parsed.data)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed Reddit child");
                None
            }
        })
        .collect())
}

fn to_raw_post(post: PostData) -> RawPost {
    let post_url = post
        .permalink
        .filter(|p| !p.is_empty())
        .map(|p| permalink_url(&p));

    let media_urls = media_urls(post.url_overridden_by_dest.as_deref(), post.preview);

    RawPost {
        content: post.title,
        post_url,
        created_at: post.created_utc.and_then(from_unix_seconds),
        media_urls: Some(media_urls),
        likes: post.score.or(post.ups),
        comments: post.num_comments,
        shares: None,
    }
}

fn permalink_url(permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        return permalink.to_owned();
    }
    format!("{PERMALINK_BASE_URL}/{}", permalink.trim_start_matches('/'))
}

/// Prefers the submission's direct media link; falls back to preview images.
///
/// A preview block of an unexpected shape is ignored.
fn media_urls(direct: Option<&str>, preview: Option<Value>) -> Vec<String> {
    if let Some(url) = direct.filter(|u| is_media_link(u)) {
        return vec![url.to_owned()];
    }
    preview
        .and_then(|p| serde_json::from_value::<Preview>(p).ok())
        .map(|p| {
            p.images
                .into_iter()
                .filter_map(|img| img.source.and_then(|s| s.url))
                // Preview URLs come HTML-escaped.
                .map(|url| url.replace("&amp;", "&"))
                .collect()
        })
        .unwrap_or_default()
}

fn is_media_link(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let host_matches = parsed
        .host_str()
        .is_some_and(|host| MEDIA_HOSTS.contains(&host));
    let path = parsed.path().to_ascii_lowercase();
    host_matches || MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
