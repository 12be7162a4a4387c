//! Telegram channel collector, read through the channel's RSS/Atom feed.

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::model::Entry;
use postsync_core::{CanonicalPost, Platform};
use reqwest::Client;

use crate::error::SourceError;
use crate::normalize::{normalize_all, RawPost};
use crate::source::{build_http_client, get_body, join_endpoint, PostSource};

const DEFAULT_BASE_URL: &str = "https://rsshub.app";
const USER_AGENT: &str = "postsync/0.1 (feed-reader)";

/// Reads a Telegram channel's syndication feed.
pub struct TelegramSource {
    client: Client,
    endpoint: String,
}

impl TelegramSource {
    /// Creates a source for `channel` against the public feed bridge.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed.
    pub fn new(channel: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(channel, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a source with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be constructed,
    /// or [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        channel: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint: join_endpoint(base_url, &format!("telegram/channel/{channel}"))?,
        })
    }
}

#[async_trait]
impl PostSource for TelegramSource {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn try_fetch(&self) -> Result<Vec<CanonicalPost>, SourceError> {
        let body = get_body(&self.client, &self.endpoint, USER_AGENT).await?;
        let raws = parse_feed(&body)?;
        Ok(normalize_all(Platform::Telegram, raws, Utc::now()))
    }
}

/// Parses an RSS or Atom document into [`RawPost`]s.
///
/// # Errors
///
/// Returns [`SourceError::Feed`] if the body is not a recognizable feed.
fn parse_feed(body: &[u8]) -> Result<Vec<RawPost>, SourceError> {
    let feed = feed_rs::parser::parse(body).map_err(|e| SourceError::Feed(e.to_string()))?;
    Ok(feed.entries.into_iter().map(to_raw_post).collect())
}

fn to_raw_post(entry: Entry) -> RawPost {
    let snippet = entry
        .summary
        .as_ref()
        .map(|s| strip_html(&s.content))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_deref())
                .map(strip_html)
                .filter(|s| !s.is_empty())
        });
    let content = snippet.or_else(|| entry.title.as_ref().map(|t| strip_html(&t.content)));

    let post_url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()));

    let media_urls: Vec<String> = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| c.url.as_ref().map(ToString::to_string))
        .collect();

    RawPost {
        content,
        post_url,
        created_at: entry.published,
        media_urls: Some(media_urls),
        likes: None,
        comments: None,
        shares: None,
    }
}

/// Strips HTML tags, decodes character references, and collapses whitespace.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_html(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes the named entities feeds commonly use plus numeric references.
///
/// Single pass, so `&amp;lt;` becomes `&lt;` rather than `<`. Unknown or
/// malformed references are kept verbatim.
fn decode_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
