//! The adapter seam and the HTTP plumbing shared by every adapter.

use std::time::Duration;

use async_trait::async_trait;
use postsync_core::{CanonicalPost, Platform};
use reqwest::Client;

use crate::error::SourceError;

/// One upstream source of posts.
///
/// Implementors only provide [`PostSource::try_fetch`]; the provided
/// [`PostSource::fetch`] turns any failure into an empty result so a broken
/// upstream can never abort a job.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// The platform tag stamped on every post this source yields.
    fn platform(&self) -> Platform;

    /// Fetch and normalize the source's recent posts.
    ///
    /// Returned posts always satisfy [`CanonicalPost::is_publishable`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, a non-2xx status, or an
    /// unparsable payload.
    async fn try_fetch(&self) -> Result<Vec<CanonicalPost>, SourceError>;

    /// Best-effort fetch: failures are logged as warnings and yield an empty `Vec`.
    ///
    /// For callers driving a single source. [`crate::orchestrator::collect_posts`]
    /// calls [`PostSource::try_fetch`] instead, since it records each failure in
    /// the source's [`crate::orchestrator::Settlement`].
    async fn fetch(&self) -> Vec<CanonicalPost> {
        match self.try_fetch().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(
                    platform = %self.platform(),
                    error = %e,
                    "source fetch failed; continuing with no posts"
                );
                Vec::new()
            }
        }
    }
}

/// Builds the HTTP client adapters share: bounded request and connect timeouts.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the underlying `reqwest::Client` cannot be
/// constructed.
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client, SourceError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Joins a base URL and a path, tolerating a trailing slash on the base.
pub(crate) fn join_endpoint(base_url: &str, path: &str) -> Result<String, SourceError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    reqwest::Url::parse(&joined).map_err(|e| SourceError::InvalidUrl {
        url: joined.clone(),
        reason: e.to_string(),
    })?;
    Ok(joined)
}

/// Sends one GET with the adapter's identifying `User-Agent` and returns the
/// body bytes of a 2xx response.
///
/// # Errors
///
/// Returns [`SourceError::Http`] on network failure or
/// [`SourceError::UnexpectedStatus`] for any non-2xx status.
pub(crate) async fn get_body(
    client: &Client,
    url: &str,
    user_agent: &str,
) -> Result<Vec<u8>, SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}
