//! PostgREST (Supabase) store client.
//!
//! Upserts go to `POST /rest/v1/{table}?on_conflict=platform,post_url` with
//! `Prefer: resolution=merge-duplicates,return=representation`, so the
//! response body echoes every inserted or overwritten row and its length is
//! the affected-row count.

use std::time::Duration;

use async_trait::async_trait;
use postsync_core::CanonicalPost;
use reqwest::{Client, Response, Url};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::PostStore;

const CONFLICT_TARGET: &str = "platform,post_url";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

/// A [`PostStore`] backed by a PostgREST endpoint.
pub struct RestStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// Creates a client for `table` under `base_url` (the project URL, without
    /// the `/rest/v1` suffix).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`StoreError::InvalidUrl`] if `base_url` and `table`
    /// do not form a valid URL.
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postsync/0.1 (store-writer)")
            .build()?;

        let raw = format!("{}/rest/v1/{table}", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| StoreError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_owned(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl PostStore for RestStore {
    async fn upsert(&self, posts: &[CanonicalPost]) -> Result<u64, StoreError> {
        if posts.is_empty() {
            return Ok(0);
        }

        let response = self
            .authorized(self.client.post(self.endpoint.clone()))
            .query(&[("on_conflict", CONFLICT_TARGET)])
            .header("Prefer", UPSERT_PREFERENCE)
            .json(posts)
            .send()
            .await?;

        let rows: Vec<Value> = decode(response, "upsert response").await?;
        tracing::debug!(
            table = self.endpoint.path(),
            submitted = posts.len(),
            returned = rows.len(),
            "store upsert completed"
        );
        Ok(rows.len() as u64)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CanonicalPost>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .authorized(self.client.get(self.endpoint.clone()))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        decode(response, "recent posts").await
    }
}

/// Checks the status and deserializes a JSON body.
async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, StoreError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    serde_json::from_slice(&body).map_err(|source| StoreError::Deserialize {
        context: context.to_owned(),
        source,
    })
}
