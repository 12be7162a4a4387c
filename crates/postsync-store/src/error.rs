use thiserror::Error;

/// Errors returned by a [`crate::PostStore`] or the [`crate::StoreWriter`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("store returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid store URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A write was requested with nothing to write.
    #[error("refusing to write an empty batch")]
    EmptyBatch,

    /// The store accepted the request but reported fewer rows than expected.
    #[error("integrity anomaly: upserted {expected} post(s) but the store reported {affected} row(s) affected")]
    IntegrityAnomaly { expected: u64, affected: u64 },
}
