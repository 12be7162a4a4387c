//! Pulling embedded JSON out of scraped HTML.
//!
//! Scraped pages change shape without notice, so the Threads adapter does not
//! hard-code how its data is found. It delegates to an [`ExtractionStrategy`],
//! which can be replaced (for example by a DOM-based parser) without touching
//! the adapter or the collector.

use regex::Regex;
use serde_json::Value;

use crate::error::SourceError;

/// Locates the array of post items embedded in a page.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns the embedded items.
    ///
    /// `Ok(None)` means the page carries no embedded data at all (for example
    /// a logged-out interstitial); callers treat that as an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Extraction`] if the data marker is present but
    /// no well-formed array follows it.
    fn extract(&self, html: &str) -> Result<Option<Vec<Value>>, SourceError>;
}

/// Finds a `"key":` marker in the raw markup and decodes the JSON array that
/// immediately follows it.
///
/// Decoding is done with a streaming JSON reader that stops after one value,
/// so nested arrays and brackets inside strings are handled correctly.
#[derive(Debug, Clone)]
pub struct MarkerArrayExtraction {
    key: String,
    marker: Regex,
}

impl MarkerArrayExtraction {
    /// Creates a strategy for the given JSON object key.
    ///
    /// # Panics
    ///
    /// Never for any `key`; it is regex-escaped before compilation.
    #[must_use]
    pub fn new(key: &str) -> Self {
        let pattern = format!(r#""{}"\s*:\s*"#, regex::escape(key));
        let marker = Regex::new(&pattern).expect("escaped marker regex is valid");
        Self {
            key: key.to_owned(),
            marker,
        }
    }

    /// The marker Threads uses for a profile's post list.
    #[must_use]
    pub fn thread_items() -> Self {
        Self::new("thread_items")
    }
}

impl ExtractionStrategy for MarkerArrayExtraction {
    fn name(&self) -> &str {
        &self.key
    }

    fn extract(&self, html: &str) -> Result<Option<Vec<Value>>, SourceError> {
        let mut saw_marker = false;

        for found in self.marker.find_iter(html) {
            saw_marker = true;
            let rest = &html[found.end()..];
            if !rest.starts_with('[') {
                continue;
            }
            let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
            if let Some(Ok(Value::Array(items))) = values.next() {
                return Ok(Some(items));
            }
        }

        if saw_marker {
            return Err(SourceError::Extraction(format!(
                "found \"{}\" marker but no decodable array after it",
                self.key
            )));
        }
        Ok(None)
    }
}
