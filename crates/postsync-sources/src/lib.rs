//! Source adapters and the fan-out collector for postsync.
//!
//! Each adapter fetches one upstream (a scraped Threads profile, the Reddit
//! JSON API, a Telegram channel feed), maps the payload into
//! [`postsync_core::CanonicalPost`]s through [`normalize`], and drops records
//! that cannot be stored. [`collect_posts`] runs every adapter concurrently
//! and merges whatever succeeded.

pub mod error;
pub mod extract;
mod lenient;
pub mod normalize;
pub mod orchestrator;
pub mod source;
pub mod sources;

pub use error::SourceError;
pub use extract::{ExtractionStrategy, MarkerArrayExtraction};
pub use normalize::{normalize, RawPost, DEFAULTS};
pub use orchestrator::{collect_posts, Collection, Settlement, SourceOutcome};
pub use source::PostSource;
pub use sources::{default_sources, RedditSource, TelegramSource, ThreadsSource};
