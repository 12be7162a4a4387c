//! Concrete adapters, one per upstream platform.

mod reddit;
mod telegram;
mod threads;

pub use reddit::RedditSource;
pub use telegram::TelegramSource;
pub use threads::ThreadsSource;

use postsync_core::AppConfig;

use crate::error::SourceError;
use crate::source::PostSource;

/// Threads profile scraped for posts.
pub const THREADS_HANDLE: &str = "aashutoshpandeyy";
/// Reddit account whose submissions are collected.
pub const REDDIT_USER: &str = "iinaayate";
/// Telegram channel read through its syndication feed.
pub const TELEGRAM_CHANNEL: &str = "aashutoshpandeyy";

/// Builds the production adapters in invocation order: Threads, Reddit, Telegram.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if an HTTP client cannot be constructed.
pub fn default_sources(config: &AppConfig) -> Result<Vec<Box<dyn PostSource>>, SourceError> {
    let timeout = config.request_timeout_secs;
    let sources: Vec<Box<dyn PostSource>> = vec![
        Box::new(ThreadsSource::new(THREADS_HANDLE, timeout)?),
        Box::new(RedditSource::new(REDDIT_USER, timeout)?),
        Box::new(TelegramSource::new(TELEGRAM_CHANNEL, timeout)?),
    ];
    Ok(sources)
}
