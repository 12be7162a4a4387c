//! `postsync recent`: print the newest stored posts, the same read the public
//! site performs.

use anyhow::Context;
use chrono::SecondsFormat;
use postsync_core::{AppConfig, CanonicalPost};
use postsync_store::{PostStore, RestStore};

const PREVIEW_CHARS: usize = 80;

pub(crate) async fn run_recent(config: &AppConfig, limit: usize) -> anyhow::Result<()> {
    let store = RestStore::new(
        &config.store_url,
        &config.store_key,
        &config.store_table,
        config.request_timeout_secs,
    )
    .context("failed to build store client")?;

    let lines = recent_lines(&store, limit).await?;
    if lines.is_empty() {
        println!("no posts stored yet");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Reads up to `limit` posts and renders one line per post.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub(crate) async fn recent_lines(store: &dyn PostStore, limit: usize) -> anyhow::Result<Vec<String>> {
    let posts = store
        .recent(limit)
        .await
        .with_context(|| format!("failed to read the {limit} most recent posts"))?;
    tracing::debug!(count = posts.len(), limit, "read recent posts");
    Ok(posts.iter().map(format_post).collect())
}

fn format_post(post: &CanonicalPost) -> String {
    format!(
        "{}  {:<8}  {:>5} likes  {:>4} comments  {}  {}",
        post.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        post.platform.as_str(),
        post.likes,
        post.comments,
        post.post_url,
        preview(&post.content),
    )
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}
