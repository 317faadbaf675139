//! Rewriting posts under styles
//!
//! `rewrite_one` is the single-instruction primitive (custom instructions,
//! one preset style). `rewrite_post` applies every style in a set and
//! swallows per-style failures; `rewrite_batch` does that for many posts
//! with bounded concurrency.

use futures_util::StreamExt;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{info, warn};

use crate::completion::CompletionClient;
use crate::error::Result;
use crate::style::{RESERVED_NAME, StyleSet};

/// Prompt sent to the model for one rewrite.
pub fn build_prompt(instruction: &str, original: &str) -> String {
    format!("{instruction}\n\nOriginal Tweet: {original}\nRewritten Tweet:")
}

/// Rewrite `original` under a single instruction.
pub async fn rewrite_one(
    client: &dyn CompletionClient,
    instruction: &str,
    original: &str,
) -> Result<String> {
    let prompt = build_prompt(instruction, original);
    client.complete(&prompt).await
}

/// Rewrites of one post, one entry per style in style-set order.
///
/// Serializes as a flat object: `{"original": ..., "<style>": ..., ...}`.
/// A failed style holds an empty string and is listed in `failed_styles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub original: String,
    rewrites: Vec<(String, String)>,
    failed: Vec<String>,
}

impl RewriteResult {
    pub fn get(&self, style: &str) -> Option<&str> {
        self.rewrites
            .iter()
            .find(|(name, _)| name == style)
            .map(|(_, text)| text.as_str())
    }

    /// `(style, rewrite)` pairs in style order.
    pub fn rewrites(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rewrites
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    pub fn failed_styles(&self) -> &[String] {
        &self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.rewrites.len() - self.failed.len()
    }
}

impl Serialize for RewriteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rewrites.len() + 1))?;
        map.serialize_entry(RESERVED_NAME, &self.original)?;
        for (name, text) in &self.rewrites {
            map.serialize_entry(name, text)?;
        }
        map.end()
    }
}

/// Rewrite `original` under every style in `styles`, one call per style.
///
/// Never fails: a style whose call fails is logged and left empty.
pub async fn rewrite_post(
    client: &dyn CompletionClient,
    styles: &StyleSet,
    original: &str,
) -> RewriteResult {
    let mut rewrites = Vec::with_capacity(styles.len());
    let mut failed = Vec::new();

    for style in styles.iter() {
        match rewrite_one(client, &style.instruction, original).await {
            Ok(text) => {
                info!(style = %style.name, chars = text.chars().count(), "rewrite ready");
                rewrites.push((style.name.clone(), text));
            }
            Err(e) => {
                warn!(style = %style.name, error = %e, "rewrite failed, leaving empty");
                rewrites.push((style.name.clone(), String::new()));
                failed.push(style.name.clone());
            }
        }
    }

    RewriteResult {
        original: original.to_string(),
        rewrites,
        failed,
    }
}

/// Rewrite many posts with at most `concurrency` posts in flight.
///
/// Results come back in input order regardless of completion order.
pub async fn rewrite_batch(
    client: &dyn CompletionClient,
    styles: &StyleSet,
    originals: &[String],
    concurrency: usize,
) -> Vec<RewriteResult> {
    let posts: Vec<_> = originals
        .iter()
        .map(|original| rewrite_post(client, styles, original))
        .collect();
    futures_util::stream::iter(posts)
        .buffered(concurrency.max(1))
        .collect()
        .await
}
