//! Service-specific error types

use thiserror::Error;

/// Batch-run errors.
///
/// Per-style rewrite failures never show up here; they are folded into the
/// results as empty strings. Everything in this enum stops the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetching bookmarks failed: {0}")]
    Fetch(#[from] x_client::Error),

    #[error("No bookmarks found")]
    NoBookmarks,

    #[error("writing rewrites failed: {0}")]
    Artifact(#[from] rewrite::Error),
}

impl Error {
    /// Short label for logs, metrics and response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Fetch(e) => e.kind(),
            Error::NoBookmarks => "no_bookmarks",
            Error::Artifact(_) => "artifact",
        }
    }
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
