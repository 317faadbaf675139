//! Error types for completion and artifact operations

/// Errors from rewrite operations.
///
/// Completion failures (`Http`, `Upstream`, `EmptyCompletion`) are per-call:
/// the multi-style paths swallow them into an empty rewrite.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("completion API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("completion contained no text")]
    EmptyCompletion,

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("unknown style: {0}")]
    UnknownStyle(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl Error {
    /// Worth retrying later (network trouble, rate limits, overload).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Upstream { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

/// Result alias for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;
