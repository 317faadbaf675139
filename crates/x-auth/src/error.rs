//! Error types for OAuth credential operations

/// Errors from token endpoint and credential operations.
///
/// Every variant returned by a renewal is treated as an auth renewal failure
/// by callers; the split only matters for logging and for telling a revoked
/// refresh token apart from a flaky network.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// A configured endpoint that cannot be used as given.
    #[error("invalid OAuth configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
