//! Error taxonomy for social API operations

/// Errors from social API operations.
///
/// `Unauthorized` is the executor's retry signal and only reaches callers
/// through `PersistentAuthFailure`. The two auth-fatal variants mean every
/// further call will fail the same way, so batch callers stop on them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transient network error: {0}")]
    Transient(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("credential renewal failed: {0}")]
    AuthRenewal(#[source] x_auth::Error),

    #[error("still unauthorized after credential renewal: {0}")]
    PersistentAuthFailure(String),
}

impl Error {
    /// A 401-equivalent from the social API.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Authorization is broken for every future call, not just this one.
    pub fn is_auth_fatal(&self) -> bool {
        matches!(
            self,
            Error::AuthRenewal(_) | Error::PersistentAuthFailure(_)
        )
    }

    /// Short label for logs, metrics and response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transient(_) => "transient",
            Error::Unauthorized(_) => "unauthorized",
            Error::Api { .. } => "api",
            Error::Decode(_) => "decode",
            Error::AuthRenewal(_) => "auth_renewal",
            Error::PersistentAuthFailure(_) => "persistent_auth_failure",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Transient(e.to_string())
        }
    }
}

/// Result alias for social API operations.
pub type Result<T> = std::result::Result<T, Error>;
