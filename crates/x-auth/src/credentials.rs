//! In-memory credential storage
//!
//! The store holds exactly one current `CredentialPair`. Replacement swaps the
//! whole pair under a write lock, so a reader sees either the old pair or the
//! new one, never an access token from one and a refresh token from the other.
//! Nothing is written to disk; the pair is supplied at startup and lives for
//! the life of the process.

use common::Secret;
use tokio::sync::RwLock;
use tracing::debug;

use crate::token::TokenResponse;

/// An access/refresh token pair issued together by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_token: Secret<String>,
    refresh_token: Secret<String>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }

    /// Bearer token for social API calls.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    pub fn refresh_token(&self) -> &str {
        self.refresh_token.as_str()
    }
}

impl From<TokenResponse> for CredentialPair {
    fn from(token: TokenResponse) -> Self {
        Self::new(token.access_token, token.refresh_token)
    }
}

/// Holder of the current credential pair.
///
/// Single writer (whoever just renewed), many readers. Reads clone the pair
/// out so no guard outlives the call.
pub struct CredentialStore {
    state: RwLock<CredentialPair>,
}

impl CredentialStore {
    pub fn new(initial: CredentialPair) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Snapshot of the current pair.
    pub async fn current(&self) -> CredentialPair {
        self.state.read().await.clone()
    }

    /// Replace the current pair wholesale.
    ///
    /// Visible to every `current()` call that starts after this returns.
    pub async fn replace(&self, pair: CredentialPair) {
        let mut state = self.state.write().await;
        *state = pair;
        debug!("credential pair replaced");
    }
}
