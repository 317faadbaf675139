//! OAuth2 token endpoint calls
//!
//! The agent talks to `/2/oauth2/token` for exactly two grants:
//! 1. `authorization_code`, once, when `login` bootstraps the first pair
//! 2. `refresh_token`, whenever a 401 forces a renewal
//!
//! Both are form POSTs.
//! Confidential clients authenticate with HTTP Basic; public clients send
//! only `client_id` in the form body.

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::DEFAULT_TOKEN_URL;
use crate::error::{Error, Result};

/// Where and as whom to talk to the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    pub url: String,
    pub client_id: String,
    /// Absent for public (PKCE-only) clients
    pub client_secret: Option<Secret<String>>,
}

impl TokenEndpoint {
    pub fn new(client_id: impl Into<String>, client_secret: Option<Secret<String>>) -> Self {
        Self {
            url: DEFAULT_TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn post(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let request = client.post(&self.url);
        match &self.client_secret {
            Some(secret) => request.basic_auth(&self.client_id, Some(secret.as_str())),
            None => request,
        }
    }
}

/// Body X returns for both grants.
///
/// The provider rotates refresh tokens: every successful response carries a
/// new one and the old one stops working.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchange an authorization code for the first token pair.
pub async fn exchange_code(
    client: &reqwest::Client,
    endpoint: &TokenEndpoint,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let response = endpoint
        .post(client)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("client_id", endpoint.client_id.as_str()),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("could not reach X token endpoint: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unreadable>"));
        return Err(Error::TokenExchange(format!(
            "code exchange failed with {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("unreadable code exchange body: {e}")))
}

/// Exchange a refresh token for a new access/refresh pair.
///
/// Not retried here. A 400/401/403 means the provider rejected the refresh
/// token itself (stale after rotation, revoked, or expired) and maps to
/// `InvalidCredentials`.
pub async fn refresh_token(
    client: &reqwest::Client,
    endpoint: &TokenEndpoint,
    refresh: &str,
) -> Result<TokenResponse> {
    debug!(url = %endpoint.url, "requesting token refresh");
    let response = endpoint
        .post(client)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", endpoint.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("could not reach X token endpoint for renewal: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unreadable>"));

        if matches!(status.as_u16(), 400 | 401 | 403) {
            return Err(Error::InvalidCredentials(format!(
                "X refused the refresh token ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "renewal failed with {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("unreadable renewal body: {e}")))
}
