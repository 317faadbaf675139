//! PKCE (Proof Key for Code Exchange) helpers per RFC 7636
//!
//! Used once, by the `login` bootstrap, to obtain the first credential pair.
//! The verifier stays local and is sent during code exchange; the S256
//! challenge goes into the authorization URL so the provider can check that
//! the exchange came from whoever started the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::constants::SCOPES;
use crate::error::{Error, Result};

/// Generate a random PKCE code verifier.
///
/// 64 random bytes encode to 86 URL-safe base64 characters, inside the
/// 43..=128 range the RFC allows and the provider enforces.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an opaque `state` value for CSRF protection.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge: `BASE64URL(SHA256(verifier))`.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Parameters of the browser authorization step.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub authorize_url: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub state: &'a str,
    pub challenge: &'a str,
}

/// Build the authorization URL with all required OAuth parameters.
pub fn build_authorization_url(request: &AuthorizationRequest<'_>) -> Result<String> {
    let url = Url::parse_with_params(
        request.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", request.client_id),
            ("redirect_uri", request.redirect_uri),
            ("scope", SCOPES),
            ("state", request.state),
            ("code_challenge", request.challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| Error::InvalidConfig(format!("authorize url {:?}: {e}", request.authorize_url)))?;
    Ok(url.into())
}

/// What the provider handed back after the user authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub code: String,
    pub state: Option<String>,
}

/// Parse what the user pasted after authorizing.
///
/// Accepts the bare code, the query string, or the full callback URL. An
/// `error` parameter (user clicked "cancel") is reported as such.
pub fn parse_callback(input: &str) -> Result<Callback> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidCallback("no code provided".into()));
    }
    if !input.contains('=') {
        return Ok(Callback {
            code: input.to_string(),
            state: None,
        });
    }

    let url = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input)
    } else {
        Url::parse(&format!(
            "http://localhost/?{}",
            input.trim_start_matches('?')
        ))
    }
    .map_err(|e| Error::InvalidCallback(format!("unparseable callback: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(Error::InvalidCallback(format!(
                    "authorization denied: {value}"
                )));
            }
            _ => {}
        }
    }

    let code = code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::InvalidCallback("callback has no code parameter".into()))?;
    Ok(Callback { code, state })
}
