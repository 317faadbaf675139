//! OAuth2 credential lifecycle for the X (Twitter) API
//!
//! Holds the current access/refresh pair in memory, exchanges refresh tokens
//! for fresh pairs, and provides the PKCE helpers used once to bootstrap the
//! first pair. This crate performs no social API calls of its own.
//!
//! Credential flow:
//! 1. `login` bootstraps a pair via `pkce::build_authorization_url()` and
//!    `token::exchange_code()` (one-shot, interactive)
//! 2. The pair is supplied to the process and wrapped in a `CredentialStore`
//! 3. On a 401, the request executor calls `Renewer::renew()` with the
//!    current refresh token and hands the result to `CredentialStore::replace()`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod pkce;
pub mod renewer;
pub mod token;

pub use constants::*;
pub use credentials::{CredentialPair, CredentialStore};
pub use error::{Error, Result};
pub use pkce::{
    AuthorizationRequest, Callback, build_authorization_url, compute_challenge, generate_state,
    generate_verifier, parse_callback,
};
pub use renewer::{OAuthRenewer, RenewFuture, Renewer};
pub use token::{TokenEndpoint, TokenResponse, exchange_code, refresh_token};
