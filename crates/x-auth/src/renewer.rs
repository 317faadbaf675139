//! Refresh-token renewal
//!
//! `Renewer` is the seam the request executor retries through. It only talks
//! to the token endpoint: storing the result is the caller's job, which keeps
//! renewal free of shared state and easy to fake in tests.

use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use crate::credentials::CredentialPair;
use crate::error::Result;
use crate::token::{self, TokenEndpoint};

/// Boxed future returned by `Renewer::renew`.
pub type RenewFuture<'a> = Pin<Box<dyn Future<Output = Result<CredentialPair>> + Send + 'a>>;

/// Exchanges a refresh token for a fresh credential pair.
///
/// Uses `Pin<Box<dyn Future>>` so executors can hold `Arc<dyn Renewer>`.
pub trait Renewer: Send + Sync {
    /// Exchange `refresh_token` for a new pair. Fails on any transport or
    /// provider-side error and never retries internally.
    fn renew<'a>(&'a self, refresh_token: &'a str) -> RenewFuture<'a>;
}

/// Renewer backed by the provider's OAuth2 token endpoint.
pub struct OAuthRenewer {
    http: reqwest::Client,
    endpoint: TokenEndpoint,
}

impl OAuthRenewer {
    pub fn new(http: reqwest::Client, endpoint: TokenEndpoint) -> Self {
        Self { http, endpoint }
    }
}

impl Renewer for OAuthRenewer {
    fn renew<'a>(&'a self, refresh_token: &'a str) -> RenewFuture<'a> {
        Box::pin(async move {
            match token::refresh_token(&self.http, &self.endpoint, refresh_token).await {
                Ok(response) => {
                    info!(expires_in = ?response.expires_in, "access token renewed");
                    Ok(CredentialPair::from(response))
                }
                Err(e) => {
                    warn!(error = %e, "access token renewal failed");
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::Error;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn start_token_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/token",
            post(
                |axum::Form(form): axum::Form<HashMap<String, String>>| async move {
                    if form.get("refresh_token").map(String::as_str) == Some("R0") {
                        (
                            StatusCode::OK,
                            axum::Json(serde_json::json!({
                                "access_token": "A1",
                                "refresh_token": "R1",
                                "expires_in": 7200
                            })),
                        )
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            axum::Json(serde_json::json!({"error": "invalid_request"})),
                        )
                    }
                },
            ),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/token")
    }

    #[tokio::test]
    async fn renewed_pair_is_visible_after_replace() {
        let url = start_token_server().await;
        let renewer = OAuthRenewer::new(
            reqwest::Client::new(),
            TokenEndpoint::new("client", None).with_url(url),
        );
        let store = CredentialStore::new(CredentialPair::new("A0", "R0"));

        let pair = renewer.renew("R0").await.unwrap();
        store.replace(pair).await;

        let current = store.current().await;
        assert_eq!(current.access_token(), "A1");
        assert_eq!(current.refresh_token(), "R1");
    }

    #[tokio::test]
    async fn renew_does_not_touch_store() {
        let url = start_token_server().await;
        let renewer = OAuthRenewer::new(
            reqwest::Client::new(),
            TokenEndpoint::new("client", None).with_url(url),
        );
        let store = CredentialStore::new(CredentialPair::new("A0", "R0"));

        let _ = renewer.renew("R0").await.unwrap();
        assert_eq!(store.current().await, CredentialPair::new("A0", "R0"));
    }

    #[tokio::test]
    async fn stale_refresh_token_fails() {
        let url = start_token_server().await;
        let renewer = OAuthRenewer::new(
            reqwest::Client::new(),
            TokenEndpoint::new("client", None).with_url(url),
        );
        let err = renewer.renew("R-old").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)), "got: {err:?}");
    }
}
