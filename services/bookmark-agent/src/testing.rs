//! Shared fakes for batch and dashboard tests

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use rewrite::{CompletionClient, CompletionFuture, StyleSet};
use tokio::net::TcpListener;
use x_auth::{CredentialPair, CredentialStore, RenewFuture, Renewer};
use x_client::{ClientFactory, RequestExecutor, XApi};

use crate::agent::Agent;

/// Completes `<style>: <original>` for the built-in conservative and
/// moderate instructions (`custom` for anything else) and fails for bold.
pub struct FakeLlm {
    pub calls: AtomicUsize,
}

impl FakeLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl CompletionClient for FakeLlm {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.starts_with("Rewrite this tweet to be bold") {
                return Err(rewrite::Error::Upstream {
                    status: 529,
                    message: "Overloaded".into(),
                });
            }
            let original = prompt
                .split("Original Tweet: ")
                .nth(1)
                .and_then(|rest| rest.split('\n').next())
                .unwrap_or_default();
            let tag = if prompt.starts_with("Rewrite this tweet to be slightly") {
                "conservative"
            } else if prompt.starts_with("Rewrite this tweet to be noticeably") {
                "moderate"
            } else {
                "custom"
            };
            Ok(format!("{tag}: {original}"))
        })
    }
}

/// Renewer that rotates `R0` into `A1`/`R1` and rejects anything else.
pub struct RotatingRenewer {
    pub calls: AtomicUsize,
}

impl Renewer for RotatingRenewer {
    fn renew<'a>(&'a self, refresh_token: &'a str) -> RenewFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if refresh_token == "R0" {
                Ok(CredentialPair::new("A1", "R1"))
            } else {
                Err(x_auth::Error::InvalidCredentials(format!(
                    "unknown refresh token {refresh_token}"
                )))
            }
        })
    }
}

#[derive(Clone)]
struct MockX {
    valid_token: &'static str,
    bookmarks: serde_json::Value,
    posts: Arc<AtomicUsize>,
}

impl MockX {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token);
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

fn unauthorized() -> (StatusCode, axum::Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(serde_json::json!({"title":"Unauthorized","status":401,"detail":"Unauthorized"})),
    )
}

/// Social API stand-in that accepts one bearer token. Returns the base URL
/// and a counter of created posts.
pub async fn start_mock_x(
    valid_token: &'static str,
    bookmarks: serde_json::Value,
) -> (String, Arc<AtomicUsize>) {
    let posts = Arc::new(AtomicUsize::new(0));
    let state = MockX {
        valid_token,
        bookmarks,
        posts: posts.clone(),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route(
            "/2/users/me",
            get(|State(x): State<MockX>, headers: HeaderMap| async move {
                if !x.authorized(&headers) {
                    return unauthorized();
                }
                (
                    StatusCode::OK,
                    axum::Json(serde_json::json!({"data":{"id":"42","username":"reader","name":"Reader"}})),
                )
            }),
        )
        .route(
            "/2/users/{id}/bookmarks",
            get(|State(x): State<MockX>, headers: HeaderMap| async move {
                if !x.authorized(&headers) {
                    return unauthorized();
                }
                (StatusCode::OK, axum::Json(x.bookmarks.clone()))
            }),
        )
        .route(
            "/2/tweets",
            post(
                |State(x): State<MockX>, headers: HeaderMap, axum::Json(body): axum::Json<serde_json::Value>| async move {
                    if !x.authorized(&headers) {
                        return unauthorized();
                    }
                    let n = x.posts.fetch_add(1, Ordering::SeqCst) + 1;
                    (
                        StatusCode::CREATED,
                        axum::Json(serde_json::json!({"data":{"id": format!("190000{n}"),"text": body["text"]}})),
                    )
                },
            ),
        )
        .with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), posts)
}

pub fn two_bookmarks() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"id":"1","text":"Shipping is a feature.","author_id":"u1","public_metrics":{"like_count":12,"retweet_count":3,"reply_count":1,"quote_count":0}},
            {"id":"2","text":"Read the error message.","author_id":"u1"}
        ],
        "includes": {"users":[{"id":"u1","username":"alice","name":"Alice"}]},
        "meta": {"result_count": 2}
    })
}

pub fn no_bookmarks() -> serde_json::Value {
    serde_json::json!({"meta":{"result_count":0}})
}

/// Agent starting from `A0`/`R0` against `base`, writing to `output`.
pub fn agent(base: &str, llm: Arc<FakeLlm>, output: &Path) -> Agent {
    let store = Arc::new(CredentialStore::new(CredentialPair::new("A0", "R0")));
    let executor = RequestExecutor::new(
        store,
        ClientFactory::new(reqwest::Client::new(), base),
        Arc::new(RotatingRenewer {
            calls: AtomicUsize::new(0),
        }),
    );
    Agent {
        api: XApi::new(executor),
        llm,
        styles: StyleSet::default(),
        output_path: output.to_path_buf(),
        concurrency: 2,
    }
}
