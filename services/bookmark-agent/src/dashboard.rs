//! Dashboard JSON API
//!
//! Thin routes over the same operations the batch run uses. Every response
//! is a `{"success": ...}` envelope; failures carry `error` and `kind` and a
//! status derived from the error.
//!
//! Endpoints:
//! - GET  /api/bookmarks          : the user's bookmarks
//! - GET  /api/styles             : configured styles in order
//! - POST /api/rewrite-style      : one preset style
//! - POST /api/rewrite-all-styles : every style, failures listed
//! - POST /api/rewrite-custom     : caller-supplied instructions
//! - POST /api/run-full-agent     : full batch run, writes the artifact
//! - POST /api/post               : publish a post
//! - GET  /health, GET /metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::agent::Agent;
use crate::batch;
use crate::metrics;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct AppState {
    agent: Arc<Agent>,
    prometheus: PrometheusHandle,
    started_at: Instant,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, prometheus: PrometheusHandle) -> Self {
        Self {
            agent,
            prometheus,
            started_at: Instant::now(),
        }
    }
}

/// Build the dashboard router, limited to `max_connections` concurrent
/// requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/api/bookmarks", get(list_bookmarks))
        .route("/api/styles", get(list_styles))
        .route("/api/rewrite-style", post(rewrite_style))
        .route("/api/rewrite-all-styles", post(rewrite_all_styles))
        .route("/api/rewrite-custom", post(rewrite_custom))
        .route("/api/run-full-agent", post(run_full_agent))
        .route("/api/post", post(publish))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Serve until SIGINT/SIGTERM, then drain for at most `DRAIN_TIMEOUT`.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    crate::shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "in-flight requests did not finish in time, exiting"
        ),
    }
    Ok(())
}

/// Failure envelope: `{"success": false, "error": ..., "kind": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "success": false,
                "error": self.message,
                "kind": self.kind,
            })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<x_client::Error> for ApiError {
    fn from(e: x_client::Error) -> Self {
        use x_client::Error as X;
        let status = match &e {
            X::Unauthorized(_) | X::AuthRenewal(_) | X::PersistentAuthFailure(_) => {
                StatusCode::UNAUTHORIZED
            }
            X::Api { status: 400, .. } => StatusCode::BAD_REQUEST,
            X::Api { .. } | X::Transient(_) | X::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<rewrite::Error> for ApiError {
    fn from(e: rewrite::Error) -> Self {
        use rewrite::Error as R;
        let (status, kind) = match &e {
            R::UnknownStyle(_) | R::InvalidStyle(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            R::Http(_) | R::Upstream { .. } | R::EmptyCompletion => {
                (StatusCode::BAD_GATEWAY, "rewrite")
            }
            R::Io(_) | R::Serialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "artifact"),
        };
        Self {
            status,
            kind,
            message: e.to_string(),
        }
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(e: crate::error::Error) -> Self {
        use crate::error::Error as B;
        match e {
            B::Fetch(e) => e.into(),
            B::Artifact(e) => e.into(),
            empty @ B::NoBookmarks => Self {
                status: StatusCode::NOT_FOUND,
                kind: empty.kind(),
                message: empty.to_string(),
            },
        }
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::bad_request(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteStyleRequest {
    original_tweet: String,
    style: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteAllRequest {
    original_tweet: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteCustomRequest {
    original_tweet: String,
    instructions: String,
}

#[derive(Deserialize)]
struct PostRequest {
    text: String,
}

/// GET /api/bookmarks
async fn list_bookmarks(State(state): State<AppState>) -> ApiResult {
    let bookmarks = state.agent.api.bookmarks().await?;
    Ok(Json(json!({ "success": true, "bookmarks": bookmarks })))
}

/// GET /api/styles
async fn list_styles(State(state): State<AppState>) -> ApiResult {
    let styles: Vec<&rewrite::Style> = state.agent.styles.iter().collect();
    Ok(Json(json!({ "success": true, "styles": styles })))
}

/// POST /api/rewrite-style
async fn rewrite_style(
    State(state): State<AppState>,
    payload: Result<Json<RewriteStyleRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let original = non_empty("originalTweet", &body.original_tweet)?;
    let style = state.agent.styles.get(&body.style)?;

    let outcome = rewrite::rewrite_one(state.agent.llm.as_ref(), &style.instruction, original).await;
    metrics::record_rewrite(&style.name, outcome.is_ok());
    let rewritten = outcome?;

    Ok(Json(json!({ "success": true, "rewrittenTweet": rewritten })))
}

/// POST /api/rewrite-all-styles
///
/// Partial success is still success; only a post for which every style
/// failed is an error.
async fn rewrite_all_styles(
    State(state): State<AppState>,
    payload: Result<Json<RewriteAllRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let original = non_empty("originalTweet", &body.original_tweet)?;

    let result = rewrite::rewrite_post(state.agent.llm.as_ref(), &state.agent.styles, original).await;
    metrics::record_rewrites(&result);
    if result.succeeded() == 0 {
        return Err(ApiError {
            status: StatusCode::BAD_GATEWAY,
            kind: "rewrite",
            message: "every style failed to rewrite".into(),
        });
    }

    let rewrites: serde_json::Map<String, Value> = result
        .rewrites()
        .map(|(style, text)| (style.to_string(), Value::from(text)))
        .collect();
    Ok(Json(json!({
        "success": true,
        "rewrites": rewrites,
        "failedStyles": result.failed_styles(),
    })))
}

/// POST /api/rewrite-custom
async fn rewrite_custom(
    State(state): State<AppState>,
    payload: Result<Json<RewriteCustomRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let original = non_empty("originalTweet", &body.original_tweet)?;
    let instructions = non_empty("instructions", &body.instructions)?;

    let outcome = rewrite::rewrite_one(state.agent.llm.as_ref(), instructions, original).await;
    metrics::record_rewrite("custom", outcome.is_ok());
    let rewritten = outcome?;

    Ok(Json(json!({ "success": true, "rewrittenTweet": rewritten })))
}

/// POST /api/run-full-agent
async fn run_full_agent(State(state): State<AppState>) -> ApiResult {
    let report = batch::run_batch(&state.agent).await?;
    Ok(Json(json!({
        "success": true,
        "tweetsProcessed": report.posts,
        "savedTo": report.output_path.display().to_string(),
    })))
}

/// POST /api/post
async fn publish(
    State(state): State<AppState>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());

    let outcome = state.agent.api.post(&body.text).await;
    metrics::record_post(outcome.is_ok());
    let ack = outcome.inspect_err(|e| warn!(request_id = %request_id, error = %e, "post failed"))?;
    info!(request_id = %request_id, post_id = %ack.id, "post published from dashboard");

    Ok(Json(json!({ "success": true, "tweetId": ack.id })))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "styles": state.agent.styles.names(),
    }))
}

/// GET /metrics: Prometheus text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
