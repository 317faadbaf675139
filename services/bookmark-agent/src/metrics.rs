//! Prometheus metrics exposition
//!
//! Counters recorded by the service (the executor records
//! `x_token_refresh_total` itself):
//!
//! - `agent_rewrites_total` (counter): labels `style`, `outcome`
//! - `agent_posts_total` (counter): label `outcome`
//! - `agent_batch_runs_total` (counter): label `outcome`

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rewrite::RewriteResult;

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

fn outcome(ok: bool) -> &'static str {
    if ok { "success" } else { "failure" }
}

/// Record a single-style rewrite.
pub fn record_rewrite(style: &str, ok: bool) {
    metrics::counter!("agent_rewrites_total", "style" => style.to_string(), "outcome" => outcome(ok))
        .increment(1);
}

/// Record every style of a multi-style rewrite.
pub fn record_rewrites(result: &RewriteResult) {
    let failed = result.failed_styles();
    for (style, _) in result.rewrites() {
        record_rewrite(style, !failed.iter().any(|f| f == style));
    }
}

/// Record a publish attempt.
pub fn record_post(ok: bool) {
    metrics::counter!("agent_posts_total", "outcome" => outcome(ok)).increment(1);
}

/// Record a finished batch run: `success`, `empty` or `failure`.
pub fn record_batch(outcome: &'static str) {
    metrics::counter!("agent_batch_runs_total", "outcome" => outcome).increment(1);
}
