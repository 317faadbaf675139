//! Batch run: bookmarks in, rewrite artifact out
//!
//! Auth-fatal errors end the run before anything is written. Per-style
//! rewrite failures are logged, counted and left as empty strings.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::agent::Agent;
use crate::error::{Error, Result};
use crate::metrics;

/// Per-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub posts: usize,
    pub rewrites_succeeded: usize,
    pub rewrites_failed: usize,
    pub output_path: PathBuf,
}

/// Fetch bookmarks, rewrite each under every style, write the artifact.
///
/// Zero bookmarks is `Error::NoBookmarks` and leaves any previous artifact
/// untouched.
#[instrument(skip_all, fields(output = %agent.output_path.display()))]
pub async fn run_batch(agent: &Agent) -> Result<BatchReport> {
    let outcome = run(agent).await;
    metrics::record_batch(match &outcome {
        Ok(_) => "success",
        Err(Error::NoBookmarks) => "empty",
        Err(_) => "failure",
    });
    outcome
}

async fn run(agent: &Agent) -> Result<BatchReport> {
    let bookmarks = agent.api.bookmarks().await.inspect_err(|e| {
        if e.is_auth_fatal() {
            warn!(error = %e, "authorization is broken, aborting run");
        }
    })?;
    if bookmarks.is_empty() {
        info!("no bookmarks found");
        return Err(Error::NoBookmarks);
    }

    let originals: Vec<String> = bookmarks.into_iter().map(|b| b.text).collect();
    info!(
        posts = originals.len(),
        styles = agent.styles.len(),
        concurrency = agent.concurrency,
        "rewriting bookmarks"
    );

    let results = rewrite::rewrite_batch(
        agent.llm.as_ref(),
        &agent.styles,
        &originals,
        agent.concurrency,
    )
    .await;
    results.iter().for_each(metrics::record_rewrites);

    rewrite::write_artifact(&agent.output_path, &results).await?;

    let rewrites_failed: usize = results.iter().map(|r| r.failed_styles().len()).sum();
    let rewrites_succeeded: usize = results.iter().map(|r| r.succeeded()).sum();
    let report = BatchReport {
        posts: results.len(),
        rewrites_succeeded,
        rewrites_failed,
        output_path: agent.output_path.clone(),
    };
    info!(
        posts = report.posts,
        rewrites_succeeded,
        rewrites_failed,
        path = %report.output_path.display(),
        "batch complete"
    );
    Ok(report)
}
