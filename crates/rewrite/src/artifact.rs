//! Batch output artifact
//!
//! One JSON array per run, written in full and replacing whatever the
//! previous run left. Each write goes to its own temp file in the same
//! directory and is renamed over the target, so a crash mid-write never leaves a
//! truncated artifact behind.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::rewriter::RewriteResult;

/// Write `results` to `path` as pretty-printed JSON, replacing the file.
pub async fn write_artifact(path: &Path, results: &[RewriteResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| Error::Serialize(format!("serializing rewrites: {e}")))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Io(format!("artifact path {} has no file name", path.display())))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let tmp_path = dir.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().as_simple()
    ));

    if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
        discard(&tmp_path).await;
        return Err(Error::Io(format!("writing temp artifact: {e}")));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        discard(&tmp_path).await;
        return Err(Error::Io(format!("renaming temp artifact: {e}")));
    }

    debug!(path = %path.display(), records = results.len(), "wrote rewrite artifact");
    Ok(())
}

async fn discard(tmp_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %tmp_path.display(), error = %e, "failed to remove temp artifact");
    }
}
