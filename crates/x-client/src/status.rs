//! Status classification for social API responses
//!
//! Maps a non-success HTTP response onto the error taxonomy. Only 401 is an
//! authorization signal: 403 on this API means the token is fine but the
//! action is not permitted (duplicate post, missing scope), and refreshing
//! would not change that.

use crate::error::Error;

/// Longest slice of an unparseable body carried into an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Classify a non-success response by HTTP status and body.
///
/// 401 is `Unauthorized` (retry after renewal), 408/429/5xx are `Transient`,
/// everything else is a non-retryable `Api` error.
pub fn classify_status(status: u16, body: &str) -> Error {
    let message = error_message(body);
    match status {
        401 => Error::Unauthorized(message),
        408 | 429 | 500..=599 => Error::Transient(format!("HTTP {status}: {message}")),
        _ => Error::Api { status, message },
    }
}

/// Pull a human-readable message out of an API error body.
///
/// The v2 API uses problem-details objects (`detail`, `title`) and sometimes
/// an `errors` array; anything else is truncated raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.get("detail"),
            value
                .get("errors")
                .and_then(|e| e.get(0))
                .and_then(|e| e.get("message")),
            value.get("title"),
            value.get("error_description"),
        ];
        if let Some(msg) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::from("<no body>");
    }
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
