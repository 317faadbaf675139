//! Logical social API operations
//!
//! Each method is one executor call, so each gets the renew-once policy as a
//! unit: fetching bookmarks resolves the user id and lists bookmarks inside a
//! single operation, and a 401 on either step retries both.

use tracing::info;

use crate::client::ClientHandle;
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::model::{BookmarkRecord, PostAck, User};

/// Page size used when none is configured (the API maximum).
pub const DEFAULT_MAX_RESULTS: u8 = 100;

/// Bookmark and posting operations for the authenticated user.
pub struct XApi {
    executor: RequestExecutor,
    max_results: u8,
}

impl XApi {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u8) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// The authenticated user.
    pub async fn me(&self) -> Result<User> {
        self.executor
            .execute(|handle: ClientHandle| async move { handle.me().await })
            .await
    }

    /// Fetch the user's bookmarks.
    ///
    /// An empty list means the user has no bookmarks; a failed fetch is an
    /// error, never an empty list.
    pub async fn bookmarks(&self) -> Result<Vec<BookmarkRecord>> {
        let max_results = self.max_results;
        let records = self
            .executor
            .execute(|handle: ClientHandle| async move {
                let user = handle.me().await?;
                info!(username = %user.username, "authenticated");
                handle.bookmarks(&user.id, max_results).await
            })
            .await?;
        info!(count = records.len(), "fetched bookmarks");
        Ok(records)
    }

    /// Publish `text` as a new post.
    pub async fn post(&self, text: &str) -> Result<PostAck> {
        if text.trim().is_empty() {
            return Err(Error::Api {
                status: 400,
                message: "post text must not be empty".into(),
            });
        }
        let ack = self
            .executor
            .execute(|handle: ClientHandle| async move { handle.create_post(text).await })
            .await?;
        info!(post_id = %ack.id, "post published");
        Ok(ack)
    }
}
