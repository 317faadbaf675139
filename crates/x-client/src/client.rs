//! Authenticated client handles
//!
//! A `ClientHandle` is bound to exactly one access token and never changes.
//! When the credential pair is replaced the executor builds a new handle;
//! building is a clone of a pooled `reqwest::Client` plus a string, so it is
//! done on every call instead of being cached.

use std::sync::Arc;

use common::Secret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use x_auth::CredentialPair;

use crate::error::{Error, Result};
use crate::model::{BookmarkRecord, Page, PostAck, Single, User};
use crate::status::classify_status;

/// Public v2 API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.x.com";

/// Bookmark fields requested on every fetch.
const TWEET_FIELDS: &str = "created_at,text,public_metrics,author_id";
const USER_FIELDS: &str = "username,name";

/// API client bound to a single access token.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    http: reqwest::Client,
    base_url: Arc<str>,
    bearer: Secret<String>,
}

impl ClientHandle {
    /// The access token this handle authenticates with.
    pub fn access_token(&self) -> &str {
        self.bearer.as_str()
    }

    /// `GET /2/users/me`
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User> {
        let request = self.http.get(self.url("/2/users/me"));
        let user: Single<User> = self.send(request).await?;
        Ok(user.data)
    }

    /// `GET /2/users/{id}/bookmarks` with author expansion.
    #[instrument(skip(self))]
    pub async fn bookmarks(&self, user_id: &str, max_results: u8) -> Result<Vec<BookmarkRecord>> {
        let max_results = max_results.to_string();
        let request = self
            .http
            .get(self.url(&format!("/2/users/{user_id}/bookmarks")))
            .query(&[
                ("expansions", "author_id"),
                ("tweet.fields", TWEET_FIELDS),
                ("user.fields", USER_FIELDS),
                ("max_results", max_results.as_str()),
            ]);
        let page: Page<BookmarkRecord> = self.send(request).await?;
        Ok(page.into_records())
    }

    /// `POST /2/tweets`
    #[instrument(skip_all, fields(chars = text.chars().count()))]
    pub async fn create_post(&self, text: &str) -> Result<PostAck> {
        let request = self
            .http
            .post(self.url("/2/tweets"))
            .json(&serde_json::json!({ "text": text }));
        let ack: Single<PostAck> = self.send(request).await?;
        Ok(ack.data)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(self.bearer.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            debug!(status = status.as_u16(), "social API returned error status");
            return Err(classify_status(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Decode(format!("invalid response body: {e}")))
    }
}

/// Builds `ClientHandle`s from credential pairs.
///
/// `build` has no side effects; the same pair always yields an equivalent
/// handle.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl ClientFactory {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    pub fn build(&self, pair: &CredentialPair) -> ClientHandle {
        ClientHandle {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            bearer: Secret::new(pair.access_token().to_string()),
        }
    }
}
