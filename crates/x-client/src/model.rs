//! Wire types for the v2 endpoints this crate calls

use serde::{Deserialize, Serialize};

/// Engagement counters attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impression_count: Option<u64>,
}

/// A bookmarked post. Read-only; never stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub public_metrics: PublicMetrics,
    /// Filled from the `includes.users` expansion when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

/// Acknowledgement of a created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAck {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// `{"data": ...}` wrapper used by single-object responses.
#[derive(Debug, Deserialize)]
pub(crate) struct Single<T> {
    pub data: T,
}

/// List response. `data` is omitted entirely when the list is empty.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
}

impl Page<BookmarkRecord> {
    /// Resolve `author_id` against the expanded users.
    pub(crate) fn into_records(self) -> Vec<BookmarkRecord> {
        let users = self.includes.users;
        self.data
            .into_iter()
            .map(|mut record| {
                record.author_username = record.author_id.as_ref().and_then(|id| {
                    users
                        .iter()
                        .find(|u| &u.id == id)
                        .map(|u| u.username.clone())
                });
                record
            })
            .collect()
    }
}
