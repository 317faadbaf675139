//! X OAuth2 endpoint defaults
//!
//! These are the public endpoints for the OAuth 2.0 authorization code flow
//! with PKCE. All of them can be overridden through configuration, which is
//! how the tests point the renewer at a local mock.

/// Token endpoint for code exchange and token refresh
pub const DEFAULT_TOKEN_URL: &str = "https://api.x.com/2/oauth2/token";

/// Authorization endpoint the user opens in a browser during `login`
pub const DEFAULT_AUTHORIZE_URL: &str = "https://x.com/i/oauth2/authorize";

/// Scopes needed to read bookmarks and publish posts.
/// `offline.access` is what makes the provider issue a refresh token at all.
pub const SCOPES: &str = "tweet.read tweet.write users.read bookmark.read offline.access";
