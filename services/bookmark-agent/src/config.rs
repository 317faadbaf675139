//! Agent settings
//!
//! Each setting is resolved from the first of: a CLI flag, the TOML file, the built-in default.
//! Tokens and API keys come only from the environment (a `.env` file in the
//! working directory is loaded into it at startup), never from the TOML.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use rewrite::{Style, StyleSet};
use serde::Deserialize;
use x_auth::CredentialPair;

/// Config file picked up from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "bookmark-agent.toml";

pub const ENV_CLIENT_ID: &str = "TWITTER_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "TWITTER_CLIENT_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "TWITTER_REFRESH_TOKEN";
pub const ENV_LLM_API_KEY: &str = "CLAUDE_API_KEY";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub x: XConfig,
    pub llm: LlmConfig,
    pub dashboard: DashboardConfig,
    pub batch: BatchConfig,
    /// Raw `[[styles]]` tables; empty means the built-in three
    styles: Vec<Style>,
    #[serde(skip)]
    style_set: StyleSet,
}

/// Social API and OAuth endpoints
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct XConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub authorize_url: String,
    /// Redirect URI registered for the app; only used by `login`
    pub callback_url: String,
    pub timeout_secs: u64,
    /// Bookmarks page size
    pub max_results: u8,
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            api_base_url: x_client::DEFAULT_API_BASE_URL.to_string(),
            token_url: x_auth::DEFAULT_TOKEN_URL.to_string(),
            authorize_url: x_auth::DEFAULT_AUTHORIZE_URL.to_string(),
            callback_url: "http://127.0.0.1:3000/callback".to_string(),
            timeout_secs: 30,
            max_results: x_client::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Completion API settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: rewrite::completion::DEFAULT_BASE_URL.to_string(),
            model: rewrite::completion::DEFAULT_MODEL.to_string(),
            max_tokens: rewrite::completion::DEFAULT_MAX_TOKENS,
            timeout_secs: 60,
        }
    }
}

/// Dashboard listener settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub listen_addr: SocketAddr,
    pub max_connections: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            max_connections: 64,
        }
    }
}

/// Batch run settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub output_path: PathBuf,
    /// Posts rewritten concurrently
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("rewritten-tweets.json"),
            concurrency: 1,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML contents.
    pub fn parse(contents: &str) -> common::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when one was resolved, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> common::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    fn validate(&mut self) -> common::Result<()> {
        for (field, url) in [
            ("x.api_base_url", &self.x.api_base_url),
            ("x.token_url", &self.x.token_url),
            ("x.authorize_url", &self.x.authorize_url),
            ("x.callback_url", &self.x.callback_url),
            ("llm.base_url", &self.llm.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{field} must start with http:// or https://, got: {url}"
                )));
            }
        }

        for (field, value) in [
            ("x.timeout_secs", self.x.timeout_secs),
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("llm.max_tokens", u64::from(self.llm.max_tokens)),
            ("dashboard.max_connections", self.dashboard.max_connections as u64),
            ("batch.concurrency", self.batch.concurrency as u64),
        ] {
            if value == 0 {
                return Err(common::Error::Config(format!(
                    "{field} must be greater than 0"
                )));
            }
        }

        if !(1..=100).contains(&self.x.max_results) {
            return Err(common::Error::Config(format!(
                "x.max_results must be between 1 and 100, got: {}",
                self.x.max_results
            )));
        }

        if !self.styles.is_empty() {
            self.style_set = StyleSet::new(std::mem::take(&mut self.styles))
                .map_err(|e| common::Error::Config(format!("styles: {e}")))?;
        }

        Ok(())
    }

    /// Styles in rewrite order.
    pub fn styles(&self) -> &StyleSet {
        &self.style_set
    }

    pub fn x_timeout(&self) -> Duration {
        Duration::from_secs(self.x.timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    /// Resolve the config file path from the CLI arg or CONFIG_PATH env var,
    /// falling back to `bookmark-agent.toml` only if it exists.
    pub fn resolve_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

/// Credentials read from the environment.
///
/// Each subcommand asks only for what it needs, so a missing variable is
/// reported when it matters and not at startup.
#[derive(Debug, Default)]
pub struct Secrets {
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    access_token: Option<Secret<String>>,
    refresh_token: Option<Secret<String>>,
    llm_api_key: Option<Secret<String>>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            client_id: env_value(ENV_CLIENT_ID),
            client_secret: env_value(ENV_CLIENT_SECRET).map(Secret::new),
            access_token: env_value(ENV_ACCESS_TOKEN).map(Secret::new),
            refresh_token: env_value(ENV_REFRESH_TOKEN).map(Secret::new),
            llm_api_key: env_value(ENV_LLM_API_KEY).map(Secret::new),
        }
    }

    pub fn client_id(&self) -> common::Result<&str> {
        self.client_id
            .as_deref()
            .ok_or(common::Error::MissingEnv(ENV_CLIENT_ID))
    }

    /// Absent for public clients.
    pub fn client_secret(&self) -> Option<&Secret<String>> {
        self.client_secret.as_ref()
    }

    pub fn refresh_token(&self) -> common::Result<&str> {
        self.refresh_token
            .as_ref()
            .map(Secret::as_str)
            .ok_or(common::Error::MissingEnv(ENV_REFRESH_TOKEN))
    }

    /// The pair the process starts with.
    pub fn credential_pair(&self) -> common::Result<CredentialPair> {
        let access = self
            .access_token
            .as_ref()
            .ok_or(common::Error::MissingEnv(ENV_ACCESS_TOKEN))?;
        Ok(CredentialPair::new(access.as_str(), self.refresh_token()?))
    }

    pub fn llm_api_key(&self) -> common::Result<&Secret<String>> {
        self.llm_api_key
            .as_ref()
            .ok_or(common::Error::MissingEnv(ENV_LLM_API_KEY))
    }
}

/// Non-empty, trimmed value of `key`.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
