//! Wiring of the social API, the completion client and the style set
//!
//! One `Agent` is built per process and shared by the batch run and every
//! dashboard route, so both paths go through the same executor and the same
//! rewrite operations.

use std::path::PathBuf;
use std::sync::Arc;

use rewrite::{AnthropicClient, CompletionClient, StyleSet};
use x_auth::{CredentialStore, OAuthRenewer, TokenEndpoint};
use x_client::{ClientFactory, RequestExecutor, XApi};

use crate::config::{Config, Secrets};

pub struct Agent {
    pub api: XApi,
    pub llm: Arc<dyn CompletionClient>,
    pub styles: StyleSet,
    pub output_path: PathBuf,
    pub concurrency: usize,
}

impl Agent {
    /// Build from config and environment secrets.
    ///
    /// Needs the client id, the initial token pair and the LLM API key.
    pub fn from_config(config: &Config, secrets: &Secrets) -> anyhow::Result<Self> {
        let http = http_client(config)?;
        let endpoint = token_endpoint(config, secrets)?;
        let store = Arc::new(CredentialStore::new(secrets.credential_pair()?));
        let executor = RequestExecutor::new(
            store,
            ClientFactory::new(http.clone(), &config.x.api_base_url),
            Arc::new(OAuthRenewer::new(http.clone(), endpoint)),
        );

        let llm = AnthropicClient::new(http, secrets.llm_api_key()?.clone())
            .with_base_url(config.llm.base_url.as_str())
            .with_model(config.llm.model.as_str())
            .with_max_tokens(config.llm.max_tokens)
            .with_timeout(config.llm_timeout());

        Ok(Self {
            api: XApi::new(executor).with_max_results(config.x.max_results),
            llm: Arc::new(llm),
            styles: config.styles().clone(),
            output_path: config.batch.output_path.clone(),
            concurrency: config.batch.concurrency,
        })
    }
}

/// Shared HTTP client; the social API timeout is the client default and the
/// completion client sets its own per request.
pub fn http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.x_timeout())
        .build()?)
}

/// Token endpoint for the configured OAuth client.
pub fn token_endpoint(config: &Config, secrets: &Secrets) -> anyhow::Result<TokenEndpoint> {
    Ok(
        TokenEndpoint::new(secrets.client_id()?, secrets.client_secret().cloned())
            .with_url(config.x.token_url.as_str()),
    )
}
