//! One-shot credential commands
//!
//! `login` bootstraps the first pair with the PKCE authorization-code flow;
//! `refresh` trades the configured refresh token for a fresh pair. Both
//! print the result as `.env` lines on stdout and everything else on
//! stderr, so `bookmark-agent refresh >> .env` works.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use x_auth::{
    AuthorizationRequest, CredentialPair, OAuthRenewer, Renewer, TokenEndpoint, TokenResponse,
};
use x_client::ClientFactory;

use crate::agent::{http_client, token_endpoint};
use crate::config::{Config, ENV_ACCESS_TOKEN, ENV_REFRESH_TOKEN, Secrets};

/// An authorization started in the browser and not yet exchanged.
pub struct LoginFlow {
    verifier: String,
    state: String,
    redirect_uri: String,
    pub authorization_url: String,
}

impl LoginFlow {
    pub fn start(config: &Config, client_id: &str) -> x_auth::Result<Self> {
        let verifier = x_auth::generate_verifier();
        let state = x_auth::generate_state();
        let challenge = x_auth::compute_challenge(&verifier);
        let authorization_url = x_auth::build_authorization_url(&AuthorizationRequest {
            authorize_url: &config.x.authorize_url,
            client_id,
            redirect_uri: &config.x.callback_url,
            state: &state,
            challenge: &challenge,
        })?;
        Ok(Self {
            verifier,
            state,
            redirect_uri: config.x.callback_url.clone(),
            authorization_url,
        })
    }

    /// Exchange what the user pasted (code, query string or callback URL).
    ///
    /// A `state` that does not match the one this flow generated is
    /// rejected before anything is sent.
    pub async fn finish(
        &self,
        http: &reqwest::Client,
        endpoint: &TokenEndpoint,
        pasted: &str,
    ) -> x_auth::Result<TokenResponse> {
        let callback = x_auth::parse_callback(pasted)?;
        if callback.state.as_deref().is_some_and(|s| s != self.state) {
            return Err(x_auth::Error::InvalidCallback(
                "state mismatch, restart the login".into(),
            ));
        }
        x_auth::exchange_code(http, endpoint, &callback.code, &self.verifier, &self.redirect_uri)
            .await
    }
}

/// The pair as `.env` lines.
pub fn env_lines(pair: &CredentialPair) -> String {
    format!(
        "{ENV_ACCESS_TOKEN}={}\n{ENV_REFRESH_TOKEN}={}\n",
        pair.access_token(),
        pair.refresh_token()
    )
}

/// `login` subcommand.
pub async fn login(config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
    let http = http_client(config)?;
    let endpoint = token_endpoint(config, secrets)?;
    let flow = LoginFlow::start(config, secrets.client_id()?)?;

    eprintln!("Open this URL in a browser and authorize the app:\n");
    eprintln!("{}\n", flow.authorization_url);
    eprintln!("Then paste the code or the full callback URL:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read authorization code")?;

    let pair = CredentialPair::from(
        flow.finish(&http, &endpoint, &line)
            .await
            .context("authorization failed")?,
    );

    let user = ClientFactory::new(http, &config.x.api_base_url)
        .build(&pair)
        .me()
        .await
        .context("new credentials were issued but could not be verified")?;
    info!(username = %user.username, "login complete");
    eprintln!("Authenticated as @{}", user.username);

    print!("{}", env_lines(&pair));
    Ok(())
}

/// `refresh` subcommand.
pub async fn refresh(config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
    let renewer = OAuthRenewer::new(http_client(config)?, token_endpoint(config, secrets)?);
    let pair = renewer
        .renew(secrets.refresh_token()?)
        .await
        .context("token refresh failed")?;
    info!("credentials renewed; the previous refresh token is no longer valid");

    print!("{}", env_lines(&pair));
    Ok(())
}
