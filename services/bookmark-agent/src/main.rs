//! Bookmark rewrite agent
//!
//! Single binary that:
//! 1. Fetches the user's bookmarked posts through the renew-once executor
//! 2. Rewrites each under every configured style with the completion API
//! 3. Writes the results as one JSON artifact per run, or serves the same
//!    operations as a dashboard JSON API
//! 4. Bootstraps (`login`) and renews (`refresh`) the OAuth2 token pair

mod agent;
mod batch;
mod cli;
mod config;
mod dashboard;
mod error;
mod metrics;
mod oauth;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::Agent;
use crate::cli::{Cli, Commands};
use crate::config::{Config, Secrets};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Secrets live in .env next to where the agent is run
    let _ = dotenvy::dotenv();
    init_tracing(cli.pretty_logs);

    let config_path = Config::resolve_path(cli.config.as_deref());
    match &config_path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => info!("no config file, using defaults"),
    }
    let mut config = Config::load_or_default(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "invalid default configuration".to_string(),
    })?;
    let secrets = Secrets::from_env();

    match cli.command {
        Commands::Run {
            output,
            concurrency,
        } => {
            if let Some(output) = output {
                config.batch.output_path = output;
            }
            if let Some(concurrency) = concurrency {
                anyhow::ensure!(concurrency > 0, "--concurrency must be greater than 0");
                config.batch.concurrency = concurrency;
            }
            run_batch(&config, &secrets).await
        }
        Commands::Dashboard { listen } => {
            if let Some(listen) = listen {
                config.dashboard.listen_addr = listen;
            }
            serve_dashboard(&config, &secrets).await
        }
        Commands::Refresh => oauth::refresh(&config, &secrets).await,
        Commands::Login => oauth::login(&config, &secrets).await,
    }
}

/// JSON output with LOG_LEVEL / RUST_LOG support, on stderr so stdout stays
/// clean for `.env` lines.
fn init_tracing(pretty: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if pretty {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run_batch(config: &Config, secrets: &Secrets) -> Result<()> {
    let agent = Agent::from_config(config, secrets)?;
    info!(
        styles = ?agent.styles.names(),
        output = %agent.output_path.display(),
        "starting batch run"
    );

    match batch::run_batch(&agent).await {
        Ok(_) | Err(error::Error::NoBookmarks) => Ok(()),
        Err(e) => Err(e).context("batch run failed"),
    }
}

async fn serve_dashboard(config: &Config, secrets: &Secrets) -> Result<()> {
    let prometheus = metrics::install_recorder()?;
    let agent = Arc::new(Agent::from_config(config, secrets)?);
    let state = dashboard::AppState::new(agent, prometheus);
    let app = dashboard::build_router(state, config.dashboard.max_connections);

    let listen_addr = config.dashboard.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "dashboard listening");

    dashboard::serve(listener, app).await?;
    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
