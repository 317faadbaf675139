use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "bookmark-agent",
    version,
    about = "Rewrite bookmarked posts with an LLM and publish the results"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Config file (default: $CONFIG_PATH, then ./bookmark-agent.toml if present)"
    )]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Human-readable logs instead of JSON")]
    pub pretty_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch bookmarks, rewrite each under every style, write the JSON artifact
    Run {
        #[arg(long, help = "Artifact path (overrides batch.output_path)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Posts rewritten concurrently (overrides batch.concurrency)")]
        concurrency: Option<usize>,
    },
    /// Serve the dashboard JSON API
    Dashboard {
        #[arg(long, help = "Listen address (overrides dashboard.listen_addr)")]
        listen: Option<SocketAddr>,
    },
    /// Exchange TWITTER_REFRESH_TOKEN for a new pair and print it as .env lines
    Refresh,
    /// Authorize the app in a browser and print the first pair as .env lines
    Login,
}
