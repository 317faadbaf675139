//! Configuration and startup error types

use thiserror::Error;

/// Errors raised while assembling runtime configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result for config loading and shared helpers.
pub type Result<T> = std::result::Result<T, Error>;
