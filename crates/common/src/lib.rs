//! Shared types for the bookmark agent workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
