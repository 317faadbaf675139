//! LLM rewrites of post text under named styles
//!
//! A style is a name plus a natural-language instruction. Rewriting one post
//! under N styles makes N independent completion calls; a failed call leaves
//! an empty string for that style and never affects its siblings. The batch
//! path and every interactive route share the same operations.

pub mod artifact;
pub mod completion;
pub mod error;
pub mod rewriter;
pub mod style;

pub use artifact::write_artifact;
pub use completion::{AnthropicClient, CompletionClient, CompletionFuture};
pub use error::{Error, Result};
pub use rewriter::{RewriteResult, build_prompt, rewrite_batch, rewrite_one, rewrite_post};
pub use style::{Style, StyleSet};
