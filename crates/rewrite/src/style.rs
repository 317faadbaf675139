//! Named rewrite styles

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key the original text occupies in serialized results; no style may use it.
pub const RESERVED_NAME: &str = "original";

/// A named rewrite policy: the instruction given to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub instruction: String,
}

impl Style {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
        }
    }
}

/// Ordered, validated set of styles. Order is the order rewrites are
/// requested and serialized in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSet {
    styles: Vec<Style>,
}

impl StyleSet {
    /// Validate and wrap `styles`.
    ///
    /// Names must be non-empty, unique and not `original`; instructions must
    /// be non-empty.
    pub fn new(styles: Vec<Style>) -> Result<Self> {
        if styles.is_empty() {
            return Err(Error::InvalidStyle("at least one style is required".into()));
        }
        for (i, style) in styles.iter().enumerate() {
            if style.name.trim().is_empty() {
                return Err(Error::InvalidStyle(format!("style #{} has an empty name", i + 1)));
            }
            if style.name == RESERVED_NAME {
                return Err(Error::InvalidStyle(format!(
                    "style name \"{RESERVED_NAME}\" is reserved"
                )));
            }
            if style.instruction.trim().is_empty() {
                return Err(Error::InvalidStyle(format!(
                    "style \"{}\" has an empty instruction",
                    style.name
                )));
            }
            if styles[..i].iter().any(|s| s.name == style.name) {
                return Err(Error::InvalidStyle(format!(
                    "duplicate style name \"{}\"",
                    style.name
                )));
            }
        }
        Ok(Self { styles })
    }

    pub fn get(&self, name: &str) -> Result<&Style> {
        self.styles
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnknownStyle(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.styles.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl Default for StyleSet {
    fn default() -> Self {
        Self {
            styles: vec![
                Style::new(
                    "conservative",
                    "Rewrite this tweet to be slightly more engaging, but keep the original meaning and tone.",
                ),
                Style::new(
                    "moderate",
                    "Rewrite this tweet to be noticeably more engaging and persuasive, while keeping your voice.",
                ),
                Style::new(
                    "bold",
                    "Rewrite this tweet to be bold, attention-grabbing, and optimized for maximum engagement. Take creative risks!",
                ),
            ],
        }
    }
}
