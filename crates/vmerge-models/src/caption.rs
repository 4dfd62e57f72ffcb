//! Caption text and placement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vertical placement of the caption block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Top => "top",
            Alignment::Middle => "middle",
            Alignment::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable caption request: raw text plus alignment.
///
/// Wrapped lines and offsets are derived from this by the text layout
/// engine and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSpec {
    pub text: String,
    #[serde(default)]
    pub alignment: Alignment,
}

impl CaptionSpec {
    pub fn new(text: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            text: text.into(),
            alignment,
        }
    }
}
