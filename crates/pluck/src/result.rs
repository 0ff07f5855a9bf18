// ABOUTME: The Extraction outcome type: a field was found with text, or it was not present.
// ABOUTME: NotFound is a normal outcome, kept distinct from the error taxonomy.

use serde::{Deserialize, Serialize};

/// Outcome of a successful extraction call.
///
/// `NotFound` means the page was fetched and parsed but no selector matched;
/// it is deliberately not an error so callers cannot conflate "the field is
/// absent" with "the fetch or parse failed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "text", rename_all = "snake_case")]
pub enum Extraction {
    /// Visible text of the first matching node, whitespace-normalized.
    Found(String),
    /// No selector in the rule matched a non-empty node.
    NotFound,
}

impl Extraction {
    /// Returns true if a value was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    /// The extracted text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Extraction::Found(text) => Some(text),
            Extraction::NotFound => None,
        }
    }

    /// Consume into the extracted text, if any.
    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::Found(text) => Some(text),
            Extraction::NotFound => None,
        }
    }
}
