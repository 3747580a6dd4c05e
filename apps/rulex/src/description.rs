//! Parser for the free-text `description` field of a rule.
//!
//! A well-formed description reads:
//!
//! ```text
//! <explanation>
//!
//! category: <label>
//!
//! example:
//!
//! <example body>
//! ```
//!
//! Explanation and label must be non-empty; the example may be empty. Both
//! markers may legitimately reappear inside the surrounding text, in which
//! case the last usable occurrence wins: the explanation extends as far as
//! possible, then the label does.

use serde::Serialize;
use thiserror::Error;

const CATEGORY_MARKER: &str = "\n\ncategory: ";
const EXAMPLE_MARKER: &str = "\n\nexample:\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// The three parts of a rule description.
pub struct DescriptionBlock {
    pub explanation: String,
    pub category: String,
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDescription {
    #[error("expected a 'category:' line after a non-empty explanation")]
    MissingCategory,
    #[error("expected an 'example:' line after a non-empty category")]
    MissingExample,
}

/// Split `text` into explanation, category, and example.
pub fn parse_description(text: &str) -> Result<DescriptionBlock, MalformedDescription> {
    let categories: Vec<usize> = marker_positions(text, CATEGORY_MARKER)
        .into_iter()
        .filter(|&p| p > 0)
        .collect();
    if categories.is_empty() {
        return Err(MalformedDescription::MissingCategory);
    }
    for &cat_at in categories.iter().rev() {
        let rest = &text[cat_at + CATEGORY_MARKER.len()..];
        let example_at = marker_positions(rest, EXAMPLE_MARKER)
            .into_iter()
            .filter(|&p| p > 0)
            .last();
        if let Some(ex_at) = example_at {
            return Ok(DescriptionBlock {
                explanation: text[..cat_at].to_string(),
                category: rest[..ex_at].to_string(),
                example: rest[ex_at + EXAMPLE_MARKER.len()..].to_string(),
            });
        }
    }
    Err(MalformedDescription::MissingExample)
}

/// Byte offsets of every occurrence of `marker`, overlapping ones included.
fn marker_positions(hay: &str, marker: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(i) = hay[from..].find(marker) {
        let at = from + i;
        out.push(at);
        // markers start with '\n', so the next byte is a char boundary
        from = at + 1;
    }
    out
}
