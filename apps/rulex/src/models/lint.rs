//! Lint findings as reported by the linter and their display form.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One alert from the linter. `line` is 1-based.
pub struct LintFinding {
    pub line: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// 1-based inclusive column range within the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Gutter annotation for the example viewer. `row` is 0-based.
pub struct AnnotationRecord {
    pub row: usize,
    pub column: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub severity: String,
}

impl From<&LintFinding> for AnnotationRecord {
    fn from(f: &LintFinding) -> Self {
        AnnotationRecord {
            row: f.line.saturating_sub(1),
            column: 0,
            text: f.message.clone(),
            severity: "error".to_string(),
        }
    }
}
