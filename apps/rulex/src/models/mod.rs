//! Shared data models for catalog, detail, and lint outputs.

pub mod lint;

use serde::Serialize;
use std::path::PathBuf;

pub use lint::{AnnotationRecord, LintFinding};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One row of the rule catalog.
pub struct RuleSummary {
    pub id: String,
    pub style: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
/// A rule file that could not be summarized.
pub struct CatalogError {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
/// Catalog with partial results: good rows plus per-file failures.
pub struct CatalogScan {
    pub rules: Vec<RuleSummary>,
    pub errors: Vec<CatalogError>,
}

#[derive(Debug, Clone, Serialize)]
/// A selected rule: its source without `description`, and the description.
pub struct RuleDetail {
    pub style: String,
    pub id: String,
    pub source: String,
    pub description: String,
}
