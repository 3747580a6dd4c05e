//! Rule catalog: one summary row per rule file under the styles root.
//!
//! Layout is `<styles>/<Style>/<Rule>.yml`. The rule id is the file stem and
//! the style is the name of the immediate parent directory. Rows follow the
//! traversal order of the glob walker; callers sort for display.

use crate::description::parse_description;
use crate::error::{Result, RulexError};
use crate::models::{CatalogError, CatalogScan, RuleSummary};
use glob::{glob, Pattern};
use rayon::prelude::*;
use serde_yaml::Value as Yaml;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of rule definition files.
pub const RULE_EXT: &str = "yml";

/// Load every rule under `styles_root`, failing on the first bad file.
pub fn load_catalog(styles_root: &Path) -> Result<Vec<RuleSummary>> {
    let files = rule_files(styles_root)?;
    let rows: Vec<Result<RuleSummary>> = files.par_iter().map(|p| summarize_rule(p)).collect();
    rows.into_iter().collect()
}

/// Load every rule under `styles_root`, keeping good rows and recording
/// one error per bad file.
pub fn scan_catalog(styles_root: &Path) -> Result<CatalogScan> {
    let files = rule_files(styles_root)?;
    let rows: Vec<Result<RuleSummary>> = files.par_iter().map(|p| summarize_rule(p)).collect();
    let mut scan = CatalogScan::default();
    for (file, row) in files.into_iter().zip(rows) {
        match row {
            Ok(r) => scan.rules.push(r),
            Err(e) => {
                log::warn!("skipping {}: {}", file.display(), e);
                scan.errors.push(CatalogError {
                    file,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(scan)
}

/// Enumerate `**/*.yml` below the styles root.
pub fn rule_files(styles_root: &Path) -> Result<Vec<PathBuf>> {
    if !styles_root.is_dir() {
        return Err(RulexError::NotFound {
            path: styles_root.to_path_buf(),
        });
    }
    let base = Pattern::escape(&styles_root.to_string_lossy());
    let pattern = format!("{}/**/*.{}", base.trim_end_matches('/'), RULE_EXT);
    let entries = glob(&pattern).map_err(|e| RulexError::parse(styles_root, e.msg))?;
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(p) if p.is_file() => files.push(p),
            Ok(_) => {}
            Err(e) => log::warn!("cannot read {}: {}", e.path().display(), e.error()),
        }
    }
    log::debug!("found {} rule files under {}", files.len(), styles_root.display());
    Ok(files)
}

/// Summarize a single rule file.
///
/// A missing `description` yields empty description and category; a
/// present one must carry both markers.
pub fn summarize_rule(path: &Path) -> Result<RuleSummary> {
    let src = fs::read_to_string(path).map_err(|e| RulexError::io(path, e))?;
    let doc: Yaml =
        serde_yaml::from_str(&src).map_err(|e| RulexError::parse(path, format!("invalid YAML: {e}")))?;
    let map = doc
        .as_mapping()
        .ok_or_else(|| RulexError::parse(path, "expected a mapping at the top level"))?;

    let (description, category) = match map.get("description") {
        None | Some(Yaml::Null) => (String::new(), String::new()),
        Some(Yaml::String(text)) => {
            let block = parse_description(text).map_err(|e| RulexError::MalformedDescription {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            (block.explanation, block.category)
        }
        Some(_) => return Err(RulexError::parse(path, "'description' must be a string")),
    };

    Ok(RuleSummary {
        id: rule_id(path).ok_or_else(|| RulexError::parse(path, "rule file has no name"))?,
        style: style_of(path).ok_or_else(|| RulexError::parse(path, "rule file has no parent directory"))?,
        description,
        category,
    })
}

fn rule_id(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

fn style_of(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
}
