//! Rule detail: the selected rule's source and its description.
//!
//! The source shown to users is the rule minus `description`, re-written by
//! [`crate::emit`] with a fixed indentation. Key order, scalar quoting and
//! comments are the author's.

use crate::catalog::RULE_EXT;
use crate::description::{parse_description, DescriptionBlock, MalformedDescription};
use crate::emit::reformat;
use crate::error::{Result, RulexError};
use crate::models::RuleDetail;
use serde_yaml::{Mapping, Value as Yaml};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Load `<styles_root>/<style>/<id>.yml` and split off its description.
pub fn load_detail(styles_root: &Path, style: &str, id: &str) -> Result<RuleDetail> {
    let path = rule_path(styles_root, style, id)?;
    let src = fs::read_to_string(&path).map_err(|e| RulexError::io(&path, e))?;
    let doc: Yaml =
        serde_yaml::from_str(&src).map_err(|e| RulexError::parse(&path, format!("invalid YAML: {e}")))?;
    let Yaml::Mapping(mut map) = doc else {
        return Err(RulexError::parse(&path, "expected a mapping at the top level"));
    };

    let description = match map.shift_remove("description") {
        None | Some(Yaml::Null) => String::new(),
        Some(Yaml::String(s)) => s,
        Some(_) => return Err(RulexError::parse(&path, "'description' must be a string")),
    };
    log::debug!("loaded {} ({} keys besides description)", path.display(), map.len());
    let source = reformat(&src, &["description"]).map_err(|e| RulexError::parse(&path, e))?;

    Ok(RuleDetail {
        style: style.to_string(),
        id: id.to_string(),
        source,
        description,
    })
}

impl RuleDetail {
    /// Split the description into explanation, category, and example.
    ///
    /// `None` when the rule has no description.
    pub fn block(&self) -> Option<std::result::Result<DescriptionBlock, MalformedDescription>> {
        if self.description.is_empty() {
            None
        } else {
            Some(parse_description(&self.description))
        }
    }

    /// Parse the re-written source back into a mapping.
    pub fn source_mapping(&self) -> Result<Mapping> {
        serde_yaml::from_str(&self.source)
            .map_err(|e| RulexError::parse(format!("{}/{}", self.style, self.id), e.to_string()))
    }
}

/// Resolve a rule file path, refusing names that would leave the style dir.
fn rule_path(styles_root: &Path, style: &str, id: &str) -> Result<PathBuf> {
    let path = styles_root.join(style).join(format!("{id}.{RULE_EXT}"));
    if !is_single_name(style) || !is_single_name(id) {
        return Err(RulexError::NotFound { path });
    }
    Ok(path)
}

fn is_single_name(s: &str) -> bool {
    let mut comps = Path::new(s).components();
    matches!((comps.next(), comps.next()), (Some(Component::Normal(_)), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use tempfile::tempdir;

    const DESC: &str = "Avoid X.\n\ncategory: style\n\nexample:\n\nUse X now.";

    fn fixture(root: &Path, body: &str) {
        let dir = root.join("Acme");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("existence.yml"), body).unwrap();
    }

    #[test]
    fn test_end_to_end_summary_and_detail() {
        let dir = tempdir().unwrap();
        fixture(
            dir.path(),
            "extends: existence\nmessage: \"Avoid '%s'.\"\ndescription: \"Avoid X.\\n\\ncategory: style\\n\\nexample:\\n\\nUse X now.\"\nlevel: error\ntokens:\n    - X\n",
        );
        let rows = load_catalog(dir.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "existence");
        assert_eq!(rows[0].style, "Acme");
        assert_eq!(rows[0].description, "Avoid X.");
        assert_eq!(rows[0].category, "style");

        let d = load_detail(dir.path(), "Acme", "existence").unwrap();
        assert_eq!(d.description, DESC);
        assert_eq!(
            d.source,
            "extends: existence\nmessage: \"Avoid '%s'.\"\nlevel: error\ntokens:\n  - X\n"
        );
        assert!(!d.source.contains("description"));
        let block = d.block().unwrap().unwrap();
        assert_eq!(block.example, "Use X now.");
    }

    #[test]
    fn test_source_round_trips_without_description() {
        let dir = tempdir().unwrap();
        let body = "extends: substitution\nmessage: 'Consider using ''%s'' instead.'\nignorecase: true\nlevel: suggestion\ndescription: |\n  Prefer simple words.\n\n  category: clarity\n\n  example:\n\n  We utilize it.\naction:\n  name: replace\nswap:\n  utilize: use\n  '(?:in order to)': to\n  leverage: use\n";
        fixture(dir.path(), body);
        let d = load_detail(dir.path(), "Acme", "existence").unwrap();

        let mut original: Mapping = serde_yaml::from_str(body).unwrap();
        original.shift_remove("description");
        let back = d.source_mapping().unwrap();
        assert_eq!(back, original);
        let keys: Vec<_> = back.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, ["extends", "message", "ignorecase", "level", "action", "swap"]);
        let swaps: Vec<_> = back
            .get("swap")
            .and_then(|v| v.as_mapping())
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(swaps, ["utilize", "(?:in order to)", "leverage"]);

        let block = d.block().unwrap().unwrap();
        assert_eq!(block.category, "clarity");
        assert_eq!(block.example, "We utilize it.\n");
    }

    #[test]
    fn test_source_keeps_authored_quoting_and_comments() {
        let dir = tempdir().unwrap();
        fixture(
            dir.path(),
            "# Flags weasel words\nextends: existence\nmessage: \"Avoid '%s'.\"\nignorecase: yes\nlevel: 'error'\ndescription: |\n  Avoid X.\n\n  category: style\n\n  example:\n\n  Use X now.\ntokens:\n    - 'X'\n",
        );
        let d = load_detail(dir.path(), "Acme", "existence").unwrap();
        assert_eq!(
            d.source,
            "# Flags weasel words\nextends: existence\nmessage: \"Avoid '%s'.\"\nignorecase: yes\nlevel: 'error'\ntokens:\n  - 'X'\n"
        );
        assert_eq!(d.block().unwrap().unwrap().category, "style");
    }

    #[test]
    fn test_missing_description_is_empty() {
        let dir = tempdir().unwrap();
        fixture(dir.path(), "extends: existence\nlevel: warning\n");
        let d = load_detail(dir.path(), "Acme", "existence").unwrap();
        assert_eq!(d.description, "");
        assert!(d.block().is_none());
        assert_eq!(d.source, "extends: existence\nlevel: warning\n");
    }

    #[test]
    fn test_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_detail(dir.path(), "Acme", "missing"),
            Err(RulexError::NotFound { .. })
        ));
        assert!(matches!(
            load_detail(dir.path(), "..", "existence"),
            Err(RulexError::NotFound { .. })
        ));
        assert!(matches!(
            load_detail(dir.path(), "Acme", "a/b"),
            Err(RulexError::NotFound { .. })
        ));
        fixture(dir.path(), "extends: [unclosed\n");
        assert!(matches!(
            load_detail(dir.path(), "Acme", "existence"),
            Err(RulexError::Parse { .. })
        ));
    }
}
