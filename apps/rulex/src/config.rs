//! Configuration discovery and effective settings resolution.
//!
//! Rulex reads `rulex.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `styles`: `testdata/styles`
//! - `configs`: `testdata` (a style's linter config is `<configs>/<style>/.vale.ini`)
//! - `output`: `human`
//! - `linter.bin`: `vale` (paths containing `/` are relative to the project root)
//! - `linter.timeout_ms`: 30000 (0 disables the timeout)
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STYLES: &str = "testdata/styles";
pub const DEFAULT_CONFIGS: &str = "testdata";
pub const DEFAULT_LINTER: &str = "vale";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const CONFIG_NAMES: [&str; 3] = ["rulex.toml", "rulex.yaml", "rulex.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Linter section under `[linter]`.
pub struct LinterCfg {
    pub bin: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `rulex.toml|yaml`.
pub struct RulexConfig {
    pub styles: Option<String>,
    pub configs: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub linter: Option<LinterCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line; `None` defers to the config file.
pub struct CliOverrides {
    pub project_root: Option<String>,
    pub styles: Option<String>,
    pub configs: Option<String>,
    pub output: Option<String>,
    pub linter_bin: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub styles_root: PathBuf,
    pub configs_root: PathBuf,
    pub output: String,
    pub linter_bin: String,
    pub timeout_ms: u64,
    /// A valid `rulex.*` file was read from the project root.
    pub config_found: bool,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `rulex.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `RulexConfig` from the first `rulex.*` file present in `root`.
///
/// A file that cannot be read or parsed is logged and ignored.
pub fn load_config(root: &Path) -> Option<RulexConfig> {
    for name in CONFIG_NAMES {
        let p = root.join(name);
        if !p.exists() {
            continue;
        }
        let s = match fs::read_to_string(&p) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("cannot read {}: {}", p.display(), e);
                return None;
            }
        };
        let parsed = if name.ends_with(".toml") {
            toml::from_str::<RulexConfig>(&s).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<RulexConfig>(&s).map_err(|e| e.to_string())
        };
        return match parsed {
            Ok(cfg) => {
                log::debug!("loaded config {}", p.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("ignoring invalid {}: {}", p.display(), e);
                None
            }
        };
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Effective {
    let start = PathBuf::from(cli.project_root.as_deref().unwrap_or("."));
    let project_root = detect_project_root(&start);
    let loaded = load_config(&project_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();
    let linter = cfg.linter.unwrap_or_default();

    let styles = cli
        .styles
        .clone()
        .or(cfg.styles)
        .unwrap_or_else(|| DEFAULT_STYLES.to_string());
    let configs = cli
        .configs
        .clone()
        .or(cfg.configs)
        .unwrap_or_else(|| DEFAULT_CONFIGS.to_string());
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let mut linter_bin = cli
        .linter_bin
        .clone()
        .or(linter.bin)
        .unwrap_or_else(|| DEFAULT_LINTER.to_string());
    // bare names are looked up on PATH; relative paths are project-relative
    if linter_bin.contains('/') && Path::new(&linter_bin).is_relative() {
        linter_bin = project_root.join(&linter_bin).to_string_lossy().to_string();
    }
    let timeout_ms = cli
        .timeout_ms
        .or(linter.timeout_ms)
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    Effective {
        styles_root: project_root.join(styles),
        configs_root: project_root.join(configs),
        project_root,
        output,
        linter_bin,
        timeout_ms,
        config_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn overrides(root: &Path) -> CliOverrides {
        CliOverrides {
            project_root: root.to_str().map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let eff = resolve_effective(&overrides(root));
        assert_eq!(eff.project_root, root);
        assert_eq!(eff.styles_root, root.join("testdata/styles"));
        assert_eq!(eff.configs_root, root.join("testdata"));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.linter_bin, "vale");
        assert_eq!(eff.timeout_ms, 30_000);
        assert!(!eff.config_found);
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("rulex.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
styles = "vale/styles"
configs = "vale"
output = "json"
[linter]
bin = "bin/linux/vale"
timeout_ms = 500
    "#
        )
        .unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let eff = resolve_effective(&overrides(&nested));
        assert_eq!(eff.project_root, root);
        assert_eq!(eff.styles_root, root.join("vale/styles"));
        assert_eq!(eff.configs_root, root.join("vale"));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.linter_bin, root.join("bin/linux/vale").to_string_lossy());
        assert_eq!(eff.timeout_ms, 500);
        assert!(eff.config_found);
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("rulex.yaml"),
            "styles: s\noutput: json\nlinter:\n  timeout_ms: 10\n",
        )
        .unwrap();
        let eff = resolve_effective(&CliOverrides {
            styles: Some("/abs/styles".into()),
            output: Some("human".into()),
            timeout_ms: Some(0),
            ..overrides(root)
        });
        assert_eq!(eff.styles_root, PathBuf::from("/abs/styles"));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.timeout_ms, 0);
        assert_eq!(eff.linter_bin, "vale");
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("rulex.toml"), "styles = [not valid").unwrap();
        assert!(load_config(root).is_none());
        let eff = resolve_effective(&overrides(root));
        assert_eq!(eff.styles_root, root.join("testdata/styles"));
        assert!(!eff.config_found);
    }
}
