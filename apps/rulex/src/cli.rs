//! CLI argument parsing via `clap`.

use crate::config::CliOverrides;
use crate::table::SortKey;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rulex",
    version,
    about = "Rule explorer for Vale styles",
    long_about = "Rulex — browse the rules of Vale styles, show a rule's source, and lint its example.\n\nConfiguration precedence: CLI > rulex.toml > defaults.",
    after_help = "Examples:\n  rulex list --sort category --filter '(?i)passive'\n  rulex list --page 2 --page-size 20 --output json\n  rulex show Microsoft Contractions\n  rulex show Acme Terms --no-lint",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue, help = "Enable debug logging (RUST_LOG overrides)")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for browsing the catalog and inspecting rules.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current rulex version.")]
    Version,
    /// List rules as a table
    #[command(
        about = "List rules",
        long_about = "Scan the styles directory and list one row per rule: id, style, category, description. Rules whose description is malformed are reported after the table unless --strict aborts on them.",
        after_help = "Examples:\n  rulex list\n  rulex list --styles vale/styles --sort id --output json"
    )]
    List {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Styles directory (default: testdata/styles)")]
        styles: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, value_enum, default_value = "style", help = "Sort column")]
        sort: SortKey,
        #[arg(long, help = "Regex matched against id, style, category, and description")]
        filter: Option<String>,
        #[arg(long, default_value_t = 1, help = "Page to show (1-based)")]
        page: usize,
        #[arg(long, default_value_t = 0, help = "Rows per page (0: all)")]
        page_size: usize,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Abort on the first malformed rule")]
        strict: bool,
    },
    /// Show one rule with its linted example
    #[command(
        about = "Show a rule",
        long_about = "Print a rule's source (without its description), its description, and its example annotated with the linter's findings.",
        after_help = "Examples:\n  rulex show Acme Terms\n  rulex show Acme Terms --bin bin/linux/vale --timeout-ms 5000"
    )]
    Show {
        #[arg(help = "Style (directory under the styles root)")]
        style: String,
        #[arg(help = "Rule id (file name without .yml)")]
        id: String,
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Styles directory (default: testdata/styles)")]
        styles: Option<String>,
        #[arg(long, help = "Root of per-style linter configs (default: testdata)")]
        configs: Option<String>,
        #[arg(long, help = "Linter binary (default: vale)")]
        bin: Option<String>,
        #[arg(long, help = "Linter timeout in milliseconds, 0 for none (default: 30000)")]
        timeout_ms: Option<u64>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not run the linter on the example")]
        no_lint: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

impl Commands {
    /// Config-affecting flags of this subcommand.
    pub fn overrides(&self) -> CliOverrides {
        match self {
            Commands::Version => CliOverrides::default(),
            Commands::List {
                project_root,
                styles,
                output,
                ..
            } => CliOverrides {
                project_root: project_root.clone(),
                styles: styles.clone(),
                output: output.clone(),
                ..Default::default()
            },
            Commands::Show {
                project_root,
                styles,
                configs,
                bin,
                timeout_ms,
                output,
                ..
            } => CliOverrides {
                project_root: project_root.clone(),
                styles: styles.clone(),
                configs: configs.clone(),
                output: output.clone(),
                linter_bin: bin.clone(),
                timeout_ms: *timeout_ms,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["rulex", "show", "Acme", "Terms", "--timeout-ms", "50", "-v"]).unwrap();
        assert!(cli.verbose);
        let ov = cli.cmd.overrides();
        assert_eq!(ov.timeout_ms, Some(50));
        match cli.cmd {
            Commands::Show { style, id, no_lint, .. } => {
                assert_eq!((style.as_str(), id.as_str(), no_lint), ("Acme", "Terms", false));
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["rulex", "list", "--sort", "category"]).unwrap();
        match cli.cmd {
            Commands::List { sort, page, page_size, strict, .. } => {
                assert_eq!(sort, SortKey::Category);
                assert_eq!((page, page_size, strict), (1, 0, false));
            }
            _ => panic!("expected list"),
        }
    }
}
