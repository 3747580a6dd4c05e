//! Rulex CLI binary entry point.
//! Delegates to the library for catalog/detail/lint and prints results.

use clap::Parser;
use regex::Regex;
use rulex::cli::{Cli, Commands};
use rulex::lint::{Annotator, ValeCli};
use rulex::output::{self, Lint};
use rulex::{catalog, config, detail, table, RulexError};

/// Everything listed and shown.
const SUCCESS: i32 = 0;
/// `list` skipped rule files it could not read.
const PARTIAL: i32 = 1;
/// Bad arguments, missing rule, or linter failure.
const TOOL_ERROR: i32 = 2;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", output::error_prefix(), msg);
    std::process::exit(TOOL_ERROR);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let eff = config::resolve_effective(&cli.cmd.overrides());
    log::debug!("effective config: {:?}", eff);

    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::List {
            sort,
            filter,
            page,
            page_size,
            strict,
            ..
        } => {
            let filter = match filter.as_deref().map(Regex::new).transpose() {
                Ok(f) => f,
                Err(e) => fail(format!("invalid --filter: {e}")),
            };
            if !eff.config_found && eff.output != "json" {
                eprintln!(
                    "{} No rulex.toml found; reading styles from {}.",
                    output::note_prefix(),
                    eff.styles_root.display()
                );
            }
            let (rows, errors) = if strict {
                match catalog::load_catalog(&eff.styles_root) {
                    Ok(rows) => (rows, Vec::new()),
                    Err(e) => fail(e),
                }
            } else {
                match catalog::scan_catalog(&eff.styles_root) {
                    Ok(scan) => (scan.rules, scan.errors),
                    Err(e) => fail(e),
                }
            };
            let rows = table::select_rows(&rows, filter.as_ref(), sort);
            let page = table::paginate(rows, page, page_size);
            output::print_catalog(&page, &errors, &eff.styles_root, &eff.output);
            std::process::exit(if errors.is_empty() { SUCCESS } else { PARTIAL });
        }
        Commands::Show {
            style, id, no_lint, ..
        } => {
            let detail = match detail::load_detail(&eff.styles_root, &style, &id) {
                Ok(d) => d,
                Err(e) => fail(e),
            };
            let (block, bad_description) = match detail.block() {
                None => (None, None),
                Some(Ok(b)) => (Some(b), None),
                Some(Err(e)) => (
                    None,
                    Some(RulexError::MalformedDescription {
                        path: eff.styles_root.join(&style).join(format!("{id}.{}", catalog::RULE_EXT)),
                        reason: e.to_string(),
                    }),
                ),
            };
            let lint = match block.as_ref() {
                Some(b) if !no_lint => {
                    let annotator =
                        Annotator::new(&eff.configs_root, ValeCli::new(&eff.linter_bin, eff.timeout_ms));
                    match annotator.annotate(&b.example, &style) {
                        Ok(anns) => Lint::Done(anns),
                        Err(e) => Lint::Failed(e.to_string()),
                    }
                }
                _ => Lint::Skipped,
            };
            output::print_detail(&detail, block.as_ref(), &lint, &eff.output);
            if let Some(e) = bad_description {
                fail(e);
            }
            if let Lint::Failed(msg) = lint {
                fail(msg);
            }
        }
    }
}
