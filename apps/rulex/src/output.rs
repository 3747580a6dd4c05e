//! Output rendering for the catalog table and rule details.
//!
//! Supports `human` (default) and `json` outputs. Human output is colored
//! unless `NO_COLOR` is set.

use crate::description::DescriptionBlock;
use crate::models::{AnnotationRecord, CatalogError, RuleDetail};
use crate::table::Page;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".blue().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Example viewer state: annotations, or why there are none.
pub enum Lint {
    Skipped,
    Done(Vec<AnnotationRecord>),
    Failed(String),
}

/// Print one page of the catalog, followed by files that failed to load.
pub fn print_catalog(page: &Page, errors: &[CatalogError], styles_root: &Path, output: &str) {
    match output {
        "json" => println!("{}", to_pretty(&compose_catalog_json(page, errors, styles_root))),
        _ => {
            let color = use_colors(output);
            let w_id = page.rows.iter().map(|r| r.id.len()).max().unwrap_or(0).max(2);
            let w_style = page.rows.iter().map(|r| r.style.len()).max().unwrap_or(0).max(5);
            let w_cat = page.rows.iter().map(|r| r.category.len()).max().unwrap_or(0).max(8);
            let header = format!(
                "{:<w_id$}  {:<w_style$}  {:<w_cat$}  {}",
                "ID", "STYLE", "CATEGORY", "DESCRIPTION"
            );
            if color {
                println!("{}", header.bold());
            } else {
                println!("{}", header);
            }
            for r in &page.rows {
                let desc = first_line(&r.description);
                if color {
                    println!(
                        "{}  {}  {}  {}",
                        format!("{:<w_id$}", r.id).bold(),
                        format!("{:<w_style$}", r.style).cyan(),
                        format!("{:<w_cat$}", r.category).yellow(),
                        desc
                    );
                } else {
                    println!(
                        "{:<w_id$}  {:<w_style$}  {:<w_cat$}  {}",
                        r.id, r.style, r.category, desc
                    );
                }
            }
            let summary = format!(
                "— page {}/{} — {} rules{}",
                page.page,
                page.pages,
                page.total,
                if errors.is_empty() {
                    String::new()
                } else {
                    format!(", {} unreadable", errors.len())
                }
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
            for e in errors {
                let full = e.file.to_string_lossy();
                let msg = e.message.replace(&*full, &display_path(&e.file, styles_root));
                eprintln!("{} {}", error_prefix(), msg);
            }
        }
    }
}

/// Print a rule's source, description parts, and annotated example.
pub fn print_detail(
    detail: &RuleDetail,
    block: Option<&DescriptionBlock>,
    lint: &Lint,
    output: &str,
) {
    match output {
        "json" => println!("{}", to_pretty(&compose_detail_json(detail, block, lint))),
        _ => {
            let color = use_colors(output);
            let heading = |s: &str| {
                if color {
                    println!("{}", format!("── {s} ──").bold())
                } else {
                    println!("── {s} ──")
                }
            };
            heading(&format!("{}.{}", detail.style, detail.id));
            heading("Source");
            print!("{}", detail.source);
            let Some(block) = block else {
                return;
            };
            heading("Description");
            println!("{}", block.explanation);
            println!("category: {}", block.category);
            heading("Example");
            let empty = Vec::new();
            let anns = match lint {
                Lint::Done(a) => a,
                _ => &empty,
            };
            print!("{}", render_example(&block.example, anns, color));
            if let Lint::Done(a) = lint {
                let summary = format!("— {} alerts", a.len());
                if color {
                    println!("{}", summary.bold());
                } else {
                    println!("{}", summary);
                }
            }
        }
    }
}

/// Number the example's lines and place each annotation under its row.
///
/// Annotations past the last line are listed at the end.
pub fn render_example(example: &str, anns: &[AnnotationRecord], color: bool) -> String {
    let lines: Vec<&str> = example.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let mut out = String::new();
    let marker = |text: &str| {
        if color {
            format!("{} {}", "✖".red(), text.red())
        } else {
            format!("✖ {}", text)
        }
    };
    for (row, line) in lines.iter().enumerate() {
        let gutter = format!("{:>width$} │", row + 1);
        if color {
            out.push_str(&format!("{} {}\n", gutter.bright_black(), line));
        } else {
            out.push_str(&format!("{} {}\n", gutter, line));
        }
        for a in anns.iter().filter(|a| a.row == row) {
            out.push_str(&format!("{:>width$}   {}\n", "", marker(&a.text)));
        }
    }
    for a in anns.iter().filter(|a| a.row >= lines.len()) {
        out.push_str(&format!("{:>width$}   {} (line {})\n", "", marker(&a.text), a.row + 1));
    }
    out
}

/// Compose catalog JSON object (pure) for testing/snapshot purposes.
pub fn compose_catalog_json(page: &Page, errors: &[CatalogError], styles_root: &Path) -> JsonVal {
    let errs: Vec<_> = errors
        .iter()
        .map(|e| json!({"file": display_path(&e.file, styles_root), "message": e.message}))
        .collect();
    json!({
        "rules": page.rows,
        "errors": errs,
        "summary": {
            "page": page.page,
            "pages": page.pages,
            "total": page.total,
            "errors": errors.len(),
        }
    })
}

/// Compose detail JSON object (pure) for testing/snapshot purposes.
pub fn compose_detail_json(
    detail: &RuleDetail,
    block: Option<&DescriptionBlock>,
    lint: &Lint,
) -> JsonVal {
    let (annotations, lint_error) = match lint {
        Lint::Skipped => (JsonVal::Null, JsonVal::Null),
        Lint::Done(a) => (json!(a), JsonVal::Null),
        Lint::Failed(msg) => (JsonVal::Null, json!(msg)),
    };
    json!({
        "style": detail.style,
        "id": detail.id,
        "source": detail.source,
        "description": detail.description,
        "explanation": block.map(|b| b.explanation.as_str()),
        "category": block.map(|b| b.category.as_str()),
        "example": block.map(|b| b.example.as_str()),
        "annotations": annotations,
        "lintError": lint_error,
    })
}

fn to_pretty(v: &JsonVal) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

/// Path relative to the styles root when possible.
fn display_path(file: &Path, styles_root: &Path) -> String {
    pathdiff::diff_paths(file, styles_root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleSummary;
    use std::path::PathBuf;

    fn ann(row: usize, text: &str) -> AnnotationRecord {
        AnnotationRecord {
            row,
            column: 0,
            text: text.into(),
            severity: "error".into(),
        }
    }

    #[test]
    fn test_render_example_places_annotations() {
        let out = render_example("Fine.\nUse X now.", &[ann(1, "Avoid X."), ann(7, "Far away.")], false);
        assert_eq!(
            out,
            "1 │ Fine.\n2 │ Use X now.\n    ✖ Avoid X.\n    ✖ Far away. (line 8)\n"
        );
    }

    #[test]
    fn test_compose_catalog_json_shape() {
        let page = Page {
            page: 1,
            pages: 1,
            total: 1,
            rows: vec![RuleSummary {
                id: "Terms".into(),
                style: "Acme".into(),
                description: "Use the right words.".into(),
                category: "word choice".into(),
            }],
        };
        let errors = vec![CatalogError {
            file: PathBuf::from("/styles/Acme/Bad.yml"),
            message: "bad".into(),
        }];
        let out = compose_catalog_json(&page, &errors, Path::new("/styles"));
        assert_eq!(out["rules"][0]["category"], "word choice");
        assert_eq!(out["errors"][0]["file"], "Acme/Bad.yml");
        assert_eq!(out["summary"]["errors"], 1);
    }

    #[test]
    fn test_compose_detail_json_shape() {
        let detail = RuleDetail {
            style: "Acme".into(),
            id: "Terms".into(),
            source: "extends: existence\n".into(),
            description: "D\n\ncategory: c\n\nexample:\n\nE".into(),
        };
        let block = DescriptionBlock {
            explanation: "D".into(),
            category: "c".into(),
            example: "E".into(),
        };
        let out = compose_detail_json(&detail, Some(&block), &Lint::Done(vec![ann(0, "m")]));
        assert_eq!(out["example"], "E");
        assert_eq!(out["annotations"][0]["type"], "error");
        assert!(out["lintError"].is_null());

        let out = compose_detail_json(&detail, None, &Lint::Failed("boom".into()));
        assert!(out["example"].is_null());
        assert_eq!(out["lintError"], "boom");
    }
}
