//! Rulex core library.
//!
//! This crate exposes programmatic APIs for browsing Vale styles: building a
//! rule catalog, loading a single rule for display, and linting a rule's
//! example into line annotations.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `catalog`: One summary row per rule file under the styles root.
//! - `description`: Parser for a rule's explanation/category/example text.
//! - `detail`: A selected rule's source and description.
//! - `emit`: Re-writes rule sources with fixed indentation, keeping quoting and comments.
//! - `lint`: Linter invocation and finding-to-annotation mapping.
//! - `table`: Sorting, filtering, and paging of catalog rows.
//! - `models`: Data models shared by the passes and printers.
//! - `output`: Human/JSON printers.
//! - `error`: Error taxonomy.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod description;
pub mod detail;
pub mod emit;
pub mod error;
pub mod lint;
pub mod models;
pub mod output;
pub mod table;

pub use error::{Result, RulexError};
