//! Error taxonomy shared by the catalog, detail, and lint passes.
//!
//! Every variant names the file or process it concerns so that callers can
//! print it as-is.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulexError {
    /// A rule file or styles directory does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A rule file is not valid YAML, or has the wrong shape.
    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The `description` field lacks the category/example markers.
    #[error("{}: malformed description: {reason}", path.display())]
    MalformedDescription { path: PathBuf, reason: String },

    /// The linter binary could not be started or exited with a failure.
    #[error("linter '{bin}' failed: {message}")]
    LinterInvocation { bin: String, message: String },

    /// The linter did not exit within the configured budget.
    #[error("linter '{bin}' timed out after {timeout_ms}ms")]
    Timeout { bin: String, timeout_ms: u64 },

    /// The linter output was not the expected JSON shape.
    #[error("malformed linter output (finding #{index}): {message}")]
    MalformedFinding { index: usize, message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RulexError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io { path, source }
    }

    /// The file this error points at, when there is one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::NotFound { path }
            | Self::Parse { path, .. }
            | Self::MalformedDescription { path, .. }
            | Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RulexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = RulexError::io(
            "styles/Foo/bar.yml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, RulexError::NotFound { .. }));
        assert_eq!(err.to_string(), "not found: styles/Foo/bar.yml");
    }

    #[test]
    fn messages_name_the_offender() {
        let err = RulexError::Timeout {
            bin: "vale".into(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "linter 'vale' timed out after 250ms");
        assert!(err.path().is_none());

        let err = RulexError::parse("a/b.yml", "expected a mapping");
        assert_eq!(err.to_string(), "a/b.yml: expected a mapping");
        assert_eq!(err.path().map(|p| p.to_string_lossy().to_string()), Some("a/b.yml".into()));
    }
}
