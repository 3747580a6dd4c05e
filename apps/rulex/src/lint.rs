//! Lint a rule's example with the external linter and turn its alerts into
//! gutter annotations.
//!
//! The linter is reached through the [`Linter`] trait so that tests (and
//! other front ends) can swap the process for a stand-in. [`ValeCli`] is the
//! process-backed implementation:
//!
//! ```text
//! <bin> --no-exit --output=JSON --config=<configs>/<style>/.vale.ini <tmp>.md
//! ```
//!
//! Its stdout is a JSON object keyed by linted file, each value an ordered
//! list of alerts with at least `Line` (1-based) and `Message`.

use crate::error::{Result, RulexError};
use crate::models::{AnnotationRecord, LintFinding};
use serde_json::Value as Json;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// File name of a style's linter configuration.
pub const CONFIG_FILE: &str = ".vale.ini";

/// Runs the linter on a file and returns its raw JSON report.
pub trait Linter {
    fn lint(&self, target: &Path, config: &Path) -> Result<String>;
}

/// Process-backed linter.
pub struct ValeCli {
    pub bin: String,
    /// Zero waits forever.
    pub timeout: Duration,
}

impl ValeCli {
    pub fn new(bin: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            bin: bin.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn failed(&self, message: impl Into<String>) -> RulexError {
        RulexError::LinterInvocation {
            bin: self.bin.clone(),
            message: message.into(),
        }
    }
}

impl Default for ValeCli {
    fn default() -> Self {
        Self::new("vale", 30_000)
    }
}

impl Linter for ValeCli {
    fn lint(&self, target: &Path, config: &Path) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--no-exit")
            .arg("--output=JSON")
            .arg(format!("--config={}", config.display()))
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // own group, so a timeout also reaches processes the linter spawned
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        log::debug!("running {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.failed("binary not found")
            } else {
                self.failed(format!("cannot start: {e}"))
            }
        })?;
        let mut stdout = child
            .stdout
            .take()
            .map(|pipe| thread::spawn(move || read_pipe(pipe)));
        let mut stderr = child
            .stderr
            .take()
            .map(|pipe| thread::spawn(move || read_pipe(pipe)));

        let status = if self.timeout.is_zero() {
            child.wait().map_err(|e| self.failed(format!("wait failed: {e}")))?
        } else {
            let start = Instant::now();
            loop {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|e| self.failed(format!("wait failed: {e}")))?
                {
                    break status;
                }
                if start.elapsed() >= self.timeout {
                    kill_tree(&mut child);
                    // readers are detached; a surviving holder of the pipes must not block us
                    drop(stdout.take());
                    drop(stderr.take());
                    return Err(RulexError::Timeout {
                        bin: self.bin.clone(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
        };

        let out = join_pipe(stdout.take()).map_err(|e| self.failed(e))?;
        let err = join_pipe(stderr.take()).map_err(|e| self.failed(e))?;
        if !status.success() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(self.failed(format!("exit status {code}: {}", err.trim())));
        }
        if !err.trim().is_empty() {
            log::debug!("{} stderr: {}", self.bin, err.trim());
        }
        Ok(out)
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: kill(2) with a negative pid signals the group the child leads.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_pipe<R: Read>(mut pipe: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn join_pipe(
    handle: Option<thread::JoinHandle<std::io::Result<String>>>,
) -> std::result::Result<String, String> {
    match handle {
        Some(h) => match h.join() {
            Ok(res) => res.map_err(|e| format!("failed to read output: {e}")),
            Err(_) => Err("output reader thread panicked".to_string()),
        },
        None => Ok(String::new()),
    }
}

/// Lints example text for a style and produces annotations.
pub struct Annotator<L: Linter> {
    pub configs_root: PathBuf,
    pub linter: L,
}

impl<L: Linter> Annotator<L> {
    pub fn new(configs_root: impl Into<PathBuf>, linter: L) -> Self {
        Self {
            configs_root: configs_root.into(),
            linter,
        }
    }

    /// `<configs_root>/<style>/.vale.ini`
    pub fn config_path(&self, style: &str) -> PathBuf {
        self.configs_root.join(style).join(CONFIG_FILE)
    }

    /// Lint `example` and return the raw findings, in report order.
    ///
    /// The example is written to a fresh `.md` temp file that is removed
    /// before this returns, on success and failure alike.
    pub fn findings(&self, example: &str, style: &str) -> Result<Vec<LintFinding>> {
        let config = self.config_path(style);
        if !config.exists() {
            log::warn!("no linter config for style '{}' at {}", style, config.display());
        }
        let mut tmp = tempfile::Builder::new()
            .prefix("rulex-")
            .suffix(".md")
            .tempfile()
            .map_err(|e| RulexError::io(std::env::temp_dir(), e))?;
        let tmp_path = tmp.path().to_path_buf();
        tmp.write_all(example.as_bytes())
            .map_err(|e| RulexError::io(&tmp_path, e))?;
        tmp.flush().map_err(|e| RulexError::io(&tmp_path, e))?;
        let report = self.linter.lint(tmp.path(), &config)?;
        parse_findings(&report)
    }

    /// Lint `example` and map each finding to an annotation.
    pub fn annotate(&self, example: &str, style: &str) -> Result<Vec<AnnotationRecord>> {
        Ok(to_annotations(&self.findings(example, style)?))
    }
}

/// Parse the linter's JSON report, flattening all files in order.
pub fn parse_findings(report: &str) -> Result<Vec<LintFinding>> {
    let doc: Json = serde_json::from_str(report).map_err(|e| RulexError::MalformedFinding {
        index: 0,
        message: format!("output is not JSON: {e}"),
    })?;
    let files = doc.as_object().ok_or_else(|| RulexError::MalformedFinding {
        index: 0,
        message: "expected an object keyed by file".to_string(),
    })?;

    let mut out = Vec::new();
    for (file, alerts) in files {
        let alerts = alerts.as_array().ok_or_else(|| RulexError::MalformedFinding {
            index: out.len(),
            message: format!("alerts for '{file}' are not a list"),
        })?;
        for alert in alerts {
            let finding = parse_alert(alert, out.len())?;
            out.push(finding);
        }
    }
    Ok(out)
}

fn parse_alert(alert: &Json, index: usize) -> Result<LintFinding> {
    let bad = |message: &str| RulexError::MalformedFinding {
        index,
        message: message.to_string(),
    };
    let line = alert
        .get("Line")
        .ok_or_else(|| bad("missing 'Line'"))?
        .as_u64()
        .filter(|&l| l >= 1)
        .ok_or_else(|| bad("'Line' must be a positive integer"))?;
    let message = alert
        .get("Message")
        .ok_or_else(|| bad("missing 'Message'"))?
        .as_str()
        .ok_or_else(|| bad("'Message' must be a string"))?;
    let span = alert.get("Span").and_then(Json::as_array).and_then(|s| {
        match (s.first()?.as_u64(), s.get(1)?.as_u64()) {
            (Some(a), Some(b)) => Some((a as usize, b as usize)),
            _ => None,
        }
    });
    Ok(LintFinding {
        line: line as usize,
        message: message.to_string(),
        check: alert.get("Check").and_then(Json::as_str).map(str::to_string),
        severity: alert.get("Severity").and_then(Json::as_str).map(str::to_string),
        span,
    })
}

/// One annotation per finding, same order.
pub fn to_annotations(findings: &[LintFinding]) -> Vec<AnnotationRecord> {
    findings.iter().map(AnnotationRecord::from).collect()
}
