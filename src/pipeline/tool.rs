//! External tool invocation.
//!
//! Every external command is built as an argument vector and executed
//! directly, never through a shell, so paths with spaces or metacharacters
//! reach the tool verbatim. Children are spawned with `kill_on_drop(true)`:
//! when the run controller abandons a stage (cancellation, deadline, sibling
//! frame failure) the future is dropped and the process is killed with it.

use crate::config::ToolPaths;
use crate::error::{Stage, Vid2PdfError};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Max bytes of stderr kept in [`Vid2PdfError::ToolFailed`].
const STDERR_LIMIT: usize = 600;

/// A fully-specified external command, ready to run.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    stage: Stage,
    program: PathBuf,
    flag: &'static str,
    args: Vec<OsString>,
}

/// Captured output of a successful invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolInvocation {
    /// `flag` names the CLI option that overrides this binary, for error hints.
    pub fn new(stage: Stage, program: &Path, flag: &'static str) -> Self {
        Self {
            stage,
            program: program.to_path_buf(),
            flag,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn argv(&self) -> &[OsString] {
        &self.args
    }

    /// Short name used in messages: the program's file name.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Run to completion, failing on spawn errors and non-zero exit.
    pub async fn run(&self) -> Result<ToolOutput, Vid2PdfError> {
        debug!(
            "[{}] {} {:?}",
            self.stage,
            self.program.display(),
            self.args
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(Vid2PdfError::ToolFailed {
                stage: self.stage,
                tool: self.tool_name(),
                exit_code: output.status.code(),
                stderr: truncate_stderr(&stderr),
            });
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    fn spawn_error(&self, e: std::io::Error) -> Vid2PdfError {
        if e.kind() == std::io::ErrorKind::NotFound {
            Vid2PdfError::ToolNotFound {
                stage: self.stage,
                tool: self.program.display().to_string(),
                flag: self.flag,
            }
        } else {
            Vid2PdfError::ToolSpawnFailed {
                stage: self.stage,
                tool: self.tool_name(),
                source: e,
            }
        }
    }
}

/// Keep the tail of stderr: tools print their actual error last.
fn truncate_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_LIMIT {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_LIMIT;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("\u{2026}{}", &trimmed[start..])
}

// ── Tool availability ────────────────────────────────────────────────────

/// Result of probing one external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    /// Role of the tool in the pipeline.
    pub stage: Stage,
    pub program: PathBuf,
    /// First line of the tool's version banner, if it ran.
    pub version: Option<String>,
    /// Why the probe failed, if it did.
    pub error: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// Probe every configured tool with its version flag.
///
/// Never fails as a whole: each tool's outcome is reported individually so
/// the caller can list everything that is missing at once.
pub async fn check_tools(tools: &ToolPaths) -> Vec<ToolStatus> {
    let probes = [
        (Stage::Extracting, &tools.ffmpeg, "ffmpeg", "-version"),
        (Stage::Watermark, &tools.mogrify, "mogrify", "-version"),
        (Stage::Ocr, &tools.tesseract, "tesseract", "--version"),
        (Stage::Combining, &tools.ghostscript, "gs", "--version"),
    ];

    let mut statuses = Vec::with_capacity(probes.len());
    for (stage, program, flag, version_arg) in probes {
        let inv = ToolInvocation::new(stage, program, flag).arg(version_arg);
        let status = match inv.run().await {
            Ok(out) => {
                // tesseract historically prints its banner on stderr
                let text = if out.stdout.is_empty() {
                    out.stderr
                } else {
                    String::from_utf8_lossy(&out.stdout).into_owned()
                };
                ToolStatus {
                    stage,
                    program: program.clone(),
                    version: text.lines().next().map(|l| l.trim().to_string()),
                    error: None,
                }
            }
            Err(e) => ToolStatus {
                stage,
                program: program.clone(),
                version: None,
                error: Some(e.to_string()),
            },
        };
        statuses.push(status);
    }
    statuses
}
