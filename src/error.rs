//! Error types for the vid2pdf library.
//!
//! A run is all-or-nothing: there is no per-page partial success, so a single
//! [`Vid2PdfError`] covers every failure. Each variant knows which pipeline
//! [`Stage`] it came from and which broad [`ErrorKind`] it belongs to, so the
//! CLI can print one terminal message naming the failing stage and tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage, used to label errors and progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Validating inputs and creating the working directory.
    Init,
    /// Frame decimation / extraction.
    Extracting,
    /// Per-frame flood-fill watermark removal.
    Watermark,
    /// Per-frame OCR into single-page PDFs.
    Ocr,
    /// Concatenation of the per-page PDFs.
    Combining,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Extracting => "frame extraction",
            Stage::Watermark => "watermark removal",
            Stage::Ocr => "OCR",
            Stage::Combining => "PDF merge",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`Vid2PdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// External process failed to start or exited non-zero.
    ToolInvocation,
    /// A stage produced zero outputs where at least one was required.
    EmptyResult,
    /// Unreadable input, unwritable output, disk exhaustion.
    Io,
    /// A per-page PDF could not be matched to its source frame.
    Correspondence,
    /// Run was cancelled or hit its deadline.
    Cancelled,
    /// Builder validation failed.
    Config,
    /// Unexpected internal error.
    Internal,
}

/// All errors returned by the vid2pdf library.
#[derive(Debug, Error)]
pub enum Vid2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input video was not found at the given path.
    #[error("Video file not found: '{path}'\nCheck the path exists and is readable.")]
    VideoNotFound { path: PathBuf },

    /// Process does not have read permission on the video.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input path exists but is a directory or other non-regular file.
    #[error("'{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The external binary could not be found on PATH.
    #[error("[{stage}] '{tool}' was not found. Install it or point --{flag} at the binary.")]
    ToolNotFound {
        stage: Stage,
        tool: String,
        flag: &'static str,
    },

    /// The external binary exists but could not be started.
    #[error("[{stage}] failed to start '{tool}': {source}")]
    ToolSpawnFailed {
        stage: Stage,
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external binary exited with a non-zero status.
    #[error("[{stage}] '{tool}' exited with {}{}", exit_label(.exit_code), stderr_suffix(.stderr))]
    ToolFailed {
        stage: Stage,
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// OCR engine exited cleanly but its stdout was not a PDF.
    #[error("[OCR] '{tool}' produced no PDF for '{frame}' (got {len} bytes)")]
    InvalidOcrOutput {
        tool: String,
        frame: PathBuf,
        len: usize,
    },

    // ── Empty results ─────────────────────────────────────────────────────
    /// Frame decimation wrote no images.
    #[error("[frame extraction] no frames were extracted from '{video}'\nThe file may be corrupt, empty, or use an unsupported codec.")]
    NoFramesExtracted { video: PathBuf },

    /// The combiner was asked to merge zero documents.
    #[error("[PDF merge] refusing to merge an empty list of pages")]
    EmptyMergeInput,

    // ── Invariant violations ──────────────────────────────────────────────
    /// Per-page PDFs do not line up 1:1 with the extracted frames.
    #[error("[PDF merge] page/frame correspondence broken: {detail}")]
    CorrespondenceMismatch { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the per-run working directory.
    #[error("[init] failed to create working directory under '{parent}': {source}")]
    WorkspaceFailed {
        parent: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or move the output PDF into place.
    #[error("[PDF merge] failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other filesystem error inside a stage.
    #[error("[{stage}] I/O error on '{path}': {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Cancellation ──────────────────────────────────────────────────────
    /// The caller cancelled the run.
    #[error("[{stage}] run cancelled")]
    Cancelled { stage: Stage },

    /// The run exceeded its configured deadline.
    #[error("[{stage}] run exceeded its {secs}s deadline")]
    TimedOut { stage: Stage, secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Vid2PdfError {
    /// Broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        use Vid2PdfError::*;
        match self {
            ToolNotFound { .. } | ToolSpawnFailed { .. } | ToolFailed { .. } => {
                ErrorKind::ToolInvocation
            }
            NoFramesExtracted { .. } | EmptyMergeInput => ErrorKind::EmptyResult,
            VideoNotFound { .. }
            | PermissionDenied { .. }
            | NotAFile { .. }
            | InvalidOcrOutput { .. }
            | WorkspaceFailed { .. }
            | OutputWriteFailed { .. }
            | Io { .. } => ErrorKind::Io,
            CorrespondenceMismatch { .. } => ErrorKind::Correspondence,
            Cancelled { .. } | TimedOut { .. } => ErrorKind::Cancelled,
            InvalidConfig(_) => ErrorKind::Config,
            Internal(_) => ErrorKind::Internal,
        }
    }

    /// The pipeline stage the error originated in, if any.
    pub fn stage(&self) -> Option<Stage> {
        use Vid2PdfError::*;
        match self {
            VideoNotFound { .. }
            | PermissionDenied { .. }
            | NotAFile { .. }
            | WorkspaceFailed { .. } => Some(Stage::Init),
            ToolNotFound { stage, .. }
            | ToolSpawnFailed { stage, .. }
            | ToolFailed { stage, .. }
            | Io { stage, .. }
            | Cancelled { stage }
            | TimedOut { stage, .. } => Some(*stage),
            InvalidOcrOutput { .. } => Some(Stage::Ocr),
            NoFramesExtracted { .. } => Some(Stage::Extracting),
            EmptyMergeInput | CorrespondenceMismatch { .. } | OutputWriteFailed { .. } => {
                Some(Stage::Combining)
            }
            InvalidConfig(_) | Internal(_) => None,
        }
    }

    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Vid2PdfError::Io {
            stage,
            path: path.into(),
            source,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (killed by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Library-wide result alias.
pub type Result<T> = std::result::Result<T, Vid2PdfError>;
