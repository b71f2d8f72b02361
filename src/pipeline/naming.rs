//! Frame and page naming.
//!
//! Every artifact's name is a pure function of its sequence number, so stage 4
//! can recover which page came from which frame without any shared state:
//!
//! ```text
//! frame_000001.png ──▶ frame_000001.pdf
//! frame_000002.png ──▶ frame_000002.pdf
//! ```

use crate::config::FramePattern;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// An extracted frame image on disk, tagged with its sequence number.
///
/// Ordering is by sequence number first, so sorting a `Vec<FramePath>`
/// restores extraction order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FramePath {
    seq: u32,
    path: PathBuf,
}

impl FramePath {
    pub fn new(seq: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            seq,
            path: path.into(),
        }
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where this frame's single-page PDF lives.
    pub fn page_pdf(&self) -> PagePdf {
        PagePdf {
            seq: self.seq,
            path: page_pdf_path(&self.path),
        }
    }
}

/// A single-page searchable PDF produced from one frame.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PagePdf {
    seq: u32,
    path: PathBuf,
}

impl PagePdf {
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Derive the per-page PDF path from a frame path by swapping the extension.
///
/// Idempotent: feeding a `.pdf` path back in returns it unchanged.
pub fn page_pdf_path(frame: &Path) -> PathBuf {
    frame.with_extension("pdf")
}

/// File-name-only variant of [`page_pdf_path`].
pub fn page_pdf_name(frame: &FramePath) -> String {
    frame
        .page_pdf()
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FramePattern {
    /// printf-style template handed to the decimation tool, e.g. `frame_%06d.png`.
    pub fn template(&self) -> String {
        format!("{}%0{}d.{}", self.prefix, self.digits, self.extension)
    }

    /// Concrete file name for a sequence number.
    pub fn file_name(&self, seq: u32) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            seq,
            self.extension,
            width = self.digits
        )
    }

    /// Recover the sequence number from a file name, or `None` if the name
    /// was not produced by this pattern.
    pub fn parse_seq(&self, file_name: &str) -> Option<u32> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?;
        let (digits, ext) = rest.rsplit_once('.')?;
        if ext != self.extension || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let seq = digits.parse().ok()?;
        // Only names this pattern would have written: same padding, no extra zeros.
        (self.file_name(seq) == file_name).then_some(seq)
    }
}
