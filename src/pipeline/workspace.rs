//! Per-run working directory.
//!
//! Backed by [`tempfile::TempDir`], so the directory and everything in it is
//! removed when the [`Workspace`] is dropped: on success, on error return,
//! on cancellation, and on panic unwinding. The only way to keep it is
//! [`Workspace::persist`], which the controller calls for successful runs
//! with `keep_intermediates` set.

use crate::error::Vid2PdfError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Exclusive working directory for one pipeline run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh `vid2pdf-XXXXXX` directory under `parent`
    /// (or the system temp dir).
    pub fn create(parent: Option<&Path>) -> Result<Self, Vid2PdfError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vid2pdf-");
        let dir = match parent {
            Some(p) => builder.tempdir_in(p),
            None => builder.tempdir(),
        }
        .map_err(|e| Vid2PdfError::WorkspaceFailed {
            parent: parent
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir),
            source: e,
        })?;
        debug!("Working directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk and return its path.
    pub fn persist(self) -> PathBuf {
        self.dir.keep()
    }

    /// Remove the directory now, logging rather than failing on error.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove working directory {}: {}", path.display(), e);
        }
    }
}
