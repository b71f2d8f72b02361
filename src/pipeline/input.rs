//! Input validation: make sure the video is a readable regular file before
//! any external tool is started.
//!
//! ffmpeg reports a missing input as a generic non-zero exit buried in a wall
//! of stderr. Checking up front turns that into a precise IO-class error and
//! guarantees no working directory or child process exists for a run that
//! could never succeed.

use crate::error::Vid2PdfError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A video path that existed and was readable at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPath(PathBuf);

impl VideoPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Validate the input video path.
pub fn resolve_video(path: &Path) -> Result<VideoPath, Vid2PdfError> {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Vid2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Vid2PdfError::VideoNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if !meta.is_file() {
        return Err(Vid2PdfError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open
    if let Err(e) = std::fs::File::open(path) {
        return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
            Vid2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Vid2PdfError::VideoNotFound {
                path: path.to_path_buf(),
            }
        });
    }

    debug!("Resolved input video: {}", path.display());
    Ok(VideoPath(path.to_path_buf()))
}

/// Check that the output PDF can be written: the path is not a directory,
/// and its parent is an existing, writable directory.
///
/// The file itself need not exist. Done before extraction so a typo in the
/// output path does not cost a full OCR pass.
pub fn check_output_parent(output: &Path) -> Result<(), Vid2PdfError> {
    let write_failed = |source: std::io::Error| Vid2PdfError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    };

    if output.is_dir() {
        return Err(write_failed(std::io::Error::new(
            std::io::ErrorKind::IsADirectory,
            "output path is a directory",
        )));
    }

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match std::fs::metadata(parent) {
        Ok(m) if m.is_dir() => {}
        Ok(_) => {
            return Err(write_failed(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("'{}' is not a directory", parent.display()),
            )));
        }
        Err(e) => return Err(write_failed(e)),
    }

    // Mode bits miss ACLs and read-only mounts; try a real write instead.
    tempfile::Builder::new()
        .prefix(".vid2pdf-probe-")
        .tempfile_in(parent)
        .map_err(write_failed)?;
    debug!("Output directory is writable: {}", parent.display());
    Ok(())
}
