//! Stage 4: concatenate per-page PDFs with Ghostscript.
//!
//! ```text
//! gs -dBATCH -dNOPAUSE -dSAFER -q -sDEVICE=pdfwrite -sOutputFile=<out.tmp> p1.pdf p2.pdf …
//! ```
//!
//! Ghostscript writes the output incrementally, so a crash mid-merge leaves a
//! truncated file. The merge therefore targets a sibling temp path and only a
//! successful run is renamed onto the caller's output path; a failed merge
//! removes the temp file and leaves any pre-existing output untouched.

use crate::config::ToolPaths;
use crate::error::{Stage, Vid2PdfError};
use crate::pipeline::naming::PagePdf;
use crate::pipeline::tool::ToolInvocation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sibling temp path the merge writes to before the final rename.
pub fn partial_output_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output.pdf"));
    name.push(".tmp");
    output.with_file_name(name)
}

/// Build the gs invocation merging `pages` (in order) into `target`.
pub fn merge_command(pages: &[PagePdf], target: &Path, tools: &ToolPaths) -> ToolInvocation {
    let mut output_arg = OsString::from("-sOutputFile=");
    output_arg.push(escape_gs_output(target));
    ToolInvocation::new(Stage::Combining, &tools.ghostscript, "gs")
        .args([
            "-dBATCH",
            "-dNOPAUSE",
            "-dSAFER",
            "-q",
            "-sDEVICE=pdfwrite",
        ])
        .arg(output_arg)
        .args(pages.iter().map(PagePdf::path))
}

/// Merge `pages` into `output`, preserving order.
pub async fn combine_pdfs(
    pages: &[PagePdf],
    output: &Path,
    tools: &ToolPaths,
) -> Result<(), Vid2PdfError> {
    if pages.is_empty() {
        return Err(Vid2PdfError::EmptyMergeInput);
    }

    let partial = partial_output_path(output);
    info!("Merging {} pages into {}", pages.len(), output.display());

    let merged = async {
        merge_command(pages, &partial, tools).run().await?;
        verify_pdf(&partial, output).await?;
        tokio::fs::rename(&partial, output)
            .await
            .map_err(|e| Vid2PdfError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })
    }
    .await;

    if merged.is_err() {
        remove_partial(&partial).await;
    }
    merged
}

async fn verify_pdf(partial: &Path, output: &Path) -> Result<(), Vid2PdfError> {
    let bytes = tokio::fs::read(partial)
        .await
        .map_err(|e| Vid2PdfError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
    if !bytes.starts_with(b"%PDF") {
        return Err(Vid2PdfError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "merge tool did not produce a PDF",
            ),
        });
    }
    Ok(())
}

/// Best-effort removal of a partially written output.
pub(crate) async fn remove_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", partial.display(), e),
    }
}

/// Ghostscript expands `%d` in `-sOutputFile` into a page number; a literal
/// `%` must be doubled.
fn escape_gs_output(path: &Path) -> OsString {
    match path.to_str() {
        Some(s) => OsString::from(s.replace('%', "%%")),
        None => path.as_os_str().to_os_string(),
    }
}
