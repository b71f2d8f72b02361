//! Stage 3: per-frame OCR into a single-page searchable PDF.
//!
//! Tesseract's `pdf` config renders the input image as the page and places
//! the recognised words as an invisible text layer on top. Passing `stdout`
//! as the output base streams the PDF bytes back to us instead of letting
//! tesseract choose a file name, so the page path stays a pure function of
//! the frame path ([`crate::pipeline::naming::page_pdf_path`]).
//!
//! A frame with no recognisable text still yields a valid page.

use crate::config::{OcrConfig, ToolPaths};
use crate::error::{Stage, Vid2PdfError};
use crate::pipeline::naming::{FramePath, PagePdf};
use crate::pipeline::tool::ToolInvocation;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Build the tesseract invocation for one frame.
pub fn ocr_command(frame: &FramePath, ocr: &OcrConfig, tools: &ToolPaths) -> ToolInvocation {
    let mut cmd = ToolInvocation::new(Stage::Ocr, &tools.tesseract, "tesseract")
        .arg(frame.path())
        .arg("stdout");
    if let Some(ref lang) = ocr.language {
        cmd = cmd.arg("-l").arg(lang);
    }
    cmd.arg("pdf")
}

/// OCR one frame and persist its page PDF next to it.
pub async fn ocr_frame(
    frame: &FramePath,
    ocr: &OcrConfig,
    tools: &ToolPaths,
) -> Result<PagePdf, Vid2PdfError> {
    let cmd = ocr_command(frame, ocr, tools);
    let output = cmd.run().await?;

    if !output.stdout.starts_with(PDF_MAGIC) {
        return Err(Vid2PdfError::InvalidOcrOutput {
            tool: cmd.tool_name(),
            frame: frame.path().to_path_buf(),
            len: output.stdout.len(),
        });
    }

    let page = frame.page_pdf();
    tokio::fs::write(page.path(), &output.stdout)
        .await
        .map_err(|e| Vid2PdfError::io(Stage::Ocr, page.path(), e))?;
    debug!(
        "OCR frame {} → {} ({} bytes)",
        frame.seq(),
        page.path().display(),
        output.stdout.len()
    );
    Ok(page)
}
