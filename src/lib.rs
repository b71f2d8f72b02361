//! # vid2pdf
//!
//! Turn a screen recording or slide video into a text-searchable PDF.
//!
//! ## Why this crate?
//!
//! Lecture captures and recorded slide decks hold documents that only exist
//! as video. Stepping through them frame by frame is slow and their text
//! cannot be searched. This crate keeps only the visually distinct frames,
//! cleans a faint overlay watermark off each one, OCRs every frame into a
//! searchable page, and stitches the pages into one PDF.
//!
//! All heavy lifting is done by well-known external tools; this crate owns
//! the sequencing, the temporary files, page ordering, cancellation and
//! error reporting.
//!
//! ## Pipeline Overview
//!
//! ```text
//! video
//!  │
//!  ├─ 1. Extract    ffmpeg -vf mpdecimate → frame_000001.png …
//!  ├─ 2. Watermark  mogrify flood fill from (0,0), in place
//!  ├─ 3. OCR        tesseract → frame_000001.pdf … (text layer over image)
//!  └─ 4. Merge      gs pdfwrite → output.pdf (atomic rename)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vid2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("lecture.mp4", "lecture.pdf", &config).await?;
//!     eprintln!("{} pages in {}ms",
//!         output.stats.pages_merged,
//!         output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vid2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Required tools
//!
//! | Stage | Binary | Package |
//! |-------|--------|---------|
//! | Extract | `ffmpeg` | ffmpeg |
//! | Watermark | `mogrify` | imagemagick |
//! | OCR | `tesseract` | tesseract-ocr |
//! | Merge | `gs` | ghostscript |
//!
//! [`check_tools`] probes all four without running a conversion.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancellationToken;
pub use config::{
    ConversionConfig, ConversionConfigBuilder, FramePattern, OcrConfig, ToolPaths,
    WatermarkConfig,
};
pub use convert::{convert, convert_sync};
pub use error::{ErrorKind, Stage, Vid2PdfError};
pub use output::{ConversionOutput, ConversionStats, PageRecord};
pub use pipeline::naming::{page_pdf_name, page_pdf_path, FramePath, PagePdf};
pub use pipeline::tool::{check_tools, ToolStatus};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
