//! Pipeline stages for video-to-PDF conversion.
//!
//! Each submodule implements exactly one step with typed inputs and outputs,
//! so stage contracts can be checked (and unit-tested) without running the
//! whole pipeline.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ watermark ──▶ ocr ──▶ merge
//! VideoPath  Vec<FramePath>  (in place)  Vec<PagePdf>  output.pdf
//! ```
//!
//! 1. [`input`]     — validate the video path before anything runs
//! 2. [`extract`]   — ffmpeg `mpdecimate` into numbered frame images
//! 3. [`watermark`] — mogrify flood fill from the seed pixel, in place
//! 4. [`ocr`]       — tesseract per frame into a single-page PDF
//! 5. [`merge`]     — Ghostscript concatenation with atomic rename
//!
//! Supporting modules: [`naming`] (pure frame → page naming), [`tool`]
//! (argument-vector process execution) and [`workspace`] (per-run temp dir).

pub mod extract;
pub mod input;
pub mod merge;
pub mod naming;
pub mod ocr;
pub mod tool;
pub mod watermark;
pub mod workspace;
