//! Result types returned by a successful conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the caller gets back from [`crate::convert`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The merged, searchable PDF.
    pub output_path: PathBuf,
    /// One record per page, in output order.
    pub pages: Vec<PageRecord>,
    /// Timing and counts.
    pub stats: ConversionStats,
    /// Working directory, only when `keep_intermediates` was set.
    pub intermediates: Option<PathBuf>,
}

/// Correspondence between an output page and the frame it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-indexed page number in the output PDF.
    pub page_num: usize,
    /// Frame sequence number assigned by the extractor.
    pub frame_seq: u32,
    /// File name of the frame image.
    pub frame_file: String,
    /// File name of the per-page PDF.
    pub page_file: String,
}

/// Run statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Frames kept by the decimation filter.
    pub frames_extracted: usize,
    /// Pages in the output PDF.
    pub pages_merged: usize,
    pub extract_duration_ms: u64,
    /// Watermark removal + OCR, all frames.
    pub frames_duration_ms: u64,
    pub merge_duration_ms: u64,
    pub total_duration_ms: u64,
}
