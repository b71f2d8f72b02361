//! Progress-callback trait for per-frame conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The CLI uses this to
//! drive an indicatif progress bar; library users can forward events to a
//! channel, a log, or a UI.
//!
//! # Example
//!
//! ```rust
//! use vid2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_frame_complete(&self, seq: u32, total_frames: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("frame {seq} done ({done}/{total_frames})");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Stage;
use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes a video.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `concurrency > 1`, `on_frame_start` and `on_frame_complete` may be
/// called concurrently and out of sequence order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the decimation tool has finished and frames are counted.
    fn on_frames_extracted(&self, total_frames: usize) {
        let _ = total_frames;
    }

    /// Called before watermark removal of a frame.
    ///
    /// # Arguments
    /// * `seq`          — frame sequence number as written by the extractor
    /// * `total_frames` — number of extracted frames
    fn on_frame_start(&self, seq: u32, total_frames: usize) {
        let _ = (seq, total_frames);
    }

    /// Called when a frame's per-page PDF has been written.
    fn on_frame_complete(&self, seq: u32, total_frames: usize) {
        let _ = (seq, total_frames);
    }

    /// Called once after the output PDF has been moved into place.
    fn on_conversion_complete(&self, output: &Path, pages: usize) {
        let _ = (output, pages);
    }

    /// Called once if the run fails, before the workspace is removed.
    fn on_conversion_failed(&self, stage: Option<Stage>, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
