//! Configuration types for video-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the classic
//! one-liner pipeline (`mpdecimate`, 20 % white flood fill from the top-left
//! pixel, default OCR language, Ghostscript merge) but every constant that
//! shapes the output is an explicit field here rather than a buried literal.

use crate::cancel::CancellationToken;
use crate::error::Vid2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a video-to-PDF conversion.
///
/// # Example
/// ```rust
/// use vid2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .fuzz_percent(25.0)
///     .concurrency(4)
///     .language("eng")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Naming of the extracted frame files.
    pub frame_pattern: FramePattern,

    /// ffmpeg video filter used for frame decimation. Default: `mpdecimate`.
    ///
    /// `mpdecimate` drops frames that differ from their predecessor by less
    /// than its internal threshold, which for screen recordings and slide
    /// videos leaves roughly one frame per distinct page.
    pub decimate_filter: String,

    /// Flood-fill watermark removal settings.
    pub watermark: WatermarkConfig,

    /// OCR engine settings.
    pub ocr: OcrConfig,

    /// Paths (or bare names resolved via PATH) of the external tools.
    pub tools: ToolPaths,

    /// Number of frames processed at once during the watermark + OCR stage. Default: 1.
    ///
    /// Frames are independent, so raising this is safe: pages are re-sorted
    /// into extraction order before merging.
    pub concurrency: usize,

    /// Keep the working directory (frames and per-page PDFs) after a successful run. Default: false.
    pub keep_intermediates: bool,

    /// Parent directory for the per-run working directory. Default: system temp dir.
    pub work_dir: Option<PathBuf>,

    /// Overall deadline for the run in seconds. Default: none.
    pub timeout_secs: Option<u64>,

    /// External cancellation handle.
    pub cancellation: Option<CancellationToken>,

    /// Per-frame progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            frame_pattern: FramePattern::default(),
            decimate_filter: "mpdecimate".to_string(),
            watermark: WatermarkConfig::default(),
            ocr: OcrConfig::default(),
            tools: ToolPaths::default(),
            concurrency: 1,
            keep_intermediates: false,
            work_dir: None,
            timeout_secs: None,
            cancellation: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("frame_pattern", &self.frame_pattern)
            .field("decimate_filter", &self.decimate_filter)
            .field("watermark", &self.watermark)
            .field("ocr", &self.ocr)
            .field("tools", &self.tools)
            .field("concurrency", &self.concurrency)
            .field("keep_intermediates", &self.keep_intermediates)
            .field("work_dir", &self.work_dir)
            .field("timeout_secs", &self.timeout_secs)
            .field("cancellation", &self.cancellation.as_ref().map(|t| t.is_cancelled()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn frame_pattern(mut self, pattern: FramePattern) -> Self {
        self.config.frame_pattern = pattern;
        self
    }

    pub fn decimate_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.decimate_filter = filter.into();
        self
    }

    pub fn watermark(mut self, watermark: WatermarkConfig) -> Self {
        self.config.watermark = watermark;
        self
    }

    pub fn remove_watermark(mut self, enabled: bool) -> Self {
        self.config.watermark.enabled = enabled;
        self
    }

    pub fn fuzz_percent(mut self, pct: f32) -> Self {
        self.config.watermark.fuzz_percent = pct;
        self
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.config.watermark.fill_color = color.into();
        self
    }

    pub fn seed(mut self, x: u32, y: u32) -> Self {
        self.config.watermark.seed = (x, y);
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = Some(lang.into());
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn keep_intermediates(mut self, v: bool) -> Self {
        self.config.keep_intermediates = v;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.config.cancellation = Some(token);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Vid2PdfError> {
        let c = &self.config;
        c.frame_pattern.validate()?;
        if c.decimate_filter.trim().is_empty() {
            return Err(Vid2PdfError::InvalidConfig(
                "decimate filter must not be empty".into(),
            ));
        }
        let fuzz = c.watermark.fuzz_percent;
        if !fuzz.is_finite() || !(0.0..=100.0).contains(&fuzz) {
            return Err(Vid2PdfError::InvalidConfig(format!(
                "fuzz must be 0–100 %, got {fuzz}"
            )));
        }
        if c.watermark.fill_color.trim().is_empty() {
            return Err(Vid2PdfError::InvalidConfig(
                "fill colour must not be empty".into(),
            ));
        }
        if let Some(ref lang) = c.ocr.language {
            let valid = !lang.is_empty()
                && lang
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '+');
            if !valid {
                return Err(Vid2PdfError::InvalidConfig(format!(
                    "OCR language must look like 'eng' or 'eng+deu', got '{lang}'"
                )));
            }
        }
        if c.concurrency == 0 {
            return Err(Vid2PdfError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.timeout_secs == Some(0) {
            return Err(Vid2PdfError::InvalidConfig(
                "timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Sub-configs ──────────────────────────────────────────────────────────

/// Filename pattern for extracted frames: `{prefix}{seq:0digits}.{extension}`.
///
/// The fixed-width numeral keeps lexical and numeric order identical, which
/// is what the decimation tool's `%0Nd` template produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePattern {
    /// Filename prefix. Default: `frame_`.
    pub prefix: String,
    /// Zero-padded width of the sequence number. Default: 6.
    pub digits: usize,
    /// Image extension without the dot. Default: `png`.
    pub extension: String,
    /// First sequence number written. Default: 1.
    pub start_number: u32,
}

impl Default for FramePattern {
    fn default() -> Self {
        Self {
            prefix: "frame_".to_string(),
            digits: 6,
            extension: "png".to_string(),
            start_number: 1,
        }
    }
}

impl FramePattern {
    fn validate(&self) -> Result<(), Vid2PdfError> {
        let bad_prefix = self.prefix.is_empty()
            || self.prefix.contains(['/', '\\', '%'])
            || self.prefix.contains(std::path::MAIN_SEPARATOR);
        if bad_prefix {
            return Err(Vid2PdfError::InvalidConfig(format!(
                "frame prefix must be a non-empty plain file name, got '{}'",
                self.prefix
            )));
        }
        if !(1..=12).contains(&self.digits) {
            return Err(Vid2PdfError::InvalidConfig(format!(
                "frame digits must be 1–12, got {}",
                self.digits
            )));
        }
        let ext_ok = !self.extension.is_empty()
            && self.extension.chars().all(|c| c.is_ascii_alphanumeric())
            && !self.extension.eq_ignore_ascii_case("pdf");
        if !ext_ok {
            return Err(Vid2PdfError::InvalidConfig(format!(
                "frame extension must be an alphanumeric image extension, got '{}'",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Flood-fill watermark removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Run the stage at all. Default: true.
    pub enabled: bool,
    /// Colour distance tolerated by the flood fill, in percent. Default: 20.
    pub fuzz_percent: f32,
    /// Fill colour as understood by ImageMagick. Default: `white`.
    pub fill_color: String,
    /// Flood-fill origin pixel `(x, y)`. Default: `(0, 0)`.
    ///
    /// The pixel must lie in the background region the overlay sits on;
    /// if it does not, the fill silently paints the wrong region.
    pub seed: (u32, u32),
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fuzz_percent: 20.0,
            fill_color: "white".to_string(),
            seed: (0, 0),
        }
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`. None = engine default.
    pub language: Option<String>,
}

/// External tool binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub mogrify: PathBuf,
    pub tesseract: PathBuf,
    pub ghostscript: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            mogrify: PathBuf::from("mogrify"),
            tesseract: PathBuf::from("tesseract"),
            ghostscript: PathBuf::from(if cfg!(windows) { "gswin64c" } else { "gs" }),
        }
    }
}
