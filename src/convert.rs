//! Run controller: drives the four stages for one video.
//!
//! ```text
//! Init ─▶ Extracting ─▶ PerFrame(Watermark ─▶ Ocr)* ─▶ Combining ─▶ Done
//!   └──────────┴────────────────┴──────────────────────────┴──▶ Failed
//! ```
//!
//! Any stage error, a cancellation, or the deadline moves the run to
//! `Failed`: the working directory is removed (dropping the [`Workspace`]
//! does that) and no output PDF is left behind. There is no retry and no
//! resumption; a failed run is restarted from scratch.

use crate::config::ConversionConfig;
use crate::error::{Stage, Vid2PdfError};
use crate::output::{ConversionOutput, ConversionStats, PageRecord};
use crate::pipeline::naming::{FramePath, PagePdf};
use crate::pipeline::workspace::Workspace;
use crate::pipeline::{extract, input, merge, ocr, watermark};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert a video into a single text-searchable PDF.
///
/// # Arguments
/// * `video`  — readable video file
/// * `output` — where to write the PDF; the parent directory must exist
/// * `config` — conversion configuration
///
/// # Errors
/// Any stage failure, an empty extraction, cancellation, or the deadline.
/// On error no file exists at `output` that was written by this run.
pub async fn convert(
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Vid2PdfError> {
    let video = video.as_ref();
    let output = output.as_ref();
    info!("Starting conversion: {} → {}", video.display(), output.display());

    let tracker = StageTracker::new();
    let result = run_with_limits(video, output, config, &tracker).await;

    if let Err(ref e) = result {
        warn!("Conversion failed: {}", e);
        if let Some(ref cb) = config.progress_callback {
            cb.on_conversion_failed(e.stage(), &e.to_string());
        }
    }
    result
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Vid2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Vid2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(video, output, config))
}

enum Interrupt {
    Cancelled,
    Deadline(u64),
}

/// Race the pipeline against the cancellation token and the deadline.
async fn run_with_limits(
    video: &Path,
    output: &Path,
    config: &ConversionConfig,
    tracker: &StageTracker,
) -> Result<ConversionOutput, Vid2PdfError> {
    if config.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
        return Err(Vid2PdfError::Cancelled { stage: Stage::Init });
    }

    let cancelled = async {
        match config.cancellation {
            Some(ref token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };
    let deadline = async {
        match config.timeout_secs {
            Some(secs) => {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                secs
            }
            None => std::future::pending().await,
        }
    };

    let interrupt = tokio::select! {
        result = run_pipeline(video, output, config, tracker) => return result,
        _ = cancelled => Interrupt::Cancelled,
        secs = deadline => Interrupt::Deadline(secs),
    };

    // The pipeline future is gone: its children were killed and its
    // workspace removed on drop. Only a half-written merge can remain.
    merge::remove_partial(&merge::partial_output_path(output)).await;
    let stage = tracker.get();
    Err(match interrupt {
        Interrupt::Cancelled => Vid2PdfError::Cancelled { stage },
        Interrupt::Deadline(secs) => Vid2PdfError::TimedOut { stage, secs },
    })
}

async fn run_pipeline(
    video: &Path,
    output: &Path,
    config: &ConversionConfig,
    tracker: &StageTracker,
) -> Result<ConversionOutput, Vid2PdfError> {
    let total_start = Instant::now();
    enter(tracker, config, Stage::Init);

    // Validate before creating anything or starting any tool.
    let video = input::resolve_video(video)?;
    input::check_output_parent(output)?;
    let workspace = Workspace::create(config.work_dir.as_deref())?;

    // ── Stage 1: extract ─────────────────────────────────────────────────
    enter(tracker, config, Stage::Extracting);
    let extract_start = Instant::now();
    let frames = extract::extract_frames(&video, workspace.path(), config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_frames_extracted(frames.len());
    }

    // ── Stages 2 + 3: per frame ──────────────────────────────────────────
    let frames_start = Instant::now();
    let pages = process_frames(&frames, config, tracker).await?;
    let frames_duration_ms = frames_start.elapsed().as_millis() as u64;

    // ── Stage 4: merge ───────────────────────────────────────────────────
    enter(tracker, config, Stage::Combining);
    check_correspondence(&frames, &pages)?;
    let merge_start = Instant::now();
    merge::combine_pdfs(&pages, output, &config.tools).await?;
    let merge_duration_ms = merge_start.elapsed().as_millis() as u64;

    let records = page_records(&frames, &pages);
    let intermediates = if config.keep_intermediates {
        let kept = workspace.persist();
        info!("Intermediate files kept in {}", kept.display());
        Some(kept)
    } else {
        workspace.close();
        None
    };

    let stats = ConversionStats {
        frames_extracted: frames.len(),
        pages_merged: pages.len(),
        extract_duration_ms,
        frames_duration_ms,
        merge_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} pages, {}ms total",
        stats.pages_merged, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(output, pages.len());
    }

    Ok(ConversionOutput {
        output_path: output.to_path_buf(),
        pages: records,
        stats,
        intermediates,
    })
}

/// Watermark removal then OCR for every frame, `config.concurrency` at a time.
///
/// Completion order is discarded: pages come back sorted by frame sequence.
/// The first failure ends the stream, which drops (and kills) the rest.
async fn process_frames(
    frames: &[FramePath],
    config: &ConversionConfig,
    tracker: &StageTracker,
) -> Result<Vec<PagePdf>, Vid2PdfError> {
    let total = frames.len();
    enter(
        tracker,
        config,
        if config.watermark.enabled {
            Stage::Watermark
        } else {
            Stage::Ocr
        },
    );

    let mut pages: Vec<PagePdf> = stream::iter(frames.iter().map(|frame| async move {
        if let Some(ref cb) = config.progress_callback {
            cb.on_frame_start(frame.seq(), total);
        }
        if config.watermark.enabled {
            tracker.set(Stage::Watermark);
            watermark::remove_watermark(frame, &config.watermark, &config.tools).await?;
        }
        tracker.set(Stage::Ocr);
        let page = ocr::ocr_frame(frame, &config.ocr, &config.tools).await?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_frame_complete(frame.seq(), total);
        }
        Ok::<_, Vid2PdfError>(page)
    }))
    .buffer_unordered(config.concurrency)
    .try_collect()
    .await?;

    pages.sort();
    debug!("Processed {} frames", pages.len());
    Ok(pages)
}

/// Every frame must map to exactly one existing page, in the same order.
fn check_correspondence(frames: &[FramePath], pages: &[PagePdf]) -> Result<(), Vid2PdfError> {
    if frames.len() != pages.len() {
        return Err(Vid2PdfError::CorrespondenceMismatch {
            detail: format!("{} frames but {} pages", frames.len(), pages.len()),
        });
    }

    let mut seen = HashSet::with_capacity(pages.len());
    for (frame, page) in frames.iter().zip(pages) {
        let expected = frame.page_pdf();
        if page != &expected {
            return Err(Vid2PdfError::CorrespondenceMismatch {
                detail: format!(
                    "frame {} ({}) paired with page {} ({})",
                    frame.seq(),
                    frame.path().display(),
                    page.seq(),
                    page.path().display()
                ),
            });
        }
        if !seen.insert(page.path()) {
            return Err(Vid2PdfError::CorrespondenceMismatch {
                detail: format!("page {} appears twice", page.path().display()),
            });
        }
        if !page.path().is_file() {
            return Err(Vid2PdfError::CorrespondenceMismatch {
                detail: format!("page {} is missing on disk", page.path().display()),
            });
        }
    }
    Ok(())
}

fn page_records(frames: &[FramePath], pages: &[PagePdf]) -> Vec<PageRecord> {
    let file_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    frames
        .iter()
        .zip(pages)
        .enumerate()
        .map(|(i, (frame, page))| PageRecord {
            page_num: i + 1,
            frame_seq: frame.seq(),
            frame_file: file_name(frame.path()),
            page_file: file_name(page.path()),
        })
        .collect()
}

fn enter(tracker: &StageTracker, config: &ConversionConfig, stage: Stage) {
    tracker.set(stage);
    debug!("Entering stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

/// Most recently entered stage, readable after the pipeline future is dropped.
struct StageTracker(AtomicU8);

impl StageTracker {
    fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    fn set(&self, stage: Stage) {
        let v = match stage {
            Stage::Init => 0,
            Stage::Extracting => 1,
            Stage::Watermark => 2,
            Stage::Ocr => 3,
            Stage::Combining => 4,
        };
        self.0.store(v, Ordering::SeqCst);
    }

    fn get(&self) -> Stage {
        match self.0.load(Ordering::SeqCst) {
            0 => Stage::Init,
            1 => Stage::Extracting,
            2 => Stage::Watermark,
            3 => Stage::Ocr,
            _ => Stage::Combining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pages(dir: &Path, n: u32) -> (Vec<FramePath>, Vec<PagePdf>) {
        let frames: Vec<FramePath> = (1..=n)
            .map(|i| FramePath::new(i, dir.join(format!("frame_{i:06}.png"))))
            .collect();
        let pages: Vec<PagePdf> = frames.iter().map(FramePath::page_pdf).collect();
        for p in &pages {
            std::fs::write(p.path(), b"%PDF-1.4").unwrap();
        }
        (frames, pages)
    }

    #[test]
    fn correspondence_accepts_matching_lists() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, pages) = write_pages(dir.path(), 3);
        check_correspondence(&frames, &pages).unwrap();
    }

    #[test]
    fn correspondence_rejects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, pages) = write_pages(dir.path(), 3);
        let err = check_correspondence(&frames, &pages[..2]).unwrap_err();
        assert!(err.to_string().contains("3 frames but 2 pages"), "got: {err}");
    }

    #[test]
    fn correspondence_rejects_reordering() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, mut pages) = write_pages(dir.path(), 3);
        pages.swap(0, 2);
        let err = check_correspondence(&frames, &pages).unwrap_err();
        assert!(matches!(err, Vid2PdfError::CorrespondenceMismatch { .. }));
    }

    #[test]
    fn correspondence_rejects_missing_page_file() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, pages) = write_pages(dir.path(), 2);
        std::fs::remove_file(pages[1].path()).unwrap();
        let err = check_correspondence(&frames, &pages).unwrap_err();
        assert!(err.to_string().contains("missing"), "got: {err}");
    }

    #[test]
    fn page_records_number_pages_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, pages) = write_pages(dir.path(), 2);
        let records = page_records(&frames, &pages);
        assert_eq!(records[0].page_num, 1);
        assert_eq!(records[1].frame_seq, 2);
        assert_eq!(records[1].frame_file, "frame_000002.png");
        assert_eq!(records[1].page_file, "frame_000002.pdf");
    }

    #[test]
    fn stage_tracker_round_trips() {
        let t = StageTracker::new();
        assert_eq!(t.get(), Stage::Init);
        for s in [
            Stage::Extracting,
            Stage::Watermark,
            Stage::Ocr,
            Stage::Combining,
            Stage::Init,
        ] {
            t.set(s);
            assert_eq!(t.get(), s);
        }
    }

    #[tokio::test]
    async fn missing_video_fails_before_any_tool_runs() {
        let parent = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .work_dir(parent.path())
            .tools(crate::config::ToolPaths {
                ffmpeg: "/definitely/not/ffmpeg".into(),
                mogrify: "/definitely/not/mogrify".into(),
                tesseract: "/definitely/not/tesseract".into(),
                ghostscript: "/definitely/not/gs".into(),
            })
            .build()
            .unwrap();
        let err = convert(
            "/definitely/not/a/video.mp4",
            parent.path().join("out.pdf"),
            &config,
        )
        .await
        .unwrap_err();
        // A tool error would mean a tool was attempted.
        assert!(matches!(err, Vid2PdfError::VideoNotFound { .. }), "got: {err:?}");
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn pre_cancelled_run_does_nothing() {
        let parent = tempfile::tempdir().unwrap();
        let token = crate::cancel::CancellationToken::new();
        token.cancel();
        let config = ConversionConfig::builder()
            .work_dir(parent.path())
            .cancellation(token)
            .build()
            .unwrap();
        let err = convert("whatever.mp4", parent.path().join("out.pdf"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Vid2PdfError::Cancelled { stage: Stage::Init }));
    }
}
