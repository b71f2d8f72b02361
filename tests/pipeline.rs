//! Integration tests for the conversion pipeline.
//!
//! The real tools are replaced by small shell scripts that honour the same
//! argument contract:
//!
//! * `ffmpeg`    reads the "video" file: `N` writes N frames, `N K` marks
//!               frame K so OCR fails on it, `fail` exits non-zero and
//!               `hang` never returns.
//! * `mogrify`   appends `cleaned` to the image it is given.
//! * `tesseract` prints a fake PDF naming the frame, followed by the image
//!               content. Frame 1 is slowed down so completion order differs
//!               from frame order.
//! * `gs`        concatenates its inputs into `-sOutputFile`.
//!
//! Run with:
//!   cargo test --test pipeline

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use vid2pdf::{
    convert, convert_sync, CancellationToken, ConversionConfig, ConversionConfigBuilder,
    ConversionProgressCallback, ErrorKind, Stage, ToolPaths, Vid2PdfError,
};

// ── Stand-in tools ───────────────────────────────────────────────────────────

const FAKE_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
video=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then video="$a"; fi
  prev="$a"
done
read n bad < "$video"
case "$n" in
  hang) exec sleep 30 ;;
  fail) echo "Invalid data found when processing input" >&2; exit 1 ;;
esac
i=1
while [ "$i" -le "$n" ]; do
  f=$(printf "$last" "$i")
  if [ "$i" = "$bad" ]; then
    printf 'frame %d FAIL\n' "$i" > "$f"
  else
    printf 'frame %d\n' "$i" > "$f"
  fi
  i=$((i+1))
done
"#;

const FAKE_MOGRIFY: &str = r#"#!/bin/sh
for last; do :; done
printf 'cleaned\n' >> "$last"
"#;

const FAKE_TESSERACT: &str = r#"#!/bin/sh
img="$1"
if grep -q FAIL "$img"; then
  echo "Error during processing." >&2
  exit 1
fi
case "$img" in
  *frame_000001.png) sleep 0.3 ;;
esac
printf '%%PDF-fake\n'
printf 'page:%s\n' "$(basename "$img")"
cat "$img"
"#;

const FAKE_GS: &str = r#"#!/bin/sh
out=""
for a in "$@"; do
  case "$a" in
    -sOutputFile=*) out="${a#-sOutputFile=}" ;;
  esac
done
{
  printf '%%PDF-merged\n'
  for a in "$@"; do
    case "$a" in
      -*) ;;
      *) cat "$a" ;;
    esac
  done
} > "$out"
"#;

/// Scripts are written once, before any test spawns a process.
fn fake_tools() -> &'static ToolPaths {
    static TOOLS: OnceLock<ToolPaths> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("vid2pdf-fake-tools");
        std::fs::create_dir_all(&dir).unwrap();
        let write = |name: &str, body: &str| -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        ToolPaths {
            ffmpeg: write("ffmpeg", FAKE_FFMPEG),
            mogrify: write("mogrify", FAKE_MOGRIFY),
            tesseract: write("tesseract", FAKE_TESSERACT),
            ghostscript: write("gs", FAKE_GS),
        }
    })
}

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new(video_content: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("work")).unwrap();
        std::fs::write(root.path().join("talk.mp4"), video_content).unwrap();
        Self { root }
    }

    fn video(&self) -> PathBuf {
        self.root.path().join("talk.mp4")
    }

    fn output(&self) -> PathBuf {
        self.root.path().join("talk.pdf")
    }

    fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn builder(&self) -> ConversionConfigBuilder {
        ConversionConfig::builder()
            .tools(fake_tools().clone())
            .work_dir(self.work())
    }

    /// No working directory or partial merge left behind.
    fn assert_clean(&self) {
        let leftovers: Vec<_> = std::fs::read_dir(self.work())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert!(leftovers.is_empty(), "working dirs left: {leftovers:?}");
        assert!(
            !self.root.path().join("talk.pdf.tmp").exists(),
            "partial merge left behind"
        );
    }

    fn output_text(&self) -> String {
        std::fs::read_to_string(self.output()).unwrap()
    }
}

/// Frame names from the `page:` markers, in file order.
fn page_order(merged: &str) -> Vec<String> {
    merged
        .lines()
        .filter_map(|l| l.strip_prefix("page:"))
        .map(str::to_owned)
        .collect()
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, e: String) {
        self.events.lock().unwrap().push(e);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ConversionProgressCallback for Recorder {
    fn on_stage_start(&self, stage: Stage) {
        self.push(format!("stage:{stage}"));
    }
    fn on_frames_extracted(&self, total_frames: usize) {
        self.push(format!("extracted:{total_frames}"));
    }
    fn on_frame_complete(&self, seq: u32, _total_frames: usize) {
        self.push(format!("frame:{seq}"));
    }
    fn on_conversion_complete(&self, _output: &Path, pages: usize) {
        self.push(format!("done:{pages}"));
    }
    fn on_conversion_failed(&self, stage: Option<Stage>, _error: &str) {
        self.push(format!("failed:{stage:?}"));
    }
}

// ── Successful runs ──────────────────────────────────────────────────────────

#[tokio::test]
async fn three_distinct_frames_become_three_ordered_pages() {
    let fx = Fixture::new("3\n");
    let config = fx.builder().build().unwrap();

    let out = convert(fx.video(), fx.output(), &config).await.unwrap();

    assert_eq!(out.output_path, fx.output());
    assert_eq!(out.stats.frames_extracted, 3);
    assert_eq!(out.stats.pages_merged, 3);
    assert!(out.intermediates.is_none());

    let merged = fx.output_text();
    assert!(merged.starts_with("%PDF-merged"));
    assert_eq!(
        page_order(&merged),
        vec!["frame_000001.png", "frame_000002.png", "frame_000003.png"]
    );

    let seqs: Vec<u32> = out.pages.iter().map(|p| p.frame_seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(out.pages[2].page_num, 3);
    assert_eq!(out.pages[2].page_file, "frame_000003.pdf");

    fx.assert_clean();
}

#[tokio::test]
async fn single_frame_video_yields_one_page() {
    let fx = Fixture::new("1\n");
    let config = fx.builder().build().unwrap();

    let out = convert(fx.video(), fx.output(), &config).await.unwrap();
    assert_eq!(out.pages.len(), 1);
    assert_eq!(page_order(&fx.output_text()), vec!["frame_000001.png"]);
    fx.assert_clean();
}

#[tokio::test]
async fn concurrent_frames_keep_frame_order() {
    let fx = Fixture::new("5\n");
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder()
        .concurrency(4)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap();

    assert_eq!(
        page_order(&fx.output_text()),
        vec![
            "frame_000001.png",
            "frame_000002.png",
            "frame_000003.png",
            "frame_000004.png",
            "frame_000005.png",
        ]
    );

    // Frame 1 is the slow one, so it cannot finish first.
    let completed: Vec<String> = recorder
        .events()
        .into_iter()
        .filter(|e| e.starts_with("frame:"))
        .collect();
    assert_eq!(completed.len(), 5);
    assert_ne!(completed[0], "frame:1", "events: {completed:?}");
    fx.assert_clean();
}

#[tokio::test]
async fn watermark_is_removed_before_ocr() {
    let fx = Fixture::new("2\n");
    let config = fx.builder().build().unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap();

    let merged = fx.output_text();
    assert_eq!(merged.matches("cleaned").count(), 2, "merged:\n{merged}");
}

#[tokio::test]
async fn disabled_watermark_removal_leaves_frames_untouched() {
    let fx = Fixture::new("2\n");
    let config = fx.builder().remove_watermark(false).build().unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap();

    assert!(!fx.output_text().contains("cleaned"));
}

#[tokio::test]
async fn keep_intermediates_persists_frames_and_pages() {
    let fx = Fixture::new("2\n");
    let config = fx.builder().keep_intermediates(true).build().unwrap();

    let out = convert(fx.video(), fx.output(), &config).await.unwrap();

    let kept = out.intermediates.expect("intermediates requested");
    assert!(kept.starts_with(fx.work()));
    for name in [
        "frame_000001.png",
        "frame_000001.pdf",
        "frame_000002.png",
        "frame_000002.pdf",
    ] {
        assert!(kept.join(name).is_file(), "missing {name}");
    }
}

#[tokio::test]
async fn existing_output_is_replaced() {
    let fx = Fixture::new("1\n");
    std::fs::write(fx.output(), "stale").unwrap();
    let config = fx.builder().build().unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap();
    assert!(fx.output_text().starts_with("%PDF-merged"));
}

#[tokio::test]
async fn progress_callback_sees_every_stage() {
    let fx = Fixture::new("2\n");
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap();

    let events = recorder.events();
    for expected in [
        "stage:init",
        "stage:frame extraction",
        "extracted:2",
        "stage:watermark removal",
        "frame:1",
        "frame:2",
        "stage:PDF merge",
        "done:2",
    ] {
        assert!(
            events.iter().any(|e| e == expected),
            "missing {expected} in {events:?}"
        );
    }
    assert_eq!(events.last().map(String::as_str), Some("done:2"));
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn video_without_distinct_frames_is_an_error() {
    let fx = Fixture::new("0\n");
    let config = fx.builder().build().unwrap();

    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert!(matches!(err, Vid2PdfError::NoFramesExtracted { .. }), "got: {err:?}");
    assert_eq!(err.kind(), ErrorKind::EmptyResult);
    assert!(!fx.output().exists());
    fx.assert_clean();
}

#[tokio::test]
async fn missing_video_is_reported_before_tools_run() {
    let fx = Fixture::new("3\n");
    let config = fx.builder().build().unwrap();

    let err = convert(fx.root.path().join("nope.mp4"), fx.output(), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Vid2PdfError::VideoNotFound { .. }), "got: {err:?}");
    fx.assert_clean();
}

#[tokio::test]
async fn extractor_failure_carries_stderr() {
    let fx = Fixture::new("fail\n");
    let config = fx.builder().build().unwrap();

    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    match err {
        Vid2PdfError::ToolFailed {
            stage,
            exit_code,
            ref stderr,
            ..
        } => {
            assert_eq!(stage, Stage::Extracting);
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("Invalid data found"), "stderr: {stderr}");
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }
    fx.assert_clean();
}

#[tokio::test]
async fn ocr_failure_aborts_without_output() {
    let fx = Fixture::new("3 2\n");
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Ocr));
    assert_eq!(err.kind(), ErrorKind::ToolInvocation);
    assert!(!fx.output().exists());
    assert!(recorder.events().contains(&"failed:Some(Ocr)".to_string()));
    fx.assert_clean();
}

#[tokio::test]
async fn watermark_failure_aborts_without_output() {
    let fx = Fixture::new("3\n");
    let tools = ToolPaths {
        mogrify: "false".into(),
        ..fake_tools().clone()
    };
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder()
        .tools(tools)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert!(matches!(err, Vid2PdfError::ToolFailed { .. }), "got: {err:?}");
    assert_eq!(err.stage(), Some(Stage::Watermark));
    assert!(!fx.output().exists());
    // Nothing reached OCR.
    assert!(
        !recorder.events().iter().any(|e| e.starts_with("frame:")),
        "events: {:?}",
        recorder.events()
    );
    fx.assert_clean();
}

#[tokio::test]
async fn output_path_that_is_a_directory_fails_before_extraction() {
    let fx = Fixture::new("3\n");
    let recorder = Arc::new(Recorder::default());
    let config = fx
        .builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = convert(fx.video(), fx.work(), &config).await.unwrap_err();

    assert!(matches!(err, Vid2PdfError::OutputWriteFailed { .. }), "got: {err:?}");
    assert!(
        !recorder.events().iter().any(|e| e == "stage:frame extraction"),
        "events: {:?}",
        recorder.events()
    );
    fx.assert_clean();
}

#[tokio::test]
async fn failed_run_leaves_previous_output_alone() {
    let fx = Fixture::new("2 1\n");
    std::fs::write(fx.output(), "previous").unwrap();
    let config = fx.builder().build().unwrap();

    convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert_eq!(fx.output_text(), "previous");
    fx.assert_clean();
}

#[tokio::test]
async fn missing_tool_names_its_override() {
    let fx = Fixture::new("1\n");
    let tools = ToolPaths {
        tesseract: fx.root.path().join("no-such-tesseract"),
        ..fake_tools().clone()
    };
    let config = fx.builder().tools(tools).build().unwrap();

    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert!(
        matches!(err, Vid2PdfError::ToolNotFound { stage: Stage::Ocr, .. }),
        "got: {err:?}"
    );
    assert!(err.to_string().contains("--tesseract"), "msg: {err}");
    fx.assert_clean();
}

#[tokio::test]
async fn missing_output_directory_is_rejected_up_front() {
    let fx = Fixture::new("1\n");
    let config = fx.builder().build().unwrap();

    let err = convert(fx.video(), fx.root.path().join("no/such/dir/out.pdf"), &config)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    fx.assert_clean();
}

#[test]
fn blocking_wrapper_converts_a_single_frame() {
    let fx = Fixture::new("1\n");
    let config = fx.builder().build().unwrap();

    let out = convert_sync(fx.video(), fx.output(), &config).unwrap();

    assert_eq!(out.stats.pages_merged, 1);
    assert_eq!(page_order(&fx.output_text()), vec!["frame_000001.png"]);
    fx.assert_clean();
}

// ── Interruption ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn deadline_kills_a_hung_extractor() {
    let fx = Fixture::new("hang\n");
    let config = fx.builder().timeout_secs(1).build().unwrap();

    let started = std::time::Instant::now();
    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();

    assert!(
        matches!(
            err,
            Vid2PdfError::TimedOut {
                stage: Stage::Extracting,
                secs: 1
            }
        ),
        "got: {err:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!fx.output().exists());
    fx.assert_clean();
}

#[tokio::test]
async fn cancellation_stops_the_run_and_cleans_up() {
    let fx = Fixture::new("hang\n");
    let token = CancellationToken::new();
    let config = fx.builder().cancellation(token.clone()).build().unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        token.cancel();
    });
    let err = convert(fx.video(), fx.output(), &config).await.unwrap_err();
    canceller.await.unwrap();

    assert!(
        matches!(err, Vid2PdfError::Cancelled { stage: Stage::Extracting }),
        "got: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    fx.assert_clean();
}
