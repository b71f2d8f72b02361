//! CLI binary for vid2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vid2pdf::{
    check_tools, convert, CancellationToken, ConversionConfig, ConversionProgressCallback,
    ProgressCallback, Stage, ToolPaths, Vid2PdfError,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while ffmpeg runs, then a bar over
/// the extracted frames. Works when frames complete out of order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} frames  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        match stage {
            Stage::Extracting => {
                self.bar.set_prefix("Extracting");
                self.bar.set_message("decimating frames…");
            }
            Stage::Combining => {
                self.bar.set_prefix("Merging");
                self.bar.set_message("writing PDF…");
            }
            _ => {}
        }
    }

    fn on_frames_extracted(&self, total_frames: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{total_frames} distinct frames extracted"))
        ));
        self.activate_bar(total_frames);
    }

    fn on_frame_start(&self, seq: u32, _total_frames: usize) {
        self.bar.set_message(format!("frame {seq}"));
    }

    fn on_frame_complete(&self, _seq: u32, _total_frames: usize) {
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, output: &Path, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages  →  {}",
            green("✔"),
            bold(&pages.to_string()),
            bold(&output.display().to_string())
        );
    }

    fn on_conversion_failed(&self, stage: Option<Stage>, _error: &str) {
        self.bar.finish_and_clear();
        if let Some(stage) = stage {
            eprintln!("{} failed during {}", red("✘"), bold(&stage.to_string()));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion
  vid2pdf -i lecture.mp4 -o lecture.pdf

  # Keep the extracted frames and per-page PDFs for inspection
  vid2pdf -i lecture.mp4 -o lecture.pdf --keep-intermediates

  # Watermark sits on a light-grey band in the bottom-right corner
  vid2pdf -i talk.mkv -o talk.pdf --seed 1910,1070 --fuzz 15

  # No watermark, German text, four frames at a time
  vid2pdf -i slides.webm -o slides.pdf --no-watermark --lang deu -c 4

  # Verify the external tools are installed
  vid2pdf --check-tools

REQUIRED TOOLS:
  Stage       Binary      Debian/Ubuntu package   Homebrew
  ─────────   ─────────   ─────────────────────   ───────────
  extract     ffmpeg      ffmpeg                  ffmpeg
  watermark   mogrify     imagemagick             imagemagick
  OCR         tesseract   tesseract-ocr           tesseract
  merge       gs          ghostscript             ghostscript

ENVIRONMENT VARIABLES:
  VID2PDF_FFMPEG, VID2PDF_MOGRIFY, VID2PDF_TESSERACT, VID2PDF_GS
                          Override tool binaries
  RUST_LOG                Override log filter (e.g. vid2pdf=debug)
"#;

/// Convert a video into a text-searchable PDF.
#[derive(Parser, Debug)]
#[command(
    name = "vid2pdf",
    version,
    about = "Convert a video into a text-searchable PDF",
    long_about = "Extract the visually distinct frames of a video (ffmpeg mpdecimate), remove a \
light overlay watermark by flood fill (ImageMagick), OCR each frame into a searchable page \
(Tesseract), and merge the pages into one PDF (Ghostscript).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input video file.
    #[arg(short = 'i', long, env = "VID2PDF_VIDEO", required_unless_present = "check_tools")]
    video_path: Option<PathBuf>,

    /// Output PDF path (parent directory must exist).
    #[arg(short = 'o', long, env = "VID2PDF_OUTPUT", required_unless_present = "check_tools")]
    output_pdf: Option<PathBuf>,

    /// Keep extracted frames and per-page PDFs after a successful run.
    #[arg(long, env = "VID2PDF_KEEP_INTERMEDIATES")]
    keep_intermediates: bool,

    /// Parent directory for the per-run working directory.
    #[arg(long, env = "VID2PDF_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// ffmpeg filter used to drop near-duplicate frames.
    #[arg(long, env = "VID2PDF_DECIMATE", default_value = "mpdecimate")]
    decimate: String,

    /// Skip watermark removal.
    #[arg(long, env = "VID2PDF_NO_WATERMARK")]
    no_watermark: bool,

    /// Flood-fill colour tolerance in percent (0–100).
    #[arg(long, env = "VID2PDF_FUZZ", default_value_t = 20.0)]
    fuzz: f32,

    /// Flood-fill colour.
    #[arg(long, env = "VID2PDF_FILL_COLOR", default_value = "white")]
    fill_color: String,

    /// Flood-fill seed pixel as X,Y.
    #[arg(long, env = "VID2PDF_SEED", default_value = "0,0", value_parser = parse_seed)]
    seed: (u32, u32),

    /// Tesseract language(s), e.g. eng or eng+deu. Default: engine default.
    #[arg(short, long, env = "VID2PDF_LANG")]
    lang: Option<String>,

    /// Frames processed concurrently during watermark removal and OCR.
    #[arg(short, long, env = "VID2PDF_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Abort the whole run after this many seconds.
    #[arg(long, env = "VID2PDF_TIMEOUT")]
    timeout: Option<u64>,

    /// ffmpeg binary.
    #[arg(long, env = "VID2PDF_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ImageMagick mogrify binary.
    #[arg(long, env = "VID2PDF_MOGRIFY", default_value = "mogrify")]
    mogrify: PathBuf,

    /// Tesseract binary.
    #[arg(long, env = "VID2PDF_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Ghostscript binary.
    #[arg(long, env = "VID2PDF_GS")]
    gs: Option<PathBuf>,

    /// Probe the external tools and exit.
    #[arg(long)]
    check_tools: bool,

    /// Print the ConversionOutput as JSON on stdout.
    #[arg(long, env = "VID2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "VID2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VID2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VID2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.check_tools;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let tools = tool_paths(&cli);

    // ── Tool check mode ──────────────────────────────────────────────────
    if cli.check_tools {
        let statuses = check_tools(&tools).await;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&statuses).context("Failed to serialize tool status")?
            );
        } else {
            for s in &statuses {
                let mark = if s.is_available() { green("✓") } else { red("✗") };
                let detail = s
                    .version
                    .clone()
                    .or_else(|| s.error.clone())
                    .unwrap_or_default();
                println!(
                    "{mark} {:<18} {:<12} {}",
                    s.stage.to_string(),
                    s.program.display(),
                    dim(&detail)
                );
            }
        }
        let missing = statuses.iter().filter(|s| !s.is_available()).count();
        if missing > 0 {
            anyhow::bail!("{missing} required tool(s) unavailable");
        }
        return Ok(());
    }

    let (Some(video), Some(output)) = (cli.video_path.clone(), cli.output_pdf.clone()) else {
        anyhow::bail!("--video-path and --output-pdf are required");
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let token = CancellationToken::new();
    let config = build_config(&cli, tools, token.clone(), progress_cb)?;

    // Ctrl-C kills the running tool and cleans up instead of leaving temp files.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&video, &output, &config).await.map_err(|e| {
        let context = failure_context(&e);
        anyhow::Error::new(e).context(context)
    })?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Converted {} frames into {} in {}ms",
                result.stats.pages_merged,
                output.display(),
                result.stats.total_duration_ms
            );
        }
        eprintln!(
            "   {}",
            dim(&format!(
                "extract {}ms  /  frames {}ms  /  merge {}ms",
                result.stats.extract_duration_ms,
                result.stats.frames_duration_ms,
                result.stats.merge_duration_ms
            ))
        );
        if let Some(ref dir) = result.intermediates {
            eprintln!("   intermediates kept in {}", bold(&dir.display().to_string()));
        }
    }

    Ok(())
}

fn tool_paths(cli: &Cli) -> ToolPaths {
    let defaults = ToolPaths::default();
    ToolPaths {
        ffmpeg: cli.ffmpeg.clone(),
        mogrify: cli.mogrify.clone(),
        tesseract: cli.tesseract.clone(),
        ghostscript: cli.gs.clone().unwrap_or(defaults.ghostscript),
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    tools: ToolPaths,
    token: CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .decimate_filter(&cli.decimate)
        .remove_watermark(!cli.no_watermark)
        .fuzz_percent(cli.fuzz)
        .fill_color(&cli.fill_color)
        .seed(cli.seed.0, cli.seed.1)
        .tools(tools)
        .concurrency(cli.concurrency)
        .keep_intermediates(cli.keep_intermediates)
        .cancellation(token);

    if let Some(ref lang) = cli.lang {
        builder = builder.language(lang);
    }
    if let Some(ref dir) = cli.work_dir {
        builder = builder.work_dir(dir);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Top-line error message; names the stage even when no progress bar ran.
fn failure_context(e: &Vid2PdfError) -> String {
    match e.stage() {
        Some(stage) => format!("Conversion failed during {stage}"),
        None => format!("Conversion failed ({:?} error)", e.kind()),
    }
}

/// Parse `--seed X,Y`.
fn parse_seed(s: &str) -> std::result::Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x = x
        .trim()
        .parse()
        .map_err(|_| format!("invalid X coordinate '{}'", x.trim()))?;
    let y = y
        .trim()
        .parse()
        .map_err(|_| format!("invalid Y coordinate '{}'", y.trim()))?;
    Ok((x, y))
}
