//! Stage 1: frame decimation with ffmpeg.
//!
//! ```text
//! ffmpeg -hide_banner -loglevel error -nostdin -y -i <video>
//!        -vf mpdecimate -vsync vfr -start_number 1 <workdir>/frame_%06d.png
//! ```
//!
//! `-vsync vfr` lets ffmpeg drop the frames the filter discards instead of
//! duplicating them back to a constant rate. Newer releases spell it
//! `-fps_mode`, but only `-vsync` is understood by every ffmpeg from 4.x on
//! (later ones print a deprecation notice, which `-loglevel error` hides). How many frames survive is only
//! known afterwards, so the stage lists the working directory and fails if
//! nothing matching the pattern was written.

use crate::config::{ConversionConfig, FramePattern};
use crate::error::{Stage, Vid2PdfError};
use crate::pipeline::input::VideoPath;
use crate::pipeline::naming::FramePath;
use crate::pipeline::tool::ToolInvocation;
use std::path::Path;
use tracing::{debug, info};

/// Build the ffmpeg invocation for a video and working directory.
pub fn extract_command(video: &VideoPath, workdir: &Path, config: &ConversionConfig) -> ToolInvocation {
    let output_template = workdir.join(config.frame_pattern.template());
    ToolInvocation::new(Stage::Extracting, &config.tools.ffmpeg, "ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
        .arg(video.path())
        .arg("-vf")
        .arg(&config.decimate_filter)
        .args(["-vsync", "vfr", "-start_number"])
        .arg(config.frame_pattern.start_number.to_string())
        .arg(output_template)
}

/// Run the decimation tool and return the frames it wrote, in sequence order.
pub async fn extract_frames(
    video: &VideoPath,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<FramePath>, Vid2PdfError> {
    info!("Extracting frames from {}", video.path().display());
    extract_command(video, workdir, config).run().await?;

    let frames = collect_frames(workdir, &config.frame_pattern).await?;
    if frames.is_empty() {
        return Err(Vid2PdfError::NoFramesExtracted {
            video: video.path().to_path_buf(),
        });
    }
    info!("Extracted {} frames", frames.len());
    Ok(frames)
}

/// List `dir` and keep the files named by `pattern`, sorted by sequence number.
pub async fn collect_frames(
    dir: &Path,
    pattern: &FramePattern,
) -> Result<Vec<FramePath>, Vid2PdfError> {
    let io_err = |e| Vid2PdfError::io(Stage::Extracting, dir, e);
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let name = entry.file_name();
        let Some(seq) = name.to_str().and_then(|n| pattern.parse_seq(n)) else {
            debug!("Ignoring {:?} in working directory", name);
            continue;
        };
        let file_type = entry.file_type().await.map_err(io_err)?;
        if file_type.is_file() {
            frames.push(FramePath::new(seq, entry.path()));
        }
    }

    frames.sort();
    Ok(frames)
}
