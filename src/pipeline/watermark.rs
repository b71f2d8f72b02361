//! Stage 2: in-place watermark removal with ImageMagick's `mogrify`.
//!
//! A semi-transparent overlay sitting on a near-white background is erased by
//! flood-filling the background from the seed pixel to pure white: anything
//! within `fuzz` of the seed colour and connected to it becomes the fill
//! colour, which swallows the faint mark while leaving dark text untouched.
//!
//! ```text
//! mogrify -fill white -fuzz 20% -draw "color 0,0 floodfill" <frame>
//! ```
//!
//! The file is rewritten in place; no backup is kept.

use crate::config::{ToolPaths, WatermarkConfig};
use crate::error::{Stage, Vid2PdfError};
use crate::pipeline::naming::FramePath;
use crate::pipeline::tool::ToolInvocation;
use tracing::debug;

/// Build the mogrify invocation for one frame.
pub fn watermark_command(
    frame: &FramePath,
    watermark: &WatermarkConfig,
    tools: &ToolPaths,
) -> ToolInvocation {
    let (x, y) = watermark.seed;
    ToolInvocation::new(Stage::Watermark, &tools.mogrify, "mogrify")
        .arg("-fill")
        .arg(&watermark.fill_color)
        .arg("-fuzz")
        .arg(format_fuzz(watermark.fuzz_percent))
        .arg("-draw")
        .arg(format!("color {x},{y} floodfill"))
        .arg(frame.path())
}

/// Flood-fill the frame's background in place.
pub async fn remove_watermark(
    frame: &FramePath,
    watermark: &WatermarkConfig,
    tools: &ToolPaths,
) -> Result<(), Vid2PdfError> {
    watermark_command(frame, watermark, tools).run().await?;

    // mogrify exits 0 on some unreadable inputs; make sure the file survived.
    let meta = tokio::fs::metadata(frame.path())
        .await
        .map_err(|e| Vid2PdfError::io(Stage::Watermark, frame.path(), e))?;
    if meta.len() == 0 {
        return Err(Vid2PdfError::io(
            Stage::Watermark,
            frame.path(),
            std::io::Error::new(std::io::ErrorKind::InvalidData, "frame is empty after fill"),
        ));
    }
    debug!("Watermark removed from frame {}", frame.seq());
    Ok(())
}

/// `20.0` → `20%`, `12.5` → `12.5%`.
fn format_fuzz(pct: f32) -> String {
    if pct.fract() == 0.0 {
        format!("{}%", pct as u32)
    } else {
        format!("{pct}%")
    }
}
