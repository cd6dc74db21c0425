//! Render the preview's developing animation to files.

use std::path::PathBuf;
use std::time::Duration;

use image::imageops::FilterType;
use polaroid_capture_engine::upload::load_upload;
use polaroid_common::config::AppConfig;
use polaroid_render_engine::encode_png;
use polaroid_render_engine::film::{develop_frame, DevelopingClock, DEVELOP_TRANSITION};

/// Frames are rendered at preview size, not print size.
const PREVIEW_SIDE: u32 = 720;

pub async fn run(
    config: &AppConfig,
    image: PathBuf,
    frames: u32,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if frames < 2 {
        anyhow::bail!("Need at least 2 frames, got {frames}");
    }

    let upload = load_upload(&image, true)?;
    let preview = upload
        .decode()?
        .resize(PREVIEW_SIDE, PREVIEW_SIDE, FilterType::Triangle)
        .to_rgba8();

    let clock = DevelopingClock::new(
        Duration::from_millis(config.print.developing_ms),
        DEVELOP_TRANSITION,
    );
    let dir = output.unwrap_or_else(|| config.output_dir.join("develop"));
    std::fs::create_dir_all(&dir)?;
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "polaroid".to_string());

    println!(
        "Developing {} over {:.1}s in {frames} frames",
        image.display(),
        clock.total().as_secs_f32()
    );
    for i in 0..frames {
        let elapsed = clock.total().mul_f64(i as f64 / (frames - 1) as f64);
        let progress = clock.progress(elapsed);
        let frame = develop_frame(&preview, progress);
        let path = dir.join(format!("{stem}-develop-{i:02}.png"));
        std::fs::write(&path, encode_png(&frame)?)?;
        tracing::debug!(frame = i, progress, path = %path.display(), "Wrote develop frame");
    }
    println!("Frames written to: {}", dir.display());
    Ok(())
}
