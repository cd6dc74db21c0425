//! Turn an image file into a print.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use polaroid_capture_engine::upload::load_upload;
use polaroid_common::config::AppConfig;
use polaroid_common::stamp;
use polaroid_model::Studio;

use super::finish::{caption_and_export, Finish};

pub async fn run(
    config: &AppConfig,
    image: PathBuf,
    square: bool,
    finish: Finish,
) -> anyhow::Result<()> {
    let square = square || config.camera.square_uploads;
    println!("Printing: {}", image.display());

    let upload = load_upload(&image, square)?;
    println!("  Source: {}x{} {}", upload.width(), upload.height(), upload.mime_type());

    let mut studio = Studio::new(Duration::from_millis(config.print.developing_ms));
    studio.accept_upload(upload, stamp::today(), Instant::now())?;

    let cancel = super::ctrl_c_token();
    caption_and_export(&mut studio, config, finish, &cancel).await?;
    Ok(())
}
