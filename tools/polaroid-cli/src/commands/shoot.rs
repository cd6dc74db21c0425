//! Take a picture with the camera.

use std::sync::Arc;
use std::time::{Duration, Instant};

use polaroid_capture_engine::backend::SyntheticBackend;
use polaroid_capture_engine::{default_backend, CameraBackend, CaptureAdapter, CaptureSettings};
use polaroid_common::config::AppConfig;
use polaroid_common::error::{PolaroidError, CAMERA_UNAVAILABLE_MESSAGE};
use polaroid_common::stamp;
use polaroid_model::{Facing, Studio};
use tokio::sync::oneshot;

use super::finish::{caption_and_export, Finish};

pub struct ShootOptions {
    pub facing: Facing,
    pub device: Option<String>,
    pub flash: bool,
    pub synthetic: bool,
    pub now: bool,
}

pub async fn run(config: &AppConfig, options: ShootOptions, finish: Finish) -> anyhow::Result<()> {
    let mut settings = CaptureSettings::from(&config.camera);
    if options.device.is_some() {
        settings.device = options.device;
    }
    let backend: Arc<dyn CameraBackend> = if options.synthetic {
        Arc::new(SyntheticBackend::default())
    } else {
        default_backend()
    };
    let adapter = CaptureAdapter::new(backend, settings);

    let mut studio = Studio::new(Duration::from_millis(config.print.developing_ms));
    let cancel = super::ctrl_c_token();

    println!("Opening {} camera ({})...", options.facing, adapter.backend_name());
    studio.open_camera(options.facing)?;
    let mut stream = match adapter.open_device_stream(options.facing, &cancel).await {
        Ok(stream) => stream,
        Err(PolaroidError::Cancelled) => {
            studio.close_camera()?;
            println!("Cancelled.");
            return Ok(());
        }
        Err(e) => {
            studio.camera_failed(&e)?;
            let message = studio.camera_error().unwrap_or(CAMERA_UNAVAILABLE_MESSAGE);
            return Err(anyhow::anyhow!("{message}"));
        }
    };
    stream.set_flash(options.flash);

    if !options.now {
        match stream.resolution() {
            Some((w, h)) => println!("Camera ready ({w}x{h})."),
            None => println!("Camera ready."),
        }
        println!("Press Enter to take the picture, Ctrl+C to cancel.");
        tokio::select! {
            _ = cancel.cancelled() => {
                drop(stream);
                studio.close_camera()?;
                println!("Cancelled; camera released.");
                return Ok(());
            }
            _ = wait_for_enter() => {}
        }
    }

    let still = match stream.capture_frame(&cancel).await {
        Ok(still) => still,
        Err(PolaroidError::Cancelled) => {
            drop(stream);
            studio.close_camera()?;
            println!("Cancelled; camera released.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    stream.close()?;
    println!("Click! {}x{} still captured.", still.width(), still.height());

    studio.accept_capture(still, stamp::today(), Instant::now())?;
    caption_and_export(&mut studio, config, finish, &cancel).await?;
    Ok(())
}

/// Resolve once a line is read from stdin.
///
/// The read happens on a detached thread so an abandoned wait never holds
/// up process exit.
async fn wait_for_enter() {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = tx.send(());
    });
    let _ = rx.await;
}
