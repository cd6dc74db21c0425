//! Camera capture adapter.
//!
//! Opens a backend stream for the requested facing and turns single frames
//! into square, mirrored JPEG stills. Every await point takes a
//! [`CancellationToken`], and the device is released on every exit path.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use polaroid_common::config::CameraDefaults;
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::{CapturedImage, Facing};
use tokio_util::sync::CancellationToken;

use crate::backend::{CameraBackend, DeviceInfo, LiveStream, StreamRequest};
use crate::frame::still_from_frame;

/// Runtime capture settings, usually derived from [`CameraDefaults`].
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub device: Option<String>,
    pub front_device: Option<String>,
    pub back_device: Option<String>,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub mirror: bool,
    pub frame_timeout: Duration,
    pub open_timeout: Duration,
    pub flash_delay: Duration,
    pub warmup_frames: u32,
}

impl From<&CameraDefaults> for CaptureSettings {
    fn from(camera: &CameraDefaults) -> Self {
        Self {
            device: camera.device.clone(),
            front_device: camera.front_device.clone(),
            back_device: camera.back_device.clone(),
            ideal_width: camera.ideal_width,
            ideal_height: camera.ideal_height,
            mirror: camera.mirror,
            frame_timeout: Duration::from_millis(camera.frame_timeout_ms),
            open_timeout: Duration::from_millis(camera.open_timeout_ms),
            flash_delay: Duration::from_millis(camera.flash_delay_ms),
            warmup_frames: camera.warmup_frames,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from(&CameraDefaults::default())
    }
}

impl CaptureSettings {
    fn request_for(&self, facing: Facing) -> StreamRequest {
        let per_facing = match facing {
            Facing::Front => &self.front_device,
            Facing::Back => &self.back_device,
        };
        StreamRequest {
            facing,
            device: self.device.clone().or_else(|| per_facing.clone()),
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            frame_timeout: self.frame_timeout,
        }
    }
}

/// Entry point for camera captures.
#[derive(Clone)]
pub struct CaptureAdapter {
    backend: Arc<dyn CameraBackend>,
    settings: CaptureSettings,
}

impl CaptureAdapter {
    pub fn new(backend: Arc<dyn CameraBackend>, settings: CaptureSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn list_devices(&self) -> PolaroidResult<Vec<DeviceInfo>> {
        self.backend.list_devices()
    }

    /// Open the camera for `facing`.
    ///
    /// Every failure to get a working stream is reported as
    /// `DeviceUnavailable`, except cancellation which yields `Cancelled`.
    /// Nothing is retried.
    pub async fn open_device_stream(
        &self,
        facing: Facing,
        cancel: &CancellationToken,
    ) -> PolaroidResult<DeviceStream> {
        let request = self.settings.request_for(facing);
        tracing::info!(
            backend = self.backend.name(),
            facing = %facing,
            device = request.device.as_deref().unwrap_or("auto"),
            "Requesting camera"
        );

        let open = tokio::time::timeout(self.settings.open_timeout, self.backend.open(&request));
        let stream = tokio::select! {
            _ = cancel.cancelled() => return Err(PolaroidError::Cancelled),
            opened = open => match opened {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(as_unavailable(e)),
                Err(_) => {
                    return Err(PolaroidError::device_unavailable(format!(
                        "Camera did not start within {}ms",
                        self.settings.open_timeout.as_millis()
                    )))
                }
            },
        };

        let mut device = DeviceStream {
            stream: Some(stream),
            facing,
            mirror: self.settings.mirror,
            flash: false,
            flash_delay: self.settings.flash_delay,
            frame_timeout: self.settings.frame_timeout,
        };

        for n in 0..self.settings.warmup_frames {
            match device.grab_raw(cancel).await {
                Ok(_) => {}
                Err(PolaroidError::Cancelled) => return Err(PolaroidError::Cancelled),
                Err(e) => {
                    tracing::warn!(frame = n, error = %e, "Camera opened but delivered no frames");
                    return Err(as_unavailable(e));
                }
            }
        }

        tracing::info!(facing = %facing, resolution = ?device.resolution(), "Camera ready");
        Ok(device)
    }
}

fn as_unavailable(err: PolaroidError) -> PolaroidError {
    match err {
        PolaroidError::DeviceUnavailable { .. } | PolaroidError::Cancelled => err,
        other => PolaroidError::device_unavailable(other.to_string()),
    }
}

/// An open camera. Dropping it releases the device.
pub struct DeviceStream {
    /// `None` once closed, or while a grab that was abandoned still owns it.
    stream: Option<Box<dyn LiveStream>>,
    facing: Facing,
    mirror: bool,
    flash: bool,
    flash_delay: Duration,
    frame_timeout: Duration,
}

impl DeviceStream {
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Fire the on-screen flash before each capture.
    pub fn set_flash(&mut self, flash: bool) {
        self.flash = flash;
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().and_then(|s| s.resolution())
    }

    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Grab one frame and turn it into a square still.
    pub async fn capture_frame(
        &mut self,
        cancel: &CancellationToken,
    ) -> PolaroidResult<CapturedImage> {
        if self.flash && !self.flash_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(PolaroidError::Cancelled),
                _ = tokio::time::sleep(self.flash_delay) => {}
            }
        }

        let frame = self.grab_raw(cancel).await?;
        let (facing, mirror) = (self.facing, self.mirror);
        let still = tokio::task::spawn_blocking(move || still_from_frame(&frame, facing, mirror))
            .await
            .map_err(|e| PolaroidError::capture(format!("Still encoding task failed: {e}")))??;

        tracing::info!(
            facing = %facing,
            side = still.width(),
            bytes = still.bytes().len(),
            "Captured still"
        );
        Ok(still)
    }

    /// Release the camera.
    pub fn close(mut self) -> PolaroidResult<()> {
        match self.stream.take() {
            Some(mut stream) => stream.stop(),
            None => Ok(()),
        }
    }

    /// Pull a raw frame on a blocking thread.
    ///
    /// The stream travels into the blocking task and back. If the wait is
    /// abandoned the task keeps it and drops it when the grab returns.
    async fn grab_raw(&mut self, cancel: &CancellationToken) -> PolaroidResult<RgbaImage> {
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| PolaroidError::capture("Camera stream is closed"))?;

        let grab = tokio::task::spawn_blocking(move || {
            let frame = stream.grab_frame();
            (stream, frame)
        });

        let joined = tokio::select! {
            _ = cancel.cancelled() => return Err(PolaroidError::Cancelled),
            joined = tokio::time::timeout(self.frame_timeout, grab) => joined,
        };

        match joined {
            Ok(Ok((stream, frame))) => {
                self.stream = Some(stream);
                frame
            }
            Ok(Err(e)) => Err(PolaroidError::capture(format!("Frame grab task failed: {e}"))),
            Err(_) => Err(PolaroidError::timeout("frame capture", self.frame_timeout)),
        }
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop() {
                tracing::warn!(error = %e, "Failed to release camera");
            }
        }
    }
}
