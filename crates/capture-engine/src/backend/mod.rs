use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use polaroid_common::error::PolaroidResult;
use polaroid_model::Facing;

/// What the caller wants from the camera.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Which camera to use when no explicit device is given.
    pub facing: Facing,

    /// Explicit device node; wins over `facing`.
    pub device: Option<String>,

    /// Preferred resolution. Backends treat these as upper bounds.
    pub ideal_width: u32,
    pub ideal_height: u32,

    /// Upper bound on a single frame grab.
    pub frame_timeout: Duration,
}

/// A camera the backend can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device node or backend-specific identifier.
    pub path: String,
    /// Human-readable name.
    pub name: String,
    /// Higher means a more likely webcam.
    pub priority: u32,
}

/// Abstract interface for camera access.
#[async_trait::async_trait]
pub trait CameraBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Cameras currently available, best candidate first.
    fn list_devices(&self) -> PolaroidResult<Vec<DeviceInfo>>;

    /// Start streaming from a camera. Fails when the device is missing,
    /// busy, or access is denied.
    async fn open(&self, request: &StreamRequest) -> PolaroidResult<Box<dyn LiveStream>>;
}

/// A started camera stream. Holds the hardware until stopped or dropped;
/// implementations release the device in `Drop` too.
pub trait LiveStream: Send {
    /// Negotiated frame size, once known.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Block until the next frame arrives (bounded by the request's
    /// frame timeout).
    fn grab_frame(&mut self) -> PolaroidResult<RgbaImage>;

    /// Release the device. Safe to call more than once.
    fn stop(&mut self) -> PolaroidResult<()>;

    /// Whether the stream still holds the device.
    fn is_live(&self) -> bool;
}

#[cfg(feature = "gstreamer")]
pub mod gst_camera;
pub mod synthetic;

#[cfg(feature = "gstreamer")]
pub use gst_camera::GstCameraBackend;
pub use synthetic::SyntheticBackend;

/// Get the platform camera backend.
///
/// Without the `gstreamer` feature only the synthetic camera exists.
pub fn default_backend() -> Arc<dyn CameraBackend> {
    #[cfg(feature = "gstreamer")]
    {
        Arc::new(GstCameraBackend::new())
    }
    #[cfg(not(feature = "gstreamer"))]
    {
        tracing::warn!("Built without the gstreamer feature; using the synthetic camera");
        Arc::new(SyntheticBackend::default())
    }
}
