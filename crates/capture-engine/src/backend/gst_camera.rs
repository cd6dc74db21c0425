//! GStreamer camera backend.
//!
//! Each open stream is a `v4l2src ! videoconvert ! appsink` pipeline that
//! delivers RGBA frames on demand. Only the newest frame is kept, so a grab
//! always returns what the camera sees right now.

use std::sync::OnceLock;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app::AppSink;
use image::RgbaImage;
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::Facing;

use crate::backend::{CameraBackend, DeviceInfo, LiveStream, StreamRequest};
use crate::frame::frame_from_rgba;

/// How long to wait for the pipeline to reach `Playing`.
const START_TIMEOUT_SECS: u64 = 10;

/// Camera access through V4L2 device nodes.
pub struct GstCameraBackend;

impl GstCameraBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GstCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CameraBackend for GstCameraBackend {
    fn name(&self) -> &str {
        "gstreamer"
    }

    fn list_devices(&self) -> PolaroidResult<Vec<DeviceInfo>> {
        Ok(detect_webcam_devices())
    }

    async fn open(&self, request: &StreamRequest) -> PolaroidResult<Box<dyn LiveStream>> {
        let device = select_device(request, &detect_webcam_devices())?;
        let request = request.clone();
        tracing::info!(device = %device, facing = %request.facing, "Opening camera");

        let stream = tokio::task::spawn_blocking(move || GstLiveStream::launch(&device, &request))
            .await
            .map_err(|e| PolaroidError::device_unavailable(format!("Camera start task failed: {e}")))??;
        Ok(Box::new(stream))
    }
}

/// A running camera pipeline.
pub struct GstLiveStream {
    device: String,
    pipeline: gst::Pipeline,
    appsink: AppSink,
    frame_timeout: gst::ClockTime,
    resolution: Option<(u32, u32)>,
    live: bool,
}

impl GstLiveStream {
    fn launch(device: &str, request: &StreamRequest) -> PolaroidResult<Self> {
        init_gstreamer()?;

        if !std::path::Path::new(device).exists() {
            return Err(PolaroidError::device_unavailable(format!(
                "Camera device {device} does not exist"
            )));
        }

        let launch = format!(
            "v4l2src device=\"{}\" ! videoconvert ! videoscale ! video/x-raw,format=RGBA,width=[1,{}],height=[1,{}] ! appsink name=sink max-buffers=1 drop=true sync=false",
            escape(device),
            request.ideal_width.max(1),
            request.ideal_height.max(1),
        );
        tracing::debug!(%launch, "Building camera pipeline");

        let pipeline = gst::parse::launch(&launch)
            .map_err(|e| {
                PolaroidError::device_unavailable(format!("Failed to build camera pipeline: {e}"))
            })?
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| {
                PolaroidError::device_unavailable("Launch string did not produce a pipeline")
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| PolaroidError::device_unavailable("Camera pipeline has no appsink"))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| PolaroidError::device_unavailable("Camera sink is not an appsink"))?;

        let mut stream = Self {
            device: device.to_string(),
            pipeline,
            appsink,
            frame_timeout: gst::ClockTime::from_mseconds(request.frame_timeout.as_millis() as u64),
            resolution: None,
            live: false,
        };
        // From here on Drop takes care of tearing the pipeline down.
        stream.start()?;
        Ok(stream)
    }

    fn start(&mut self) -> PolaroidResult<()> {
        self.live = true;
        self.pipeline.set_state(gst::State::Playing).map_err(|e| {
            PolaroidError::device_unavailable(format!(
                "Failed to start camera {}: {e:?}{}",
                self.device,
                self.bus_error().map(|m| format!(" ({m})")).unwrap_or_default()
            ))
        })?;

        match self
            .pipeline
            .state(gst::ClockTime::from_seconds(START_TIMEOUT_SECS))
        {
            (Ok(_), gst::State::Playing, _) => {
                tracing::debug!(device = %self.device, "Camera pipeline playing");
                Ok(())
            }
            (Ok(_), state, _) => Err(PolaroidError::device_unavailable(format!(
                "Camera {} stuck in {state:?} after {START_TIMEOUT_SECS}s",
                self.device
            ))),
            (Err(e), _, _) => Err(PolaroidError::device_unavailable(format!(
                "Camera {} failed to start: {e:?}{}",
                self.device,
                self.bus_error().map(|m| format!(" ({m})")).unwrap_or_default()
            ))),
        }
    }

    /// First error message posted on the pipeline bus, if any.
    fn bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        match msg.view() {
            gst::MessageView::Error(e) => Some(e.error().to_string()),
            _ => None,
        }
    }
}

impl LiveStream for GstLiveStream {
    fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    fn grab_frame(&mut self) -> PolaroidResult<RgbaImage> {
        if !self.live {
            return Err(PolaroidError::capture("Camera stream is stopped"));
        }

        let sample = self.appsink.try_pull_sample(self.frame_timeout).ok_or_else(|| {
            match self.bus_error() {
                Some(message) => PolaroidError::capture(format!("Camera error: {message}")),
                None => PolaroidError::capture(format!(
                    "No frame from {} within {}ms",
                    self.device,
                    self.frame_timeout.mseconds()
                )),
            }
        })?;

        let caps = sample
            .caps()
            .ok_or_else(|| PolaroidError::capture("Frame has no caps"))?;
        let structure = caps
            .structure(0)
            .ok_or_else(|| PolaroidError::capture("Frame caps have no structure"))?;
        let width = structure
            .get::<i32>("width")
            .map_err(|_| PolaroidError::capture("Frame caps have no width"))?;
        let height = structure
            .get::<i32>("height")
            .map_err(|_| PolaroidError::capture("Frame caps have no height"))?;
        let (width, height) = (width.max(0) as u32, height.max(0) as u32);

        let buffer = sample
            .buffer()
            .ok_or_else(|| PolaroidError::capture("Frame has no buffer"))?;
        let map = buffer
            .map_readable()
            .map_err(|_| PolaroidError::capture("Failed to map frame buffer"))?;

        let frame = frame_from_rgba(width, height, map.as_slice())?;
        self.resolution = Some((width, height));
        Ok(frame)
    }

    fn stop(&mut self) -> PolaroidResult<()> {
        if !self.live {
            return Ok(());
        }
        self.live = false;
        self.pipeline.set_state(gst::State::Null).map_err(|e| {
            PolaroidError::capture(format!("Failed to stop camera {}: {e:?}", self.device))
        })?;
        tracing::info!(device = %self.device, "Camera released");
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for GstLiveStream {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "Camera release on drop failed");
        }
    }
}

fn init_gstreamer() -> PolaroidResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(PolaroidError::device_unavailable(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// Pick the device node for a request.
///
/// An explicit device always wins. Otherwise the front camera is the best
/// webcam candidate and the back camera is the second best.
fn select_device(request: &StreamRequest, devices: &[DeviceInfo]) -> PolaroidResult<String> {
    if let Some(device) = &request.device {
        return Ok(device.clone());
    }

    let index = match request.facing {
        Facing::Front => 0,
        Facing::Back => 1,
    };
    devices
        .iter()
        .filter(|d| d.priority > 0)
        .nth(index)
        .map(|d| d.path.clone())
        .ok_or_else(|| {
            PolaroidError::device_unavailable(format!(
                "No {} camera found (checked {} /dev/video* nodes)",
                request.facing,
                devices.len()
            ))
        })
}

/// Enumerate `/dev/video0`–`/dev/video15`, best webcam candidate first.
fn detect_webcam_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = (0..16u32)
        .filter_map(|idx| {
            let path = format!("/dev/video{idx}");
            if !std::path::Path::new(&path).exists() {
                return None;
            }
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{idx}/name"))
                .map(|n| n.trim().to_string())
                .unwrap_or_default();
            let priority = webcam_priority(&name);
            Some(DeviceInfo {
                path,
                name,
                priority,
            })
        })
        .collect();

    // Stable sort keeps /dev/video order among equal priorities.
    devices.sort_by(|a, b| b.priority.cmp(&a.priority));
    devices
}

/// Score a V4L2 device name as a webcam candidate (0 = not a webcam).
fn webcam_priority(name: &str) -> u32 {
    let name = name.to_lowercase();
    let webcam_keywords = [
        "webcam",
        "camera",
        "cam",
        "facetime",
        "logitech",
        "integrated",
        "v4l2loopback",
    ];
    let non_webcam_keywords = [
        "tuner", "dvb", "hdmi", "capture", "encoder", "decoder", "metadata",
    ];

    if non_webcam_keywords.iter().any(|kw| name.contains(kw)) {
        return 0;
    }
    if webcam_keywords.iter().any(|kw| name.contains(kw)) {
        return 80;
    }
    // No sysfs name, or a generic one; still worth trying.
    10
}

fn escape(device: &str) -> String {
    device.replace('"', "\\\"")
}
