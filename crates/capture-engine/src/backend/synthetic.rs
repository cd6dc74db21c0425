//! Test-pattern camera.
//!
//! Produces the same frame every time: vertical color bars, a centered
//! circle, and a marker in the top-left corner so mirroring is visible.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use polaroid_common::error::{PolaroidError, PolaroidResult};

use crate::backend::{CameraBackend, DeviceInfo, LiveStream, StreamRequest};

const BARS: [[u8; 3]; 6] = [
    [230, 57, 70],
    [244, 162, 97],
    [233, 196, 106],
    [42, 157, 143],
    [38, 70, 83],
    [131, 56, 236],
];

/// A camera that needs no hardware.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    width: u32,
    height: u32,
    deny: bool,
}

impl SyntheticBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            deny: false,
        }
    }

    /// A camera whose `open` always fails as if permission was refused.
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[async_trait::async_trait]
impl CameraBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn list_devices(&self) -> PolaroidResult<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo {
            path: "synthetic:0".to_string(),
            name: format!("Test pattern {}x{}", self.width, self.height),
            priority: 1,
        }])
    }

    async fn open(&self, request: &StreamRequest) -> PolaroidResult<Box<dyn LiveStream>> {
        if self.deny {
            return Err(PolaroidError::device_unavailable(
                "Permission denied by synthetic camera",
            ));
        }
        let width = self.width.min(request.ideal_width.max(1));
        let height = self.height.min(request.ideal_height.max(1));
        tracing::debug!(width, height, facing = %request.facing, "Opening synthetic camera");
        Ok(Box::new(SyntheticStream {
            frame: Arc::new(test_pattern(width, height)),
            live: true,
        }))
    }
}

struct SyntheticStream {
    frame: Arc<RgbaImage>,
    live: bool,
}

impl LiveStream for SyntheticStream {
    fn resolution(&self) -> Option<(u32, u32)> {
        Some(self.frame.dimensions())
    }

    fn grab_frame(&mut self) -> PolaroidResult<RgbaImage> {
        if !self.live {
            return Err(PolaroidError::capture("Synthetic camera is stopped"));
        }
        Ok(self.frame.as_ref().clone())
    }

    fn stop(&mut self) -> PolaroidResult<()> {
        self.live = false;
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Draw the synthetic frame.
pub fn test_pattern(width: u32, height: u32) -> RgbaImage {
    let bar_width = (width / BARS.len() as u32).max(1);
    let mut frame = RgbaImage::from_fn(width, height, |x, _| {
        let [r, g, b] = BARS[((x / bar_width) as usize).min(BARS.len() - 1)];
        Rgba([r, g, b, 255])
    });

    let radius = (width.min(height) / 4) as i32;
    draw_filled_circle_mut(
        &mut frame,
        ((width / 2) as i32, (height / 2) as i32),
        radius,
        Rgba([250, 250, 250, 255]),
    );

    let marker = (width.min(height) / 8).max(1);
    draw_filled_rect_mut(
        &mut frame,
        Rect::at(0, 0).of_size(marker, marker),
        Rgba([0, 0, 0, 255]),
    );
    frame
}
