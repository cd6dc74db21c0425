//! Print geometry.

use polaroid_common::config::PrintDefaults;
use polaroid_common::error::{PolaroidError, PolaroidResult};

/// Date baseline distance from the bottom edge.
const DATE_OFFSET: f32 = 60.0;

/// The photo window inside a print, in print pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inset {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fixed print layout: equal padding on top/left/right, a taller band at
/// the bottom for the caption and date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    width: u32,
    height: u32,
    padding: u32,
    bottom_padding: u32,
}

impl PrintLayout {
    pub fn new(width: u32, height: u32, padding: u32, bottom_padding: u32) -> PolaroidResult<Self> {
        if width <= padding.saturating_mul(2) || height <= padding.saturating_add(bottom_padding) {
            return Err(PolaroidError::render(format!(
                "Print {width}x{height} leaves no room for the photo \
                 (padding {padding}, bottom {bottom_padding})"
            )));
        }
        Ok(Self {
            width,
            height,
            padding,
            bottom_padding,
        })
    }

    pub fn from_defaults(print: &PrintDefaults) -> PolaroidResult<Self> {
        Self::new(print.width, print.height, print.padding, print.bottom_padding)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn inset(&self) -> Inset {
        Inset {
            x: self.padding,
            y: self.padding,
            width: self.width - self.padding * 2,
            height: self.height - self.padding - self.bottom_padding,
        }
    }

    /// Center of the caption line.
    pub fn caption_anchor(&self) -> (f32, f32) {
        (
            self.width as f32 / 2.0,
            self.height as f32 - self.bottom_padding as f32 / 1.8,
        )
    }

    /// Center of the date line.
    pub fn date_anchor(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 - DATE_OFFSET)
    }
}

impl Default for PrintLayout {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1200,
            padding: 60,
            bottom_padding: 250,
        }
    }
}

/// Region of the source image to draw, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Integer pixel window for cropping a raster, rounded to the nearest
    /// pixel and clamped to the source.
    pub fn to_pixels(&self, src_width: u32, src_height: u32) -> (u32, u32, u32, u32) {
        let width = (self.width.round() as u32).clamp(1, src_width.max(1));
        let height = (self.height.round() as u32).clamp(1, src_height.max(1));
        let x = (self.x.round() as u32).min(src_width.saturating_sub(width));
        let y = (self.y.round() as u32).min(src_height.saturating_sub(height));
        (x, y, width, height)
    }
}

/// Largest centered region of the source with the target's aspect ratio.
///
/// Wider sources keep their full height and lose width evenly on both
/// sides; taller ones keep their full width.
pub fn cover_crop(src_width: u32, src_height: u32, target_width: u32, target_height: u32) -> CropRect {
    let (sw, sh) = (src_width as f64, src_height as f64);
    let target_aspect = target_width as f64 / target_height as f64;
    let image_aspect = sw / sh;

    if image_aspect > target_aspect {
        let width = sh * target_aspect;
        CropRect {
            x: (sw - width) / 2.0,
            y: 0.0,
            width,
            height: sh,
        }
    } else {
        let height = sw / target_aspect;
        CropRect {
            x: 0.0,
            y: (sh - height) / 2.0,
            width: sw,
            height,
        }
    }
}
