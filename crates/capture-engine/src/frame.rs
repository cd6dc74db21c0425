//! Still-frame processing: raw buffer import, square crop, mirroring, JPEG.

use std::io::Cursor;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage, RgbaImage};
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::{CapturedImage, Facing, ImageOrigin};

/// JPEG quality used for camera stills.
pub const CAPTURE_JPEG_QUALITY: u8 = 90;

/// Build an RGBA image from a (possibly padded) packed RGBA buffer.
pub fn frame_from_rgba(width: u32, height: u32, data: &[u8]) -> PolaroidResult<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(PolaroidError::capture(format!(
            "Frame has no pixels ({width}x{height})"
        )));
    }

    let row_bytes = width as usize * 4;
    let stride = data.len() / height as usize;
    if stride < row_bytes {
        return Err(PolaroidError::capture(format!(
            "Frame buffer too small: {} bytes for {width}x{height} RGBA",
            data.len()
        )));
    }

    let packed = if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut packed = Vec::with_capacity(row_bytes * height as usize);
        for row in data.chunks_exact(stride).take(height as usize) {
            packed.extend_from_slice(&row[..row_bytes]);
        }
        packed
    };

    RgbaImage::from_raw(width, height, packed)
        .ok_or_else(|| PolaroidError::capture("Frame buffer does not match its dimensions"))
}

/// Cut the centered square of side `min(w, h)` out of a frame, flipping it
/// horizontally when `mirror` is set so it matches a mirrored preview.
pub fn square_crop(frame: &RgbaImage, mirror: bool) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;

    let mut square = imageops::crop_imm(frame, x, y, side, side).to_image();
    if mirror {
        imageops::flip_horizontal_in_place(&mut square);
    }
    square
}

/// Encode an RGBA still as JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> PolaroidResult<Vec<u8>> {
    let rgb: RgbImage = image.convert();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| PolaroidError::capture(format!("Failed to encode JPEG: {e}")))?;
    Ok(out)
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> PolaroidResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| PolaroidError::capture(format!("Failed to encode PNG: {e}")))?;
    Ok(out.into_inner())
}

/// Square-crop, optionally mirror, and encode a raw camera frame.
pub fn still_from_frame(
    frame: &RgbaImage,
    facing: Facing,
    mirror: bool,
) -> PolaroidResult<CapturedImage> {
    let square = square_crop(frame, mirror);
    let jpeg = encode_jpeg(&square, CAPTURE_JPEG_QUALITY)?;
    tracing::debug!(
        raw_width = frame.width(),
        raw_height = frame.height(),
        side = square.width(),
        mirror,
        bytes = jpeg.len(),
        "Encoded camera still"
    );
    CapturedImage::from_encoded(jpeg, ImageOrigin::Camera { facing })
}
