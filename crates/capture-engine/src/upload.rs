//! Files picked by the user.

use std::path::Path;

use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::{CapturedImage, ImageOrigin};

use crate::frame::{encode_png, square_crop};

/// Read a local image into a [`CapturedImage`].
///
/// The file is kept as-is unless `square` is set, in which case it gets the
/// same centered square crop as camera stills (never mirrored) and is
/// re-encoded as PNG.
pub fn load_upload(path: &Path, square: bool) -> PolaroidResult<CapturedImage> {
    if !path.exists() {
        return Err(PolaroidError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path)?;
    let origin = ImageOrigin::Upload {
        path: path.to_path_buf(),
    };
    let image = CapturedImage::from_encoded(bytes, origin.clone())?;
    tracing::debug!(
        path = %path.display(),
        format = ?image.format(),
        width = image.width(),
        height = image.height(),
        "Loaded upload"
    );

    if !square || image.is_square() {
        return Ok(image);
    }

    let cropped = square_crop(&image.decode()?.to_rgba8(), false);
    CapturedImage::from_encoded(encode_png(&cropped)?, origin)
}
