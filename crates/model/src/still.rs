//! Encoded still images produced by a capture or an upload.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, ImageReader};
use polaroid_common::error::{PolaroidError, PolaroidResult};
use serde::{Deserialize, Serialize};

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Towards the user (selfie camera). Previewed mirrored.
    #[default]
    Front,
    /// Away from the user.
    Back,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => f.write_str("front"),
            Facing::Back => f.write_str("back"),
        }
    }
}

/// Where a captured image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    /// A still grabbed from a live camera stream.
    Camera { facing: Facing },
    /// A local file picked by the user.
    Upload { path: PathBuf },
}

/// An encoded raster image plus the dimensions read from its header.
///
/// Immutable once created; a recapture replaces it wholesale. Cloning only
/// bumps a reference count.
#[derive(Clone)]
pub struct CapturedImage {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
    origin: ImageOrigin,
}

impl CapturedImage {
    /// Wrap encoded bytes, sniffing the format and reading the dimensions.
    ///
    /// Only the header is parsed here; a truncated body surfaces later from
    /// [`CapturedImage::decode`].
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>, origin: ImageOrigin) -> PolaroidResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let reader = ImageReader::new(Cursor::new(&bytes[..]))
            .with_guessed_format()
            .map_err(|e| PolaroidError::decode(format!("Failed to read image header: {e}")))?;
        let format = reader
            .format()
            .ok_or_else(|| PolaroidError::decode("Unrecognized image format"))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PolaroidError::decode(format!("Failed to read {format:?} dimensions: {e}")))?;

        if width == 0 || height == 0 {
            return Err(PolaroidError::decode(format!(
                "Image has no pixels ({width}x{height})"
            )));
        }

        Ok(Self {
            bytes,
            format,
            width,
            height,
            origin,
        })
    }

    /// Fully decode the image.
    pub fn decode(&self) -> PolaroidResult<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| PolaroidError::decode(format!("Failed to decode {:?} image: {e}", self.format)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the encoded bytes (e.g. `image/jpeg`).
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn from_encoded_reads_format_and_dimensions() {
        let image = CapturedImage::from_encoded(
            png_bytes(40, 30),
            ImageOrigin::Camera {
                facing: Facing::Front,
            },
        )
        .unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!((image.width(), image.height()), (40, 30));
        assert!(!image.is_square());

        let decoded = image.decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = CapturedImage::from_encoded(
            b"definitely not an image".to_vec(),
            ImageOrigin::Upload {
                path: PathBuf::from("notes.txt"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, PolaroidError::Decode { .. }));
    }

    #[test]
    fn truncated_body_fails_on_decode() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(bytes.len() / 2);
        let image = CapturedImage::from_encoded(
            bytes,
            ImageOrigin::Upload {
                path: PathBuf::from("half.png"),
            },
        )
        .unwrap();
        assert!(matches!(image.decode(), Err(PolaroidError::Decode { .. })));
    }

    #[test]
    fn facing_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Facing::Back).unwrap(), "\"back\"");
        assert_eq!(Facing::Front.to_string(), "front");
    }
}
