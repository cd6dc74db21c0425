//! The single in-memory polaroid being previewed.

use crate::still::CapturedImage;

/// One captured image together with its caption and date.
///
/// Owned by the [`Studio`](crate::state::Studio) for the lifetime of a
/// preview; discarded on reset or a new capture.
#[derive(Debug, Clone)]
pub struct PolaroidRecord {
    image: CapturedImage,
    caption: String,
    date: String,
}

impl PolaroidRecord {
    /// Create a record with an empty caption. `date` is fixed from here on.
    pub fn new(image: CapturedImage, date: impl Into<String>) -> Self {
        Self {
            image,
            caption: String::new(),
            date: date.into(),
        }
    }

    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Caption to draw on a downloaded print: the placeholder when blank.
    pub fn caption_for_export<'a>(&'a self, placeholder: &'a str) -> &'a str {
        if self.caption.trim().is_empty() {
            placeholder
        } else {
            &self.caption
        }
    }
}
