//! Print compositor: background, photo window, caption and date.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use polaroid_common::config::PrintDefaults;
use polaroid_common::error::PolaroidResult;
use polaroid_model::CapturedImage;

use crate::layout::{cover_crop, PrintLayout};
use crate::text::{draw_centered, FontSet};

pub const PAPER_TOP: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
pub const PAPER_BOTTOM: Rgba<u8> = Rgba([0xf8, 0xf8, 0xf8, 0xff]);
pub const PHOTO_PLACEHOLDER: Rgba<u8> = Rgba([0x1a, 0x1a, 0x1a, 0xff]);
pub const CAPTION_INK: Rgba<u8> = Rgba([0x22, 0x22, 0x22, 0xff]);
pub const DATE_INK: Rgba<u8> = Rgba([0x88, 0x88, 0x88, 0xff]);

/// Renders fixed-layout prints.
#[derive(Debug, Clone)]
pub struct PrintRenderer {
    layout: PrintLayout,
    fonts: FontSet,
    caption_size: f32,
    date_size: f32,
}

impl PrintRenderer {
    pub fn new(layout: PrintLayout, fonts: FontSet) -> Self {
        Self {
            layout,
            fonts,
            caption_size: 60.0,
            date_size: 30.0,
        }
    }

    pub fn from_defaults(print: &PrintDefaults) -> PolaroidResult<Self> {
        Ok(Self::new(PrintLayout::from_defaults(print)?, FontSet::from_defaults(print))
            .with_font_sizes(print.caption_font_size, print.date_font_size))
    }

    pub fn with_font_sizes(mut self, caption: f32, date: f32) -> Self {
        self.caption_size = caption;
        self.date_size = date;
        self
    }

    pub fn layout(&self) -> &PrintLayout {
        &self.layout
    }

    /// Compose a print.
    ///
    /// The source is decoded and fonts are picked before anything is
    /// drawn, so a broken image yields `Decode` and text no font can draw
    /// yields `Render`, with no partial output either way.
    pub fn render(
        &self,
        image: &CapturedImage,
        caption: &str,
        date: &str,
    ) -> PolaroidResult<RgbaImage> {
        let source = image.decode()?;
        let caption_font = self.fonts.caption_font_for(caption)?;
        let date_font = self.fonts.date_font_for(date)?;

        let mut canvas = paper(self.layout.width(), self.layout.height());

        let inset = self.layout.inset();
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(inset.x as i32, inset.y as i32).of_size(inset.width, inset.height),
            PHOTO_PLACEHOLDER,
        );

        let crop = cover_crop(source.width(), source.height(), inset.width, inset.height);
        let (cx, cy, cw, ch) = crop.to_pixels(source.width(), source.height());
        let photo = source
            .crop_imm(cx, cy, cw, ch)
            .resize_exact(inset.width, inset.height, FilterType::Lanczos3)
            .to_rgba8();
        imageops::overlay(&mut canvas, &photo, inset.x as i64, inset.y as i64);

        if let Some(font) = caption_font {
            draw_centered(
                &mut canvas,
                font,
                caption,
                self.caption_size,
                self.layout.caption_anchor(),
                CAPTION_INK,
            );
        }
        if let Some(font) = date_font {
            draw_centered(
                &mut canvas,
                font,
                date,
                self.date_size,
                self.layout.date_anchor(),
                DATE_INK,
            );
        }

        tracing::debug!(
            source_width = source.width(),
            source_height = source.height(),
            crop = ?(cx, cy, cw, ch),
            caption_chars = caption.chars().count(),
            "Rendered print"
        );
        Ok(canvas)
    }
}

/// White paper with a faint diagonal falloff toward the bottom-right.
fn paper(width: u32, height: u32) -> RgbaImage {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    RgbaImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f32 / span;
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba([
            mix(PAPER_TOP[0], PAPER_BOTTOM[0]),
            mix(PAPER_TOP[1], PAPER_BOTTOM[1]),
            mix(PAPER_TOP[2], PAPER_BOTTOM[2]),
            0xff,
        ])
    })
}
