//! Font resolution and centered text drawing.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use polaroid_common::config::PrintDefaults;
use polaroid_common::error::{PolaroidError, PolaroidResult};

/// Serif faces tried after the configured lists, CJK-capable ones first.
const SYSTEM_SERIF_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSerifCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSerifCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSerifCJK-Regular.ttc",
    "/usr/share/fonts/truetype/arphic/uming.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/System/Library/Fonts/Supplemental/Songti.ttc",
    "/Library/Fonts/Georgia.ttf",
];

/// A font together with the file it came from.
#[derive(Clone)]
pub struct LoadedFont {
    path: PathBuf,
    font: FontArc,
}

impl LoadedFont {
    /// Load the first face of a font file or collection.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        match FontVec::try_from_vec_and_index(bytes, 0) {
            Ok(font) => Some(Self {
                path: path.to_path_buf(),
                font: FontArc::new(font),
            }),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable font");
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_glyph(&self, c: char) -> bool {
        c.is_whitespace() || self.font.glyph_id(c).0 != 0
    }

    /// Whether every visible character of `text` has a real glyph.
    pub fn covers(&self, text: &str) -> bool {
        text.chars().all(|c| self.has_glyph(c))
    }

    /// `PxScale` for a CSS-style font size (pixels per em).
    fn scale_for(&self, size: f32) -> PxScale {
        match self.font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                PxScale::from(size * self.font.height_unscaled() / units_per_em)
            }
            _ => PxScale::from(size),
        }
    }
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont").field("path", &self.path).finish()
    }
}

/// Ordered candidate faces for the caption and the date of a print.
///
/// Configured fonts come first (decorative, then fallback), followed by the
/// system serif candidates. Each piece of text is drawn with the first
/// candidate that has glyphs for all of it.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    caption: Vec<LoadedFont>,
    date: Vec<LoadedFont>,
}

impl FontSet {
    /// Load every usable font from each ordered list, then the built-in
    /// system candidates.
    pub fn resolve(caption_fonts: &[PathBuf], date_fonts: &[PathBuf]) -> Self {
        let system = load_all(SYSTEM_SERIF_CANDIDATES.iter().map(Path::new));
        let caption = with_fallbacks(load_all(caption_fonts.iter().map(PathBuf::as_path)), &system);
        let date = with_fallbacks(load_all(date_fonts.iter().map(PathBuf::as_path)), &system);

        if caption.is_empty() || date.is_empty() {
            tracing::warn!(
                caption = caption.len(),
                date = date.len(),
                "No usable font for some print text; configure print.caption_fonts / print.date_fonts"
            );
        } else {
            tracing::debug!(
                caption = %caption[0].path.display(),
                date = %date[0].path.display(),
                candidates = caption.len(),
                "Resolved print fonts"
            );
        }

        Self { caption, date }
    }

    pub fn from_defaults(print: &PrintDefaults) -> Self {
        Self::resolve(&print.caption_fonts, &print.date_fonts)
    }

    /// A set built from already loaded fonts, in preference order.
    pub fn from_candidates(caption: Vec<LoadedFont>, date: Vec<LoadedFont>) -> Self {
        Self { caption, date }
    }

    /// A set with no fonts; only blank text can be drawn with it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn caption_candidates(&self) -> &[LoadedFont] {
        &self.caption
    }

    pub fn date_candidates(&self) -> &[LoadedFont] {
        &self.date
    }

    /// Face to draw `text` as a caption with. `None` for blank text.
    pub fn caption_font_for(&self, text: &str) -> PolaroidResult<Option<&LoadedFont>> {
        pick(&self.caption, text, "caption")
    }

    /// Face to draw `text` as a date with. `None` for blank text.
    pub fn date_font_for(&self, text: &str) -> PolaroidResult<Option<&LoadedFont>> {
        pick(&self.date, text, "date")
    }
}

fn load_all<'a>(paths: impl Iterator<Item = &'a Path>) -> Vec<LoadedFont> {
    paths
        .filter(|path| path.is_file())
        .filter_map(LoadedFont::load)
        .collect()
}

fn with_fallbacks(mut fonts: Vec<LoadedFont>, system: &[LoadedFont]) -> Vec<LoadedFont> {
    for font in system {
        if !fonts.iter().any(|f| f.path == font.path) {
            fonts.push(font.clone());
        }
    }
    fonts
}

fn pick<'a>(
    candidates: &'a [LoadedFont],
    text: &str,
    role: &str,
) -> PolaroidResult<Option<&'a LoadedFont>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    if candidates.is_empty() {
        return Err(PolaroidError::render(format!(
            "No usable {role} font; set print.{role}_fonts"
        )));
    }
    if let Some(font) = candidates.iter().find(|f| f.covers(text)) {
        return Ok(Some(font));
    }

    let missing: String = text
        .chars()
        .filter(|&c| !candidates.iter().any(|f| f.has_glyph(c)))
        .collect();
    let detail = if missing.is_empty() {
        "no single font has all of its characters".to_string()
    } else {
        format!("missing glyphs for {missing:?}")
    };
    Err(PolaroidError::render(format!(
        "No {role} font can draw {text:?}: {detail}; set print.{role}_fonts"
    )))
}

/// Top-left origin that centers one line on `anchor`: horizontally on
/// the advance width, vertically on the middle of the ascent/descent box.
fn line_origin(font: &LoadedFont, text: &str, scale: PxScale, anchor: (f32, f32)) -> (i32, i32) {
    let (width, _) = text_size(scale, &font.font, text);
    let scaled = font.font.as_scaled(scale);
    let line_height = scaled.ascent() - scaled.descent();
    let x = (anchor.0 - width as f32 / 2.0).round() as i32;
    let y = (anchor.1 - line_height / 2.0).round() as i32;
    (x, y)
}

/// Draw one line of text centered on `anchor` (horizontal center and
/// vertical middle of the line box).
pub fn draw_centered(
    canvas: &mut RgbaImage,
    font: &LoadedFont,
    text: &str,
    size: f32,
    anchor: (f32, f32),
    color: Rgba<u8>,
) {
    if text.is_empty() {
        return;
    }
    let scale = font.scale_for(size);
    let (x, y) = line_origin(font, text, scale, anchor);
    draw_text_mut(canvas, color, x, y, scale, &font.font, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_font() -> Option<LoadedFont> {
        FontSet::resolve(&[], &[]).caption_candidates().first().cloned()
    }

    fn latin_only_font() -> Option<LoadedFont> {
        SYSTEM_SERIF_CANDIDATES
            .iter()
            .filter(|p| p.contains("DejaVu") || p.contains("Georgia"))
            .find_map(|p| LoadedFont::load(Path::new(p)))
            .filter(|f| !f.has_glyph('美'))
    }

    #[test]
    fn missing_configured_fonts_fall_through() {
        let fonts = FontSet::resolve(
            &[PathBuf::from("/nonexistent/Decorative.ttf")],
            &[PathBuf::from("/nonexistent/Serif.ttf")],
        );
        for font in fonts.caption_candidates() {
            assert!(SYSTEM_SERIF_CANDIDATES.contains(&font.path().to_str().unwrap_or_default()));
        }
    }

    #[test]
    fn non_font_file_is_skipped() {
        let path = std::env::temp_dir().join(format!("polaroid-not-a-font-{}.ttf", std::process::id()));
        std::fs::write(&path, b"not a font").unwrap();
        assert!(LoadedFont::load(&path).is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn blank_text_needs_no_font() {
        let fonts = FontSet::empty();
        assert!(fonts.caption_font_for("  ").unwrap().is_none());
        assert!(fonts.date_font_for("").unwrap().is_none());
        assert!(matches!(
            fonts.caption_font_for("hello"),
            Err(PolaroidError::Render { .. })
        ));
    }

    #[test]
    fn latin_only_font_cannot_draw_chinese() {
        let Some(latin) = latin_only_font() else {
            eprintln!("no latin-only font available; skipping");
            return;
        };
        assert!(latin.covers("2024.05.01"));
        let fonts = FontSet::from_candidates(vec![latin.clone()], vec![latin]);
        assert!(fonts.date_font_for("2024.05.01").unwrap().is_some());

        let err = fonts.caption_font_for("美好瞬间").unwrap_err();
        assert!(matches!(err, PolaroidError::Render { .. }));
        assert!(err.to_string().contains('美'), "{err}");
    }

    #[test]
    fn chinese_caption_skips_configured_latin_font() {
        let Some(latin) = latin_only_font() else {
            eprintln!("no latin-only font available; skipping");
            return;
        };
        let fonts = FontSet::resolve(&[latin.path().to_path_buf()], &[]);
        assert_eq!(fonts.caption_candidates()[0].path(), latin.path());
        match fonts.caption_font_for("我的时刻") {
            Ok(Some(font)) => {
                assert_ne!(font.path(), latin.path());
                assert!(font.covers("我的时刻"));
            }
            Ok(None) => panic!("non-blank text resolved to no font"),
            Err(e) => assert!(matches!(e, PolaroidError::Render { .. })),
        }
    }

    #[test]
    fn text_is_centered_on_anchor() {
        let Some(font) = any_font() else {
            eprintln!("no system font available; skipping");
            return;
        };
        let mut canvas = RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255]));
        draw_centered(&mut canvas, &font, "2024.05.01", 30.0, (200.0, 100.0), Rgba([0, 0, 0, 255]));

        let inked: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        let min_x = inked.iter().map(|p| p.0).min().unwrap_or(0);
        let max_x = inked.iter().map(|p| p.0).max().unwrap_or(0);
        let mid = (min_x + max_x) as f32 / 2.0;
        assert!((mid - 200.0).abs() < 8.0, "ink centered at {mid}");
    }

    #[test]
    fn line_position_ignores_glyph_shapes() {
        let Some(font) = any_font() else {
            return;
        };
        let scale = font.scale_for(60.0);
        let (_, low) = line_origin(&font, "ace", scale, (500.0, 1061.0));
        let (_, tall) = line_origin(&font, "Ag", scale, (500.0, 1061.0));
        assert_eq!(low, tall);
    }
}
