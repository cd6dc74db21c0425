use std::io::Cursor;
use std::time::Instant;

use chrono::{TimeZone, Utc};
use image::{ImageFormat, Rgba, RgbaImage};
use polaroid_common::config::DEFAULT_EMPTY_CAPTION_PLACEHOLDER;
use polaroid_common::error::PolaroidError;
use polaroid_model::{CapturedImage, ImageOrigin, Studio};
use polaroid_render_engine::text::LoadedFont;
use polaroid_render_engine::{export_print, FontSet, PrintLayout, PrintRenderer};
use proptest::prelude::*;

fn png_image(width: u32, height: u32) -> CapturedImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 251) as u8, 90, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    CapturedImage::from_encoded(
        out.into_inner(),
        ImageOrigin::Upload {
            path: "fixture.png".into(),
        },
    )
    .unwrap()
}

fn blank_renderer() -> PrintRenderer {
    PrintRenderer::new(PrintLayout::default(), FontSet::empty())
}

fn scratch_dir(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("polaroid-export-{tag}-{}", std::process::id()))
}

#[test]
fn blank_caption_and_date_export_a_valid_png_without_fonts() {
    let mut studio = Studio::default();
    studio
        .accept_upload(png_image(4000, 2000), "", Instant::now())
        .unwrap();
    let record = studio.record().unwrap();

    // Only blank text can be drawn without fonts, so pass a blank placeholder.
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let print = export_print(&blank_renderer(), record, "", at).unwrap();
    assert_eq!(print.file_name, format!("polaroid-{}.png", at.timestamp_millis()));

    let decoded = image::load_from_memory_with_format(&print.png, ImageFormat::Png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1000, 1200));
    assert_eq!((print.width, print.height), (1000, 1200));
}

#[test]
fn corrupt_source_fails_before_anything_is_written() {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 255]))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    let mut bytes = bytes.into_inner();
    bytes.truncate(bytes.len() / 2);
    let broken = CapturedImage::from_encoded(
        bytes,
        ImageOrigin::Upload {
            path: "broken.png".into(),
        },
    )
    .unwrap();

    let mut studio = Studio::default();
    studio.accept_upload(broken, "", Instant::now()).unwrap();
    let err = export_print(&blank_renderer(), studio.record().unwrap(), "", Utc::now()).unwrap_err();
    assert!(matches!(err, PolaroidError::Decode { .. }));
}

#[test]
fn save_writes_final_name_only() {
    let dir = scratch_dir("save");
    let mut studio = Studio::default();
    studio
        .accept_upload(png_image(300, 300), "", Instant::now())
        .unwrap();
    let print = export_print(&blank_renderer(), studio.record().unwrap(), "", Utc::now()).unwrap();

    let path = print.save(&dir.join("nested")).unwrap();
    assert!(path.ends_with(&print.file_name));
    assert_eq!(std::fs::read(&path).unwrap(), print.png);

    let leftovers: Vec<_> = std::fs::read_dir(dir.join("nested"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn blank_caption_uses_placeholder_when_fonts_exist() {
    let fonts = FontSet::resolve(&[], &[]);
    let drawable = matches!(fonts.caption_font_for(DEFAULT_EMPTY_CAPTION_PLACEHOLDER), Ok(Some(_)))
        && matches!(fonts.date_font_for("2024.05.01"), Ok(Some(_)));
    if !drawable {
        eprintln!("no system font can draw the placeholder; skipping");
        return;
    }
    let renderer = PrintRenderer::new(PrintLayout::default(), fonts);
    let mut studio = Studio::default();
    studio
        .accept_upload(png_image(800, 600), "2024.05.01", Instant::now())
        .unwrap();
    let record = studio.record().unwrap();

    let with_placeholder =
        export_print(&renderer, record, DEFAULT_EMPTY_CAPTION_PLACEHOLDER, Utc::now()).unwrap();
    let without = export_print(&renderer, record, " ", Utc::now());
    // A whitespace placeholder draws nothing, so both succeed but differ.
    let without = without.unwrap();
    assert_ne!(with_placeholder.png, without.png);
}

#[test]
fn chinese_caption_with_latin_font_fails_instead_of_drawing_boxes() {
    let latin = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    ]
    .iter()
    .find_map(|p| LoadedFont::load(std::path::Path::new(p)));
    let Some(latin) = latin else {
        eprintln!("no latin-only font available; skipping");
        return;
    };
    let renderer = PrintRenderer::new(
        PrintLayout::default(),
        FontSet::from_candidates(vec![latin.clone()], vec![latin]),
    );
    let mut studio = Studio::default();
    studio
        .accept_upload(png_image(64, 64), "2024.05.01", Instant::now())
        .unwrap();
    studio.edit_caption("美好瞬间").unwrap();

    let err = export_print(&renderer, studio.record().unwrap(), DEFAULT_EMPTY_CAPTION_PLACEHOLDER, Utc::now())
        .unwrap_err();
    assert!(matches!(err, PolaroidError::Render { .. }), "{err}");

    studio.edit_caption("Summer").unwrap();
    let print = export_print(&renderer, studio.record().unwrap(), DEFAULT_EMPTY_CAPTION_PLACEHOLDER, Utc::now())
        .unwrap();
    assert_eq!((print.width, print.height), (1000, 1200));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn print_size_is_independent_of_source(width in 1u32..600, height in 1u32..600) {
        let mut studio = Studio::default();
        studio.accept_upload(png_image(width, height), "", Instant::now()).unwrap();
        let print = export_print(&blank_renderer(), studio.record().unwrap(), "", Utc::now()).unwrap();
        let decoded = image::load_from_memory(&print.png).unwrap();
        prop_assert_eq!((decoded.width(), decoded.height()), (1000, 1200));
    }
}
