//! PNG export of finished prints.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_common::stamp::export_file_name;
use polaroid_model::PolaroidRecord;

use crate::compositor::PrintRenderer;

/// Encode a print losslessly.
pub fn encode_png(image: &RgbaImage) -> PolaroidResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| PolaroidError::export(format!("Failed to encode PNG: {e}")))?;
    Ok(out.into_inner())
}

/// A rendered print, ready to be written anywhere.
#[derive(Clone)]
pub struct ExportedPrint {
    /// `polaroid-<unix-millis>.png`
    pub file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportedPrint {
    /// Write the print into `dir`, creating it if needed.
    ///
    /// The file appears under its final name only once fully written.
    pub fn save(&self, dir: &Path) -> PolaroidResult<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| {
            PolaroidError::export(format!("Cannot create {}: {e}", dir.display()))
        })?;

        let target = dir.join(&self.file_name);
        let partial = dir.join(format!(".{}.part", self.file_name));
        std::fs::write(&partial, &self.png).map_err(|e| {
            PolaroidError::export(format!("Cannot write {}: {e}", partial.display()))
        })?;
        if let Err(e) = std::fs::rename(&partial, &target) {
            std::fs::remove_file(&partial).ok();
            return Err(PolaroidError::export(format!(
                "Cannot move print into place at {}: {e}",
                target.display()
            )));
        }

        tracing::info!(path = %target.display(), bytes = self.png.len(), "Saved print");
        Ok(target)
    }
}

impl std::fmt::Debug for ExportedPrint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedPrint")
            .field("file_name", &self.file_name)
            .field("bytes", &self.png.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Render and encode the record being previewed.
///
/// A blank caption is printed as `placeholder`.
pub fn export_print(
    renderer: &PrintRenderer,
    record: &PolaroidRecord,
    placeholder: &str,
    now: DateTime<Utc>,
) -> PolaroidResult<ExportedPrint> {
    let caption = record.caption_for_export(placeholder);
    let print = renderer.render(record.image(), caption, record.date())?;
    let png = encode_png(&print)?;

    Ok(ExportedPrint {
        file_name: export_file_name(&now),
        width: print.width(),
        height: print.height(),
        png,
    })
}
