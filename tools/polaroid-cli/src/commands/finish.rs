//! Shared tail of `shoot` and `print`: caption, render, save.

use std::path::PathBuf;

use chrono::Utc;
use polaroid_caption_ai::CaptionService;
use polaroid_common::config::AppConfig;
use polaroid_model::Studio;
use polaroid_render_engine::{export_print, PrintRenderer};
use tokio_util::sync::CancellationToken;

/// What to do with the record once it is on screen.
#[derive(Debug, Clone, Default)]
pub struct Finish {
    pub caption: Option<String>,
    pub ai: bool,
    pub output: Option<PathBuf>,
}

/// Caption the previewed record, export it, and reset the studio.
pub async fn caption_and_export(
    studio: &mut Studio,
    config: &AppConfig,
    finish: Finish,
    cancel: &CancellationToken,
) -> anyhow::Result<PathBuf> {
    if let Some(text) = finish.caption {
        studio.edit_caption(text)?;
    } else if finish.ai {
        println!("Writing a caption...");
        let service = CaptionService::from_defaults(&config.caption);
        let ticket = studio.begin_caption_request()?;
        let outcome = service.request_caption(ticket.image(), cancel).await;
        if !outcome.generated {
            println!("  Caption service unavailable; using \"{}\"", outcome.text);
        }
        studio.finish_caption_request(ticket, outcome.text);
    }

    let record = studio
        .record()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No polaroid to export"))?;
    println!("  Caption: {}", record.caption_for_export(&config.print.empty_caption_placeholder));
    println!("  Date: {}", record.date());

    let renderer = PrintRenderer::from_defaults(&config.print)?;
    let placeholder = config.print.empty_caption_placeholder.clone();
    let print = tokio::task::spawn_blocking(move || {
        export_print(&renderer, &record, &placeholder, Utc::now())
    })
    .await?
    .map_err(|e| anyhow::anyhow!("Export failed: {e}"))?;

    let dir = finish.output.unwrap_or_else(|| config.output_dir.clone());
    let path = print
        .save(&dir)
        .map_err(|e| anyhow::anyhow!("Export failed: {e}"))?;
    println!("Print saved to: {}", path.display());

    studio.reset();
    Ok(path)
}
