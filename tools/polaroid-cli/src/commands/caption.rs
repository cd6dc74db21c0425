//! Ask the caption service about an image.

use std::path::PathBuf;

use polaroid_caption_ai::CaptionService;
use polaroid_capture_engine::upload::load_upload;
use polaroid_common::config::AppConfig;

pub async fn run(config: &AppConfig, image: PathBuf) -> anyhow::Result<()> {
    let upload = load_upload(&image, false)?;
    let service = CaptionService::from_defaults(&config.caption);
    if !service.has_provider() {
        eprintln!(
            "No credential in ${} or $GEMINI_API_KEY; showing the fallback caption.",
            config.caption.api_key_env
        );
    }

    let cancel = super::ctrl_c_token();
    let outcome = service.request_caption(&upload, &cancel).await;
    println!("{}", outcome.text);
    Ok(())
}
