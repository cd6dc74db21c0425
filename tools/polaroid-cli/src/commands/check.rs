//! Check cameras, fonts, credentials, and the output directory.

use polaroid_capture_engine::{default_backend, CaptureAdapter, CaptureSettings};
use polaroid_common::config::{config_file_path, AppConfig};
use polaroid_render_engine::FontSet;

/// Sample date used to check the date font.
const SAMPLE_DATE: &str = "2024.05.01";

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Polaroid Snap System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    // Cameras
    let adapter = CaptureAdapter::new(default_backend(), CaptureSettings::from(&config.camera));
    match adapter.list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!("[WARN] Cameras ({}): none found", adapter.backend_name())
        }
        Ok(devices) => {
            println!("[OK] Cameras ({}): {}", adapter.backend_name(), devices.len());
            for d in &devices {
                println!("     {} {} (priority {})", d.path, d.name, d.priority);
            }
        }
        Err(e) => println!("[WARN] Cameras ({}): {e}", adapter.backend_name()),
    }

    // Fonts
    let fonts = FontSet::from_defaults(&config.print);
    let captions = [
        ("placeholder", config.print.empty_caption_placeholder.as_str()),
        ("fallback", config.caption.fallback.as_str()),
    ];
    let mut ready = true;
    for (role, what, text, font) in captions
        .iter()
        .map(|&(what, text)| ("Caption font", what, text, fonts.caption_font_for(text)))
        .chain([("Date font", "date", SAMPLE_DATE, fonts.date_font_for(SAMPLE_DATE))])
    {
        match font {
            Ok(Some(f)) => println!("[OK] {role} for {what} \"{text}\": {}", f.path().display()),
            Ok(None) => println!("[OK] {role} for {what}: blank, nothing to draw"),
            Err(e) => {
                ready = false;
                println!("[WARN] {role} for {what} \"{text}\": {e}");
            }
        }
    }

    // Credential
    if config.caption.api_key().is_some() {
        println!("[OK] Caption credential: present ({})", config.caption.model);
    } else {
        println!(
            "[WARN] Caption credential: ${} / $GEMINI_API_KEY not set; captions fall back to \"{}\"",
            config.caption.api_key_env, config.caption.fallback
        );
    }

    // Output directory
    let dir = &config.output_dir;
    let probe = dir.join(".polaroid-write-test");
    let writable = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&probe, b"ok"))
        .and_then(|_| std::fs::remove_file(&probe));
    match writable {
        Ok(()) => println!("[OK] Output directory: {}", dir.display()),
        Err(e) => println!("[WARN] Output directory {}: {e}", dir.display()),
    }

    println!();
    if ready {
        println!("Ready to print.");
    } else {
        println!("Prints need fonts that can draw the caption and date text. See above for fixes.");
    }

    Ok(())
}
