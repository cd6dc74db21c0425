//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PolaroidError, PolaroidResult};

/// Instruction sent with every caption request.
pub const DEFAULT_CAPTION_PROMPT: &str = "Please look at this image and generate a very short, poetic, or witty caption (maximum 10 words) suitable for a Polaroid photo bottom margin. The language should be Chinese (Simplified). Only return the text.";

/// Caption used whenever the captioning service cannot produce one.
pub const DEFAULT_FALLBACK_CAPTION: &str = "美好瞬间";

/// Caption drawn on a downloaded print when the user left it blank.
pub const DEFAULT_EMPTY_CAPTION_PLACEHOLDER: &str = "我的时刻";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported prints are written.
    pub output_dir: PathBuf,

    /// Camera capture settings.
    pub camera: CameraDefaults,

    /// Print layout and typography.
    pub print: PrintDefaults,

    /// Captioning service settings.
    pub caption: CaptionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default camera parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDefaults {
    /// Explicit device node (e.g. `/dev/video2`). Overrides facing selection.
    pub device: Option<String>,

    /// Device used for the front-facing camera.
    pub front_device: Option<String>,

    /// Device used for the back-facing camera.
    pub back_device: Option<String>,

    /// Preferred capture resolution; the device may negotiate something else.
    pub ideal_width: u32,
    pub ideal_height: u32,

    /// Mirror captured frames so they match the live preview.
    pub mirror: bool,

    /// How long to wait for a frame before failing the capture.
    pub frame_timeout_ms: u64,

    /// How long to wait for the device to start streaming.
    pub open_timeout_ms: u64,

    /// Delay between the shutter press and the grab when the flash is on.
    pub flash_delay_ms: u64,

    /// Frames discarded after opening so exposure can settle.
    pub warmup_frames: u32,

    /// Apply the camera's square crop to uploaded files as well.
    pub square_uploads: bool,
}

/// Print layout and typography.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintDefaults {
    pub width: u32,
    pub height: u32,

    /// Border on the top, left and right of the photo.
    pub padding: u32,

    /// Caption band below the photo.
    pub bottom_padding: u32,

    pub caption_font_size: f32,
    pub date_font_size: f32,

    /// Caption font files, decorative first; the first loadable one wins.
    pub caption_fonts: Vec<PathBuf>,

    /// Date font files; the first loadable one wins.
    pub date_fonts: Vec<PathBuf>,

    /// Caption drawn on a downloaded print when the caption is blank.
    pub empty_caption_placeholder: String,

    /// How long a fresh preview stays in the "developing" state.
    pub developing_ms: u64,
}

/// Captioning service parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionDefaults {
    /// Base URL of the generative-language API.
    pub endpoint: String,

    /// Model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Upper bound on a single caption request.
    pub timeout_secs: u64,

    /// Caption substituted on any failure.
    pub fallback: String,

    /// Instruction sent alongside the image.
    pub prompt: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "polaroid=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            camera: CameraDefaults::default(),
            print: PrintDefaults::default(),
            caption: CaptionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            device: None,
            front_device: None,
            back_device: None,
            ideal_width: 1920,
            ideal_height: 1920,
            mirror: true,
            frame_timeout_ms: 3_000,
            open_timeout_ms: 10_000,
            flash_delay_ms: 100,
            warmup_frames: 3,
            square_uploads: false,
        }
    }
}

impl Default for PrintDefaults {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1200,
            padding: 60,
            bottom_padding: 250,
            caption_font_size: 60.0,
            date_font_size: 30.0,
            caption_fonts: Vec::new(),
            date_fonts: Vec::new(),
            empty_caption_placeholder: DEFAULT_EMPTY_CAPTION_PLACEHOLDER.to_string(),
            developing_ms: 2_500,
        }
    }
}

impl Default for CaptionDefaults {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 20,
            fallback: DEFAULT_FALLBACK_CAPTION.to_string(),
            prompt: DEFAULT_CAPTION_PROMPT.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl CaptionDefaults {
    /// Look up the service credential.
    ///
    /// The configured variable is checked first, then `GEMINI_API_KEY`.
    /// Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        [self.api_key_env.as_str(), "GEMINI_API_KEY"]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), error = %e, "Ignoring unusable config");
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], any
    /// problem with the file is an error.
    pub fn load_from(path: &Path) -> PolaroidResult<Self> {
        if !path.exists() {
            return Err(PolaroidError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make an operation impossible.
    pub fn validate(&self) -> PolaroidResult<()> {
        let print = &self.print;
        if print.width <= print.padding.saturating_mul(2) {
            return Err(PolaroidError::config(format!(
                "print width {} leaves no room for padding {}",
                print.width, print.padding
            )));
        }
        if print.height <= print.padding.saturating_add(print.bottom_padding) {
            return Err(PolaroidError::config(format!(
                "print height {} leaves no room for padding {} + caption band {}",
                print.height, print.padding, print.bottom_padding
            )));
        }
        if print.caption_font_size <= 0.0 || print.date_font_size <= 0.0 {
            return Err(PolaroidError::config("font sizes must be positive"));
        }
        if self.caption.timeout_secs == 0 {
            return Err(PolaroidError::config("caption timeout must be at least 1s"));
        }
        if self.caption.fallback.trim().is_empty() {
            return Err(PolaroidError::config("fallback caption must not be empty"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("polaroid").join("config.json")
}

/// Default directory for exported prints.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_PICTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Pictures"));
    base.join("polaroid")
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}
