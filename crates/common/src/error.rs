//! Error types shared across Polaroid Snap crates.

use std::path::PathBuf;

/// Message shown to the user whenever the camera cannot be opened.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "无法访问相机，请检查权限。";

/// Top-level error type for Polaroid Snap operations.
#[derive(Debug, thiserror::Error)]
pub enum PolaroidError {
    #[error("Camera unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Caption error: {message}")]
    Caption { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{operation} timed out after {secs:.1}s")]
    Timeout { operation: String, secs: f64 },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PolaroidError.
pub type PolaroidResult<T> = Result<T, PolaroidError>;

impl PolaroidError {
    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs: after.as_secs_f64(),
        }
    }

    /// Text suitable for showing to the person holding the camera.
    ///
    /// Only camera failures have a fixed message; everything else falls back
    /// to the display string.
    pub fn user_message(&self) -> String {
        match self {
            Self::DeviceUnavailable { .. } => CAMERA_UNAVAILABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::DeviceUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(PolaroidError::device_unavailable("x")
            .to_string()
            .starts_with("Camera unavailable:"));
        assert!(PolaroidError::decode("x")
            .to_string()
            .starts_with("Decode error:"));
        assert!(PolaroidError::render("x")
            .to_string()
            .starts_with("Render error:"));
        assert!(PolaroidError::invalid_state("x")
            .to_string()
            .starts_with("Invalid state:"));
    }

    #[test]
    fn device_unavailable_has_fixed_user_message() {
        let err = PolaroidError::device_unavailable("permission denied by portal");
        assert_eq!(err.user_message(), CAMERA_UNAVAILABLE_MESSAGE);
        assert!(err.is_device_unavailable());

        let other = PolaroidError::export("disk full");
        assert_eq!(other.user_message(), "Export error: disk full");
    }

    #[test]
    fn timeout_reports_operation_and_duration() {
        let err = PolaroidError::timeout("caption request", std::time::Duration::from_millis(2500));
        assert_eq!(err.to_string(), "caption request timed out after 2.5s");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PolaroidError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
