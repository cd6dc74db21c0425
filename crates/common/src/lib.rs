//! Polaroid Snap Common Utilities
//!
//! Shared infrastructure for all Polaroid Snap crates:
//! - Error types and result aliases
//! - Print date and export file-name stamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod stamp;

pub use config::*;
pub use error::*;
pub use stamp::*;
