//! Polaroid Snap Captions
//!
//! One best-effort request per caption: the image goes to a vision model
//! together with a fixed instruction, and a short line of text comes back.
//! [`CaptionService::request_caption`] never fails; any problem turns into
//! the configured fallback caption.

pub mod gemini;
pub mod provider;
pub mod service;

pub use gemini::GeminiProvider;
pub use provider::CaptionProvider;
pub use service::*;
