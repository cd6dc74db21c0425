//! Polaroid Snap Render Engine
//!
//! Turns a captured image, a caption and a date into a fixed-size print.
//!
//! # Pipeline
//!
//! ```text
//! CapturedImage ── decode ──┐
//!                           ├── cover crop + Lanczos resize ──┐
//! PrintLayout (inset) ──────┘                                 │
//!                                        paper + placeholder ─┤
//!                                                             ├── caption / date text
//! FontSet ────────────────────────────────────────────────────┘        │
//!                                                                      ▼
//!                                                         PNG  polaroid-<millis>.png
//! ```
//!
//! [`film`] holds the preview-only look (tone and developing animation).

pub mod compositor;
pub mod export;
pub mod film;
pub mod layout;
pub mod text;

pub use compositor::PrintRenderer;
pub use export::*;
pub use layout::{cover_crop, CropRect, Inset, PrintLayout};
pub use text::FontSet;
