//! Polaroid Snap Capture Engine
//!
//! Turns a camera (or a file picked by the user) into a [`CapturedImage`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                CaptureAdapter                │
//! │   open_device_stream(facing) ──▶ DeviceStream│
//! │                                      │       │
//! │   ┌──────────────┐   grab_frame  ┌───▼─────┐ │
//! │   │ CameraBackend│──────────────▶│LiveStream│ │
//! │   │ gst | synth  │               └───┬─────┘ │
//! │   └──────────────┘                   │       │
//! │                       square crop + mirror   │
//! │                                      ▼       │
//! │                              JPEG CapturedImage
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Uploads skip the stream entirely; see [`upload::load_upload`].
//!
//! [`CapturedImage`]: polaroid_model::CapturedImage

pub mod adapter;
pub mod backend;
pub mod frame;
pub mod upload;

pub use adapter::*;
pub use backend::{default_backend, CameraBackend, DeviceInfo, LiveStream, StreamRequest};
