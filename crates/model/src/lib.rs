//! Polaroid Snap Model
//!
//! Defines the core data contracts:
//! - **CapturedImage:** an encoded still from the camera or an upload
//! - **PolaroidRecord:** the image plus its caption and print date
//! - **Studio:** the Idle → Capturing → Previewing state machine that owns
//!   the single record
//!
//! Nothing here touches devices, the network, or the filesystem.

pub mod still;
pub mod record;
pub mod state;

pub use still::*;
pub use record::*;
pub use state::*;
