//! Frame orchestration.
//!
//! This module is responsible for:
//! - the error type shared by the crate
//! - device and swap chain configuration
//! - sequencing a frame's geometry, ambient and dynamic light passes

mod config;
mod error;
mod init;
mod orchestrator;
mod phase;

pub use config::DeviceConfig;
pub use error::{GraphicsError, Result, SurfaceErrorAction};
pub use init::DeviceInit;
pub use orchestrator::Device;
pub use phase::FramePhase;
