//! Umbra engine crate.
//!
//! Deferred-shading renderer core. Scene geometry is drawn into a geometry
//! buffer (diffuse, specular, position, normal + depth), then lit by an ambient
//! pass and any number of additive light passes into the back buffer.
//!
//! All GPU state changes go through an explicit [`pipeline::PipelineState`]
//! handle owned by the [`device::Device`]; a [`backend::Backend`] turns the
//! recorded command stream into real GPU work at the end of each frame.

pub mod backend;
pub mod device;
pub mod logging;
pub mod pipeline;
pub mod resource;
pub mod scene;
pub mod shader;

pub use device::{Device, DeviceConfig, DeviceInit, GraphicsError, Result};
