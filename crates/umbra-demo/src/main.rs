//! Deferred-shading demo: a lit cube scene driven by the umbra engine.
//!
//! Usage: `umbra-demo [texture.png|texture.dds]`
//!
//! WASD moves the camera, dragging with the left mouse button turns it,
//! Escape quits.

mod clock;
mod input;
mod runtime;
mod scene;

use anyhow::Result;

use umbra_engine::logging::{init_logging, LoggingConfig};
use umbra_engine::{DeviceConfig, DeviceInit};

use runtime::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig { texture: std::env::args_os().nth(1).map(Into::into), ..RuntimeConfig::default() };
    if let Some(path) = &config.texture {
        log::info!("texture: {}", path.display());
    }

    Runtime::run(config, DeviceInit::default(), DeviceConfig::default())
}
