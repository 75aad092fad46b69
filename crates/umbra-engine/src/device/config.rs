use std::path::PathBuf;

use crate::pipeline::{BlendMode, Filter};

/// Renderer configuration independent of the backend.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Source of the geometry pass shader.
    pub geometry_shader: PathBuf,
    /// Source of the lighting pass shader.
    pub frame_shader: PathBuf,
    /// Blend used while lights accumulate into the back buffer.
    ///
    /// Defaults to [`BlendMode::Additive`] (`SrcAlpha, One, Add`) rather
    /// than the classic `SrcAlpha, InvSrcAlpha, Add`. The frame shader writes
    /// alpha 1, so under [`BlendMode::AlphaBlend`] every light replaces the
    /// previous ones instead of summing with them. `AlphaBlend` stays
    /// available for single-light output.
    pub light_blend: BlendMode,
    /// G-buffer clear value. Position w = 0 marks empty texels.
    pub geometry_clear_color: [f32; 4],
    pub frame_clear_color: [f32; 4],
    /// Filter of the geometry shader's image sampler.
    pub geometry_filter: Filter,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            geometry_shader: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/geometry.wgsl")),
            frame_shader: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/frame.wgsl")),
            light_blend: BlendMode::Additive,
            geometry_clear_color: [0.0; 4],
            frame_clear_color: [0.0, 0.0, 0.0, 1.0],
            geometry_filter: Filter::Anisotropic(16),
        }
    }
}
