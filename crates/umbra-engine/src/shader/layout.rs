use crate::pipeline::StageMask;

/// How a bound texture is read by the shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureSampleKind {
    /// `texture_2d<f32>` read through a sampler.
    Filterable,
    /// `texture_2d<f32>` read with `textureLoad` only (e.g. 32-bit float targets).
    Unfilterable,
    /// `texture_depth_2d`.
    Depth,
}

/// Bindings a shader expects, by slot.
///
/// Constant buffers map to bind group 0, textures to group 1 and samplers to
/// group 2, with `binding == slot`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderLayout {
    pub constant_buffers: Vec<(u32, StageMask)>,
    pub textures: Vec<(u32, TextureSampleKind)>,
    pub samplers: Vec<u32>,
}

impl ShaderLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_buffer(mut self, slot: u32, stages: StageMask) -> Self {
        self.constant_buffers.push((slot, stages));
        self
    }

    pub fn with_texture(mut self, slot: u32, kind: TextureSampleKind) -> Self {
        self.textures.push((slot, kind));
        self
    }

    pub fn with_sampler(mut self, slot: u32) -> Self {
        self.samplers.push(slot);
        self
    }
}
