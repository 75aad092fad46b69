//! Fixed binding-slot convention shared by the engine and its shaders.
//!
//! Constant buffers live in bind group 0, textures in group 1 and samplers in
//! group 2; within a group the binding index is the slot.

/// Per-object transform (world, world normals, view-projection). Vertex stage.
pub const TRANSFORM_SLOT: u32 = 0;
/// Camera and light vectors. Pixel stage.
pub const VECTORS_SLOT: u32 = 1;
/// Material parameters during the geometry pass. Pixel stage.
pub const MATERIAL_SLOT: u32 = 2;
/// Light parameters during the lighting passes. Pixel stage.
pub const LIGHT_SLOT: u32 = 2;

pub const DIFFUSE_SLOT: u32 = 0;
pub const SPECULAR_SLOT: u32 = 1;
pub const POSITION_SLOT: u32 = 2;
pub const NORMAL_SLOT: u32 = 3;
pub const DEPTH_SLOT: u32 = 4;

/// Image textures bind here during the geometry pass.
pub const IMAGE_SLOT: u32 = 0;
pub const SAMPLER_SLOT: u32 = 0;
