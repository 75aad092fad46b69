use crate::backend::Backend;
use crate::device::Result;
use crate::pipeline::slots::{DEPTH_SLOT, DIFFUSE_SLOT, NORMAL_SLOT, POSITION_SLOT, SPECULAR_SLOT};
use crate::pipeline::{BlendMode, CullMode, FillMode, PipelineState, RasterizerState, TextureId};

use super::texture::Texture;

const GEOMETRY_RASTERIZER: RasterizerState = RasterizerState::new(FillMode::Solid, CullMode::Back, true);
const FRAME_RASTERIZER: RasterizerState = RasterizerState::new(FillMode::Solid, CullMode::Back, false);

/// Four float color targets plus depth-stencil, sized to the back buffer.
///
/// Shader output location N writes color target N: diffuse, specular,
/// position, normal.
#[derive(Debug)]
pub struct GeometryBuffer {
    colors: [Texture; 4],
    depth: Texture,
    clear_color: [f32; 4],
}

impl GeometryBuffer {
    pub fn new(backend: &mut dyn Backend, width: u32, height: u32, clear_color: [f32; 4]) -> Result<Self> {
        let colors = [
            Texture::geometry(backend, "gbuffer diffuse", DIFFUSE_SLOT, width, height)?,
            Texture::geometry(backend, "gbuffer specular", SPECULAR_SLOT, width, height)?,
            Texture::geometry(backend, "gbuffer position", POSITION_SLOT, width, height)?,
            Texture::geometry(backend, "gbuffer normal", NORMAL_SLOT, width, height)?,
        ];
        let depth = Texture::depth_stencil(backend, "gbuffer depth", DEPTH_SLOT, width, height)?;
        log::debug!("geometry buffer {width}x{height}");

        Ok(Self { colors, depth, clear_color })
    }

    pub fn colors(&self) -> &[Texture; 4] {
        &self.colors
    }

    pub fn diffuse(&self) -> &Texture {
        &self.colors[0]
    }

    pub fn specular(&self) -> &Texture {
        &self.colors[1]
    }

    pub fn position(&self) -> &Texture {
        &self.colors[2]
    }

    pub fn normal(&self) -> &Texture {
        &self.colors[3]
    }

    pub fn depth(&self) -> &Texture {
        &self.depth
    }

    pub fn size(&self) -> (u32, u32) {
        self.depth.size()
    }

    fn color_ids(&self) -> [Option<TextureId>; 4] {
        self.colors.each_ref().map(|t| Some(t.id()))
    }

    fn enable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_render_targets(&self.color_ids(), Some(self.depth.id()))?;
        state.set_rasterizer_state(GEOMETRY_RASTERIZER);
        state.set_blend_state(BlendMode::Disabled);

        for color in &self.colors {
            state.clear_render_target(color.id(), self.clear_color)?;
        }
        state.clear_depth_stencil(self.depth.id(), 1.0, 0)
    }

    fn disable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_render_targets(&[None; 4], None)
    }

    fn release(self, backend: &mut dyn Backend) {
        for color in self.colors {
            color.release(backend);
        }
        self.depth.release(backend);
    }
}

/// The swap chain's current back buffer as a light accumulation target.
#[derive(Debug)]
pub struct FrameBuffer {
    blend: BlendMode,
    clear_color: [f32; 4],
}

impl FrameBuffer {
    pub fn new(blend: BlendMode, clear_color: [f32; 4]) -> Self {
        Self { blend, clear_color }
    }

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    fn enable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_render_targets(&[Some(TextureId::BACK_BUFFER)], None)?;
        state.set_rasterizer_state(FRAME_RASTERIZER);
        state.set_blend_state(self.blend);
        state.clear_render_target(TextureId::BACK_BUFFER, self.clear_color)
    }

    fn disable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_render_targets(&[None], None)
    }
}

/// Output-merger configuration for one pass.
#[derive(Debug)]
pub enum RenderTarget {
    Geometry(GeometryBuffer),
    Frame(FrameBuffer),
}

impl RenderTarget {
    /// Binds every owned target in one call, sets the pass's rasterizer and
    /// blend state, then clears every owned target.
    pub fn enable(&self, state: &mut PipelineState) -> Result<()> {
        log::trace!("enable {} target", self.name());
        match self {
            RenderTarget::Geometry(g) => g.enable(state),
            RenderTarget::Frame(f) => f.enable(state),
        }
    }

    /// Unbinds every slot `enable` used and restores default rasterizer and
    /// blend state.
    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        match self {
            RenderTarget::Geometry(g) => g.disable(state)?,
            RenderTarget::Frame(f) => f.disable(state)?,
        }
        state.set_rasterizer_state(RasterizerState::default());
        state.set_blend_state(BlendMode::default());
        Ok(())
    }

    /// Targets a later pass reads as shader resources.
    pub fn outputs(&self) -> &[Texture] {
        match self {
            RenderTarget::Geometry(g) => g.colors(),
            RenderTarget::Frame(_) => &[],
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryBuffer> {
        match self {
            RenderTarget::Geometry(g) => Some(g),
            RenderTarget::Frame(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderTarget::Geometry(_) => "geometry",
            RenderTarget::Frame(_) => "frame",
        }
    }

    /// Releases owned textures. The back buffer belongs to the swap chain.
    pub fn release(self, backend: &mut dyn Backend) {
        if let RenderTarget::Geometry(g) = self {
            g.release(backend);
        }
    }
}
