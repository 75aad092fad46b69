use std::path::Path;

use crate::backend::{decode_image, Backend, ImageDesc, TextureDesc, TextureFormat, TextureUsage};
use crate::device::{GraphicsError, Result};
use crate::pipeline::{AddressMode, Filter, PipelineState, SamplerDesc, SamplerId, TextureId};

/// What a texture was created for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureKind {
    /// G-buffer color target, later read by the lighting passes.
    Geometry,
    /// Depth/stencil target.
    DepthStencil,
    /// Loaded image, read through its own sampler.
    Image { sampler: SamplerId },
}

/// A texture bound for reading at a fixed shader-resource slot.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    slot: u32,
    kind: TextureKind,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn geometry(
        backend: &mut dyn Backend,
        label: &str,
        slot: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let id = backend.create_texture(&TextureDesc {
            label: label.to_string(),
            width,
            height,
            format: TextureFormat::Rgba32Float,
            usage: TextureUsage::RENDER_TARGET | TextureUsage::SHADER_RESOURCE,
        })?;
        Ok(Self { id, slot, kind: TextureKind::Geometry, width, height })
    }

    pub fn depth_stencil(
        backend: &mut dyn Backend,
        label: &str,
        slot: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let id = backend.create_texture(&TextureDesc {
            label: label.to_string(),
            width,
            height,
            format: TextureFormat::Depth24PlusStencil8,
            usage: TextureUsage::DEPTH_STENCIL | TextureUsage::SHADER_RESOURCE,
        })?;
        Ok(Self { id, slot, kind: TextureKind::DepthStencil, width, height })
    }

    /// Loads a DDS or PNG file with an anisotropic, border-addressed sampler.
    pub fn image(
        backend: &mut dyn Backend,
        slot: u32,
        path: impl AsRef<Path>,
        anisotropy: u8,
    ) -> Result<Self> {
        let path = path.as_ref();
        let pixels = decode_image(path)?;
        let label = path.display().to_string();
        log::debug!("loaded image {label} ({}x{})", pixels.width(), pixels.height());

        Self::from_rgba(backend, &label, slot, pixels.width(), pixels.height(), &pixels, anisotropy)
    }

    /// Image texture from tightly packed RGBA8 pixels.
    pub fn from_rgba(
        backend: &mut dyn Backend,
        label: &str,
        slot: u32,
        width: u32,
        height: u32,
        rgba: &[u8],
        anisotropy: u8,
    ) -> Result<Self> {
        if width == 0 || height == 0 || rgba.len() != width as usize * height as usize * 4 {
            return Err(GraphicsError::InvalidSize { width, height });
        }

        let id = backend.create_image(&ImageDesc { label, width, height, rgba })?;
        let sampler = backend.create_sampler(&SamplerDesc {
            filter: Filter::Anisotropic(anisotropy),
            address: AddressMode::Border,
        })?;
        Ok(Self { id, slot, kind: TextureKind::Image { sampler }, width, height })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Binds the texture (and an image's sampler) at its slot.
    pub fn enable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_shader_resource(self.slot, Some(self.id))?;
        if let TextureKind::Image { sampler } = self.kind {
            state.set_sampler(self.slot, Some(sampler))?;
        }
        Ok(())
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_shader_resource(self.slot, None)?;
        if let TextureKind::Image { .. } = self.kind {
            state.set_sampler(self.slot, None)?;
        }
        Ok(())
    }

    pub fn release(self, backend: &mut dyn Backend) {
        backend.release_texture(self.id);
    }
}
