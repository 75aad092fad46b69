//! wgpu backend: a window surface plus the device objects behind the
//! engine's resource ids.

mod context;
mod pipeline;
mod registry;
mod replay;
mod surface;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{DeviceInit, GraphicsError, Result, SurfaceErrorAction};
use crate::pipeline::{BufferId, Command, SamplerDesc, SamplerId, ShaderId, TextureId};
use crate::shader::ShaderProgram;

use super::{Backend, BufferDesc, IdAllocator, ImageDesc, PresentStatus, TextureDesc};

pub use context::Gpu;

use context::GpuFrame;

use pipeline::PipelineCache;
use registry::Registry;
use replay::{BackBuffer, FrameEncoder};

/// Renders into a window through wgpu.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    ids: IdAllocator,
    registry: Registry,
    pipelines: PipelineCache,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the device and swap chain for `window`.
    pub async fn new(window: &'w Window, init: DeviceInit) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;
        Ok(Self { gpu, ids: IdAllocator::default(), registry: Registry::default(), pipelines: PipelineCache::default() })
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Number of distinct render pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}

impl Backend for WgpuBackend<'_> {
    fn back_buffer_size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::InvalidSize { width: desc.width, height: desc.height });
        }
        let id = self.ids.texture();
        self.registry.insert_texture(id, self.gpu.device(), desc);
        Ok(id)
    }

    fn create_image(&mut self, desc: &ImageDesc<'_>) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::InvalidSize { width: desc.width, height: desc.height });
        }
        let id = self.ids.texture();
        self.registry.insert_image(id, self.gpu.device(), self.gpu.queue(), desc);
        Ok(id)
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId> {
        let id = self.ids.sampler();
        self.registry.insert_sampler(id, self.gpu.device(), desc);
        Ok(id)
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId> {
        let id = self.ids.buffer();
        self.registry.insert_buffer(id, self.gpu.device(), desc);
        Ok(id)
    }

    fn create_shader(&mut self, program: &ShaderProgram) -> Result<ShaderId> {
        let id = self.ids.shader();
        self.registry.insert_shader(id, self.gpu.device(), program);
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        if !self.registry.remove_texture(id) {
            log::debug!("release of unknown {id:?} ignored");
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.gpu.resize(PhysicalSize::new(width, height));
        Ok(())
    }

    fn present(&mut self, commands: &[Command]) -> Result<PresentStatus> {
        let (width, height) = self.back_buffer_size();
        if width == 0 || height == 0 {
            return Ok(PresentStatus::Skipped(SurfaceErrorAction::SkipFrame));
        }

        let GpuFrame { surface_texture, view, encoder } = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let action = self.gpu.handle_surface_error(&err);
                log::warn!("surface error: {err} -> {action:?}");
                return match action {
                    SurfaceErrorAction::Fatal => Err(GraphicsError::Surface(err)),
                    action => Ok(PresentStatus::Skipped(action)),
                };
            }
        };

        let back_buffer = BackBuffer { view: &view, format: self.gpu.surface_format() };
        let mut replay = FrameEncoder::new(self.gpu.device(), &self.registry, &mut self.pipelines, back_buffer, encoder);
        for command in commands {
            replay.execute(command)?;
        }
        let work = replay.finish();

        self.gpu.queue().submit(std::iter::once(work));
        drop(view);
        surface_texture.present();
        Ok(PresentStatus::Presented)
    }
}
