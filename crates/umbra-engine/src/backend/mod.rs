//! GPU backends.
//!
//! A backend creates resources on behalf of the engine components and turns
//! each frame's recorded [`Command`] list into GPU work. Two implementations
//! ship with the crate:
//! - [`gpu::WgpuBackend`]: real device + window surface
//! - [`headless::HeadlessBackend`]: keeps resource descriptions and submitted
//!   frames in memory; used by tests and GPU-less runs

mod desc;
pub mod headless;
pub mod gpu;

use std::path::Path;

use crate::device::{Result, SurfaceErrorAction};
use crate::pipeline::{BufferId, Command, SamplerId, SamplerDesc, ShaderId, TextureId};
use crate::shader::ShaderProgram;

pub use desc::{BufferDesc, BufferKind, ImageDesc, TextureDesc, TextureFormat, TextureUsage};
pub use gpu::WgpuBackend;
pub use headless::HeadlessBackend;

/// Outcome of [`Backend::present`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresentStatus {
    Presented,
    /// The frame was dropped; the surface error has already been handled.
    Skipped(SurfaceErrorAction),
}

/// Resource factory + frame sink.
pub trait Backend {
    /// Current back-buffer size in physical pixels.
    fn back_buffer_size(&self) -> (u32, u32);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId>;

    /// Creates a sampled RGBA8 (sRGB) texture from decoded pixels.
    fn create_image(&mut self, desc: &ImageDesc<'_>) -> Result<TextureId>;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId>;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId>;

    fn create_shader(&mut self, program: &ShaderProgram) -> Result<ShaderId>;

    /// Releases a texture. Unknown ids are ignored.
    fn release_texture(&mut self, id: TextureId);

    /// Resizes the back buffer. A zero size (minimized window) must be
    /// accepted and is what [`back_buffer_size`](Self::back_buffer_size)
    /// reports afterwards; a swap chain that cannot be zero-sized keeps its
    /// last real size until a non-zero one arrives.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Executes one frame's commands in order and presents the back buffer.
    fn present(&mut self, commands: &[Command]) -> Result<PresentStatus>;
}

/// Decodes an image file into RGBA8 pixels.
pub(crate) fn decode_image(path: &Path) -> Result<::image::RgbaImage> {
    let image = ::image::open(path).map_err(|source| crate::device::GraphicsError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Monotonic id source shared by the backends. Id 0 of every kind is
/// reserved (texture 0 is the back buffer).
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    fn bump(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }

    pub(crate) fn texture(&mut self) -> TextureId {
        TextureId(self.bump())
    }

    pub(crate) fn buffer(&mut self) -> BufferId {
        BufferId(self.bump())
    }

    pub(crate) fn sampler(&mut self) -> SamplerId {
        SamplerId(self.bump())
    }

    pub(crate) fn shader(&mut self) -> ShaderId {
        ShaderId(self.bump())
    }
}
