use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::{BindRole, TextureId};
use crate::scene::LightKind;
use crate::shader::ShaderStage;

use super::phase::FramePhase;

/// Errors raised by the renderer core.
///
/// Creation failures are fatal and never retried. Binding and ordering
/// violations are programming errors surfaced as values instead of asserts.
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("failed to create wgpu surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find a suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create wgpu device/queue: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("no supported surface formats")]
    NoSurfaceFormat,

    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),

    #[error("invalid size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("failed to read shader source {path}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {stage} program of shader `{label}`:\n{diagnostics}")]
    ShaderCompile {
        label: String,
        stage: ShaderStage,
        diagnostics: String,
    },

    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{texture:?} cannot be bound as {requested} while bound as {bound_as}")]
    ReadWriteHazard {
        texture: TextureId,
        requested: BindRole,
        bound_as: BindRole,
    },

    #[error("{kind} slot {slot} out of range (max {max})")]
    SlotOutOfRange {
        kind: &'static str,
        slot: u32,
        max: usize,
    },

    #[error("draw issued without a {0} bound")]
    Unbound(&'static str),

    #[error("`{operation}` called during {phase:?}")]
    PassOrder {
        operation: &'static str,
        phase: FramePhase,
    },

    #[error("{kind:?} light cannot be drawn during {phase:?}")]
    LightKind { kind: LightKind, phase: FramePhase },

    #[error("unknown {kind} id {id}")]
    UnknownResource { kind: &'static str, id: u32 },
}

pub type Result<T, E = GraphicsError> = std::result::Result<T, E>;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
