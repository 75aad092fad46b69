use super::ids::{BufferId, SamplerId, ShaderId, TextureId};
use super::states::{BlendMode, RasterizerState, StageMask, Viewport};

/// One recorded pipeline-state change or draw, in issue order.
///
/// `None` bindings unbind the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetViewport(Viewport),
    /// Replaces every output-merger slot; slots past `colors.len()` are unbound.
    SetRenderTargets {
        colors: Vec<Option<TextureId>>,
        depth: Option<TextureId>,
    },
    SetBlendState(BlendMode),
    SetRasterizerState(RasterizerState),
    ClearRenderTarget {
        target: TextureId,
        color: [f32; 4],
    },
    ClearDepthStencil {
        target: TextureId,
        depth: f32,
        stencil: u32,
    },
    SetShader(Option<ShaderId>),
    SetConstantBuffer {
        stages: StageMask,
        slot: u32,
        buffer: Option<BufferId>,
    },
    /// Whole-buffer overwrite.
    UpdateBuffer {
        buffer: BufferId,
        data: Vec<u8>,
    },
    SetShaderResource {
        slot: u32,
        texture: Option<TextureId>,
    },
    SetSampler {
        slot: u32,
        sampler: Option<SamplerId>,
    },
    SetVertexBuffer(Option<BufferId>),
    SetIndexBuffer(Option<BufferId>),
    DrawIndexed {
        index_count: u32,
    },
    Present,
}

impl Command {
    /// Short name used in logs and test diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetViewport(_) => "SetViewport",
            Command::SetRenderTargets { .. } => "SetRenderTargets",
            Command::SetBlendState(_) => "SetBlendState",
            Command::SetRasterizerState(_) => "SetRasterizerState",
            Command::ClearRenderTarget { .. } => "ClearRenderTarget",
            Command::ClearDepthStencil { .. } => "ClearDepthStencil",
            Command::SetShader(_) => "SetShader",
            Command::SetConstantBuffer { .. } => "SetConstantBuffer",
            Command::UpdateBuffer { .. } => "UpdateBuffer",
            Command::SetShaderResource { .. } => "SetShaderResource",
            Command::SetSampler { .. } => "SetSampler",
            Command::SetVertexBuffer(_) => "SetVertexBuffer",
            Command::SetIndexBuffer(_) => "SetIndexBuffer",
            Command::DrawIndexed { .. } => "DrawIndexed",
            Command::Present => "Present",
        }
    }

    /// Textures referenced by this command.
    pub fn textures(&self) -> Vec<TextureId> {
        match self {
            Command::SetRenderTargets { colors, depth } => {
                colors.iter().flatten().chain(depth.iter()).copied().collect()
            }
            Command::ClearRenderTarget { target, .. } | Command::ClearDepthStencil { target, .. } => {
                vec![*target]
            }
            Command::SetShaderResource { texture: Some(t), .. } => vec![*t],
            _ => Vec::new(),
        }
    }

    /// Buffers referenced by this command.
    pub fn buffers(&self) -> Vec<BufferId> {
        match self {
            Command::SetConstantBuffer { buffer: Some(b), .. }
            | Command::SetVertexBuffer(Some(b))
            | Command::SetIndexBuffer(Some(b)) => vec![*b],
            Command::UpdateBuffer { buffer, .. } => vec![*buffer],
            _ => Vec::new(),
        }
    }
}
