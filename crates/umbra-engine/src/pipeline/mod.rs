//! Explicit pipeline state.
//!
//! `PipelineState` stands in for an immediate-mode graphics context: it owns
//! the binding tables (output-merger slots, blend/rasterizer state, viewport,
//! shader, constant buffers, shader resources, samplers, input buffers) and
//! records every change as a [`Command`] in issue order. Components never touch
//! the GPU directly; they take `&mut PipelineState` in `enable`/`disable`/`draw`.

mod command;
mod ids;
pub mod slots;
mod state;
mod states;

pub use command::Command;
pub use ids::{BufferId, SamplerId, ShaderId, TextureId};
pub use state::{
    BindRole, Bindings, PipelineState, MAX_COLOR_TARGETS, MAX_CONSTANT_BUFFERS, MAX_SAMPLERS,
    MAX_SHADER_RESOURCES,
};
pub use states::{
    AddressMode, BlendMode, CullMode, FillMode, Filter, RasterizerState, SamplerDesc, StageMask,
    Viewport,
};
