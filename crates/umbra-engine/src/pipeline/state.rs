use std::fmt;

use crate::device::{GraphicsError, Result};

use super::command::Command;
use super::ids::{BufferId, SamplerId, ShaderId, TextureId};
use super::states::{BlendMode, RasterizerState, StageMask, Viewport};

pub const MAX_COLOR_TARGETS: usize = 8;
pub const MAX_CONSTANT_BUFFERS: usize = 14;
pub const MAX_SHADER_RESOURCES: usize = 16;
pub const MAX_SAMPLERS: usize = 16;

/// How a texture is currently bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindRole {
    RenderTarget,
    DepthStencil,
    ShaderResource,
}

impl fmt::Display for BindRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindRole::RenderTarget => "render target",
            BindRole::DepthStencil => "depth-stencil target",
            BindRole::ShaderResource => "shader resource",
        })
    }
}

/// Current contents of every binding table.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    pub viewport: Option<Viewport>,
    pub color_targets: [Option<TextureId>; MAX_COLOR_TARGETS],
    pub depth_target: Option<TextureId>,
    pub blend: BlendMode,
    pub rasterizer: RasterizerState,
    pub shader: Option<ShaderId>,
    pub vertex_constant_buffers: [Option<BufferId>; MAX_CONSTANT_BUFFERS],
    pub pixel_constant_buffers: [Option<BufferId>; MAX_CONSTANT_BUFFERS],
    pub shader_resources: [Option<TextureId>; MAX_SHADER_RESOURCES],
    pub samplers: [Option<SamplerId>; MAX_SAMPLERS],
    pub vertex_buffer: Option<BufferId>,
    pub index_buffer: Option<BufferId>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            viewport: None,
            color_targets: [None; MAX_COLOR_TARGETS],
            depth_target: None,
            blend: BlendMode::default(),
            rasterizer: RasterizerState::default(),
            shader: None,
            vertex_constant_buffers: [None; MAX_CONSTANT_BUFFERS],
            pixel_constant_buffers: [None; MAX_CONSTANT_BUFFERS],
            shader_resources: [None; MAX_SHADER_RESOURCES],
            samplers: [None; MAX_SAMPLERS],
            vertex_buffer: None,
            index_buffer: None,
        }
    }
}

impl Bindings {
    /// Applies a command to the tables without validation.
    ///
    /// Commands that do not change bindings (clears, updates, draws, present)
    /// are ignored.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::SetViewport(vp) => self.viewport = Some(*vp),
            Command::SetRenderTargets { colors, depth } => {
                self.color_targets = [None; MAX_COLOR_TARGETS];
                for (slot, color) in self.color_targets.iter_mut().zip(colors) {
                    *slot = *color;
                }
                self.depth_target = *depth;
            }
            Command::SetBlendState(mode) => self.blend = *mode,
            Command::SetRasterizerState(state) => self.rasterizer = *state,
            Command::SetShader(shader) => self.shader = *shader,
            Command::SetConstantBuffer { stages, slot, buffer } => {
                let slot = *slot as usize;
                if stages.contains(StageMask::VERTEX) {
                    if let Some(s) = self.vertex_constant_buffers.get_mut(slot) {
                        *s = *buffer;
                    }
                }
                if stages.contains(StageMask::PIXEL) {
                    if let Some(s) = self.pixel_constant_buffers.get_mut(slot) {
                        *s = *buffer;
                    }
                }
            }
            Command::SetShaderResource { slot, texture } => {
                if let Some(s) = self.shader_resources.get_mut(*slot as usize) {
                    *s = *texture;
                }
            }
            Command::SetSampler { slot, sampler } => {
                if let Some(s) = self.samplers.get_mut(*slot as usize) {
                    *s = *sampler;
                }
            }
            Command::SetVertexBuffer(buffer) => self.vertex_buffer = *buffer,
            Command::SetIndexBuffer(buffer) => self.index_buffer = *buffer,
            Command::ClearRenderTarget { .. }
            | Command::ClearDepthStencil { .. }
            | Command::UpdateBuffer { .. }
            | Command::DrawIndexed { .. }
            | Command::Present => {}
        }
    }

    /// Output-merger role of `texture`, if it is bound for writing.
    pub fn output_role(&self, texture: TextureId) -> Option<BindRole> {
        if self.color_targets.contains(&Some(texture)) {
            Some(BindRole::RenderTarget)
        } else if self.depth_target == Some(texture) {
            Some(BindRole::DepthStencil)
        } else {
            None
        }
    }

    pub fn is_shader_resource(&self, texture: TextureId) -> bool {
        self.shader_resources.contains(&Some(texture))
    }

    /// Returns `true` if any table still references `texture`.
    pub fn references_texture(&self, texture: TextureId) -> bool {
        self.output_role(texture).is_some() || self.is_shader_resource(texture)
    }

    /// Returns `true` if any table still references `buffer`.
    pub fn references_buffer(&self, buffer: BufferId) -> bool {
        let some = Some(buffer);
        self.vertex_constant_buffers.contains(&some)
            || self.pixel_constant_buffers.contains(&some)
            || self.vertex_buffer == some
            || self.index_buffer == some
    }
}

/// Explicit pipeline-state handle.
///
/// Every mutation validates against the current tables, applies the change
/// and appends the matching [`Command`] to the frame's command list. Failed
/// calls leave both the tables and the command list untouched.
#[derive(Debug, Default)]
pub struct PipelineState {
    bindings: Bindings,
    commands: Vec<Command>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Commands recorded since the last [`take_commands`](Self::take_commands).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the recorded commands. Binding tables are kept.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.record(Command::SetViewport(viewport));
    }

    /// Binds `colors` to output-merger slots `0..colors.len()` and `depth` to
    /// the depth slot in one call. Remaining color slots are unbound.
    pub fn set_render_targets(
        &mut self,
        colors: &[Option<TextureId>],
        depth: Option<TextureId>,
    ) -> Result<()> {
        if colors.len() > MAX_COLOR_TARGETS {
            return Err(GraphicsError::SlotOutOfRange {
                kind: "render target",
                slot: colors.len() as u32 - 1,
                max: MAX_COLOR_TARGETS,
            });
        }
        for (texture, role) in colors
            .iter()
            .flatten()
            .map(|t| (*t, BindRole::RenderTarget))
            .chain(depth.map(|t| (t, BindRole::DepthStencil)))
        {
            if self.bindings.is_shader_resource(texture) {
                return Err(GraphicsError::ReadWriteHazard {
                    texture,
                    requested: role,
                    bound_as: BindRole::ShaderResource,
                });
            }
        }

        self.record(Command::SetRenderTargets { colors: colors.to_vec(), depth });
        Ok(())
    }

    pub fn set_blend_state(&mut self, mode: BlendMode) {
        self.record(Command::SetBlendState(mode));
    }

    pub fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.record(Command::SetRasterizerState(state));
    }

    pub fn clear_render_target(&mut self, target: TextureId, color: [f32; 4]) -> Result<()> {
        self.ensure_writable(target, BindRole::RenderTarget)?;
        self.record(Command::ClearRenderTarget { target, color });
        Ok(())
    }

    pub fn clear_depth_stencil(&mut self, target: TextureId, depth: f32, stencil: u32) -> Result<()> {
        self.ensure_writable(target, BindRole::DepthStencil)?;
        self.record(Command::ClearDepthStencil { target, depth, stencil });
        Ok(())
    }

    pub fn set_shader(&mut self, shader: Option<ShaderId>) {
        self.record(Command::SetShader(shader));
    }

    pub fn set_constant_buffer(
        &mut self,
        stages: StageMask,
        slot: u32,
        buffer: Option<BufferId>,
    ) -> Result<()> {
        check_slot("constant buffer", slot, MAX_CONSTANT_BUFFERS)?;
        self.record(Command::SetConstantBuffer { stages, slot, buffer });
        Ok(())
    }

    /// Records a whole-buffer overwrite with `data`.
    pub fn update_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        self.record(Command::UpdateBuffer { buffer, data: data.to_vec() });
    }

    pub fn set_shader_resource(&mut self, slot: u32, texture: Option<TextureId>) -> Result<()> {
        check_slot("shader resource", slot, MAX_SHADER_RESOURCES)?;
        if let Some(texture) = texture {
            if let Some(bound_as) = self.bindings.output_role(texture) {
                return Err(GraphicsError::ReadWriteHazard {
                    texture,
                    requested: BindRole::ShaderResource,
                    bound_as,
                });
            }
        }
        self.record(Command::SetShaderResource { slot, texture });
        Ok(())
    }

    pub fn set_sampler(&mut self, slot: u32, sampler: Option<SamplerId>) -> Result<()> {
        check_slot("sampler", slot, MAX_SAMPLERS)?;
        self.record(Command::SetSampler { slot, sampler });
        Ok(())
    }

    pub fn set_vertex_buffer(&mut self, buffer: Option<BufferId>) {
        self.record(Command::SetVertexBuffer(buffer));
    }

    pub fn set_index_buffer(&mut self, buffer: Option<BufferId>) {
        self.record(Command::SetIndexBuffer(buffer));
    }

    /// Indexed triangle-list draw with the current bindings.
    pub fn draw_indexed(&mut self, index_count: u32) -> Result<()> {
        let b = &self.bindings;
        if b.shader.is_none() {
            return Err(GraphicsError::Unbound("shader"));
        }
        if b.vertex_buffer.is_none() {
            return Err(GraphicsError::Unbound("vertex buffer"));
        }
        if b.index_buffer.is_none() {
            return Err(GraphicsError::Unbound("index buffer"));
        }
        if b.color_targets.iter().all(Option::is_none) && b.depth_target.is_none() {
            return Err(GraphicsError::Unbound("render target"));
        }

        log::trace!("draw_indexed: {index_count} indices with {:?}", b.shader);
        self.record(Command::DrawIndexed { index_count });
        Ok(())
    }

    pub fn present(&mut self) {
        self.record(Command::Present);
    }

    fn ensure_writable(&self, texture: TextureId, requested: BindRole) -> Result<()> {
        if self.bindings.is_shader_resource(texture) {
            return Err(GraphicsError::ReadWriteHazard {
                texture,
                requested,
                bound_as: BindRole::ShaderResource,
            });
        }
        Ok(())
    }

    fn record(&mut self, command: Command) {
        self.bindings.apply(&command);
        self.commands.push(command);
    }
}

fn check_slot(kind: &'static str, slot: u32, max: usize) -> Result<()> {
    if slot as usize >= max {
        return Err(GraphicsError::SlotOutOfRange { kind, slot, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(n: u32) -> TextureId {
        TextureId(n)
    }

    fn buf(n: u32) -> BufferId {
        BufferId(n)
    }

    fn ready_to_draw() -> PipelineState {
        let mut s = PipelineState::new();
        s.set_render_targets(&[Some(TextureId::BACK_BUFFER)], None).unwrap();
        s.set_shader(Some(ShaderId(1)));
        s.set_vertex_buffer(Some(buf(1)));
        s.set_index_buffer(Some(buf(2)));
        s
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[test]
    fn commands_are_recorded_in_issue_order() {
        let mut s = PipelineState::new();
        s.set_viewport(Viewport::new(4.0, 4.0));
        s.set_blend_state(BlendMode::Additive);
        s.present();

        let names: Vec<_> = s.commands().iter().map(Command::name).collect();
        assert_eq!(names, ["SetViewport", "SetBlendState", "Present"]);
    }

    #[test]
    fn take_commands_keeps_bindings() {
        let mut s = PipelineState::new();
        s.set_blend_state(BlendMode::Additive);
        let taken = s.take_commands();
        assert_eq!(taken.len(), 1);
        assert!(s.commands().is_empty());
        assert_eq!(s.bindings().blend, BlendMode::Additive);
    }

    // ── render targets ────────────────────────────────────────────────────

    #[test]
    fn set_render_targets_replaces_all_slots() {
        let mut s = PipelineState::new();
        s.set_render_targets(&[Some(tex(1)), Some(tex(2)), Some(tex(3))], Some(tex(4))).unwrap();
        s.set_render_targets(&[Some(tex(5))], None).unwrap();

        let b = s.bindings();
        assert_eq!(b.color_targets[0], Some(tex(5)));
        assert!(b.color_targets[1..].iter().all(Option::is_none));
        assert_eq!(b.depth_target, None);
    }

    #[test]
    fn too_many_render_targets_rejected() {
        let mut s = PipelineState::new();
        let colors = [Some(tex(1)); MAX_COLOR_TARGETS + 1];
        let err = s.set_render_targets(&colors, None).unwrap_err();
        assert!(matches!(err, GraphicsError::SlotOutOfRange { kind: "render target", .. }));
        assert!(s.commands().is_empty());
    }

    // ── read/write hazards ────────────────────────────────────────────────

    #[test]
    fn shader_resource_bound_as_render_target_is_hazard() {
        let mut s = PipelineState::new();
        s.set_render_targets(&[Some(tex(7))], None).unwrap();
        let err = s.set_shader_resource(0, Some(tex(7))).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ReadWriteHazard { bound_as: BindRole::RenderTarget, .. }
        ));
        assert_eq!(s.bindings().shader_resources[0], None);
    }

    #[test]
    fn depth_target_bound_as_shader_resource_is_hazard() {
        let mut s = PipelineState::new();
        s.set_render_targets(&[], Some(tex(9))).unwrap();
        let err = s.set_shader_resource(4, Some(tex(9))).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ReadWriteHazard { bound_as: BindRole::DepthStencil, .. }
        ));
    }

    #[test]
    fn render_target_bound_as_shader_resource_is_hazard() {
        let mut s = PipelineState::new();
        s.set_shader_resource(2, Some(tex(3))).unwrap();
        let err = s.set_render_targets(&[None, Some(tex(3))], None).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ReadWriteHazard { requested: BindRole::RenderTarget, .. }
        ));
        assert_eq!(s.commands().len(), 1);
    }

    #[test]
    fn clearing_a_shader_resource_is_hazard() {
        let mut s = PipelineState::new();
        s.set_shader_resource(0, Some(tex(3))).unwrap();
        assert!(s.clear_render_target(tex(3), [0.0; 4]).is_err());
    }

    #[test]
    fn unbinding_clears_hazard() {
        let mut s = PipelineState::new();
        s.set_render_targets(&[Some(tex(7))], None).unwrap();
        s.set_render_targets(&[], None).unwrap();
        assert!(s.set_shader_resource(0, Some(tex(7))).is_ok());
        assert!(s.bindings().output_role(tex(7)).is_none());
    }

    // ── slots ─────────────────────────────────────────────────────────────

    #[test]
    fn out_of_range_slots_rejected() {
        let mut s = PipelineState::new();
        assert!(s.set_constant_buffer(StageMask::PIXEL, MAX_CONSTANT_BUFFERS as u32, None).is_err());
        assert!(s.set_shader_resource(MAX_SHADER_RESOURCES as u32, None).is_err());
        assert!(s.set_sampler(MAX_SAMPLERS as u32, None).is_err());
        assert!(s.commands().is_empty());
    }

    #[test]
    fn constant_buffer_binds_per_stage() {
        let mut s = PipelineState::new();
        s.set_constant_buffer(StageMask::VERTEX, 0, Some(buf(1))).unwrap();
        s.set_constant_buffer(StageMask::VERTEX | StageMask::PIXEL, 1, Some(buf(2))).unwrap();

        let b = s.bindings();
        assert_eq!(b.vertex_constant_buffers[0], Some(buf(1)));
        assert_eq!(b.pixel_constant_buffers[0], None);
        assert_eq!(b.vertex_constant_buffers[1], Some(buf(2)));
        assert_eq!(b.pixel_constant_buffers[1], Some(buf(2)));
        assert!(b.references_buffer(buf(2)));
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_requires_complete_bindings() {
        let mut s = ready_to_draw();
        s.set_index_buffer(None);
        assert!(matches!(s.draw_indexed(6), Err(GraphicsError::Unbound("index buffer"))));

        let mut s = ready_to_draw();
        s.set_shader(None);
        assert!(matches!(s.draw_indexed(6), Err(GraphicsError::Unbound("shader"))));

        let mut s = ready_to_draw();
        s.set_render_targets(&[], None).unwrap();
        assert!(matches!(s.draw_indexed(6), Err(GraphicsError::Unbound("render target"))));
    }

    #[test]
    fn draw_with_complete_bindings_records() {
        let mut s = ready_to_draw();
        s.draw_indexed(36).unwrap();
        assert_eq!(s.commands().last(), Some(&Command::DrawIndexed { index_count: 36 }));
    }
}
