use glam::{Mat4, Vec3};

use crate::backend::{Backend, BufferDesc, BufferKind};
use crate::device::Result;
use crate::pipeline::{BufferId, PipelineState};

use super::vertex::{MeshData, Vertex};

/// Vertex/index buffers plus a transform.
///
/// The world matrix is recomputed after every mutation as
/// `translation * rotation * scale`: scale first, then rotation, then
/// translation.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,

    rotation: Mat4,
    scaling: Vec3,
    position: Vec3,
    world: Mat4,
}

impl Mesh {
    pub fn new(backend: &mut dyn Backend, data: &MeshData) -> Result<Self> {
        let vertices: &[u8] = bytemuck::cast_slice(&data.vertices);
        let indices: &[u8] = bytemuck::cast_slice(&data.indices);

        let vertex_buffer = backend.create_buffer(&BufferDesc {
            label: "mesh vertices",
            kind: BufferKind::Vertex { stride: std::mem::size_of::<Vertex>() as u32 },
            size: vertices.len() as u64,
            contents: Some(vertices),
        })?;
        let index_buffer = backend.create_buffer(&BufferDesc {
            label: "mesh indices",
            kind: BufferKind::Index,
            size: indices.len() as u64,
            contents: Some(indices),
        })?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            rotation: Mat4::IDENTITY,
            scaling: Vec3::ONE,
            position: Vec3::ZERO,
            world: Mat4::IDENTITY,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    /// Rotates by `degrees` around `axis`, after any earlier rotation. A
    /// zero-length axis is ignored.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) {
        let Some(axis) = axis.try_normalize() else {
            log::warn!("mesh rotation around a zero-length axis ignored");
            return;
        };
        self.rotation = Mat4::from_axis_angle(axis, degrees.to_radians()) * self.rotation;
        self.update_world();
    }

    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    /// Multiplies the current scale component-wise.
    pub fn scale(&mut self, scaling: Vec3) {
        self.scaling *= scaling;
        self.update_world();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Translates by `offset`.
    pub fn move_by(&mut self, offset: Vec3) {
        self.position += offset;
        self.update_world();
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    fn update_world(&mut self) {
        self.world = Mat4::from_translation(self.position) * self.rotation * Mat4::from_scale(self.scaling);
    }

    pub fn enable(&self, state: &mut PipelineState) {
        state.set_vertex_buffer(Some(self.vertex_buffer));
        state.set_index_buffer(Some(self.index_buffer));
    }

    pub fn disable(&self, state: &mut PipelineState) {
        state.set_vertex_buffer(None);
        state.set_index_buffer(None);
    }

    /// Binds the buffers and issues one indexed triangle-list draw.
    pub fn draw(&self, state: &mut PipelineState) -> Result<()> {
        self.enable(state);
        state.draw_indexed(self.index_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::Command;

    fn cube() -> (HeadlessBackend, Mesh) {
        let mut b = HeadlessBackend::new(4, 4);
        let mesh = Mesh::new(&mut b, &MeshData::cube()).unwrap();
        (b, mesh)
    }

    fn apply(m: Mat4, p: Vec3) -> Vec3 {
        m.transform_point3(p)
    }

    // ── world composition ─────────────────────────────────────────────────

    #[test]
    fn scale_then_move_maps_origin_and_unit_x() {
        let (_, mut mesh) = cube();
        mesh.scale(Vec3::splat(2.0));
        mesh.move_by(Vec3::X);

        let world = mesh.world();
        assert!(apply(world, Vec3::ZERO).abs_diff_eq(Vec3::X, 1e-6));
        assert!(apply(world, Vec3::X).abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn scale_and_move_accumulate() {
        let (_, mut mesh) = cube();
        mesh.scale(Vec3::splat(2.0));
        mesh.scale(Vec3::new(1.0, 3.0, 1.0));
        mesh.move_by(Vec3::X);
        mesh.move_by(Vec3::Y);
        assert_eq!(mesh.scaling(), Vec3::new(2.0, 6.0, 2.0));
        assert_eq!(mesh.position(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn rotation_applies_after_scale_before_translation() {
        let (_, mut mesh) = cube();
        mesh.scale(Vec3::new(2.0, 1.0, 1.0));
        mesh.rotate(Vec3::Z, 90.0);
        mesh.move_by(Vec3::new(0.0, 0.0, 5.0));

        // +X scaled to 2, rotated onto +Y, then moved along +Z.
        assert!(apply(mesh.world(), Vec3::X).abs_diff_eq(Vec3::new(0.0, 2.0, 5.0), 1e-5));
    }

    #[test]
    fn rotations_compose_in_call_order() {
        let (_, mut mesh) = cube();
        mesh.rotate(Vec3::Z, 90.0);
        mesh.rotate(Vec3::X, 90.0);

        // X -> Y (about Z) -> Z (about X)
        assert!(apply(mesh.rotation(), Vec3::X).abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn zero_axis_rotation_is_ignored() {
        let (_, mut mesh) = cube();
        mesh.rotate(Vec3::ZERO, 45.0);
        assert_eq!(mesh.world(), Mat4::IDENTITY);
    }

    // ── buffers ───────────────────────────────────────────────────────────

    #[test]
    fn buffers_hold_mesh_data() {
        let (b, mesh) = cube();
        assert_eq!(mesh.index_count(), 36);
        let Some(Command::SetVertexBuffer(Some(vb))) = ({
            let mut state = PipelineState::new();
            mesh.enable(&mut state);
            state.commands().first().cloned()
        }) else {
            panic!("vertex buffer not bound first");
        };
        assert_eq!(b.buffer(vb).unwrap().contents.len(), 24 * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn enable_disable_symmetry() {
        let (_, mesh) = cube();
        let mut state = PipelineState::new();
        mesh.enable(&mut state);
        mesh.disable(&mut state);
        assert_eq!(state.bindings().vertex_buffer, None);
        assert_eq!(state.bindings().index_buffer, None);
    }
}
