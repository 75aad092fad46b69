use std::collections::BTreeMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::backend::Backend;
use crate::device::{GraphicsError, Result};
use crate::pipeline::slots::{TRANSFORM_SLOT, VECTORS_SLOT};
use crate::pipeline::{AddressMode, Filter, PipelineState, SamplerDesc, SamplerId, ShaderId, StageMask};
use crate::resource::UniformBlock;

use super::compile::compile;
use super::layout::ShaderLayout;

/// Validated, stage-specific WGSL ready for a backend.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub label: String,
    pub vertex_source: String,
    pub pixel_source: String,
    pub layout: ShaderLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformData {
    pub world: [[f32; 4]; 4],
    /// Inverse-transpose of `world`.
    pub world_normals: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
}

impl Default for TransformData {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self { world: identity, world_normals: identity, view_projection: identity }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VectorsData {
    pub camera_position: [f32; 4],
    pub light_position: [f32; 4],
    pub light_direction: [f32; 4],
}

/// Inverse-transpose of `world`; identity for singular matrices.
///
/// Singularity is judged relative to the basis lengths, so uniformly tiny
/// but invertible transforms keep their exact normal matrix.
fn normal_matrix(world: Mat4) -> Mat4 {
    let scale = world
        .x_axis
        .truncate()
        .length()
        .max(world.y_axis.truncate().length())
        .max(world.z_axis.truncate().length());
    let det = world.determinant();
    if !det.is_finite() || det.abs() <= f32::EPSILON * scale.powi(3) {
        log::warn!("singular world matrix; using identity normal matrix");
        return Mat4::IDENTITY;
    }

    let normals = world.inverse().transpose();
    if !normals.is_finite() {
        log::warn!("world matrix inverse not finite; using identity normal matrix");
        return Mat4::IDENTITY;
    }
    normals
}

fn point(v: Vec3) -> [f32; 4] {
    v.extend(1.0).to_array()
}

fn direction(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}

/// Vertex + pixel program pair with its transform/vector constants and
/// samplers.
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    label: String,
    transform: UniformBlock<TransformData>,
    vectors: UniformBlock<VectorsData>,
    samplers: BTreeMap<u32, SamplerId>,
}

impl Shader {
    /// Reads, compiles and creates the shader at `path`.
    pub fn from_file(backend: &mut dyn Backend, path: impl AsRef<Path>, layout: ShaderLayout) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GraphicsError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_source(backend, &label, &source, layout)
    }

    pub fn from_source(
        backend: &mut dyn Backend,
        label: &str,
        source: &str,
        layout: ShaderLayout,
    ) -> Result<Self> {
        let program = compile(label, source, layout)?;
        let id = backend.create_shader(&program)?;

        let transform = UniformBlock::new(
            backend,
            &format!("{label} transform"),
            TRANSFORM_SLOT,
            StageMask::VERTEX,
            TransformData::default(),
        )?;
        let vectors = UniformBlock::new(
            backend,
            &format!("{label} vectors"),
            VECTORS_SLOT,
            StageMask::PIXEL,
            VectorsData::default(),
        )?;

        Ok(Self { id, label: label.to_string(), transform, vectors, samplers: BTreeMap::new() })
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn transform(&self) -> &TransformData {
        self.transform.get()
    }

    pub fn vectors(&self) -> &VectorsData {
        self.vectors.get()
    }

    pub fn transform_block(&self) -> &UniformBlock<TransformData> {
        &self.transform
    }

    pub fn vectors_block(&self) -> &UniformBlock<VectorsData> {
        &self.vectors
    }

    /// Sets the world matrix and its inverse-transpose together.
    pub fn set_world(&mut self, world: Mat4) {
        let normals = normal_matrix(world);
        self.transform.modify(|t| {
            t.world = world.to_cols_array_2d();
            t.world_normals = normals.to_cols_array_2d();
        });
    }

    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.transform.modify(|t| t.view_projection = view_projection.to_cols_array_2d());
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.vectors.modify(|v| v.camera_position = point(position));
    }

    pub fn set_light_position(&mut self, position: Vec3) {
        self.vectors.modify(|v| v.light_position = point(position));
    }

    pub fn set_light_direction(&mut self, dir: Vec3) {
        self.vectors.modify(|v| v.light_direction = direction(dir));
    }

    /// Creates a wrap-addressed sampler with `filter` and binds it at `slot`
    /// on every later `enable`.
    pub fn set_sampler(&mut self, backend: &mut dyn Backend, slot: u32, filter: Filter) -> Result<()> {
        let sampler = backend.create_sampler(&SamplerDesc { filter, address: AddressMode::Wrap })?;
        self.samplers.insert(slot, sampler);
        Ok(())
    }

    pub fn sampler(&self, slot: u32) -> Option<SamplerId> {
        self.samplers.get(&slot).copied()
    }

    /// Uploads constant data changed since the last upload.
    pub fn update(&mut self, state: &mut PipelineState) {
        self.transform.flush(state);
        self.vectors.flush(state);
    }

    /// Binds the program pair, its constant buffers and samplers. Render
    /// targets are left alone.
    pub fn enable(&mut self, state: &mut PipelineState) -> Result<()> {
        state.set_shader(Some(self.id));
        self.transform.enable(state)?;
        self.vectors.enable(state)?;
        for (&slot, &sampler) in &self.samplers {
            state.set_sampler(slot, Some(sampler))?;
        }
        Ok(())
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        state.set_shader(None);
        self.transform.disable(state)?;
        self.vectors.disable(state)?;
        for &slot in self.samplers.keys() {
            state.set_sampler(slot, None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::{Bindings, Command};

    const FRAME: &str = include_str!("../../shaders/frame.wgsl");

    fn shader(backend: &mut HeadlessBackend) -> Shader {
        Shader::from_source(backend, "frame", FRAME, ShaderLayout::new()).unwrap()
    }

    fn approx(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_source_error() {
        let mut b = HeadlessBackend::new(4, 4);
        let err = Shader::from_file(&mut b, "no/such/shader.wgsl", ShaderLayout::new()).unwrap_err();
        assert!(matches!(err, GraphicsError::ShaderSource { .. }));
    }

    #[test]
    fn bundled_file_loads_with_stem_label() {
        let mut b = HeadlessBackend::new(4, 4);
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/geometry.wgsl");
        let s = Shader::from_file(&mut b, path, ShaderLayout::new()).unwrap();
        assert_eq!(s.label(), "geometry");
        assert_eq!(b.shader_label(s.id()), Some("geometry"));
    }

    // ── transform ─────────────────────────────────────────────────────────

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_y(0.7)
            * Mat4::from_scale(Vec3::new(2.0, 0.5, 3.0));
        s.set_world(world);

        let t = s.transform();
        assert!(approx(Mat4::from_cols_array_2d(&t.world), world));
        assert!(approx(Mat4::from_cols_array_2d(&t.world_normals), world.inverse().transpose()));
    }

    #[test]
    fn world_and_normals_upload_in_one_update() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        let mut state = PipelineState::new();
        s.enable(&mut state).unwrap();
        state.take_commands();

        s.set_world(Mat4::from_scale(Vec3::splat(2.0)));
        s.update(&mut state);

        let commands = state.commands();
        assert_eq!(commands.len(), 1);
        let Command::UpdateBuffer { buffer, data } = &commands[0] else { panic!("not an update") };
        assert_eq!(*buffer, s.transform_block().buffer().id());
        let uploaded: TransformData = bytemuck::pod_read_unaligned(data);
        assert_eq!(uploaded, *s.transform());
    }

    #[test]
    fn tiny_rotated_world_keeps_exact_normals() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        let world = Mat4::from_scale(Vec3::splat(0.004)) * Mat4::from_rotation_z(0.6);
        s.set_world(world);

        let expected = world.inverse().transpose();
        let got = Mat4::from_cols_array_2d(&s.transform().world_normals);
        assert!(got.abs_diff_eq(expected, expected.x_axis.abs().max_element() * 1e-4));
        assert_ne!(got, Mat4::IDENTITY);
    }

    #[test]
    fn singular_world_falls_back_to_identity_normals() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        s.set_world(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(s.transform().world_normals, Mat4::IDENTITY.to_cols_array_2d());
    }

    // ── vectors ───────────────────────────────────────────────────────────

    #[test]
    fn vectors_use_homogeneous_w() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        s.set_camera_position(Vec3::new(1.0, 2.0, 3.0));
        s.set_light_direction(Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(s.vectors().camera_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(s.vectors().light_direction, [0.0, -1.0, 0.0, 0.0]);
    }

    // ── binding ───────────────────────────────────────────────────────────

    #[test]
    fn enable_binds_program_buffers_and_samplers() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        s.set_sampler(&mut b, 0, Filter::Point).unwrap();
        let mut state = PipelineState::new();
        s.enable(&mut state).unwrap();

        let bind = state.bindings();
        assert_eq!(bind.shader, Some(s.id()));
        assert_eq!(bind.vertex_constant_buffers[TRANSFORM_SLOT as usize], Some(s.transform_block().buffer().id()));
        assert_eq!(bind.pixel_constant_buffers[VECTORS_SLOT as usize], Some(s.vectors_block().buffer().id()));
        assert_eq!(bind.samplers[0], s.sampler(0));
        assert!(bind.color_targets.iter().all(Option::is_none));
        assert!(!state.commands().iter().any(|c| matches!(c, Command::ClearRenderTarget { .. })));
    }

    #[test]
    fn enable_disable_symmetry() {
        let mut b = HeadlessBackend::new(4, 4);
        let mut s = shader(&mut b);
        s.set_sampler(&mut b, 0, Filter::Anisotropic(8)).unwrap();
        let mut state = PipelineState::new();
        s.enable(&mut state).unwrap();
        s.disable(&mut state).unwrap();
        assert_eq!(state.bindings(), &Bindings::default());
    }
}
