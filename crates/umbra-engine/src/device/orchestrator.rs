use crate::backend::{Backend, PresentStatus};
use crate::pipeline::slots::{
    DIFFUSE_SLOT, IMAGE_SLOT, LIGHT_SLOT, MATERIAL_SLOT, NORMAL_SLOT, POSITION_SLOT, SAMPLER_SLOT,
    SPECULAR_SLOT, TRANSFORM_SLOT, VECTORS_SLOT,
};
use crate::pipeline::{PipelineState, StageMask, Viewport};
use crate::resource::{FrameBuffer, GeometryBuffer, RenderTarget, Texture};
use crate::scene::{Camera, Light, Material, Mesh, MeshData};
use crate::shader::{Shader, ShaderLayout, TextureSampleKind};

use super::config::DeviceConfig;
use super::error::{GraphicsError, Result};
use super::phase::FramePhase;

fn geometry_layout() -> ShaderLayout {
    ShaderLayout::new()
        .with_constant_buffer(TRANSFORM_SLOT, StageMask::VERTEX)
        .with_constant_buffer(MATERIAL_SLOT, StageMask::PIXEL)
        .with_texture(IMAGE_SLOT, TextureSampleKind::Filterable)
        .with_sampler(SAMPLER_SLOT)
}

fn frame_layout() -> ShaderLayout {
    [DIFFUSE_SLOT, SPECULAR_SLOT, POSITION_SLOT, NORMAL_SLOT].into_iter().fold(
        ShaderLayout::new()
            .with_constant_buffer(VECTORS_SLOT, StageMask::PIXEL)
            .with_constant_buffer(LIGHT_SLOT, StageMask::PIXEL),
        |layout, slot| layout.with_texture(slot, TextureSampleKind::Unfilterable),
    )
}

/// Deferred renderer: owns the backend, the pipeline state, both render
/// targets, both shaders and the full-screen quad.
///
/// A frame is driven as
/// `geometry_begin` → draw meshes → `geometry_end` →
/// `ambient_light_begin` → draw ambient lights → `ambient_light_end` →
/// `dynamic_light_begin` → draw lights → `dynamic_light_end` → `frame_end`.
/// Calls out of that order fail with [`GraphicsError::PassOrder`] and leave
/// the pipeline state untouched.
pub struct Device<B: Backend> {
    backend: B,
    config: DeviceConfig,
    state: PipelineState,
    phase: FramePhase,
    frame_index: u64,

    geometry: RenderTarget,
    frame: RenderTarget,
    geometry_shader: Shader,
    frame_shader: Shader,
    frame_quad: Mesh,
    blank_image: Texture,
}

impl<B: Backend> Device<B> {
    pub fn new(mut backend: B, config: DeviceConfig) -> Result<Self> {
        let (width, height) = backend.back_buffer_size();
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidSize { width, height });
        }

        let geometry = RenderTarget::Geometry(GeometryBuffer::new(
            &mut backend,
            width,
            height,
            config.geometry_clear_color,
        )?);
        let frame = RenderTarget::Frame(FrameBuffer::new(config.light_blend, config.frame_clear_color));

        let mut geometry_shader = Shader::from_file(&mut backend, &config.geometry_shader, geometry_layout())?;
        geometry_shader.set_sampler(&mut backend, SAMPLER_SLOT, config.geometry_filter)?;
        let frame_shader = Shader::from_file(&mut backend, &config.frame_shader, frame_layout())?;

        let frame_quad = Mesh::new(&mut backend, &MeshData::quad())?;
        let blank_image = Texture::from_rgba(&mut backend, "blank image", IMAGE_SLOT, 1, 1, &[255; 4], 1)?;

        log::info!("device ready ({width}x{height}, light blend {:?})", config.light_blend);

        Ok(Self {
            backend,
            config,
            state: PipelineState::new(),
            phase: FramePhase::Idle,
            frame_index: 0,
            geometry,
            frame,
            geometry_shader,
            frame_shader,
            frame_quad,
            blank_image,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Pipeline state, for binding textures and other resources directly.
    pub fn pipeline(&mut self) -> &mut PipelineState {
        &mut self.state
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Number of frames submitted so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn geometry_buffer(&self) -> &RenderTarget {
        &self.geometry
    }

    pub fn frame_buffer(&self) -> &RenderTarget {
        &self.frame
    }

    pub fn geometry_shader(&self) -> &Shader {
        &self.geometry_shader
    }

    pub fn frame_shader(&self) -> &Shader {
        &self.frame_shader
    }

    /// Loads an image texture bound at the geometry pass image slot.
    pub fn load_texture(&mut self, path: impl AsRef<std::path::Path>, anisotropy: u8) -> Result<Texture> {
        Texture::image(&mut self.backend, IMAGE_SLOT, path, anisotropy)
    }

    /// Feeds the camera to both shaders. Takes effect on the next draw.
    pub fn set_camera(&mut self, camera: &Camera) {
        let view_projection = camera.view_projection();
        for shader in [&mut self.geometry_shader, &mut self.frame_shader] {
            shader.set_view_projection(view_projection);
            shader.set_camera_position(camera.position());
        }
    }

    fn expect_phase(&self, operation: &'static str, expected: FramePhase) -> Result<()> {
        if self.phase != expected {
            return Err(GraphicsError::PassOrder { operation, phase: self.phase });
        }
        Ok(())
    }

    // ── geometry pass ─────────────────────────────────────────────────────

    /// Sets the viewport to the back buffer, binds the geometry shader and
    /// binds + clears the G-buffer. A blank white image sits in the image
    /// slot until a mesh's own texture is enabled.
    pub fn geometry_begin(&mut self) -> Result<()> {
        self.expect_phase("geometry_begin", FramePhase::Idle)?;

        let (width, height) = self.backend.back_buffer_size();
        self.state.set_viewport(Viewport::new(width as f32, height as f32));
        self.blank_image.enable(&mut self.state)?;
        self.geometry_shader.enable(&mut self.state)?;
        self.geometry.enable(&mut self.state)?;

        self.phase = FramePhase::Geometry;
        log::trace!("frame {}: geometry pass", self.frame_index);
        Ok(())
    }

    /// Draws `mesh` into the G-buffer with `material`.
    pub fn draw_mesh(&mut self, mesh: &Mesh, material: &mut Material) -> Result<()> {
        self.expect_phase("draw_mesh", FramePhase::Geometry)?;

        self.geometry_shader.set_world(mesh.world());
        self.geometry_shader.update(&mut self.state);
        material.enable(&mut self.state)?;
        mesh.draw(&mut self.state)
    }

    pub fn geometry_end(&mut self) -> Result<()> {
        self.expect_phase("geometry_end", FramePhase::Geometry)?;
        self.geometry.disable(&mut self.state)?;
        self.phase = FramePhase::GeometryDone;
        Ok(())
    }

    // ── lighting passes ───────────────────────────────────────────────────

    /// Binds the G-buffer color targets for reading, the frame shader and the
    /// frame buffer. The frame buffer is cleared here, once per frame.
    pub fn frame_begin(&mut self) -> Result<()> {
        self.expect_phase("frame_begin", FramePhase::GeometryDone)?;

        for texture in self.geometry.outputs() {
            texture.enable(&mut self.state)?;
        }
        self.frame_shader.enable(&mut self.state)?;
        self.frame.enable(&mut self.state)?;

        self.phase = FramePhase::Ambient;
        log::trace!("frame {}: ambient pass", self.frame_index);
        Ok(())
    }

    /// Entry to the ambient pass; same as [`frame_begin`](Self::frame_begin).
    pub fn ambient_light_begin(&mut self) -> Result<()> {
        self.frame_begin()
    }

    pub fn ambient_light_end(&mut self) -> Result<()> {
        self.expect_phase("ambient_light_end", FramePhase::Ambient)?;
        self.phase = FramePhase::AmbientDone;
        Ok(())
    }

    pub fn dynamic_light_begin(&mut self) -> Result<()> {
        self.expect_phase("dynamic_light_begin", FramePhase::AmbientDone)?;
        self.phase = FramePhase::DynamicLight;
        log::trace!("frame {}: dynamic light pass", self.frame_index);
        Ok(())
    }

    pub fn dynamic_light_end(&mut self) -> Result<()> {
        self.expect_phase("dynamic_light_end", FramePhase::DynamicLight)?;
        self.phase = FramePhase::DynamicLightDone;
        Ok(())
    }

    /// Accumulates one light into the frame buffer with a full-screen quad.
    ///
    /// Ambient lights belong to the ambient pass, every other kind to the
    /// dynamic light pass.
    pub fn draw_light(&mut self, light: &mut Light) -> Result<()> {
        let wants_ambient = match self.phase {
            FramePhase::Ambient => true,
            FramePhase::DynamicLight => false,
            phase => return Err(GraphicsError::PassOrder { operation: "draw_light", phase }),
        };
        if light.kind().is_ambient() != wants_ambient {
            return Err(GraphicsError::LightKind { kind: light.kind(), phase: self.phase });
        }

        self.frame_shader.set_light_position(light.position());
        self.frame_shader.set_light_direction(light.direction());
        self.frame_shader.update(&mut self.state);
        light.enable(&mut self.state)?;
        self.frame_quad.draw(&mut self.state)
    }

    /// Releases the G-buffer read bindings and the frame buffer, then submits
    /// the frame and presents it.
    pub fn frame_end(&mut self) -> Result<PresentStatus> {
        self.expect_phase("frame_end", FramePhase::DynamicLightDone)?;

        for texture in self.geometry.outputs() {
            texture.disable(&mut self.state)?;
        }
        self.frame.disable(&mut self.state)?;
        self.state.present();

        let commands = self.state.take_commands();
        self.phase = FramePhase::Idle;
        self.frame_index += 1;

        let status = self.backend.present(&commands)?;
        if let PresentStatus::Skipped(action) = status {
            log::debug!("frame {} skipped: {action:?}", self.frame_index - 1);
        }
        Ok(status)
    }

    /// Same as [`frame_end`](Self::frame_end).
    pub fn present(&mut self) -> Result<PresentStatus> {
        self.frame_end()
    }

    /// Resizes the swap chain and recreates the G-buffer. Only allowed
    /// between frames. A zero size (minimized window) only resizes the
    /// backend; the G-buffer keeps its previous size until a real size
    /// arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.expect_phase("resize", FramePhase::Idle)?;
        self.backend.resize(width, height)?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let geometry = RenderTarget::Geometry(GeometryBuffer::new(
            &mut self.backend,
            width,
            height,
            self.config.geometry_clear_color,
        )?);
        std::mem::replace(&mut self.geometry, geometry).release(&mut self.backend);

        log::info!("resized to {width}x{height}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::scene::LightKind;

    fn device() -> Device<HeadlessBackend> {
        Device::new(HeadlessBackend::new(64, 32), DeviceConfig::default()).unwrap()
    }

    fn run_to(device: &mut Device<HeadlessBackend>, phase: FramePhase) {
        let steps: [fn(&mut Device<HeadlessBackend>) -> Result<()>; 6] = [
            Device::geometry_begin,
            Device::geometry_end,
            Device::ambient_light_begin,
            Device::ambient_light_end,
            Device::dynamic_light_begin,
            Device::dynamic_light_end,
        ];
        for step in steps {
            if device.phase() == phase {
                return;
            }
            step(device).unwrap();
        }
        assert_eq!(device.phase(), phase);
    }

    // ── construction ─────────────────────────────────────────────────────

    #[test]
    fn zero_sized_back_buffer_is_rejected() {
        let err = Device::new(HeadlessBackend::new(0, 32), DeviceConfig::default()).err().unwrap();
        assert!(matches!(err, GraphicsError::InvalidSize { width: 0, height: 32 }));
    }

    #[test]
    fn missing_shader_file_is_reported_with_its_path() {
        let config = DeviceConfig { frame_shader: "does/not/exist.wgsl".into(), ..DeviceConfig::default() };
        let err = Device::new(HeadlessBackend::new(8, 8), config).err().unwrap();
        match err {
            GraphicsError::ShaderSource { path, .. } => assert!(path.ends_with("exist.wgsl")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn new_device_is_idle_with_empty_pipeline() {
        let mut d = device();
        assert_eq!(d.phase(), FramePhase::Idle);
        assert_eq!(d.frame_index(), 0);
        assert!(d.pipeline().commands().is_empty());
        assert_eq!(d.geometry_buffer().as_geometry().unwrap().size(), (64, 32));
        assert_eq!(d.backend().shader_label(d.geometry_shader().id()), Some("geometry"));
        assert_eq!(d.backend().shader_label(d.frame_shader().id()), Some("frame"));
    }

    // ── pass order ───────────────────────────────────────────────────────

    #[test]
    fn out_of_order_call_fails_without_recording() {
        let mut d = device();
        let err = d.geometry_end().unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::PassOrder { operation: "geometry_end", phase: FramePhase::Idle }
        ));
        assert!(d.pipeline().commands().is_empty());
        assert_eq!(d.phase(), FramePhase::Idle);
    }

    #[test]
    fn geometry_cannot_begin_twice() {
        let mut d = device();
        d.geometry_begin().unwrap();
        let recorded = d.pipeline().commands().len();
        assert!(d.geometry_begin().is_err());
        assert_eq!(d.pipeline().commands().len(), recorded);
    }

    #[test]
    fn frame_end_requires_every_pass() {
        let mut d = device();
        run_to(&mut d, FramePhase::AmbientDone);
        assert!(matches!(d.frame_end(), Err(GraphicsError::PassOrder { .. })));
    }

    #[test]
    fn present_ends_the_frame() {
        let mut d = device();
        run_to(&mut d, FramePhase::DynamicLightDone);
        assert!(matches!(d.present(), Ok(PresentStatus::Presented)));
        assert_eq!(d.phase(), FramePhase::Idle);
        assert_eq!(d.frame_index(), 1);
        assert!(d.backend().last_frame().is_some());
    }

    #[test]
    fn draw_mesh_outside_geometry_pass_fails() {
        let mut d = device();
        let mesh = Mesh::new(d.backend_mut(), &MeshData::cube()).unwrap();
        let mut material = Material::new(d.backend_mut()).unwrap();
        assert!(d.draw_mesh(&mesh, &mut material).is_err());
    }

    // ── lights ───────────────────────────────────────────────────────────

    #[test]
    fn light_kind_must_match_pass() {
        let mut d = device();
        let mut ambient = Light::new(d.backend_mut(), LightKind::Ambient).unwrap();
        let mut point = Light::new(d.backend_mut(), LightKind::Point).unwrap();

        run_to(&mut d, FramePhase::Ambient);
        assert!(matches!(
            d.draw_light(&mut point),
            Err(GraphicsError::LightKind { kind: LightKind::Point, phase: FramePhase::Ambient })
        ));
        d.draw_light(&mut ambient).unwrap();

        run_to(&mut d, FramePhase::DynamicLight);
        assert!(matches!(d.draw_light(&mut ambient), Err(GraphicsError::LightKind { .. })));
        d.draw_light(&mut point).unwrap();
    }

    #[test]
    fn draw_light_outside_lighting_passes_fails() {
        let mut d = device();
        let mut light = Light::new(d.backend_mut(), LightKind::Direction).unwrap();
        assert!(matches!(d.draw_light(&mut light), Err(GraphicsError::PassOrder { .. })));
    }

    #[test]
    fn light_vectors_reach_frame_shader() {
        let mut d = device();
        let mut light = Light::new(d.backend_mut(), LightKind::Spot).unwrap();
        light.move_by(Vec3::new(1.0, 2.0, 3.0));

        run_to(&mut d, FramePhase::DynamicLight);
        d.draw_light(&mut light).unwrap();
        assert_eq!(d.frame_shader().vectors().light_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(d.frame_shader().vectors().light_direction[3], 0.0);
    }

    // ── camera ───────────────────────────────────────────────────────────

    #[test]
    fn camera_feeds_both_shaders() {
        let mut d = device();
        let mut camera = Camera::new();
        camera.move_by(Vec3::new(0.0, 1.0, -5.0));
        d.set_camera(&camera);

        let vp = camera.view_projection().to_cols_array_2d();
        for shader in [d.geometry_shader(), d.frame_shader()] {
            assert_eq!(shader.transform().view_projection, vp);
            assert_eq!(shader.vectors().camera_position, [0.0, 1.0, -5.0, 1.0]);
        }
    }

    // ── resize ───────────────────────────────────────────────────────────

    #[test]
    fn resize_recreates_geometry_buffer() {
        let mut d = device();
        let old = d.geometry_buffer().as_geometry().unwrap().diffuse().id();
        d.resize(128, 96).unwrap();

        let g = d.geometry_buffer().as_geometry().unwrap();
        assert_eq!(g.size(), (128, 96));
        assert_ne!(g.diffuse().id(), old);
        assert!(d.backend().texture(old).is_none());
        assert_eq!(d.backend().texture_count(), 5);
    }

    #[test]
    fn zero_resize_keeps_geometry_buffer() {
        let mut d = device();
        d.resize(0, 0).unwrap();
        assert_eq!(d.geometry_buffer().as_geometry().unwrap().size(), (64, 32));
    }

    #[test]
    fn resize_mid_frame_fails() {
        let mut d = device();
        d.geometry_begin().unwrap();
        assert!(matches!(d.resize(10, 10), Err(GraphicsError::PassOrder { operation: "resize", .. })));
    }
}
