use std::f32::consts::FRAC_PI_2;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

use crate::backend::Backend;
use crate::device::Result;
use crate::pipeline::slots::LIGHT_SLOT;
use crate::pipeline::{PipelineState, StageMask};
use crate::resource::UniformBlock;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LightKind {
    Ambient = 0,
    Direction = 1,
    Point = 2,
    Spot = 3,
}

impl LightKind {
    pub fn is_ambient(self) -> bool {
        self == LightKind::Ambient
    }
}

/// GPU layout of a light; matches `Light` in `frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub color: [f32; 3],
    pub intensity: f32,
    pub kind: u32,
    pub falloff: f32,
    /// Cone half-angle in radians.
    pub spot_angle: f32,
    /// Fraction of the cone over which a spot light fades out.
    pub spot_border: f32,
}

impl LightData {
    fn new(kind: LightKind) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            kind: kind as u32,
            falloff: 20.0,
            spot_angle: FRAC_PI_2 / 3.0,
            spot_border: 0.25,
        }
    }
}

/// Light parameters with a lazily uploaded constant buffer.
///
/// Position and direction are fed to the frame shader by the device when the
/// light is drawn; the remaining parameters live in the light's own buffer.
#[derive(Debug)]
pub struct Light {
    kind: LightKind,
    position: Vec3,
    direction: Vec3,
    block: UniformBlock<LightData>,
}

impl Light {
    /// White, unit intensity, at the origin pointing down +z.
    pub fn new(backend: &mut dyn Backend, kind: LightKind) -> Result<Self> {
        let block = UniformBlock::new(backend, "light", LIGHT_SLOT, StageMask::PIXEL, LightData::new(kind))?;
        Ok(Self { kind, position: Vec3::ZERO, direction: Vec3::Z, block })
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn data(&self) -> &LightData {
        self.block.get()
    }

    pub fn block(&self) -> &UniformBlock<LightData> {
        &self.block
    }

    pub fn is_dirty(&self) -> bool {
        self.block.is_dirty()
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from(self.data().color)
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.block.modify(|d| d.color = color.to_array());
    }

    pub fn intensity(&self) -> f32 {
        self.data().intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.block.modify(|d| d.intensity = intensity);
    }

    pub fn falloff(&self) -> f32 {
        self.data().falloff
    }

    pub fn set_falloff(&mut self, falloff: f32) {
        self.block.modify(|d| d.falloff = falloff);
    }

    /// Cone half-angle in radians.
    pub fn spot_angle(&self) -> f32 {
        self.data().spot_angle
    }

    pub fn set_spot_angle(&mut self, radians: f32) {
        self.block.modify(|d| d.spot_angle = radians);
    }

    pub fn spot_border(&self) -> f32 {
        self.data().spot_border
    }

    pub fn set_spot_border(&mut self, border: f32) {
        self.block.modify(|d| d.spot_border = border);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn move_by(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Unit direction the light points in.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Rotates the direction by `degrees` around `axis`. A zero-length axis
    /// is ignored.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) {
        if let Some(axis) = axis.try_normalize() {
            self.direction = (Quat::from_axis_angle(axis, degrees.to_radians()) * self.direction).normalize();
        }
    }

    /// Uploads changed parameters, then binds the buffer.
    pub fn enable(&mut self, state: &mut PipelineState) -> Result<()> {
        self.block.enable(state)
    }

    pub fn disable(&self, state: &mut PipelineState) -> Result<()> {
        self.block.disable(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::Command;

    fn light(kind: LightKind) -> Light {
        let mut b = HeadlessBackend::new(4, 4);
        Light::new(&mut b, kind).unwrap()
    }

    fn uploads(state: &PipelineState) -> Vec<LightData> {
        state
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::UpdateBuffer { data, .. } => Some(bytemuck::pod_read_unaligned(data)),
                _ => None,
            })
            .collect()
    }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let l = light(LightKind::Spot);
        assert_eq!(l.color(), Vec3::ONE);
        assert_eq!(l.intensity(), 1.0);
        assert_eq!(l.falloff(), 20.0);
        assert!((l.spot_angle() - std::f32::consts::PI / 6.0).abs() < 1e-6);
        assert_eq!(l.spot_border(), 0.25);
        assert_eq!(l.data().kind, 3);
        assert_eq!(l.direction(), Vec3::Z);
        assert_eq!(std::mem::size_of::<LightData>(), 32);
    }

    // ── dirty tracking ────────────────────────────────────────────────────

    #[test]
    fn setters_then_enable_upload_once_with_final_values() {
        let mut l = light(LightKind::Point);
        let mut state = PipelineState::new();

        l.set_color(Vec3::new(1.0, 0.0, 0.0));
        l.set_intensity(2.0);
        l.set_falloff(5.0);
        l.set_intensity(3.0);
        assert!(state.commands().is_empty());

        l.enable(&mut state).unwrap();
        let data = uploads(&state);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(data[0].intensity, 3.0);
        assert_eq!(data[0].falloff, 5.0);
        assert!(!l.is_dirty());
    }

    #[test]
    fn clean_enable_only_binds() {
        let mut l = light(LightKind::Direction);
        let mut state = PipelineState::new();
        l.enable(&mut state).unwrap();
        state.take_commands();

        l.enable(&mut state).unwrap();
        let names: Vec<_> = state.commands().iter().map(Command::name).collect();
        assert_eq!(names, ["SetConstantBuffer"]);
    }

    #[test]
    fn move_and_rotate_do_not_dirty_the_buffer() {
        let mut l = light(LightKind::Spot);
        let mut state = PipelineState::new();
        l.enable(&mut state).unwrap();

        l.move_by(Vec3::new(0.0, 3.0, 0.0));
        l.rotate(Vec3::X, 90.0);
        assert!(!l.is_dirty());
        assert_eq!(l.position(), Vec3::new(0.0, 3.0, 0.0));
        assert!(l.direction().abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }
}
