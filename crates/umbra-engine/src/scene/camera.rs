use glam::{Mat4, Quat, Vec3};

/// Left-handed perspective camera with an orthonormal right/up/forward basis.
///
/// View and projection are recomputed by every setter.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,

    /// Vertical field of view in degrees.
    fov: f32,
    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,

    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// At the origin looking down +z, 90 degree fov, square aspect, 0.1..10.
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
            fov: 90.0,
            aspect_ratio: 1.0,
            near_plane: 0.1,
            far_plane: 10.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_view();
        camera.update_projection();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn move_by(&mut self, offset: Vec3) {
        self.position += offset;
        self.update_view();
    }

    /// Rotates the basis by `degrees` around `axis`. A zero-length axis is
    /// ignored.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) {
        let Some(axis) = axis.try_normalize() else { return };
        let q = Quat::from_axis_angle(axis, degrees.to_radians());

        // Re-orthonormalize to keep drift from accumulating.
        self.forward = (q * self.forward).normalize();
        self.right = (q * self.right).reject_from_normalized(self.forward).normalize();
        self.up = self.forward.cross(self.right);
        self.update_view();
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = degrees;
        self.update_projection();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection();
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn set_near_plane(&mut self, near: f32) {
        self.near_plane = near;
        self.update_projection();
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    pub fn set_far_plane(&mut self, far: f32) {
        self.far_plane = far;
        self.update_projection();
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// `projection * view`: world to clip space.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn update_view(&mut self) {
        self.view = Mat4::look_to_lh(self.position, self.forward, self.up);
    }

    fn update_projection(&mut self) {
        self.projection =
            Mat4::perspective_lh(self.fov.to_radians(), self.aspect_ratio, self.near_plane, self.far_plane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── view ──────────────────────────────────────────────────────────────

    #[test]
    fn view_maps_camera_position_to_origin() {
        let mut c = Camera::new();
        c.move_by(Vec3::new(1.0, 2.0, 3.0));
        assert!(c.view().transform_point3(c.position()).abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn point_ahead_has_positive_view_depth() {
        let c = Camera::new();
        let p = c.view().transform_point3(Vec3::new(0.0, 0.0, 5.0));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));
    }

    #[test]
    fn yaw_keeps_basis_orthonormal() {
        let mut c = Camera::new();
        for _ in 0..100 {
            c.rotate(Vec3::Y, 7.3);
            c.rotate(c.right(), 3.1);
        }
        assert!((c.forward().length() - 1.0).abs() < 1e-4);
        assert!(c.forward().dot(c.right()).abs() < 1e-4);
        assert!(c.forward().dot(c.up()).abs() < 1e-4);
    }

    #[test]
    fn yaw_90_turns_forward_to_positive_x() {
        let mut c = Camera::new();
        c.rotate(Vec3::Y, 90.0);
        assert!(c.forward().abs_diff_eq(Vec3::X, 1e-5));
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn near_and_far_map_to_unit_depth_range() {
        let c = Camera::new();
        let near = c.projection().project_point3(Vec3::new(0.0, 0.0, c.near_plane()));
        let far = c.projection().project_point3(Vec3::new(0.0, 0.0, c.far_plane()));
        assert!((near.z - 0.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn setters_recompute_projection() {
        let mut c = Camera::new();
        let before = c.projection();
        c.set_aspect_ratio(16.0 / 9.0);
        assert_ne!(c.projection(), before);
        c.set_fov(60.0);
        assert_eq!(c.fov(), 60.0);
        assert_eq!(
            c.projection(),
            Mat4::perspective_lh(60f32.to_radians(), 16.0 / 9.0, 0.1, 10.0)
        );
    }
}
