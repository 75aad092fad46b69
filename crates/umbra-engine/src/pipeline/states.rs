use bitflags::bitflags;

bitflags! {
    /// Shader stages a constant buffer is visible to.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct StageMask: u8 {
        const VERTEX = 0b01;
        const PIXEL = 0b10;
    }
}

/// Output-merger blend configuration.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source replaces destination.
    #[default]
    Disabled,
    /// `src * src.a + dst * (1 - src.a)`.
    AlphaBlend,
    /// `src * src.a + dst`. Accumulates light passes.
    Additive,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Rasterizer state. Front faces wind clockwise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub fill: FillMode,
    pub cull: CullMode,
    pub depth_clip: bool,
}

impl RasterizerState {
    pub const fn new(fill: FillMode, cull: CullMode, depth_clip: bool) -> Self {
        Self { fill, cull, depth_clip }
    }
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::new(FillMode::Solid, CullMode::Back, true)
    }
}

/// Viewport rectangle in physical pixels plus depth range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport at the origin with depth range `0..1`.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height, min_depth: 0.0, max_depth: 1.0 }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && (0.0..=1.0).contains(&self.min_depth)
            && (0.0..=1.0).contains(&self.max_depth)
            && self.min_depth <= self.max_depth
    }
}

/// Texture filtering used by a sampler.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    Point,
    #[default]
    Linear,
    /// Anisotropic filtering with the given maximum anisotropy (1..=16).
    Anisotropic(u8),
}

impl Filter {
    /// Maximum anisotropy clamped to the range every backend accepts.
    pub fn anisotropy(self) -> u16 {
        match self {
            Filter::Anisotropic(n) => u16::from(n).clamp(1, 16),
            _ => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum AddressMode {
    #[default]
    Wrap,
    Clamp,
    /// Outside texels read a constant border color.
    Border,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address: AddressMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── viewport ──────────────────────────────────────────────────────────

    #[test]
    fn viewport_new_spans_unit_depth() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!((vp.x, vp.y), (0.0, 0.0));
        assert_eq!((vp.min_depth, vp.max_depth), (0.0, 1.0));
        assert!(vp.is_valid());
    }

    #[test]
    fn viewport_zero_size_is_invalid() {
        assert!(!Viewport::new(0.0, 600.0).is_valid());
        assert!(!Viewport::new(800.0, f32::NAN).is_valid());
    }

    #[test]
    fn viewport_inverted_depth_is_invalid() {
        let vp = Viewport { min_depth: 0.8, max_depth: 0.2, ..Viewport::new(1.0, 1.0) };
        assert!(!vp.is_valid());
    }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn rasterizer_default_is_solid_back_cull_with_depth_clip() {
        let r = RasterizerState::default();
        assert_eq!(r.fill, FillMode::Solid);
        assert_eq!(r.cull, CullMode::Back);
        assert!(r.depth_clip);
    }

    #[test]
    fn blend_default_is_disabled() {
        assert_eq!(BlendMode::default(), BlendMode::Disabled);
    }

    // ── filter ────────────────────────────────────────────────────────────

    #[test]
    fn anisotropy_is_clamped() {
        assert_eq!(Filter::Anisotropic(0).anisotropy(), 1);
        assert_eq!(Filter::Anisotropic(8).anisotropy(), 8);
        assert_eq!(Filter::Anisotropic(64).anisotropy(), 16);
        assert_eq!(Filter::Linear.anisotropy(), 1);
    }
}
