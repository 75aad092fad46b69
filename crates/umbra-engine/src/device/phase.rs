/// Position of the device within a frame.
///
/// Passes run strictly in declaration order; `frame_end` returns to `Idle`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FramePhase {
    #[default]
    Idle,
    Geometry,
    GeometryDone,
    Ambient,
    AmbientDone,
    DynamicLight,
    DynamicLightDone,
}
