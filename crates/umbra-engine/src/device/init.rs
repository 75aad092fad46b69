/// Adapter, device and swap chain settings for [`WgpuBackend`](crate::backend::WgpuBackend).
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Pick an sRGB back buffer format if the surface offers one.
    pub prefer_srgb: bool,

    /// Defaults to `AutoNoVsync`: present immediately where the platform
    /// allows, falling back to FIFO.
    pub present_mode: wgpu::PresentMode,

    /// Composite alpha mode. Unsupported or unset picks the surface's first.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// Optional features the renderer can use (depth clip control, border
    /// addressing, wireframe) are requested separately when the adapter has
    /// them.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. Two buffers are used
    /// for flip presentation.
    pub desired_maximum_frame_latency: u32,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
