use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{DeviceInit, GraphicsError, Result, SurfaceErrorAction};

use super::surface;

/// Features used when the adapter has them: depth clip control, border
/// addressing and wireframe fill.
const OPTIONAL_FEATURES: wgpu::Features = wgpu::Features::DEPTH_CLIP_CONTROL
    .union(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
    .union(wgpu::Features::POLYGON_MODE_LINE);

/// Device, queue and swap chain for one window.
///
/// The surface borrows the window for `'w`, so the window has to outlive
/// this value.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Window size in physical pixels. May be zero while minimized, in which
    /// case `config` still holds the last non-zero size.
    size: PhysicalSize<u32>,
}

/// Swap chain image acquired for one frame, with the encoder that renders
/// into it. Dropping the surface texture without presenting discards the frame.
pub(crate) struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: DeviceInit) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(GraphicsError::InvalidSize { width: size.width, height: size.height });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let (device, queue) = open_device(&adapter, &init).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb).ok_or(GraphicsError::NoSurfaceFormat)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: surface::choose_present_mode(&caps, init.present_mode),
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);
        log::debug!(
            "swap chain {format:?} {}x{}, {:?}",
            size.width,
            size.height,
            config.present_mode
        );

        Ok(Gpu { surface, adapter, device, queue, config, size })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Features enabled on the device, optional ones included.
    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    /// Records the new size and reconfigures the swap chain. A zero size
    /// cannot be configured, so the swap chain keeps its old size until the
    /// window is restored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            log::debug!("window minimized, swap chain left at {}x{}", self.config.width, self.config.height);
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn begin_frame(&self) -> std::result::Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("umbra frame") });

        Ok(GpuFrame { surface_texture, view, encoder })
    }

    /// Reconfigures the swap chain where the error allows it and says what
    /// the caller should do with the current frame.
    pub fn handle_surface_error(&self, err: &wgpu::SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}

/// Requests the device with the caller's features plus whichever optional
/// features the adapter offers.
async fn open_device(adapter: &wgpu::Adapter, init: &DeviceInit) -> Result<(wgpu::Device, wgpu::Queue)> {
    let optional = adapter.features() & OPTIONAL_FEATURES;
    let missing = OPTIONAL_FEATURES - optional;
    if !missing.is_empty() {
        log::warn!("adapter lacks optional features {missing:?}");
    }

    let pair = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("umbra-engine device"),
            required_features: init.required_features | optional,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok(pair)
}
