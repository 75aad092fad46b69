use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::backend::{BufferDesc, BufferKind, ImageDesc, TextureDesc, TextureFormat, TextureUsage};
use crate::device::{GraphicsError, Result};
use crate::pipeline::{AddressMode, BufferId, Filter, SamplerDesc, SamplerId, ShaderId, StageMask, TextureId};
use crate::shader::{ShaderLayout, ShaderProgram, TextureSampleKind, ENTRY_POINT};

pub(crate) struct TextureEntry {
    /// Kept alive for the views; never read directly.
    _texture: wgpu::Texture,
    /// View used as a render or depth attachment.
    pub target_view: wgpu::TextureView,
    /// View used as a shader resource. Depth-only for depth/stencil formats.
    pub sample_view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

pub(crate) struct BufferEntry {
    pub buffer: wgpu::Buffer,
}

pub(crate) struct ShaderEntry {
    pub label: String,
    pub vertex: wgpu::ShaderModule,
    pub pixel: wgpu::ShaderModule,
    pub layout: ShaderLayout,
    /// Constant buffers, textures, samplers.
    pub bind_group_layouts: [wgpu::BindGroupLayout; 3],
    pub pipeline_layout: wgpu::PipelineLayout,
}

/// wgpu objects behind the engine's ids.
#[derive(Default)]
pub(crate) struct Registry {
    textures: HashMap<TextureId, TextureEntry>,
    buffers: HashMap<BufferId, BufferEntry>,
    samplers: HashMap<SamplerId, wgpu::Sampler>,
    shaders: HashMap<ShaderId, ShaderEntry>,
}

fn unknown(kind: &'static str, id: u32) -> GraphicsError {
    GraphicsError::UnknownResource { kind, id }
}

impl Registry {
    pub fn texture(&self, id: TextureId) -> Result<&TextureEntry> {
        self.textures.get(&id).ok_or_else(|| unknown(TextureId::KIND, id.raw()))
    }

    pub fn buffer(&self, id: BufferId) -> Result<&BufferEntry> {
        self.buffers.get(&id).ok_or_else(|| unknown(BufferId::KIND, id.raw()))
    }

    pub fn sampler(&self, id: SamplerId) -> Result<&wgpu::Sampler> {
        self.samplers.get(&id).ok_or_else(|| unknown(SamplerId::KIND, id.raw()))
    }

    pub fn shader(&self, id: ShaderId) -> Result<&ShaderEntry> {
        self.shaders.get(&id).ok_or_else(|| unknown(ShaderId::KIND, id.raw()))
    }

    pub fn remove_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id).is_some()
    }

    pub fn insert_texture(&mut self, id: TextureId, device: &wgpu::Device, desc: &TextureDesc) {
        let format = texture_format(desc.format);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d { width: desc.width, height: desc.height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: texture_usages(desc.usage),
            view_formats: &[],
        });

        let target_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sample_view = match desc.format {
            TextureFormat::Depth24PlusStencil8 => texture.create_view(&wgpu::TextureViewDescriptor {
                aspect: wgpu::TextureAspect::DepthOnly,
                ..Default::default()
            }),
            TextureFormat::Rgba32Float => target_view.clone(),
        };

        self.textures.insert(id, TextureEntry { _texture: texture, target_view, sample_view, format });
    }

    pub fn insert_image(&mut self, id: TextureId, device: &wgpu::Device, queue: &wgpu::Queue, desc: &ImageDesc<'_>) {
        let size = wgpu::Extent3d { width: desc.width, height: desc.height, depth_or_array_layers: 1 };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            desc.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * desc.width),
                rows_per_image: Some(desc.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(
            id,
            TextureEntry { _texture: texture, target_view: view.clone(), sample_view: view, format },
        );
    }

    pub fn insert_sampler(&mut self, id: SamplerId, device: &wgpu::Device, desc: &SamplerDesc) {
        let border_supported = device.features().contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let (address, border_color) = match desc.address {
            AddressMode::Wrap => (wgpu::AddressMode::Repeat, None),
            AddressMode::Clamp => (wgpu::AddressMode::ClampToEdge, None),
            AddressMode::Border if border_supported => {
                (wgpu::AddressMode::ClampToBorder, Some(wgpu::SamplerBorderColor::OpaqueBlack))
            }
            AddressMode::Border => {
                log::warn!("border addressing unsupported, clamping to edge");
                (wgpu::AddressMode::ClampToEdge, None)
            }
        };

        let (filter, mipmap_filter) = match desc.filter {
            Filter::Point => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest),
            Filter::Linear | Filter::Anisotropic(_) => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear),
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("umbra sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter,
            anisotropy_clamp: desc.filter.anisotropy(),
            border_color,
            ..Default::default()
        });
        self.samplers.insert(id, sampler);
    }

    pub fn insert_buffer(&mut self, id: BufferId, device: &wgpu::Device, desc: &BufferDesc<'_>) {
        let usage = buffer_usages(desc.kind);

        let buffer = match desc.contents {
            Some(contents) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents,
                usage,
            }),
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: desc.size.max(1).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
                usage,
                mapped_at_creation: false,
            }),
        };
        self.buffers.insert(id, BufferEntry { buffer });
    }

    pub fn insert_shader(&mut self, id: ShaderId, device: &wgpu::Device, program: &ShaderProgram) {
        let module = |stage: &str, source: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} {stage}", program.label)),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let vertex = module("vertex", &program.vertex_source);
        let pixel = module("pixel", &program.pixel_source);

        let bind_group_layouts = bind_group_layouts(device, &program.label, &program.layout);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&program.label),
            bind_group_layouts: &[&bind_group_layouts[0], &bind_group_layouts[1], &bind_group_layouts[2]],
            immediate_size: 0,
        });

        log::debug!("shader {id:?} `{}` ready, entry point `{ENTRY_POINT}`", program.label);
        self.shaders.insert(
            id,
            ShaderEntry {
                label: program.label.clone(),
                vertex,
                pixel,
                layout: program.layout.clone(),
                bind_group_layouts,
                pipeline_layout,
            },
        );
    }
}

pub(crate) fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

pub(crate) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut out = wgpu::TextureUsages::empty();
    if usage.intersects(TextureUsage::RENDER_TARGET | TextureUsage::DEPTH_STENCIL) {
        out |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.contains(TextureUsage::SHADER_RESOURCE) {
        out |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    out
}

/// Every buffer is a copy destination; updates arrive as staged copies.
pub(crate) fn buffer_usages(kind: BufferKind) -> wgpu::BufferUsages {
    wgpu::BufferUsages::COPY_DST
        | match kind {
            BufferKind::Constant => wgpu::BufferUsages::UNIFORM,
            BufferKind::Vertex { .. } => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        }
}

pub(crate) fn shader_stages(stages: StageMask) -> wgpu::ShaderStages {
    let mut out = wgpu::ShaderStages::NONE;
    if stages.contains(StageMask::VERTEX) {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(StageMask::PIXEL) {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    out
}

fn sample_type(kind: TextureSampleKind) -> wgpu::TextureSampleType {
    match kind {
        TextureSampleKind::Filterable => wgpu::TextureSampleType::Float { filterable: true },
        TextureSampleKind::Unfilterable => wgpu::TextureSampleType::Float { filterable: false },
        TextureSampleKind::Depth => wgpu::TextureSampleType::Depth,
    }
}

fn bind_group_layouts(device: &wgpu::Device, label: &str, layout: &ShaderLayout) -> [wgpu::BindGroupLayout; 3] {
    let constant_buffers: Vec<_> = layout
        .constant_buffers
        .iter()
        .map(|&(slot, stages)| wgpu::BindGroupLayoutEntry {
            binding: slot,
            visibility: shader_stages(stages),
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    let textures: Vec<_> = layout
        .textures
        .iter()
        .map(|&(slot, kind)| wgpu::BindGroupLayoutEntry {
            binding: slot,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: sample_type(kind),
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();

    let samplers: Vec<_> = layout
        .samplers
        .iter()
        .map(|&slot| wgpu::BindGroupLayoutEntry {
            binding: slot,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        })
        .collect();

    let create = |group: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} {group}")),
            entries,
        })
    };
    [create("constant buffers", &constant_buffers), create("textures", &textures), create("samplers", &samplers)]
}
