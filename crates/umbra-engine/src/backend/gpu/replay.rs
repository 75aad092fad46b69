use wgpu::util::DeviceExt;

use crate::device::{GraphicsError, Result};
use crate::pipeline::{Bindings, BufferId, Command, StageMask, TextureId};

use super::pipeline::{PipelineCache, PipelineKey};
use super::registry::{Registry, ShaderEntry};

/// Swap chain image the frame renders into.
pub(crate) struct BackBuffer<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

/// Replays one frame's commands into a wgpu command encoder.
///
/// Draws between two output-merger changes share a render pass. Clears,
/// buffer updates and render-target changes end the open pass; clears run as
/// their own pass with a clear load op.
pub(crate) struct FrameEncoder<'a> {
    device: &'a wgpu::Device,
    registry: &'a Registry,
    pipelines: &'a mut PipelineCache,
    back_buffer: BackBuffer<'a>,

    encoder: wgpu::CommandEncoder,
    bindings: Bindings,
    pass: Option<wgpu::RenderPass<'static>>,
    passes: u32,
    draws: u32,
}

impl<'a> FrameEncoder<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        registry: &'a Registry,
        pipelines: &'a mut PipelineCache,
        back_buffer: BackBuffer<'a>,
        encoder: wgpu::CommandEncoder,
    ) -> Self {
        Self {
            device,
            registry,
            pipelines,
            back_buffer,
            encoder,
            bindings: Bindings::default(),
            pass: None,
            passes: 0,
            draws: 0,
        }
    }

    pub fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::SetRenderTargets { .. } | Command::Present => self.end_pass(),
            Command::ClearRenderTarget { target, color } => {
                self.end_pass();
                self.clear_color(*target, *color)?;
            }
            Command::ClearDepthStencil { target, depth, stencil } => {
                self.end_pass();
                self.clear_depth(*target, *depth, *stencil)?;
            }
            Command::UpdateBuffer { buffer, data } => {
                self.end_pass();
                self.update_buffer(*buffer, data)?;
            }
            Command::DrawIndexed { index_count } => self.draw(*index_count)?,
            _ => {}
        }
        self.bindings.apply(command);
        Ok(())
    }

    /// Closes the last pass and returns the recorded work.
    pub fn finish(mut self) -> wgpu::CommandBuffer {
        self.end_pass();
        log::trace!("replayed {} draws in {} passes", self.draws, self.passes);
        self.encoder.finish()
    }

    fn end_pass(&mut self) {
        self.pass = None;
    }

    fn color_view(&self, id: TextureId) -> Result<&'a wgpu::TextureView> {
        if id.is_back_buffer() {
            return Ok(self.back_buffer.view);
        }
        let registry: &'a Registry = self.registry;
        Ok(&registry.texture(id)?.target_view)
    }

    fn color_format(&self, id: TextureId) -> Result<wgpu::TextureFormat> {
        if id.is_back_buffer() {
            return Ok(self.back_buffer.format);
        }
        Ok(self.registry.texture(id)?.format)
    }

    /// Bound color targets up to the last occupied slot.
    fn color_targets(&self) -> &[Option<TextureId>] {
        let targets = &self.bindings.color_targets;
        let used = targets.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        &targets[..used]
    }

    fn clear_color(&mut self, target: TextureId, color: [f32; 4]) -> Result<()> {
        let view = self.color_view(target)?;
        let [r, g, b, a] = color.map(f64::from);
        self.passes += 1;
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("umbra clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn clear_depth(&mut self, target: TextureId, depth: f32, stencil: u32) -> Result<()> {
        let registry: &'a Registry = self.registry;
        let view = &registry.texture(target)?.target_view;
        self.passes += 1;
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("umbra clear depth"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(depth), store: wgpu::StoreOp::Store }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(stencil),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    /// Whole-buffer overwrite through a staging copy, so that draws recorded
    /// earlier in the frame keep the previous contents.
    fn update_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<()> {
        let target = &self.registry.buffer(id)?.buffer;
        let len = (data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).min(target.size());
        if len == 0 {
            return Ok(());
        }

        let mut bytes = data.to_vec();
        bytes.resize(len as usize, 0);
        let staging = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("umbra staging"),
            contents: &bytes,
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        self.encoder.copy_buffer_to_buffer(&staging, 0, target, 0, len);
        Ok(())
    }

    fn ensure_pass(&mut self) -> Result<()> {
        if self.pass.is_some() {
            return Ok(());
        }
        let registry: &'a Registry = self.registry;

        let mut colors = Vec::new();
        for target in self.color_targets() {
            colors.push(match target {
                Some(id) => Some(wgpu::RenderPassColorAttachment {
                    view: self.color_view(*id)?,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                }),
                None => None,
            });
        }
        let depth = match self.bindings.depth_target {
            Some(id) => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &registry.texture(id)?.target_view,
                depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }),
                stencil_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }),
            }),
            None => None,
        };

        self.passes += 1;
        let pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("umbra draw"),
                color_attachments: &colors,
                depth_stencil_attachment: depth,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();
        self.pass = Some(pass);
        Ok(())
    }

    fn bind_groups(&self, shader: &ShaderEntry) -> Result<[wgpu::BindGroup; 3]> {
        let b = &self.bindings;

        let mut buffers = Vec::with_capacity(shader.layout.constant_buffers.len());
        for &(slot, stages) in &shader.layout.constant_buffers {
            let table = if stages.contains(StageMask::VERTEX) {
                &b.vertex_constant_buffers
            } else {
                &b.pixel_constant_buffers
            };
            let id = table
                .get(slot as usize)
                .copied()
                .flatten()
                .ok_or(GraphicsError::Unbound("constant buffer"))?;
            buffers.push((slot, &self.registry.buffer(id)?.buffer));
        }

        let mut views = Vec::with_capacity(shader.layout.textures.len());
        for &(slot, _) in &shader.layout.textures {
            let id = b
                .shader_resources
                .get(slot as usize)
                .copied()
                .flatten()
                .ok_or(GraphicsError::Unbound("shader resource"))?;
            views.push((slot, &self.registry.texture(id)?.sample_view));
        }

        let mut samplers = Vec::with_capacity(shader.layout.samplers.len());
        for &slot in &shader.layout.samplers {
            let id = b.samplers.get(slot as usize).copied().flatten().ok_or(GraphicsError::Unbound("sampler"))?;
            samplers.push((slot, self.registry.sampler(id)?));
        }

        let group0: Vec<_> = buffers
            .iter()
            .map(|&(binding, buffer)| wgpu::BindGroupEntry { binding, resource: buffer.as_entire_binding() })
            .collect();
        let group1: Vec<_> = views
            .iter()
            .map(|&(binding, view)| wgpu::BindGroupEntry { binding, resource: wgpu::BindingResource::TextureView(view) })
            .collect();
        let group2: Vec<_> = samplers
            .iter()
            .map(|&(binding, sampler)| wgpu::BindGroupEntry { binding, resource: wgpu::BindingResource::Sampler(sampler) })
            .collect();

        let create = |index: usize, entries: &[wgpu::BindGroupEntry]| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&shader.label),
                layout: &shader.bind_group_layouts[index],
                entries,
            })
        };
        Ok([create(0, &group0), create(1, &group1), create(2, &group2)])
    }

    fn draw(&mut self, index_count: u32) -> Result<()> {
        let registry = self.registry;
        let shader_id = self.bindings.shader.ok_or(GraphicsError::Unbound("shader"))?;
        let shader = registry.shader(shader_id)?;
        let vertex_buffer = registry
            .buffer(self.bindings.vertex_buffer.ok_or(GraphicsError::Unbound("vertex buffer"))?)?;
        let index_buffer = registry
            .buffer(self.bindings.index_buffer.ok_or(GraphicsError::Unbound("index buffer"))?)?;

        let mut colors = Vec::new();
        for target in self.color_targets() {
            colors.push(match target {
                Some(id) => Some(self.color_format(*id)?),
                None => None,
            });
        }
        let depth = match self.bindings.depth_target {
            Some(id) => Some(registry.texture(id)?.format),
            None => None,
        };
        let key = PipelineKey {
            shader: shader_id,
            blend: self.bindings.blend,
            rasterizer: self.bindings.rasterizer,
            colors,
            depth,
        };

        let groups = self.bind_groups(shader)?;
        let pipeline = self.pipelines.get_or_create(&key, self.device, shader).clone();
        let viewport = self.bindings.viewport.filter(|vp| vp.is_valid());

        self.ensure_pass()?;
        let Some(pass) = self.pass.as_mut() else {
            return Ok(());
        };

        pass.set_pipeline(&pipeline);
        if let Some(vp) = viewport {
            pass.set_viewport(vp.x, vp.y, vp.width, vp.height, vp.min_depth, vp.max_depth);
        }
        for (index, group) in groups.iter().enumerate() {
            pass.set_bind_group(index as u32, group, &[]);
        }
        pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));
        pass.set_index_buffer(index_buffer.buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..1);

        self.draws += 1;
        Ok(())
    }
}
