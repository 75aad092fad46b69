use std::collections::HashMap;

use crate::pipeline::{BlendMode, CullMode, FillMode, RasterizerState, ShaderId};
use crate::scene::Vertex;
use crate::shader::ENTRY_POINT;

use super::registry::ShaderEntry;

/// Everything a render pipeline bakes in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub shader: ShaderId,
    pub blend: BlendMode,
    pub rasterizer: RasterizerState,
    /// Formats of the bound color targets, trailing empty slots trimmed.
    pub colors: Vec<Option<wgpu::TextureFormat>>,
    pub depth: Option<wgpu::TextureFormat>,
}

/// Render pipelines built on first use of a state combination.
#[derive(Default)]
pub(crate) struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn get_or_create(
        &mut self,
        key: &PipelineKey,
        device: &wgpu::Device,
        shader: &ShaderEntry,
    ) -> &wgpu::RenderPipeline {
        if !self.pipelines.contains_key(key) {
            let pipeline = create_pipeline(key, device, shader);
            log::debug!("pipeline #{} for `{}`: {key:?}", self.pipelines.len(), shader.label);
            self.pipelines.insert(key.clone(), pipeline);
        }
        &self.pipelines[key]
    }
}

pub(crate) fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Disabled => None,
        BlendMode::AlphaBlend => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

pub(crate) fn primitive_state(state: RasterizerState, features: wgpu::Features) -> wgpu::PrimitiveState {
    let polygon_mode = match state.fill {
        FillMode::Solid => wgpu::PolygonMode::Fill,
        FillMode::Wireframe if features.contains(wgpu::Features::POLYGON_MODE_LINE) => wgpu::PolygonMode::Line,
        FillMode::Wireframe => {
            log::warn!("wireframe fill unsupported, drawing solid");
            wgpu::PolygonMode::Fill
        }
    };

    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        // Clockwise triangles face the camera.
        front_face: wgpu::FrontFace::Cw,
        cull_mode: match state.cull {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        },
        polygon_mode,
        unclipped_depth: !state.depth_clip && features.contains(wgpu::Features::DEPTH_CLIP_CONTROL),
        conservative: false,
    }
}

fn create_pipeline(key: &PipelineKey, device: &wgpu::Device, shader: &ShaderEntry) -> wgpu::RenderPipeline {
    let blend = blend_state(key.blend);
    let targets: Vec<Option<wgpu::ColorTargetState>> = key
        .colors
        .iter()
        .map(|format| {
            format.map(|format| wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();

    let depth_stencil = key.depth.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&shader.label),
        layout: Some(&shader.pipeline_layout),

        vertex: wgpu::VertexState {
            module: &shader.vertex,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader.pixel,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            targets: &targets,
        }),

        primitive: primitive_state(key.rasterizer, device.features()),
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── blend ────────────────────────────────────────────────────────────

    #[test]
    fn disabled_blend_writes_through() {
        assert_eq!(blend_state(BlendMode::Disabled), None);
    }

    #[test]
    fn additive_blend_accumulates() {
        let state = blend_state(BlendMode::Additive).unwrap();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(state.alpha.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn alpha_blend_uses_inverse_source_alpha() {
        let state = blend_state(BlendMode::AlphaBlend).unwrap();
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    // ── rasterizer ───────────────────────────────────────────────────────

    #[test]
    fn default_rasterizer_culls_back_faces_clockwise_front() {
        let p = primitive_state(RasterizerState::default(), wgpu::Features::empty());
        assert_eq!(p.front_face, wgpu::FrontFace::Cw);
        assert_eq!(p.cull_mode, Some(wgpu::Face::Back));
        assert!(!p.unclipped_depth);
    }

    #[test]
    fn depth_clip_off_needs_feature() {
        let state = RasterizerState::new(FillMode::Solid, CullMode::None, false);
        assert!(!primitive_state(state, wgpu::Features::empty()).unclipped_depth);
        assert!(primitive_state(state, wgpu::Features::DEPTH_CLIP_CONTROL).unclipped_depth);
    }

    #[test]
    fn wireframe_falls_back_to_fill_without_feature() {
        let state = RasterizerState::new(FillMode::Wireframe, CullMode::Back, true);
        assert_eq!(primitive_state(state, wgpu::Features::empty()).polygon_mode, wgpu::PolygonMode::Fill);
        assert_eq!(
            primitive_state(state, wgpu::Features::POLYGON_MODE_LINE).polygon_mode,
            wgpu::PolygonMode::Line
        );
    }
}
