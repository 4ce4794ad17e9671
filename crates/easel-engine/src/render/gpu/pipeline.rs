use bytemuck::{Pod, Zeroable};

use crate::coords::Matrix2d;
use crate::paint::BlendMode;

use super::batch::Vertex;

/// Back buffer format. Unorm so read-back bytes equal the written values.
pub(super) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ── blend ─────────────────────────────────────────────────────────────────

/// Fixed-function blend state for a blend mode (straight-alpha sources).
pub(super) fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    use wgpu::BlendFactor as F;

    let color = |src_factor, dst_factor| wgpu::BlendComponent {
        src_factor,
        dst_factor,
        operation: wgpu::BlendOperation::Add,
    };
    let alpha = match mode {
        BlendMode::Lighter | BlendMode::Additive => color(F::SrcAlpha, F::One),
        _ => color(F::One, F::OneMinusSrcAlpha),
    };

    let rgb = match mode {
        BlendMode::Normal => color(F::SrcAlpha, F::OneMinusSrcAlpha),
        BlendMode::Multiply => color(F::Dst, F::OneMinusSrcAlpha),
        BlendMode::Lighter | BlendMode::Additive => color(F::SrcAlpha, F::One),
        BlendMode::Screen => color(F::One, F::OneMinusSrc),
    };

    wgpu::BlendState { color: rgb, alpha }
}

// ── globals uniform ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Globals {
    pub projection: [[f32; 4]; 3], // mat3x3 columns, 16-byte aligned
}

impl Globals {
    pub fn new(projection: &Matrix2d) -> Self {
        Self { projection: projection.to_padded_columns() }
    }
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// Render pipelines for every blend mode, solid and textured.
pub(super) struct Pipelines {
    pub globals_layout: wgpu::BindGroupLayout,
    pub image_layout: wgpu::BindGroupLayout,
    solid: Vec<(BlendMode, wgpu::RenderPipeline)>,
    image: Vec<(BlendMode, wgpu::RenderPipeline)>,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("easel shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/easel.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Globals>() as u64),
                },
                count: None,
            }],
        });

        let image_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel image bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel solid pipeline layout"),
            bind_group_layouts: &[&globals_layout],
            immediate_size: 0,
        });
        let image_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel image pipeline layout"),
            bind_group_layouts: &[&globals_layout, &image_layout],
            immediate_size: 0,
        });

        let solid = BlendMode::ALL
            .into_iter()
            .map(|m| (m, create_pipeline(device, &shader, &solid_layout, "fs_solid", m)))
            .collect();
        let image = BlendMode::ALL
            .into_iter()
            .map(|m| (m, create_pipeline(device, &shader, &image_pipeline_layout, "fs_image", m)))
            .collect();

        Self { globals_layout, image_layout, solid, image }
    }

    pub fn solid(&self, mode: BlendMode) -> Option<&wgpu::RenderPipeline> {
        self.solid.iter().find(|(m, _)| *m == mode).map(|(_, p)| p)
    }

    pub fn image(&self, mode: BlendMode) -> Option<&wgpu::RenderPipeline> {
        self.image.iter().find(|(m, _)| *m == mode).map(|(_, p)| p)
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &'static str,
    mode: BlendMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(blend_state(mode)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_modes_share_blend_state() {
        assert_eq!(blend_state(BlendMode::Lighter), blend_state(BlendMode::Additive));
        assert_ne!(blend_state(BlendMode::Normal), blend_state(BlendMode::Multiply));
    }

    #[test]
    fn globals_layout_matches_wgsl_mat3() {
        assert_eq!(std::mem::size_of::<Globals>(), 48);
    }
}
