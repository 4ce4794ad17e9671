use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::surface::{Canvas, ImageRendering};

use super::gpu::{new_instance, request_adapter};
use super::GpuInit;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; presentation may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

pub(crate) fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    let preferred = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb];
    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::CompositeAlphaMode {
    [wgpu::CompositeAlphaMode::Opaque]
        .into_iter()
        .find(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Texture format the canvas bytes are uploaded as.
///
/// Canvas bytes are sRGB-encoded; on an sRGB surface they are decoded on sampling
/// and re-encoded on write, so the window shows the stored values.
pub(crate) fn canvas_texture_format(surface: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if surface.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// Where the canvas lands in the window, as `[x, y, width, height]` in physical pixels.
///
/// The canvas display size (logical pixels) is scaled by the window's scale factor
/// and centered. A canvas larger than the window is shrunk uniformly to fit.
/// `None` when nothing would be visible.
pub(crate) fn present_viewport(
    display_width: f32,
    display_height: f32,
    scale_factor: f64,
    target: PhysicalSize<u32>,
) -> Option<[f32; 4]> {
    let (tw, th) = (target.width as f32, target.height as f32);
    let w = display_width * scale_factor as f32;
    let h = display_height * scale_factor as f32;
    if !(w > 0.0 && h > 0.0 && tw > 0.0 && th > 0.0) {
        return None;
    }

    let k = (tw / w).min(th / h).min(1.0);
    let (w, h) = (w * k, h * k);
    Some([((tw - w) / 2.0).floor(), ((th - h) / 2.0).floor(), w, h])
}

struct CanvasTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Shows the screen canvas in a window through a wgpu surface.
///
/// Owns its own device: the canvas is uploaded every frame and drawn into the
/// window's swapchain texture.
pub struct Presenter {
    /// Kept alive for the lifetime of the surface.
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    linear: wgpu::Sampler,
    nearest: wgpu::Sampler,
    texture: Option<CanvasTexture>,
}

impl Presenter {
    /// Creates a surface for `window` and a device able to present to it.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        let instance = new_instance();
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = request_adapter(&instance, &init, Some(&surface)).await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("easel presenter device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps).context("no supported surface formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: choose_alpha_mode(&caps),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &config);
        }

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel present bgl"),
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
        let pipeline = create_pipeline(&device, &layout, format);

        let sampler = |filter, label| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };
        let linear = sampler(wgpu::FilterMode::Linear, "easel present linear");
        let nearest = sampler(wgpu::FilterMode::Nearest, "easel present nearest");

        log::info!("presenting to a {format:?} surface on {}", adapter.get_info().name);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            layout,
            linear,
            nearest,
            texture: None,
        })
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Uploads `canvas` and draws it, centered at its display size, into the next
    /// swapchain texture. Areas outside the canvas are black.
    pub fn present(&mut self, canvas: &Canvas, scale_factor: f64) -> std::result::Result<(), SurfaceError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(());
        }

        self.upload(canvas);
        let Some(texture) = self.texture.as_ref() else { return Ok(()) };

        let sampler = match canvas.style.image_rendering {
            ImageRendering::Pixelated => &self.nearest,
            ImageRendering::Auto => &self.linear,
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel present bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&texture.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("easel present encoder") });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel present"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let display = (canvas.style.width, canvas.style.height);
            if let Some([x, y, w, h]) = present_viewport(display.0, display.1, scale_factor, self.size) {
                pass.set_viewport(x, y, w, h, 0.0, 1.0);
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }

    fn upload(&mut self, canvas: &Canvas) {
        let (width, height) = (canvas.width(), canvas.height());
        let reuse = self.texture.as_ref().is_some_and(|t| t.width == width && t.height == height);
        if !reuse {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("easel present canvas"),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: canvas_texture_format(self.config.format),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.texture = Some(CanvasTexture { texture, view, width, height });
        }

        let Some(target) = self.texture.as_ref() else { return };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &canvas.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("easel present shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/present.wgsl").into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("easel present pipeline layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("easel present pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                // Transparent canvas pixels show the black clear.
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat], alpha_modes: &[wgpu::CompositeAlphaMode]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: alpha_modes.to_vec(),
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    // ── format selection ──────────────────────────────────────────────────

    #[test]
    fn prefers_srgb_surface_format() {
        use wgpu::TextureFormat as F;
        let c = caps(&[F::Bgra8Unorm, F::Rgba8UnormSrgb], &[]);
        assert_eq!(choose_surface_format(&c), Some(F::Rgba8UnormSrgb));
        let c = caps(&[F::Rgba16Float, F::Bgra8Unorm], &[]);
        assert_eq!(choose_surface_format(&c), Some(F::Rgba16Float));
        assert_eq!(choose_surface_format(&caps(&[], &[])), None);
    }

    #[test]
    fn canvas_texture_matches_surface_encoding() {
        use wgpu::TextureFormat as F;
        assert_eq!(canvas_texture_format(F::Bgra8UnormSrgb), F::Rgba8UnormSrgb);
        assert_eq!(canvas_texture_format(F::Bgra8Unorm), F::Rgba8Unorm);
    }

    #[test]
    fn alpha_mode_prefers_opaque() {
        use wgpu::CompositeAlphaMode as A;
        assert_eq!(choose_alpha_mode(&caps(&[], &[A::PreMultiplied, A::Opaque])), A::Opaque);
        assert_eq!(choose_alpha_mode(&caps(&[], &[A::PostMultiplied])), A::PostMultiplied);
        assert_eq!(choose_alpha_mode(&caps(&[], &[])), A::Auto);
    }

    // ── viewport ──────────────────────────────────────────────────────────

    #[test]
    fn viewport_is_centered_at_display_size() {
        let vp = present_viewport(800.0, 600.0, 1.0, PhysicalSize::new(1000, 700));
        assert_eq!(vp, Some([100.0, 50.0, 800.0, 600.0]));
    }

    #[test]
    fn viewport_follows_scale_factor() {
        let vp = present_viewport(800.0, 600.0, 2.0, PhysicalSize::new(1600, 1200));
        assert_eq!(vp, Some([0.0, 0.0, 1600.0, 1200.0]));
    }

    #[test]
    fn oversized_canvas_shrinks_uniformly() {
        let vp = present_viewport(800.0, 600.0, 1.0, PhysicalSize::new(400, 600));
        assert_eq!(vp, Some([0.0, 150.0, 400.0, 300.0]));
    }

    #[test]
    fn empty_viewport_is_skipped() {
        assert_eq!(present_viewport(800.0, 600.0, 1.0, PhysicalSize::new(0, 600)), None);
        assert_eq!(present_viewport(0.0, 600.0, 1.0, PhysicalSize::new(800, 600)), None);
    }
}
