//! Hardware backend built on wgpu.
//!
//! Primitives are tessellated on the CPU into a [`BatchList`], then drawn in a
//! single render pass per [`flush`](Renderer::flush) into an off-screen
//! texture. The texture is read back into the screen canvas after each pass.
//!
//! Convention:
//! - Vertex positions are back buffer pixels (top-left origin, +Y down).
//! - The vertex shader maps them to NDC with the renderer's projection.

mod batch;
mod pipeline;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::coords::{Matrix2d, Rect, Vector2d};
use crate::device::{Gpu, GpuInit};
use crate::paint::{BlendMode, Color};
use crate::scene::{tessellate, Ellipse, Polygon, Shape};
use crate::surface::{create_canvas, Canvas, ContextKind, ImageRendering};

use super::{Renderer, RendererKind, RendererSettings, RendererState, Scissor};

use batch::{BatchKind, BatchList};
use pipeline::{Globals, Pipelines, TARGET_FORMAT};

/// Bytes per texel of the back buffer.
const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a `width`-pixel row in a texture-to-buffer copy.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Two triangles covering `[dx, dx + dw] x [dy, dy + dh]` with unit UVs.
fn image_quad(dx: f32, dy: f32, dw: f32, dh: f32) -> [(Vector2d, [f32; 2]); 6] {
    let tl = (Vector2d::new(dx, dy), [0.0, 0.0]);
    let tr = (Vector2d::new(dx + dw, dy), [1.0, 0.0]);
    let br = (Vector2d::new(dx + dw, dy + dh), [1.0, 1.0]);
    let bl = (Vector2d::new(dx, dy + dh), [0.0, 1.0]);
    [tl, tr, br, tl, br, bl]
}

fn to_wgpu_color(c: Color) -> wgpu::Color {
    let [r, g, b, a] = c.to_array();
    wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
}

/// Render target texture plus the buffer it is read back through.
struct Target {
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
}

impl Target {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel back buffer"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel readback"),
            size: padded_bytes_per_row(width) as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { width, height, texture, view, readback }
    }
}

/// GPU backend. Draws through wgpu, presents into a [`Canvas`].
pub struct GpuRenderer {
    state: RendererState,
    gpu: Gpu,
    canvas: Canvas,
    target: Target,
    pipelines: Pipelines,
    globals: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    linear: wgpu::Sampler,
    nearest: wgpu::Sampler,
    anti_alias: bool,

    batches: BatchList,
    /// Bind groups of images referenced by the pending batches.
    images: Vec<wgpu::BindGroup>,
    /// Clear applied at the start of the next pass.
    pending_clear: Option<Color>,
}

impl GpuRenderer {
    /// Acquires a device matching `settings.gpu` and allocates the back buffer.
    ///
    /// Fails when no suitable adapter exists; callers fall back to the canvas
    /// backend.
    pub fn new(settings: RendererSettings) -> Result<Self> {
        let (w, h) = (settings.width, settings.height);

        let gpu = pollster::block_on(Gpu::new_headless(GpuInit::from(settings.gpu)))
            .context("failed to initialize the gpu renderer")?;

        let mut canvas = create_canvas(w, h, false).context("failed to create the screen canvas")?;
        canvas.claim(ContextKind::Gpu).context("failed to acquire a gpu context")?;

        let device = gpu.device();
        let target = Target::new(device, w, h);
        let pipelines = Pipelines::new(device);

        let projection = Matrix2d::ortho(0.0, w as f32, h as f32, 0.0);
        let globals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel globals"),
            contents: bytemuck::bytes_of(&Globals::new(&projection)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel globals bg"),
            layout: &pipelines.globals_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: globals.as_entire_binding() }],
        });

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
        let linear = sampler(wgpu::FilterMode::Linear, "easel linear sampler");
        let nearest = sampler(wgpu::FilterMode::Nearest, "easel nearest sampler");

        log::info!("gpu renderer {w}x{h} on {}", gpu.adapter_info().name);

        let transparent = settings.transparent;
        let anti_alias = settings.anti_alias;
        let blend = settings.blend_mode;
        let mut r = Self {
            state: RendererState::new(settings),
            gpu,
            canvas,
            target,
            pipelines,
            globals,
            globals_bind_group,
            linear,
            nearest,
            anti_alias,
            batches: BatchList::default(),
            images: Vec::new(),
            pending_clear: None,
        };
        r.set_anti_alias(anti_alias);
        r.set_blend_mode(blend);
        r.clear_color(if transparent { Color::transparent() } else { Color::black() }, true);
        r.flush();
        Ok(r)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.gpu.adapter_info()
    }

    /// Number of batches recorded since the last flush.
    pub fn pending_batches(&self) -> usize {
        self.batches.batches.len()
    }

    fn push_solid(&mut self, triangles: &[Vector2d]) {
        let s = &self.state;
        self.batches
            .push_solid(s.blend_mode(), s.scissor(), &s.transform(), s.effective_color(), triangles);
    }

    fn push_shape(&mut self, shape: &Shape, fill: bool) {
        let triangles = if fill {
            tessellate::fill_triangles(shape)
        } else {
            tessellate::stroke_triangles(shape, self.state.line_width())
        };
        self.push_solid(&triangles);
    }

    fn upload_image(&mut self, image: &Canvas) -> usize {
        let device = self.gpu.device();
        let size = wgpu::Extent3d { width: image.width(), height: image.height(), depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_PIXEL * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = if self.anti_alias { &self.linear } else { &self.nearest };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel image bg"),
            layout: &self.pipelines.image_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });
        self.images.push(bind_group);
        self.images.len() - 1
    }

    fn encode_pass(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let load = match self.pending_clear.take() {
            Some(c) => wgpu::LoadOp::Clear(to_wgpu_color(c)),
            None => wgpu::LoadOp::Load,
        };

        let vertices = (!self.batches.vertices.is_empty()).then(|| {
            self.gpu.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("easel vertices"),
                contents: bytemuck::cast_slice(&self.batches.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(vertices) = vertices.as_ref() else { return };
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_bind_group(0, &self.globals_bind_group, &[]);

        for batch in &self.batches.batches {
            let pipeline = match batch.kind {
                BatchKind::Solid => self.pipelines.solid(batch.blend),
                BatchKind::Image(i) => {
                    let Some(bg) = self.images.get(i) else { continue };
                    pass.set_bind_group(1, bg, &[]);
                    self.pipelines.image(batch.blend)
                }
            };
            let Some(pipeline) = pipeline else { continue };
            pass.set_pipeline(pipeline);
            let s = batch.scissor;
            pass.set_scissor_rect(s.x, s.y, s.width, s.height);
            pass.draw(batch.range.clone(), 0..1);
        }
    }

    fn discard_pending(&mut self) {
        self.batches.clear();
        self.images.clear();
        self.pending_clear = None;
    }

    /// Copies the back buffer texture into the screen canvas pixels.
    fn read_back(&mut self) -> Result<()> {
        let (w, h) = (self.target.width, self.target.height);
        let padded = padded_bytes_per_row(w) as usize;
        let row = (w * BYTES_PER_PIXEL) as usize;

        let slice = self.target.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.gpu
            .device()
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for the gpu")?;
        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map the readback buffer")?;

        {
            let data = slice.get_mapped_range();
            let opaque = !self.state.settings.transparent;
            let rows = data.chunks(padded).take(h as usize).map(|r| &r[..row]);
            self.canvas.write_rgba8_rows(rows, opaque);
        }
        self.target.readback.unmap();
        Ok(())
    }
}

impl Renderer for GpuRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Gpu
    }

    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn screen_canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn screen_canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    fn backbuffer_size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn resize_surfaces(&mut self, width: u32, height: u32) {
        self.target = Target::new(self.gpu.device(), width, height);
        self.canvas.set_size(width, height);
        self.state.projection = Matrix2d::ortho(0.0, width as f32, height as f32, 0.0);
        self.batches.clear();
        self.images.clear();
        let transparent = self.state.settings.transparent;
        self.pending_clear = Some(if transparent { Color::transparent() } else { Color::black() });
    }

    // Blending is part of each batch's pipeline.
    fn apply_blend_mode(&mut self, _mode: BlendMode) {}

    fn set_anti_alias(&mut self, enable: bool) {
        self.anti_alias = enable;
        self.canvas.style.image_rendering = if enable { ImageRendering::Auto } else { ImageRendering::Pixelated };
    }

    fn clear(&mut self) {
        let transparent = self.state.settings.transparent;
        self.clear_color(if transparent { Color::transparent() } else { Color::black() }, true);
    }

    fn clear_color(&mut self, color: Color, opaque: bool) {
        if opaque {
            self.discard_pending();
            self.pending_clear = Some(color);
            return;
        }
        let (w, h) = self.backbuffer_size();
        let quad = tessellate::fill_triangles(&Shape::Rect(Rect::new(0.0, 0.0, w as f32, h as f32)));
        let mode = self.state.blend_mode();
        self.batches.push_solid(mode, Scissor::full(w, h), &Matrix2d::identity(), color, &quad);
    }

    fn flush(&mut self) {
        if self.gpu.is_lost() && self.state.lose_context() {
            log::error!("gpu device lost, drawing is suspended");
        }
        if !self.state.is_context_valid {
            self.discard_pending();
            return;
        }
        if self.batches.is_empty() && self.pending_clear.is_none() {
            return;
        }

        let projection = self.state.projection();
        self.gpu
            .queue()
            .write_buffer(&self.globals, 0, bytemuck::bytes_of(&Globals::new(&projection)));

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("easel encoder") });
        self.encode_pass(&mut encoder);

        let (w, h) = (self.target.width, self.target.height);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(w)),
                    rows_per_image: Some(h),
                },
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
        self.gpu.queue().submit(Some(encoder.finish()));

        self.batches.clear();
        self.images.clear();

        if let Err(e) = self.read_back() {
            log::error!("gpu readback failed: {e:#}");
        }
    }

    fn clear_cache(&mut self) {
        self.images.clear();
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: bool) {
        self.push_shape(&Shape::Rect(Rect::new(x, y, width, height)), fill);
    }

    fn stroke_polygon(&mut self, poly: &Polygon, fill: bool) {
        self.push_shape(&Shape::Polygon(poly.clone()), fill);
    }

    fn stroke_ellipse(&mut self, x: f32, y: f32, w: f32, h: f32, fill: bool) {
        self.push_shape(&Shape::Ellipse(Ellipse::new(x, y, w, h)), fill);
    }

    fn draw_image(&mut self, image: &Canvas, dx: f32, dy: f32, dw: f32, dh: f32) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let index = self.upload_image(image);
        let s = &self.state;
        let [r, g, b, _] = s.tint().to_array();
        let color = Color::from_array([r, g, b, s.effective_color().alpha()]);
        self.batches.push(
            BatchKind::Image(index),
            s.blend_mode(),
            s.scissor(),
            &s.transform(),
            color,
            &image_quad(dx, dy, dw, dh),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readback_rows_are_aligned() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn image_quad_spans_destination() {
        let q = image_quad(10.0, 20.0, 30.0, 40.0);
        assert_eq!(q[0], (Vector2d::new(10.0, 20.0), [0.0, 0.0]));
        assert_eq!(q[2], (Vector2d::new(40.0, 60.0), [1.0, 1.0]));
        assert_eq!(q[5].1, [0.0, 1.0]);
    }

    #[test]
    fn clear_color_maps_to_unit_range() {
        let c = to_wgpu_color(Color::new(255.0, 0.0, 0.0, 0.5));
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 0.5));
    }
}
