use crate::device::GpuOptions;
use crate::paint::BlendMode;

/// Concrete backend behind a [`Renderer`](super::Renderer).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererKind {
    Canvas,
    Gpu,
}

impl RendererKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RendererKind::Canvas => "Canvas",
            RendererKind::Gpu => "GPU",
        }
    }
}

/// Normalized options handed to a backend at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// Back buffer size in pixels (the design resolution at construction).
    pub width: u32,
    pub height: u32,
    /// Physical display size, updated by the video surface manager on every scale.
    pub zoom_x: f32,
    pub zoom_y: f32,
    /// Draw into a separate back buffer, presented by `flush`.
    pub double_buffering: bool,
    pub anti_alias: bool,
    pub transparent: bool,
    /// Blend mode restored by `reset`.
    pub blend_mode: BlendMode,
    pub sub_pixel: bool,
    pub gpu: GpuOptions,
}

impl RendererSettings {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            zoom_x: width as f32,
            zoom_y: height as f32,
            double_buffering: false,
            anti_alias: false,
            transparent: false,
            blend_mode: BlendMode::Normal,
            sub_pixel: false,
            gpu: GpuOptions::default(),
        }
    }
}
