use crate::coords::{Matrix2d, Rect};
use crate::paint::{BlendMode, Color};

use super::RendererSettings;

/// Clip rectangle in back buffer pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Scissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Clamps a float rect into `[0, width] x [0, height]`.
    pub fn clamped(r: Rect, width: u32, height: u32) -> Self {
        let r = r.normalized();
        let clamp = |v: f32, hi: u32| -> u32 {
            if v.is_nan() { 0 } else { (v.round().max(0.0) as u32).min(hi) }
        };
        let x0 = clamp(r.left(), width);
        let y0 = clamp(r.top(), height);
        let x1 = clamp(r.right(), width).max(x0);
        let y1 = clamp(r.bottom(), height).max(y0);
        Self { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }

    #[inline]
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x as f32, self.y as f32, self.width as f32, self.height as f32)
    }
}

/// Notification emitted by a renderer, drained by its owner.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererEvent {
    CanvasResized { width: u32, height: u32 },
    /// The drawing context is gone; further drawing is discarded.
    ContextLost,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SavedState {
    pub color: Color,
    pub tint: Color,
    pub blend_mode: BlendMode,
    pub transform: Matrix2d,
    pub scissor: Scissor,
    pub line_width: f32,
}

/// Drawing state shared by every backend.
#[derive(Debug, Clone)]
pub struct RendererState {
    pub settings: RendererSettings,
    pub is_context_valid: bool,
    pub(crate) color: Color,
    pub(crate) tint: Color,
    pub(crate) blend_mode: BlendMode,
    pub(crate) scissor: Scissor,
    pub(crate) projection: Matrix2d,
    pub(crate) transform: Matrix2d,
    pub(crate) line_width: f32,
    pub(crate) stack: Vec<SavedState>,
    pub(crate) events: Vec<RendererEvent>,
}

impl RendererState {
    pub fn new(settings: RendererSettings) -> Self {
        let (w, h) = (settings.width, settings.height);
        Self {
            settings,
            is_context_valid: true,
            color: Color::black(),
            tint: Color::white(),
            blend_mode: BlendMode::Normal,
            scissor: Scissor::full(w, h),
            projection: Matrix2d::ortho(0.0, w as f32, h as f32, 0.0),
            transform: Matrix2d::identity(),
            line_width: 1.0,
            stack: Vec::new(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn tint(&self) -> Color {
        self.tint
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    #[inline]
    pub fn scissor(&self) -> Scissor {
        self.scissor
    }

    #[inline]
    pub fn projection(&self) -> Matrix2d {
        self.projection
    }

    #[inline]
    pub fn transform(&self) -> Matrix2d {
        self.transform
    }

    #[inline]
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Color actually painted: current color modulated by the tint.
    pub fn effective_color(&self) -> Color {
        let c = self.color.to_array();
        let t = self.tint.to_array();
        Color::from_array([c[0] * t[0], c[1] * t[1], c[2] * t[2], c[3] * t[3]])
    }

    /// Invalidates the context. Returns `false` if it already was invalid.
    pub(crate) fn lose_context(&mut self) -> bool {
        if !self.is_context_valid {
            return false;
        }
        self.is_context_valid = false;
        self.events.push(RendererEvent::ContextLost);
        true
    }

    pub(crate) fn snapshot(&self) -> SavedState {
        SavedState {
            color: self.color,
            tint: self.tint,
            blend_mode: self.blend_mode,
            transform: self.transform,
            scissor: self.scissor,
            line_width: self.line_width,
        }
    }
}
