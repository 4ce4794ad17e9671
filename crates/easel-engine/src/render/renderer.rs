use crate::coords::{Matrix2d, Rect};
use crate::paint::{BlendMode, Color};
use crate::scene::{Polygon, Shape};
use crate::surface::{create_canvas, Canvas, CompositeOp, Context2d, SurfaceError};

use super::{RendererEvent, RendererKind, RendererState, Scissor};

/// Acquires a 2D context on `canvas`, with image smoothing set to `anti_alias`.
///
/// Fails with [`SurfaceError::UnsupportedSurface`] when the canvas is already
/// bound to another context kind.
pub fn get_context2d(
    canvas: Canvas,
    transparent: bool,
    anti_alias: bool,
) -> Result<Context2d, SurfaceError> {
    let mut ctx = Context2d::new(canvas, transparent)?;
    ctx.set_image_smoothing_enabled(anti_alias);
    Ok(ctx)
}

/// Returns a new surface holding `image` tinted by `color`.
///
/// Paints the opaque `color`, composites the image with `mode`, then masks the
/// result to the image's own alpha with a `destination-atop` pass.
pub fn tint_canvas(
    image: &Canvas,
    color: Color,
    mode: CompositeOp,
    anti_alias: bool,
) -> Result<Canvas, SurfaceError> {
    let (w, h) = (image.width(), image.height());
    let mut ctx = get_context2d(create_canvas(w, h, true)?, true, anti_alias)?;

    ctx.save();
    let mut fill = color;
    fill.set_alpha(1.0);
    ctx.set_fill_style(fill);
    ctx.fill_rect(0.0, 0.0, w as f32, h as f32);

    ctx.set_global_composite_operation(mode);
    ctx.draw_image(image, 0.0, 0.0);
    ctx.set_global_composite_operation(CompositeOp::DestinationAtop);
    ctx.draw_image(image, 0.0, 0.0);
    ctx.restore();

    Ok(ctx.into_canvas())
}

/// Operations every rendering backend supports identically.
///
/// Shared drawing state lives in a [`RendererState`] owned by the backend;
/// the provided methods implement the backend-independent part of the
/// contract on top of a handful of backend primitives.
pub trait Renderer {
    fn kind(&self) -> RendererKind;

    fn state(&self) -> &RendererState;

    fn state_mut(&mut self) -> &mut RendererState;

    /// Canvas presented to the user.
    fn screen_canvas(&self) -> &Canvas;

    fn screen_canvas_mut(&mut self) -> &mut Canvas;

    /// Back buffer size in pixels.
    fn backbuffer_size(&self) -> (u32, u32);

    /// Reallocates the screen canvas and back buffer. Only called with a new,
    /// non-zero size.
    fn resize_surfaces(&mut self, width: u32, height: u32);

    /// Backend part of [`set_blend_mode`](Self::set_blend_mode).
    fn apply_blend_mode(&mut self, mode: BlendMode);

    /// Enables or disables smoothing when images are scaled.
    fn set_anti_alias(&mut self, enable: bool);

    /// Fills the whole back buffer, ignoring scissor and transform.
    ///
    /// When `opaque` is false the color is blended with the current blend mode.
    fn clear_color(&mut self, color: Color, opaque: bool);

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: bool);

    fn stroke_polygon(&mut self, poly: &Polygon, fill: bool);

    /// `(x, y)` is the center, `w`/`h` the radii.
    fn stroke_ellipse(&mut self, x: f32, y: f32, w: f32, h: f32, fill: bool);

    /// Draws `image` scaled into the destination rect.
    fn draw_image(&mut self, image: &Canvas, dx: f32, dy: f32, dw: f32, dh: f32);

    /// Prepares the back buffer for a new frame.
    fn clear(&mut self) {}

    /// Presents pending drawing.
    fn flush(&mut self) {}

    /// Drops backend caches (tinted surfaces, uploaded textures).
    fn clear_cache(&mut self) {}

    // ── size ─────────────────────────────────────────────────────────────

    fn width(&self) -> u32 {
        self.backbuffer_size().0
    }

    fn height(&self) -> u32 {
        self.backbuffer_size().1
    }

    /// Resizes the screen canvas and back buffer together.
    ///
    /// Returns `false` without side effects when the size is unchanged or a
    /// dimension is zero.
    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::debug!("ignoring renderer resize to {width}x{height}");
            return false;
        }
        if (width, height) == self.backbuffer_size() {
            return false;
        }
        self.resize_surfaces(width, height);
        let state = self.state_mut();
        state.scissor = Scissor::full(width, height);
        state.events.push(RendererEvent::CanvasResized { width, height });
        true
    }

    /// Restores transform, blend mode, color and tint, clears caches and
    /// re-derives the scissor from the current back buffer size.
    fn reset(&mut self) {
        self.reset_transform();
        let mode = self.state().settings.blend_mode;
        self.set_blend_mode(mode);
        self.set_color(Color::black());
        self.clear_tint();
        self.clear_cache();
        let (w, h) = self.backbuffer_size();
        self.state_mut().scissor = Scissor::full(w, h);
    }

    /// Visible back buffer rect overlaps `bounds` (edges inclusive).
    fn overlaps(&self, bounds: Rect) -> bool {
        let (w, h) = self.backbuffer_size();
        bounds.overlaps(Rect::new(0.0, 0.0, w as f32, h as f32))
    }

    fn drain_events(&mut self) -> Vec<RendererEvent> {
        std::mem::take(&mut self.state_mut().events)
    }

    fn get_context2d(&self, canvas: Canvas, transparent: bool) -> Result<Context2d, SurfaceError> {
        get_context2d(canvas, transparent, self.state().settings.anti_alias)
    }

    /// See [`tint_canvas`].
    fn tint(&mut self, image: &Canvas, color: Color, mode: CompositeOp) -> Result<Canvas, SurfaceError> {
        tint_canvas(image, color, mode, self.state().settings.anti_alias)
    }

    // ── shapes ───────────────────────────────────────────────────────────

    fn stroke(&mut self, shape: &Shape, fill: bool) {
        match shape {
            Shape::Rect(r) => self.stroke_rect(r.left(), r.top(), r.width(), r.height(), fill),
            Shape::Polygon(p) | Shape::Line(p) => self.stroke_polygon(p, fill),
            Shape::Ellipse(e) => self.stroke_ellipse(e.pos.x, e.pos.y, e.radius.x, e.radius.y, fill),
        }
    }

    fn fill(&mut self, shape: &Shape) {
        self.stroke(shape, true);
    }

    // ── color & blending ─────────────────────────────────────────────────

    fn set_color(&mut self, color: Color) {
        self.state_mut().color = color;
    }

    fn color(&self) -> Color {
        self.state().color
    }

    /// Parses and applies a CSS color string.
    fn set_color_css(&mut self, css: &str) -> Result<(), crate::paint::ColorError> {
        let c = Color::from_css(css)?;
        self.set_color(c);
        Ok(())
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state_mut().color.set_alpha(alpha);
    }

    fn global_alpha(&self) -> f32 {
        self.state().color.alpha()
    }

    fn set_tint(&mut self, tint: Color) {
        self.state_mut().tint = tint;
    }

    /// Resets the tint to opaque white.
    fn clear_tint(&mut self) {
        self.state_mut().tint = Color::white();
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state_mut().blend_mode = mode;
        self.apply_blend_mode(mode);
    }

    fn blend_mode(&self) -> BlendMode {
        self.state().blend_mode
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state_mut().line_width = width;
        }
    }

    // ── transforms & clipping ────────────────────────────────────────────

    fn set_projection(&mut self, m: Matrix2d) {
        self.state_mut().projection = m;
    }

    fn reset_transform(&mut self) {
        self.state_mut().transform = Matrix2d::identity();
    }

    fn set_transform(&mut self, m: Matrix2d) {
        self.state_mut().transform = m;
    }

    fn transform(&mut self, m: &Matrix2d) {
        let t = self.state().transform.multiply(m);
        self.state_mut().transform = t;
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state_mut().transform.translate(x, y);
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.state_mut().transform.scale(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        self.state_mut().transform.rotate(angle);
    }

    /// Restricts drawing to a rect in back buffer pixels, clamped to the back buffer.
    fn clip_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let (w, h) = self.backbuffer_size();
        self.state_mut().scissor = Scissor::clamped(Rect::new(x, y, width, height), w, h);
    }

    fn save(&mut self) {
        let snap = self.state().snapshot();
        self.state_mut().stack.push(snap);
    }

    /// No-op on an empty stack. The saved scissor is clamped to the current
    /// back buffer, which may have been resized since the save.
    fn restore(&mut self) {
        let Some(s) = self.state_mut().stack.pop() else { return };
        let (w, h) = self.backbuffer_size();
        {
            let state = self.state_mut();
            state.color = s.color;
            state.tint = s.tint;
            state.transform = s.transform;
            state.scissor = Scissor::clamped(s.scissor.to_rect(), w, h);
            state.line_width = s.line_width;
        }
        self.set_blend_mode(s.blend_mode);
    }
}
