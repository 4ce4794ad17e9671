use std::collections::hash_map::Entry;
use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::coords::Matrix2d;
use crate::paint::{BlendMode, Color};
use crate::scene::Polygon;
use crate::surface::{create_canvas, Canvas, CompositeOp, Context2d, SurfaceError};

use super::renderer::{get_context2d, tint_canvas};
use super::{Renderer, RendererKind, RendererSettings, RendererState};

/// Composite operation used for a blend mode on a 2D context.
pub fn composite_for(mode: BlendMode) -> CompositeOp {
    match mode {
        BlendMode::Normal => CompositeOp::SourceOver,
        BlendMode::Multiply => CompositeOp::Multiply,
        BlendMode::Lighter | BlendMode::Additive => CompositeOp::Lighter,
        BlendMode::Screen => CompositeOp::Screen,
    }
}

type TintKey = (String, String, CompositeOp);

/// Software backend drawing through [`Context2d`].
///
/// With double buffering, drawing goes to an off-screen back buffer that
/// [`flush`](Renderer::flush) copies onto the screen canvas.
pub struct CanvasRenderer {
    state: RendererState,
    screen: Context2d,
    back: Option<Context2d>,
    tint_cache: HashMap<TintKey, Canvas>,
}

impl CanvasRenderer {
    pub fn new(settings: RendererSettings) -> Result<Self> {
        let (w, h) = (settings.width, settings.height);
        let aa = settings.anti_alias;
        let transparent = settings.transparent;

        let screen_canvas = create_canvas(w, h, false).context("failed to create the screen canvas")?;
        let screen = get_context2d(screen_canvas, transparent, aa)
            .context("failed to acquire the screen 2d context")?;

        let back = if settings.double_buffering {
            let canvas = create_canvas(w, h, true).context("failed to create the back buffer")?;
            Some(get_context2d(canvas, transparent, aa).context("failed to acquire the back buffer 2d context")?)
        } else {
            None
        };

        let blend = settings.blend_mode;
        let mut r = Self { state: RendererState::new(settings), screen, back, tint_cache: HashMap::new() };
        r.set_blend_mode(blend);
        log::debug!("canvas renderer {w}x{h} (double buffering: {})", r.back.is_some());
        Ok(r)
    }

    /// Context drawing goes to.
    pub fn context(&self) -> &Context2d {
        self.back.as_ref().unwrap_or(&self.screen)
    }

    pub fn screen_context(&self) -> &Context2d {
        &self.screen
    }

    /// Back buffer canvas (the screen canvas when not double buffered).
    pub fn back_canvas(&self) -> &Canvas {
        self.context().canvas()
    }

    /// Returns `image` tinted by `color`, computing it once per `(key, color, mode)`.
    ///
    /// The cache is dropped by [`reset`](Renderer::reset).
    pub fn tint_cached(
        &mut self,
        key: &str,
        image: &Canvas,
        color: Color,
        mode: CompositeOp,
    ) -> Result<&Canvas, SurfaceError> {
        let aa = self.state.settings.anti_alias;
        match self.tint_cache.entry((key.to_owned(), color.to_hex8(), mode)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(tint_canvas(image, color, mode, aa)?)),
        }
    }

    pub fn tint_cache_len(&self) -> usize {
        self.tint_cache.len()
    }

    fn target(&mut self) -> (&mut Context2d, &RendererState) {
        let ctx = match self.back.as_mut() {
            Some(b) => b,
            None => &mut self.screen,
        };
        (ctx, &self.state)
    }

    /// Pushes the shared drawing state into the target context.
    fn synced(&mut self) -> &mut Context2d {
        let (ctx, state) = self.target();
        let color = state.effective_color();
        ctx.set_fill_style(color);
        ctx.set_stroke_style(color);
        ctx.set_line_width(state.line_width());
        ctx.set_global_alpha(1.0);
        ctx.set_global_composite_operation(composite_for(state.blend_mode()));

        ctx.reset_clip();
        let s = state.scissor();
        if !s.is_full(ctx.width(), ctx.height()) {
            ctx.set_transform(Matrix2d::identity());
            ctx.clip_rect(s.x as f32, s.y as f32, s.width as f32, s.height as f32);
        }
        ctx.set_transform(state.transform());
        ctx
    }
}

impl Renderer for CanvasRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Canvas
    }

    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn screen_canvas(&self) -> &Canvas {
        self.screen.canvas()
    }

    fn screen_canvas_mut(&mut self) -> &mut Canvas {
        self.screen.canvas_mut()
    }

    fn backbuffer_size(&self) -> (u32, u32) {
        let c = self.back_canvas();
        (c.width(), c.height())
    }

    fn resize_surfaces(&mut self, width: u32, height: u32) {
        self.screen.resize(width, height);
        if let Some(back) = self.back.as_mut() {
            back.resize(width, height);
        }
    }

    fn apply_blend_mode(&mut self, mode: BlendMode) {
        let op = composite_for(mode);
        self.screen.set_global_composite_operation(op);
        if let Some(back) = self.back.as_mut() {
            back.set_global_composite_operation(op);
        }
    }

    fn set_anti_alias(&mut self, enable: bool) {
        self.screen.set_image_smoothing_enabled(enable);
        if let Some(back) = self.back.as_mut() {
            back.set_image_smoothing_enabled(enable);
        }
    }

    fn clear(&mut self) {
        if self.state.settings.transparent {
            self.clear_color(Color::transparent(), true);
        }
    }

    fn clear_color(&mut self, color: Color, opaque: bool) {
        let (ctx, state) = self.target();
        let op = if opaque { CompositeOp::Copy } else { composite_for(state.blend_mode()) };
        let (w, h) = (ctx.width() as f32, ctx.height() as f32);
        ctx.save();
        ctx.reset_transform();
        ctx.reset_clip();
        ctx.set_global_alpha(1.0);
        ctx.set_global_composite_operation(op);
        ctx.set_fill_style(color);
        ctx.fill_rect(0.0, 0.0, w, h);
        ctx.restore();
    }

    fn flush(&mut self) {
        let Some(back) = self.back.as_ref() else { return };
        let screen = &mut self.screen;
        let (w, h) = (screen.width() as f32, screen.height() as f32);
        screen.save();
        screen.reset_transform();
        screen.reset_clip();
        screen.set_global_alpha(1.0);
        screen.set_global_composite_operation(CompositeOp::Copy);
        let src = back.canvas();
        screen.draw_image_scaled(src, 0.0, 0.0, src.width() as f32, src.height() as f32, 0.0, 0.0, w, h);
        screen.restore();
    }

    fn clear_cache(&mut self) {
        self.tint_cache.clear();
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: bool) {
        let ctx = self.synced();
        if fill {
            ctx.fill_rect(x, y, width, height);
        } else {
            ctx.stroke_rect(x, y, width, height);
        }
    }

    fn stroke_polygon(&mut self, poly: &Polygon, fill: bool) {
        let points = poly.world_points();
        let ctx = self.synced();
        if fill {
            ctx.fill_polygon(&points);
        } else {
            ctx.stroke_polyline(&points, poly.closed);
        }
    }

    fn stroke_ellipse(&mut self, x: f32, y: f32, w: f32, h: f32, fill: bool) {
        let ctx = self.synced();
        if fill {
            ctx.fill_ellipse(x, y, w, h);
        } else {
            ctx.stroke_ellipse(x, y, w, h);
        }
    }

    fn draw_image(&mut self, image: &Canvas, dx: f32, dy: f32, dw: f32, dh: f32) {
        let tint = self.state.tint();
        let alpha = self.state.effective_color().alpha();
        let aa = self.state.settings.anti_alias;

        let tinted = if tint != Color::white() {
            match tint_canvas(image, tint, CompositeOp::Multiply, aa) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("tint failed, drawing untinted: {e}");
                    None
                }
            }
        } else {
            None
        };
        let src = tinted.as_ref().unwrap_or(image);

        let ctx = self.synced();
        ctx.set_global_alpha(alpha);
        ctx.draw_image_scaled(src, 0.0, 0.0, src.width() as f32, src.height() as f32, dx, dy, dw, dh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vector2d};
    use crate::scene::{Ellipse, Shape};

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn renderer(w: u32, h: u32, double_buffering: bool) -> CanvasRenderer {
        let mut s = RendererSettings::new(w, h);
        s.double_buffering = double_buffering;
        CanvasRenderer::new(s).unwrap()
    }

    // ── drawing ──────────────────────────────────────────────────────────

    #[test]
    fn fill_rect_uses_current_color() {
        let mut r = renderer(8, 8, false);
        r.set_color(Color::new(255.0, 0.0, 0.0, 1.0));
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        assert_eq!(r.screen_canvas().pixel(1, 1), RED);
        assert_eq!(r.screen_canvas().pixel(5, 5), [0, 0, 0, 255]);
    }

    #[test]
    fn tint_modulates_shape_color() {
        let mut r = renderer(4, 4, false);
        r.set_color(Color::white());
        r.set_tint(Color::new(255.0, 0.0, 0.0, 1.0));
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        assert_eq!(r.screen_canvas().pixel(2, 2), RED);
    }

    #[test]
    fn scissor_clips_drawing() {
        let mut r = renderer(8, 8, false);
        r.set_color(Color::white());
        r.clip_rect(0.0, 0.0, 4.0, 8.0);
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 8.0, 8.0)));
        assert_eq!(r.screen_canvas().pixel(3, 3), [255, 255, 255, 255]);
        assert_eq!(r.screen_canvas().pixel(4, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn transform_applies_to_shapes() {
        let mut r = renderer(8, 8, false);
        r.set_color(Color::white());
        r.translate(4.0, 4.0);
        r.fill(&Shape::Ellipse(Ellipse::circle(0.0, 0.0, 2.0)));
        assert_eq!(r.screen_canvas().pixel(4, 4), [255, 255, 255, 255]);
        assert_eq!(r.screen_canvas().pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn polygon_stroke_and_fill() {
        let mut r = renderer(10, 10, false);
        r.set_color(Color::white());
        r.set_line_width(2.0);
        let square = Polygon::new(
            Vector2d::new(1.0, 1.0),
            vec![
                Vector2d::new(0.0, 0.0),
                Vector2d::new(8.0, 0.0),
                Vector2d::new(8.0, 8.0),
                Vector2d::new(0.0, 8.0),
            ],
        );
        r.stroke(&Shape::Polygon(square.clone()), false);
        assert_eq!(r.screen_canvas().pixel(5, 5), [0, 0, 0, 255]);
        assert_eq!(r.screen_canvas().pixel(1, 5), [255, 255, 255, 255]);
        r.fill(&Shape::Polygon(square));
        assert_eq!(r.screen_canvas().pixel(5, 5), [255, 255, 255, 255]);
    }

    // ── buffering ────────────────────────────────────────────────────────

    #[test]
    fn double_buffer_is_presented_on_flush() {
        let mut r = renderer(4, 4, true);
        r.set_color(Color::new(255.0, 0.0, 0.0, 1.0));
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        assert_eq!(r.screen_canvas().pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(r.back_canvas().pixel(0, 0), RED);
        r.flush();
        assert_eq!(r.screen_canvas().pixel(0, 0), RED);
    }

    #[test]
    fn resize_reallocates_both_buffers() {
        let mut r = renderer(4, 4, true);
        assert!(r.resize(6, 3));
        assert_eq!((r.screen_canvas().width(), r.screen_canvas().height()), (6, 3));
        assert_eq!((r.back_canvas().width(), r.back_canvas().height()), (6, 3));
        assert_eq!((r.width(), r.height()), (6, 3));
    }

    #[test]
    fn transparent_clear_wipes_back_buffer() {
        let mut s = RendererSettings::new(2, 2);
        s.transparent = true;
        let mut r = CanvasRenderer::new(s).unwrap();
        r.set_color(Color::white());
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        r.clear();
        assert_eq!(r.screen_canvas().pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clear_color_ignores_scissor() {
        let mut r = renderer(4, 4, false);
        r.clip_rect(0.0, 0.0, 1.0, 1.0);
        r.clear_color(Color::new(0.0, 0.0, 255.0, 1.0), true);
        assert_eq!(r.screen_canvas().pixel(3, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn translucent_clear_uses_current_blend_mode() {
        let mut r = renderer(2, 2, false);
        r.clear_color(Color::new(128.0, 255.0, 255.0, 1.0), true);
        r.set_blend_mode(BlendMode::Multiply);
        r.clear_color(Color::new(255.0, 128.0, 0.0, 1.0), false);
        assert_eq!(r.screen_canvas().pixel(1, 1), [128, 128, 0, 255]);

        r.set_blend_mode(BlendMode::Normal);
        r.clear_color(Color::new(0.0, 0.0, 255.0, 1.0), false);
        assert_eq!(r.screen_canvas().pixel(1, 1), [0, 0, 255, 255]);
    }

    // ── blending & cache ─────────────────────────────────────────────────

    #[test]
    fn additive_blend_uses_lighter() {
        let mut r = renderer(2, 2, false);
        r.set_blend_mode(BlendMode::Additive);
        assert_eq!(r.screen_context().global_composite_operation(), CompositeOp::Lighter);
        r.set_color(Color::new(100.0, 0.0, 0.0, 1.0));
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        assert_eq!(r.screen_canvas().pixel(0, 0), [200, 0, 0, 255]);
    }

    #[test]
    fn tint_cache_is_cleared_by_reset() {
        let mut r = renderer(2, 2, false);
        let img = create_canvas(2, 2, true).unwrap();
        let red = Color::new(255.0, 0.0, 0.0, 1.0);
        r.tint_cached("sprite", &img, red, CompositeOp::Multiply).unwrap();
        r.tint_cached("sprite", &img, red, CompositeOp::Multiply).unwrap();
        assert_eq!(r.tint_cache_len(), 1);
        r.reset();
        assert_eq!(r.tint_cache_len(), 0);
    }

    #[test]
    fn draw_image_is_tinted() {
        let mut src = get_context2d(create_canvas(1, 1, true).unwrap(), true, false).unwrap();
        src.set_fill_style(Color::white());
        src.fill_rect(0.0, 0.0, 1.0, 1.0);
        let src = src.into_canvas();

        let mut r = renderer(2, 2, false);
        r.set_tint(Color::new(0.0, 255.0, 0.0, 1.0));
        r.draw_image(&src, 0.0, 0.0, 2.0, 2.0);
        assert_eq!(r.screen_canvas().pixel(1, 1), [0, 255, 0, 255]);
    }
}
