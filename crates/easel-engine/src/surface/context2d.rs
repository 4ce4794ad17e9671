use tiny_skia::{
    BlendMode as SkiaBlendMode, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pattern, Pixmap,
    PixmapPaint, Rect as SkiaRect, SpreadMode, Stroke, Transform,
};

use crate::coords::{Matrix2d, Vector2d};
use crate::paint::Color;

use super::canvas::{Canvas, ContextKind, ImageRendering};
use super::composite::CompositeOp;
use super::SurfaceError;

/// Drawing state saved and restored by [`Context2d::save`] / [`Context2d::restore`].
#[derive(Debug, Clone)]
struct DrawState {
    fill_style: Color,
    stroke_style: Color,
    line_width: f32,
    global_alpha: f32,
    composite: CompositeOp,
    image_smoothing: bool,
    transform: Matrix2d,
    /// Device-space clip; `None` means the whole canvas.
    clip: Option<Mask>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill_style: Color::black(),
            stroke_style: Color::black(),
            line_width: 1.0,
            global_alpha: 1.0,
            composite: CompositeOp::SourceOver,
            image_smoothing: true,
            transform: Matrix2d::identity(),
            clip: None,
        }
    }
}

/// Software 2D drawing context over a tiny-skia pixmap.
///
/// The context owns the canvas it draws into; [`canvas`](Self::canvas) is the
/// back-reference to it and [`into_canvas`](Self::into_canvas) releases it.
#[derive(Debug, Clone)]
pub struct Context2d {
    canvas: Canvas,
    transparent: bool,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Context2d {
    /// Claims the 2D context of `canvas`.
    ///
    /// A non-transparent context starts opaque black and keeps every pixel opaque.
    pub fn new(mut canvas: Canvas, transparent: bool) -> Result<Self, SurfaceError> {
        canvas.claim(ContextKind::TwoD)?;
        if !transparent {
            canvas.fill([0, 0, 0, 255]);
        }
        Ok(Self { canvas, transparent, state: DrawState::default(), stack: Vec::new() })
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[inline]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Resizes the canvas. Like a DOM canvas this discards pixels and drawing state.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.canvas.set_size(width, height) {
            return false;
        }
        let smoothing = self.state.image_smoothing;
        self.state = DrawState { image_smoothing: smoothing, ..DrawState::default() };
        self.stack.clear();
        if !self.transparent {
            self.canvas.fill([0, 0, 0, 255]);
        }
        true
    }

    // ── state ────────────────────────────────────────────────────────────

    pub fn set_fill_style(&mut self, c: Color) {
        self.state.fill_style = c;
    }

    pub fn fill_style(&self) -> Color {
        self.state.fill_style
    }

    pub fn set_stroke_style(&mut self, c: Color) {
        self.state.stroke_style = c;
    }

    pub fn stroke_style(&self) -> Color {
        self.state.stroke_style
    }

    /// Non-positive or non-finite widths are ignored.
    pub fn set_line_width(&mut self, w: f32) {
        if w.is_finite() && w > 0.0 {
            self.state.line_width = w;
        }
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    /// Values outside `[0, 1]` are ignored.
    pub fn set_global_alpha(&mut self, a: f32) {
        if (0.0..=1.0).contains(&a) {
            self.state.global_alpha = a;
        }
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    pub fn set_global_composite_operation(&mut self, op: CompositeOp) {
        self.state.composite = op;
    }

    pub fn global_composite_operation(&self) -> CompositeOp {
        self.state.composite
    }

    /// Also updates the canvas `image-rendering` hint.
    pub fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.state.image_smoothing = enabled;
        self.canvas.style.image_rendering =
            if enabled { ImageRendering::Auto } else { ImageRendering::Pixelated };
    }

    pub fn image_smoothing_enabled(&self) -> bool {
        self.state.image_smoothing
    }

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// No-op on an empty stack.
    pub fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
    }

    // ── transform ────────────────────────────────────────────────────────

    pub fn transform(&self) -> Matrix2d {
        self.state.transform
    }

    pub fn set_transform(&mut self, m: Matrix2d) {
        self.state.transform = m;
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Matrix2d::identity();
    }

    /// Post-multiplies `m` onto the current transform.
    pub fn apply_transform(&mut self, m: &Matrix2d) {
        self.state.transform = self.state.transform.multiply(m);
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform.scale(x, y);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.state.transform.rotate(angle);
    }

    // ── clipping ─────────────────────────────────────────────────────────

    /// Intersects the clip region with the transformed rect.
    pub fn clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (cw, ch) = (self.canvas.width(), self.canvas.height());
        let Some(path) = rect_path(x, y, w, h) else {
            // Empty rect: nothing stays drawable.
            self.state.clip = Mask::new(cw, ch);
            return;
        };
        let transform = to_skia_transform(&self.state.transform);
        if let Some(mask) = self.state.clip.as_mut() {
            mask.intersect_path(&path, FillRule::Winding, false, transform);
            return;
        }
        let Some(mut mask) = Mask::new(cw, ch) else { return };
        mask.fill_path(&path, FillRule::Winding, false, transform);
        self.state.clip = Some(mask);
    }

    pub fn reset_clip(&mut self) {
        self.state.clip = None;
    }

    // ── primitives ───────────────────────────────────────────────────────

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(path) = rect_path(x, y, w, h) else { return };
        let paint = self.solid_paint(self.state.fill_style);
        self.paint_path(&path, &paint, None);
    }

    /// Clears to transparent (opaque black for non-transparent contexts), ignoring
    /// the composite operation and global alpha.
    pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(path) = rect_path(x, y, w, h) else { return };
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, if self.transparent { 0 } else { 255 });
        paint.blend_mode = SkiaBlendMode::Source;
        let transform = to_skia_transform(&self.state.transform);
        self.canvas
            .pixmap_mut()
            .fill_path(&path, &paint, FillRule::Winding, transform, self.state.clip.as_ref());
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(path) = rect_path(x, y, w, h) else { return };
        self.stroke_path(&path);
    }

    /// Fills a polygon given in user space (non-zero winding).
    pub fn fill_polygon(&mut self, points: &[Vector2d]) {
        let Some(path) = polyline_path(points, true) else { return };
        let paint = self.solid_paint(self.state.fill_style);
        self.paint_path(&path, &paint, None);
    }

    /// Strokes a polyline given in user space with the current line width.
    pub fn stroke_polyline(&mut self, points: &[Vector2d], closed: bool) {
        let Some(path) = polyline_path(points, closed) else { return };
        self.stroke_path(&path);
    }

    /// `(x, y)` is the center, `rx`/`ry` the radii.
    pub fn fill_ellipse(&mut self, x: f32, y: f32, rx: f32, ry: f32) {
        let Some(path) = ellipse_path(x, y, rx, ry) else { return };
        let paint = self.solid_paint(self.state.fill_style);
        self.paint_path(&path, &paint, None);
    }

    pub fn stroke_ellipse(&mut self, x: f32, y: f32, rx: f32, ry: f32) {
        let Some(path) = ellipse_path(x, y, rx, ry) else { return };
        self.stroke_path(&path);
    }

    /// Draws `image` at its natural size with its top-left corner at `(dx, dy)`.
    pub fn draw_image(&mut self, image: &Canvas, dx: f32, dy: f32) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        self.draw_image_scaled(image, 0.0, 0.0, w, h, dx, dy, w, h);
    }

    /// Draws the source rect of `image` into the destination rect.
    ///
    /// Sampling is bilinear when image smoothing is enabled, nearest otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_scaled(
        &mut self,
        image: &Canvas,
        sx: f32,
        sy: f32,
        sw: f32,
        sh: f32,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        if sw == 0.0 || sh == 0.0 || dw == 0.0 || dh == 0.0 {
            return;
        }
        let Some(path) = rect_path(dx, dy, dw, dh) else { return };

        let (kx, ky) = (dw / sw, dh / sh);
        let quality = if self.state.image_smoothing { FilterQuality::Bilinear } else { FilterQuality::Nearest };
        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            image.pixmap().as_ref(),
            SpreadMode::Pad,
            quality,
            self.state.global_alpha,
            Transform::from_row(kx, 0.0, 0.0, ky, dx - sx * kx, dy - sy * ky),
        );
        paint.anti_alias = true;
        paint.blend_mode = self.state.composite.to_skia();
        self.paint_path(&path, &paint, None);
    }

    // ── internals ────────────────────────────────────────────────────────

    fn solid_paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (color.alpha() * self.state.global_alpha).clamp(0.0, 1.0);
        paint.set_color_rgba8(color.r(), color.g(), color.b(), (alpha * 255.0).round() as u8);
        paint.anti_alias = true;
        paint.blend_mode = self.state.composite.to_skia();
        paint
    }

    fn stroke_path(&mut self, path: &Path) {
        let paint = self.solid_paint(self.state.stroke_style);
        let stroke = Stroke { width: self.state.line_width, ..Default::default() };
        self.paint_path(path, &paint, Some(&stroke));
    }

    /// Paints `path` with the current transform and clip.
    ///
    /// Unbounded operations render the source into a layer first, then
    /// composite the whole layer so pixels outside the shape are affected too.
    fn paint_path(&mut self, path: &Path, paint: &Paint<'_>, stroke: Option<&Stroke>) {
        let transform = to_skia_transform(&self.state.transform);
        let clip = self.state.clip.as_ref();

        if !self.state.composite.is_unbounded() {
            draw_path(self.canvas.pixmap_mut(), path, paint, stroke, transform, clip);
            return;
        }

        let Some(mut layer) = Pixmap::new(self.canvas.width(), self.canvas.height()) else { return };
        let mut source = paint.clone();
        source.blend_mode = SkiaBlendMode::SourceOver;
        draw_path(&mut layer, path, &source, stroke, transform, None);

        let layer_paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: paint.blend_mode,
            quality: FilterQuality::Nearest,
        };
        self.canvas
            .pixmap_mut()
            .draw_pixmap(0, 0, layer.as_ref(), &layer_paint, Transform::identity(), clip);

        if !self.transparent {
            self.canvas.flatten_alpha();
        }
    }
}

fn draw_path(
    pixmap: &mut Pixmap,
    path: &Path,
    paint: &Paint<'_>,
    stroke: Option<&Stroke>,
    transform: Transform,
    clip: Option<&Mask>,
) {
    match stroke {
        Some(stroke) => pixmap.stroke_path(path, paint, stroke, transform, clip),
        None => pixmap.fill_path(path, paint, FillRule::Winding, transform, clip),
    }
}

fn to_skia_transform(m: &Matrix2d) -> Transform {
    Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
}

/// Rect path; negative sizes extend left/up. `None` when empty.
fn rect_path(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
    let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
    if w == 0.0 || h == 0.0 {
        return None;
    }
    SkiaRect::from_xywh(x, y, w, h).map(PathBuilder::from_rect)
}

fn polyline_path(points: &[Vector2d], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

fn ellipse_path(x: f32, y: f32, rx: f32, ry: f32) -> Option<Path> {
    if !(rx > 0.0 && ry > 0.0) {
        return None;
    }
    PathBuilder::from_oval(SkiaRect::from_xywh(x - rx, y - ry, rx * 2.0, ry * 2.0)?)
}

/// Reads a pixel back as a [`Color`].
pub fn pixel_color(canvas: &Canvas, x: u32, y: u32) -> Color {
    let p = canvas.pixel(x, y);
    Color::new(p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32 / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::create_canvas;

    fn ctx(w: u32, h: u32) -> Context2d {
        Context2d::new(create_canvas(w, h, true).unwrap(), true).unwrap()
    }

    // ── construction ─────────────────────────────────────────────────────

    #[test]
    fn opaque_context_starts_black() {
        let c = Context2d::new(create_canvas(2, 2, true).unwrap(), false).unwrap();
        assert_eq!(c.canvas().pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn gpu_bound_canvas_has_no_2d_context() {
        let mut canvas = create_canvas(2, 2, true).unwrap();
        canvas.claim(ContextKind::Gpu).unwrap();
        assert_eq!(Context2d::new(canvas, true).unwrap_err(), SurfaceError::UnsupportedSurface);
    }

    // ── shapes ───────────────────────────────────────────────────────────

    #[test]
    fn fill_rect_respects_transform() {
        let mut c = ctx(8, 8);
        c.set_fill_style(Color::new(255.0, 0.0, 0.0, 1.0));
        c.translate(2.0, 2.0);
        c.scale(2.0, 2.0);
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.canvas().pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(c.canvas().pixel(3, 3), [255, 0, 0, 255]);
        assert_eq!(c.canvas().pixel(4, 4), [0, 0, 0, 0]);
        assert_eq!(c.canvas().pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn negative_rect_extends_up_left() {
        let mut c = ctx(4, 4);
        c.set_fill_style(Color::white());
        c.fill_rect(4.0, 4.0, -2.0, -2.0);
        assert_eq!(c.canvas().pixel(3, 3), [255, 255, 255, 255]);
        assert_eq!(c.canvas().pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_limits_drawing() {
        let mut c = ctx(4, 4);
        c.set_fill_style(Color::white());
        c.clip_rect(0.0, 0.0, 2.0, 4.0);
        c.fill_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(c.canvas().pixel(1, 0), [255, 255, 255, 255]);
        assert_eq!(c.canvas().pixel(2, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn nested_clips_intersect() {
        let mut c = ctx(4, 4);
        c.set_fill_style(Color::white());
        c.clip_rect(0.0, 0.0, 3.0, 4.0);
        c.clip_rect(1.0, 0.0, 3.0, 4.0);
        c.fill_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(c.canvas().pixel(0, 0)[3], 0);
        assert_eq!(c.canvas().pixel(1, 0)[3], 255);
        assert_eq!(c.canvas().pixel(3, 0)[3], 0);
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut c = ctx(2, 2);
        c.save();
        c.set_global_alpha(0.5);
        c.translate(1.0, 1.0);
        c.set_global_composite_operation(CompositeOp::Multiply);
        c.clip_rect(0.0, 0.0, 1.0, 1.0);
        c.restore();
        assert_eq!(c.global_alpha(), 1.0);
        assert!(c.transform().is_identity());
        assert_eq!(c.global_composite_operation(), CompositeOp::SourceOver);
        c.set_fill_style(Color::white());
        c.fill_rect(0.0, 0.0, 2.0, 2.0);
        assert_eq!(c.canvas().pixel(1, 1)[3], 255);
        c.restore();
    }

    #[test]
    fn stroke_rect_leaves_interior_untouched() {
        let mut c = ctx(10, 10);
        c.set_stroke_style(Color::white());
        c.set_line_width(2.0);
        c.stroke_rect(1.0, 1.0, 8.0, 8.0);
        assert_eq!(c.canvas().pixel(1, 5)[3], 255);
        assert_eq!(c.canvas().pixel(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn filled_ellipse_covers_center_not_corner() {
        let mut c = ctx(10, 10);
        c.set_fill_style(Color::white());
        c.fill_ellipse(5.0, 5.0, 4.0, 4.0);
        assert_eq!(c.canvas().pixel(5, 5)[3], 255);
        assert_eq!(c.canvas().pixel(0, 0)[3], 0);
    }

    #[test]
    fn clear_rect_ignores_composite() {
        let mut c = ctx(2, 2);
        c.set_fill_style(Color::white());
        c.fill_rect(0.0, 0.0, 2.0, 2.0);
        c.set_global_composite_operation(CompositeOp::Lighter);
        c.clear_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.canvas().pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(c.canvas().pixel(1, 1), [255, 255, 255, 255]);
    }

    // ── compositing ──────────────────────────────────────────────────────

    #[test]
    fn multiply_on_opaque_backdrop() {
        let mut c = ctx(1, 1);
        c.set_fill_style(Color::new(128.0, 255.0, 255.0, 1.0));
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        c.set_global_composite_operation(CompositeOp::Multiply);
        c.set_fill_style(Color::new(255.0, 128.0, 0.0, 1.0));
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.canvas().pixel(0, 0), [128, 128, 0, 255]);
    }

    #[test]
    fn destination_in_masks_outside_source() {
        let mut c = ctx(2, 1);
        c.set_fill_style(Color::white());
        c.fill_rect(0.0, 0.0, 2.0, 1.0);
        c.set_global_composite_operation(CompositeOp::DestinationIn);
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.canvas().pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(c.canvas().pixel(1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn unbounded_op_keeps_opaque_context_opaque() {
        let mut c = Context2d::new(create_canvas(2, 1, true).unwrap(), false).unwrap();
        c.set_fill_style(Color::white());
        c.set_global_composite_operation(CompositeOp::Copy);
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(c.canvas().pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(c.canvas().pixel(1, 0), [0, 0, 0, 255]);
    }

    // ── images ───────────────────────────────────────────────────────────

    #[test]
    fn draw_image_nearest_upscales_pixels() {
        let mut img = ctx(2, 1);
        img.set_fill_style(Color::new(255.0, 0.0, 0.0, 1.0));
        img.fill_rect(0.0, 0.0, 1.0, 1.0);
        img.set_fill_style(Color::new(0.0, 0.0, 255.0, 1.0));
        img.fill_rect(1.0, 0.0, 1.0, 1.0);
        let img = img.into_canvas();

        let mut c = ctx(4, 2);
        c.set_image_smoothing_enabled(false);
        assert_eq!(c.canvas().style.image_rendering, ImageRendering::Pixelated);
        c.draw_image_scaled(&img, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 4.0, 2.0);
        assert_eq!(c.canvas().pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(c.canvas().pixel(2, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn draw_image_source_rect_selects_texels() {
        let mut img = ctx(2, 1);
        img.set_fill_style(Color::new(0.0, 255.0, 0.0, 1.0));
        img.fill_rect(1.0, 0.0, 1.0, 1.0);
        let img = img.into_canvas();

        let mut c = ctx(2, 2);
        c.set_image_smoothing_enabled(false);
        c.draw_image_scaled(&img, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 2.0, 2.0);
        assert_eq!(c.canvas().pixel(0, 0), [0, 255, 0, 255]);
        assert_eq!(c.canvas().pixel(1, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn pixel_color_reads_back() {
        let mut c = ctx(1, 1);
        c.set_fill_style(Color::new(10.0, 20.0, 30.0, 1.0));
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(pixel_color(c.canvas(), 0, 0).to_hex(), "#0A141E");
    }
}
