use tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

use super::SurfaceError;

/// How the compositor should filter the canvas when its display size differs
/// from its pixel size.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ImageRendering {
    #[default]
    Auto,
    Pixelated,
}

/// Display-side properties of a canvas (the CSS box it is shown in).
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasStyle {
    /// Displayed size in logical pixels.
    pub width: f32,
    pub height: f32,
    /// Raw `max-width`/`max-height` constraints, parsed at resize time.
    pub max_width: Option<String>,
    pub max_height: Option<String>,
    pub image_rendering: ImageRendering,
}

/// Rendering context claimed on a canvas. A canvas hosts at most one kind.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ContextKind {
    #[default]
    None,
    TwoD,
    Gpu,
}

/// Pixel surface: a tiny-skia pixmap (premultiplied RGBA8) plus its display style.
///
/// Accessors that hand out bytes ([`pixel`](Self::pixel), [`to_rgba8`](Self::to_rgba8))
/// convert to straight alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    offscreen: bool,
    context: ContextKind,
    pixmap: Pixmap,
    pub style: CanvasStyle,
}

/// Allocates a transparent canvas of `width` x `height` pixels.
///
/// Fails with [`SurfaceError::InvalidSurfaceSize`] when either dimension is zero
/// or the pixmap cannot be allocated.
pub fn create_canvas(width: u32, height: u32, offscreen: bool) -> Result<Canvas, SurfaceError> {
    let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSurfaceSize { width, height })?;
    Ok(Canvas {
        offscreen,
        context: ContextKind::None,
        pixmap,
        style: CanvasStyle {
            width: width as f32,
            height: height as f32,
            max_width: None,
            max_height: None,
            image_rendering: ImageRendering::Auto,
        },
    })
}

impl Canvas {
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[inline]
    pub fn is_offscreen(&self) -> bool {
        self.offscreen
    }

    #[inline]
    pub fn context_kind(&self) -> ContextKind {
        self.context
    }

    /// Claims a context kind; fails if a different kind already owns the canvas.
    pub(crate) fn claim(&mut self, kind: ContextKind) -> Result<(), SurfaceError> {
        match self.context {
            ContextKind::None => {
                self.context = kind;
                Ok(())
            }
            current if current == kind => Ok(()),
            _ => Err(SurfaceError::UnsupportedSurface),
        }
    }

    /// Reallocates the pixmap. Contents are discarded (cleared to transparent).
    ///
    /// Sizes the pixmap cannot take (zero dimensions) are ignored and reported as `false`.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        match Pixmap::new(width, height) {
            Some(p) => {
                self.pixmap = p;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    #[inline]
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Straight-alpha RGBA at `(x, y)`, transparent black when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixmap.pixel(x, y).map_or([0; 4], |p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Copies the pixels out as tightly packed straight-alpha RGBA8 rows.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Overwrites the pixels from straight-alpha RGBA8 rows, one slice per row.
    ///
    /// Rows may be longer than the canvas (padded); extra bytes are ignored.
    /// With `opaque`, alpha is forced to 255.
    pub(crate) fn write_rgba8_rows<'a, I>(&mut self, rows: I, opaque: bool)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let width = self.pixmap.width() as usize;
        let dst_rows = self.pixmap.pixels_mut().chunks_mut(width);
        for (src, dst) in rows.into_iter().zip(dst_rows) {
            for (px, out) in src.chunks_exact(4).zip(dst.iter_mut()) {
                let a = if opaque { 255 } else { px[3] };
                *out = ColorU8::from_rgba(px[0], px[1], px[2], a).premultiply();
            }
        }
    }

    /// Writes a straight-alpha pixel. Out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let i = y as usize * self.width() as usize + x as usize;
        self.pixmap.pixels_mut()[i] = ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
    }

    /// Overwrites all pixels with the straight-alpha `rgba`.
    pub(crate) fn fill(&mut self, rgba: [u8; 4]) {
        self.pixmap.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    }

    /// Forces every pixel opaque, as if composited onto black.
    pub(crate) fn flatten_alpha(&mut self) {
        for px in self.pixmap.pixels_mut() {
            if px.alpha() != 255 {
                *px = PremultipliedColorU8::from_rgba(px.red(), px.green(), px.blue(), 255)
                    .unwrap_or(PremultipliedColorU8::TRANSPARENT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            create_canvas(0, 10, false),
            Err(SurfaceError::InvalidSurfaceSize { width: 0, height: 10 })
        );
        assert!(create_canvas(10, 0, true).is_err());
    }

    #[test]
    fn new_canvas_is_transparent_and_styled_at_pixel_size() {
        let c = create_canvas(4, 3, false).unwrap();
        assert_eq!(c.to_rgba8().len(), 48);
        assert!(c.pixmap().data().iter().all(|&b| b == 0));
        assert_eq!((c.style.width, c.style.height), (4.0, 3.0));
    }

    #[test]
    fn context_kinds_are_exclusive() {
        let mut c = create_canvas(1, 1, true).unwrap();
        assert!(c.claim(ContextKind::Gpu).is_ok());
        assert!(c.claim(ContextKind::Gpu).is_ok());
        assert_eq!(c.claim(ContextKind::TwoD), Err(SurfaceError::UnsupportedSurface));
    }

    #[test]
    fn resize_clears_and_ignores_zero() {
        let mut c = create_canvas(2, 2, false).unwrap();
        c.put_pixel(0, 0, [10, 20, 30, 255]);
        assert!(!c.set_size(0, 5));
        assert_eq!(c.pixel(0, 0), [10, 20, 30, 255]);
        assert!(c.set_size(3, 1));
        assert_eq!((c.width(), c.height()), (3, 1));
        assert_eq!(c.pixel(0, 0), [0; 4]);
        assert_eq!(c.pixel(5, 5), [0; 4]);
    }

    #[test]
    fn stored_premultiplied_read_straight() {
        let mut c = create_canvas(1, 1, true).unwrap();
        c.put_pixel(0, 0, [255, 0, 0, 51]);
        assert_eq!(c.pixmap().data(), &[51, 0, 0, 51]);
        assert_eq!(c.pixel(0, 0), [255, 0, 0, 51]);
    }

    #[test]
    fn padded_rows_are_written_and_flattened() {
        let mut c = create_canvas(2, 2, true).unwrap();
        let row = [1, 2, 3, 0, 4, 5, 6, 0, 99, 99, 99, 99];
        c.write_rgba8_rows([&row[..], &row[..]], true);
        assert_eq!(c.pixel(0, 1), [1, 2, 3, 255]);
        assert_eq!(c.pixel(1, 0), [4, 5, 6, 255]);
        assert_eq!(c.to_rgba8().len(), 16);
    }

    #[test]
    fn flatten_alpha_composites_onto_black() {
        let mut c = create_canvas(1, 1, true).unwrap();
        c.put_pixel(0, 0, [255, 255, 255, 0]);
        c.flatten_alpha();
        assert_eq!(c.pixel(0, 0), [0, 0, 0, 255]);
    }
}
