//! Pixel surfaces and the software 2D context.
//!
//! A [`Canvas`] is a tiny-skia pixmap plus display style; a [`Context2d`]
//! claims it and paints shapes and images into it.

mod canvas;
mod composite;
mod context2d;
mod error;

pub use canvas::{create_canvas, Canvas, CanvasStyle, ContextKind, ImageRendering};
pub use composite::CompositeOp;
pub use context2d::{pixel_color, Context2d};
pub use error::SurfaceError;
