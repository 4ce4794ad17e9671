//! Rendering backends.
//!
//! Every backend implements [`Renderer`] over a shared [`RendererState`]:
//! [`CanvasRenderer`] rasterizes in software through a 2D context,
//! [`GpuRenderer`] draws with wgpu into an off-screen texture.
//!
//! Convention:
//! - Geometry is in back buffer pixels (top-left origin, +Y down).
//! - The current transform applies to shapes and images, not to the scissor.

mod canvas;
mod gpu;
mod renderer;
mod settings;
mod state;

pub use canvas::{composite_for, CanvasRenderer};
pub use gpu::GpuRenderer;
pub use renderer::{get_context2d, tint_canvas, Renderer};
pub use settings::{RendererKind, RendererSettings};
pub use state::{RendererEvent, RendererState, Scissor};
