use std::sync::Arc;

use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::coords::Viewport;
use crate::device::{DeviceProbe, Gpu, GpuOptions};
use crate::video::Signal;

/// Device probe backed by a native window.
///
/// The window's inner area plays the role of the canvas container.
#[derive(Debug, Clone)]
pub struct WindowProbe {
    window: Arc<Window>,
}

impl WindowProbe {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl DeviceProbe for WindowProbe {
    fn is_gpu_supported(&self, opts: &GpuOptions) -> bool {
        Gpu::is_supported(opts)
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn parent_bounds(&self) -> Viewport {
        let size: LogicalSize<f64> = self.window.inner_size().to_logical(self.window.scale_factor());
        Viewport::new(size.width as f32, size.height as f32)
    }
}

/// Video signal raised by a window event, if any.
pub fn signal_for(event: &WindowEvent) -> Option<Signal> {
    match event {
        WindowEvent::Resized(_) => Some(Signal::WindowResize),
        WindowEvent::ScaleFactorChanged { .. } => Some(Signal::PixelRatioChange),
        WindowEvent::MouseWheel { .. } => Some(Signal::Scroll),
        // Moving between monitors can change the usable area.
        WindowEvent::Moved(_) => Some(Signal::ParentMutated),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};

    #[test]
    fn layout_events_map_to_signals() {
        assert_eq!(signal_for(&WindowEvent::Resized(PhysicalSize::new(10, 10))), Some(Signal::WindowResize));
        assert_eq!(signal_for(&WindowEvent::Moved(PhysicalPosition::new(1, 1))), Some(Signal::ParentMutated));
        assert_eq!(signal_for(&WindowEvent::CloseRequested), None);
        assert_eq!(signal_for(&WindowEvent::Focused(true)), None);
    }
}
