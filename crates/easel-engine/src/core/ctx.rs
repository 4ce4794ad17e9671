use winit::window::{Window, WindowId};

use crate::render::Renderer;
use crate::time::FrameTime;
use crate::video::{Video, VideoEvent};
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys  = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    pub window:  WindowCtx<'a>,
    pub video:   &'a mut Video,
    pub time:    FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a> FrameCtx<'a> {
    /// Video events published since the previous frame.
    pub fn events(&mut self) -> Vec<VideoEvent> {
        self.video.drain_events()
    }

    /// Clears the back buffer, calls `draw` with the renderer, then flushes.
    ///
    /// Does nothing before the video is initialized.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut dyn Renderer),
    {
        let Some(renderer) = self.video.renderer_mut() else {
            log::debug!("frame {} skipped: no renderer", self.time.frame_index);
            return AppControl::Continue;
        };

        renderer.clear();
        draw(&mut *renderer);
        renderer.flush();

        AppControl::Continue
    }
}
