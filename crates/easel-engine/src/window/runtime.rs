use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{DeviceProbe, GpuInit, Orientation, Presenter, SurfaceErrorAction};
use crate::time::{FrameClock, FrameTime};
use crate::video::{Signal, Video, VideoOptions};

use super::probe::{signal_for, WindowProbe};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Design resolution handed to [`Video::init`].
    pub design_width: u32,
    pub design_height: u32,
    pub video: VideoOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            design_width: 800,
            design_height: 600,
            video: VideoOptions::default(),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct WindowEntry {
    window: Arc<Window>,
    video: Video,
    clock: FrameClock,
    orientation: Orientation,
    /// `None` when no surface could be created; frames are still drawn off-screen.
    presenter: Option<Presenter>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        Self { config, app, entry: None, exit_requested: false }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);

        let probe = WindowProbe::new(window.clone());
        let orientation = probe.screen_orientation();
        let mut video = Video::new(Box::new(probe));
        let (w, h) = (self.config.design_width, self.config.design_height);
        if !video.init(w, h, self.config.video.clone()) {
            anyhow::bail!("video initialization failed for a {w}x{h} design");
        }

        let presenter = match pollster::block_on(Presenter::new(window.clone(), GpuInit::default())) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("window presentation unavailable: {e:#}");
                None
            }
        };

        self.entry = Some(WindowEntry { window, video, clock: FrameClock::default(), orientation, presenter });
        Ok(())
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = self.entry.as_ref() {
                        entry.window.set_title(&title);
                    }
                }
                Command::Exit => self.request_exit(),
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl WindowEntry {
    /// Shows the renderer's screen canvas in the window.
    fn present(&mut self) -> AppControl {
        let (Some(presenter), Some(renderer)) = (self.presenter.as_mut(), self.video.renderer()) else {
            return AppControl::Continue;
        };

        match presenter.present(renderer.screen_canvas(), self.window.scale_factor()) {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                let reason = err.to_string();
                match presenter.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("window surface failed: {reason}");
                        AppControl::Exit
                    }
                    action => {
                        log::debug!("surface error ({reason}): {action:?}");
                        AppControl::Continue
                    }
                }
            }
        }
    }

    /// Forwards a window event to the video surface manager.
    fn route(&mut self, event: &WindowEvent) {
        let Some(signal) = signal_for(event) else { return };
        self.video.notify(signal);

        // No native orientation event: derive it from the window shape.
        if signal == Signal::WindowResize {
            let now = self.video.orientation();
            if now != self.orientation {
                self.orientation = now;
                self.video.notify(Signal::OrientationChange);
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create initial window: {e:#}");
            self.request_exit();
            event_loop.exit();
            return;
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; also delivers trailing throttled signals.
        if let Some(entry) = self.entry.as_ref() {
            entry.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut().filter(|e| e.window.id() == window_id) else {
            return;
        };

        if app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        entry.route(&event);

        match &event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.request_exit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(presenter) = entry.presenter.as_mut() {
                    presenter.resize(*size);
                }
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();

                entry.video.update();
                let ft: FrameTime = entry.clock.tick();

                let app_control = {
                    let mut ctx = FrameCtx {
                        window: WindowCtx { id: window_id, window: &entry.window },
                        video: &mut entry.video,
                        time: ft,
                        runtime: &mut runtime_ctx,
                    };
                    app.on_frame(&mut ctx)
                };

                entry.window.pre_present_notify();
                let present_control = entry.present();

                if app_control == AppControl::Exit || present_control == AppControl::Exit {
                    runtime_ctx.exit();
                }

                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
