use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::coords::{Vector2d, Viewport};
use crate::device::{DeviceProbe, GpuOptions, Orientation};
use crate::render::{CanvasRenderer, GpuRenderer, Renderer, RendererEvent, RendererKind, RendererSettings};
use crate::surface::{self, Canvas, SurfaceError};
use crate::time::{Clock, SystemClock, Throttle};

use super::policy::{compute_scale, parse_css_length};
use super::{EventQueue, RendererPreference, Signal, VideoEvent, VideoOptions, VideoSettings};

/// Rate limit applied to resize and scroll signals.
pub const SIGNAL_THROTTLE: Duration = Duration::from_millis(100);

/// Video surface manager.
///
/// Owns the renderer and maps the fixed design resolution onto the
/// container reported by its [`DeviceProbe`]. Platform signals enter through
/// [`notify`](Self::notify); throttled signals are delivered by
/// [`update`](Self::update), which the owner calls once per frame.
pub struct Video {
    probe: Box<dyn DeviceProbe>,
    resize_throttle: Throttle,
    scroll_throttle: Throttle,

    renderer: Option<Box<dyn Renderer>>,
    settings: Option<VideoSettings>,
    design: (u32, u32),
    design_ratio: f32,
    scale_ratio: Vector2d,

    events: EventQueue,
}

impl Video {
    pub fn new(probe: Box<dyn DeviceProbe>) -> Self {
        Self::with_clock(probe, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(probe: Box<dyn DeviceProbe>, clock: Rc<dyn Clock>) -> Self {
        Self {
            probe,
            resize_throttle: Throttle::new(SIGNAL_THROTTLE, clock.clone()),
            scroll_throttle: Throttle::new(SIGNAL_THROTTLE, clock),
            renderer: None,
            settings: None,
            design: (0, 0),
            design_ratio: 1.0,
            scale_ratio: Vector2d::new(1.0, 1.0),
            events: EventQueue::default(),
        }
    }

    // ── init ─────────────────────────────────────────────────────────────

    /// Creates the renderer for a `width` x `height` design resolution.
    ///
    /// Returns `false` when no backend could be created or when already
    /// initialized. The failure is logged.
    pub fn init(&mut self, width: u32, height: u32, options: VideoOptions) -> bool {
        if self.is_initialized() {
            log::error!("video is already initialized");
            return false;
        }
        match self.try_init(width, height, options) {
            Ok(()) => true,
            Err(e) => {
                log::error!("video init failed: {e:#}");
                false
            }
        }
    }

    fn try_init(&mut self, width: u32, height: u32, options: VideoOptions) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSurfaceSize { width, height })
                .context("design resolution must not be empty");
        }

        let settings = VideoSettings::normalize(&options);
        if settings.console_header {
            log::info!("easel-engine v{}", env!("CARGO_PKG_VERSION"));
        }

        let mut rs = RendererSettings::new(width, height);
        rs.zoom_x = width as f32 * settings.scale;
        rs.zoom_y = height as f32 * settings.scale;
        rs.double_buffering = settings.double_buffering;
        rs.anti_alias = options.anti_alias;
        rs.transparent = options.transparent;
        rs.blend_mode = options.blend_mode;
        rs.sub_pixel = options.sub_pixel;
        rs.gpu = GpuOptions {
            power_preference: options.power_preference,
            fail_if_major_performance_caveat: options.fail_if_major_performance_caveat,
        };

        let mut renderer = match settings.renderer {
            RendererPreference::Canvas => {
                Box::new(CanvasRenderer::new(rs).context("failed to create the canvas renderer")?)
                    as Box<dyn Renderer>
            }
            RendererPreference::Gpu | RendererPreference::Auto => self.auto_detect(rs)?,
        };

        let style = &mut renderer.screen_canvas_mut().style;
        style.max_width = options.max_width;
        style.max_height = options.max_height;

        self.design = (width, height);
        self.design_ratio = width as f32 / height as f32;
        self.scale_ratio = Vector2d::new(settings.scale, settings.scale);
        let (auto_scale, scale) = (settings.auto_scale, settings.scale);
        self.settings = Some(settings);
        self.renderer = Some(renderer);

        if auto_scale {
            self.onresize();
        } else {
            self.scale(scale, scale);
        }

        let backend = self.backend().unwrap_or(RendererKind::Canvas);
        if self.settings.as_ref().is_some_and(|s| s.console_header) {
            log::info!(
                "{} renderer | pixel ratio {} | {}",
                backend.as_str(),
                self.probe.device_pixel_ratio(),
                self.probe.screen_orientation().as_str(),
            );
            if let Some(r) = self.renderer.as_deref() {
                log::info!("resolution: requested {width}x{height}, got {}x{}", r.width(), r.height());
            }
        }

        self.events.push(VideoEvent::Initialized { backend });
        Ok(())
    }

    /// GPU when the probe reports support and construction succeeds, canvas otherwise.
    fn auto_detect(&self, rs: RendererSettings) -> Result<Box<dyn Renderer>> {
        if self.probe.is_gpu_supported(&rs.gpu) {
            match GpuRenderer::new(rs.clone()) {
                Ok(r) => return Ok(Box::new(r)),
                Err(e) => log::warn!("gpu renderer unavailable, falling back to canvas: {e:#}"),
            }
        } else {
            log::debug!("gpu not supported, using the canvas renderer");
        }
        let r = CanvasRenderer::new(rs).context("failed to create the canvas renderer")?;
        Ok(Box::new(r))
    }

    // ── signals ──────────────────────────────────────────────────────────

    /// Feeds a platform signal. Ignored before init.
    pub fn notify(&mut self, signal: Signal) {
        if !self.is_initialized() {
            log::debug!("ignoring {signal:?} before video init");
            return;
        }
        match signal {
            Signal::WindowResize => {
                if self.resize_throttle.hit() {
                    self.onresize();
                }
            }
            Signal::Scroll => {
                if self.scroll_throttle.hit() {
                    self.events.push(VideoEvent::Scrolled);
                }
            }
            Signal::OrientationChange => {
                self.events.push(VideoEvent::OrientationChanged(self.probe.screen_orientation()));
                self.onresize();
            }
            Signal::ParentMutated => self.onresize(),
            Signal::PixelRatioChange => match self.settings.as_ref() {
                Some(s) if !s.auto_scale => {
                    let f = s.scale;
                    self.scale(f, f);
                }
                _ => self.onresize(),
            },
        }
    }

    /// Delivers trailing throttled signals whose interval has elapsed.
    pub fn update(&mut self) {
        if self.resize_throttle.poll() {
            self.onresize();
        }
        if self.scroll_throttle.poll() {
            self.events.push(VideoEvent::Scrolled);
        }
    }

    // ── scaling ──────────────────────────────────────────────────────────

    /// Recomputes scale (and back buffer size, for resizing policies) from
    /// the current container. Only active when auto-scaling.
    pub fn onresize(&mut self) {
        let Some(method) = self.settings.as_ref().filter(|s| s.auto_scale).map(|s| s.scale_method) else {
            return;
        };
        let parent = self.probe.parent_bounds();
        let Some(renderer) = self.renderer.as_deref_mut() else { return };

        let style = &renderer.screen_canvas().style;
        let css_max = (
            parse_css_length(style.max_width.as_deref()),
            parse_css_length(style.max_height.as_deref()),
        );

        let outcome = compute_scale(method, self.design, css_max, parent);
        log::debug!("{method} in {}x{}: {outcome:?}", parent.width, parent.height);
        if let Some((w, h)) = outcome.resize {
            renderer.resize(w, h);
        }
        self.scale(outcome.scale_x, outcome.scale_y);
    }

    /// Sets the display size to `x` / `y` times the back buffer, corrected
    /// for the device pixel ratio, and requests a repaint.
    pub fn scale(&mut self, x: f32, y: f32) {
        let dpr = match self.probe.device_pixel_ratio() {
            r if r.is_finite() && r > 0.0 => r,
            _ => 1.0,
        };
        let Some(renderer) = self.renderer.as_deref_mut() else { return };

        let canvas = renderer.screen_canvas();
        let w = canvas.width() as f32 * x * dpr;
        let h = canvas.height() as f32 * y * dpr;

        let rs = &mut renderer.state_mut().settings;
        rs.zoom_x = w;
        rs.zoom_y = h;
        let (anti_alias, blend_mode) = (rs.anti_alias, rs.blend_mode);

        let style = &mut renderer.screen_canvas_mut().style;
        style.width = w / dpr;
        style.height = h / dpr;

        // Canvas resizes drop context state.
        renderer.set_anti_alias(anti_alias);
        renderer.set_blend_mode(blend_mode);

        self.scale_ratio = Vector2d::new(x * dpr, y * dpr);
        self.forward_renderer_events();
        self.events.push(VideoEvent::ScaleChanged { scale_x: self.scale_ratio.x, scale_y: self.scale_ratio.y });
        self.events.push(VideoEvent::RepaintRequested);
    }

    /// Forwards the engine reset notification to the renderer.
    pub fn reset(&mut self) {
        let Some(renderer) = self.renderer.as_deref_mut() else { return };
        renderer.reset();
        self.events.push(VideoEvent::Reset);
    }

    fn forward_renderer_events(&mut self) {
        let Some(renderer) = self.renderer.as_deref_mut() else { return };
        for e in renderer.drain_events() {
            match e {
                RendererEvent::CanvasResized { width, height } => {
                    self.events.push(VideoEvent::CanvasResized { width, height })
                }
                RendererEvent::ContextLost => self.events.push(VideoEvent::ContextLost),
            }
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<VideoEvent> {
        self.forward_renderer_events();
        self.events.drain()
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut dyn Renderer> {
        match self.renderer.as_mut() {
            Some(r) => Some(r.as_mut()),
            None => None,
        }
    }

    pub fn backend(&self) -> Option<RendererKind> {
        self.renderer.as_deref().map(|r| r.kind())
    }

    pub fn settings(&self) -> Option<&VideoSettings> {
        self.settings.as_ref()
    }

    /// Container the canvas is laid out in.
    pub fn parent_bounds(&self) -> Viewport {
        self.probe.parent_bounds()
    }

    pub fn orientation(&self) -> Orientation {
        self.probe.screen_orientation()
    }

    pub fn design_size(&self) -> (u32, u32) {
        self.design
    }

    /// `design width / design height`, fixed at init.
    pub fn design_ratio(&self) -> f32 {
        self.design_ratio
    }

    /// Current display scale including the device pixel ratio.
    pub fn scale_ratio(&self) -> Vector2d {
        self.scale_ratio
    }

    /// See [`surface::create_canvas`].
    pub fn create_canvas(&self, width: u32, height: u32, offscreen: bool) -> Result<Canvas, SurfaceError> {
        surface::create_canvas(width, height, offscreen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ManualProbe;
    use crate::time::ManualClock;
    use crate::video::Scale;

    fn video(w: f32, h: f32) -> (ManualProbe, ManualClock, Video) {
        let probe = ManualProbe::new(w, h);
        let clock = ManualClock::new();
        let video = Video::with_clock(Box::new(probe.clone()), Rc::new(clock.clone()));
        (probe, clock, video)
    }

    fn auto(method: &str) -> VideoOptions {
        VideoOptions { scale: Scale::Auto, scale_method: method.into(), console_header: false, ..Default::default() }
    }

    // ── init ─────────────────────────────────────────────────────────────

    #[test]
    fn init_falls_back_to_canvas_without_gpu() {
        let (_, _, mut v) = video(800.0, 600.0);
        assert!(v.init(800, 600, VideoOptions::default()));
        assert_eq!(v.backend(), Some(RendererKind::Canvas));
        assert_eq!(v.design_ratio(), 800.0 / 600.0);
        assert!(v.drain_events().contains(&VideoEvent::Initialized { backend: RendererKind::Canvas }));
    }

    #[test]
    fn init_rejects_empty_design_and_second_call() {
        let (_, _, mut v) = video(800.0, 600.0);
        assert!(!v.init(0, 600, VideoOptions::default()));
        assert!(!v.is_initialized());
        assert!(v.init(80, 60, VideoOptions::default()));
        assert!(!v.init(80, 60, VideoOptions::default()));
    }

    #[test]
    fn unknown_method_auto_scales_with_fit() {
        let (_, _, mut v) = video(1600.0, 1200.0);
        assert!(v.init(800, 600, auto("zoom")));
        let s = v.settings().unwrap();
        assert!(s.auto_scale);
        assert_eq!(s.scale_method, crate::video::ScaleMethod::Fit);
        assert_eq!(v.scale_ratio(), Vector2d::new(2.0, 2.0));
    }

    #[test]
    fn numeric_scale_is_applied_at_init() {
        let (_, _, mut v) = video(100.0, 100.0);
        let opts = VideoOptions { scale: Scale::Factor(2.0), console_header: false, ..Default::default() };
        assert!(v.init(80, 60, opts));
        let style = &v.renderer().unwrap().screen_canvas().style;
        assert_eq!((style.width, style.height), (160.0, 120.0));
        assert_eq!(v.renderer().unwrap().width(), 80);
    }

    // ── scaling ──────────────────────────────────────────────────────────

    #[test]
    fn fit_scales_by_height_on_wide_container() {
        let (_, _, mut v) = video(1600.0, 900.0);
        assert!(v.init(800, 600, auto("fit")));
        assert_eq!(v.scale_ratio(), Vector2d::new(1.5, 1.5));
        let style = &v.renderer().unwrap().screen_canvas().style;
        assert_eq!((style.width, style.height), (1200.0, 900.0));
    }

    #[test]
    fn stretch_scales_axes_independently() {
        let (_, _, mut v) = video(1000.0, 900.0);
        assert!(v.init(800, 600, auto("stretch")));
        assert_eq!(v.scale_ratio(), Vector2d::new(1.25, 1.5));
    }

    #[test]
    fn flex_resizes_the_back_buffer() {
        let (_, _, mut v) = video(300.0, 200.0);
        assert!(v.init(80, 60, auto("flex")));
        let r = v.renderer().unwrap();
        assert_eq!((r.width(), r.height()), (300, 200));
        let events = v.drain_events();
        assert!(events.contains(&VideoEvent::CanvasResized { width: 300, height: 200 }));
        assert!(events.contains(&VideoEvent::RepaintRequested));
    }

    #[test]
    fn pixel_ratio_scales_backing_size_not_css_size() {
        let (probe, _, mut v) = video(1600.0, 1200.0);
        probe.set_pixel_ratio(2.0);
        assert!(v.init(800, 600, auto("fit")));
        assert_eq!(v.scale_ratio(), Vector2d::new(4.0, 4.0));
        let r = v.renderer().unwrap();
        assert_eq!(r.state().settings.zoom_x, 3200.0);
        assert_eq!(r.screen_canvas().style.width, 1600.0);
    }

    #[test]
    fn css_max_width_limits_the_scale() {
        let (_, _, mut v) = video(1600.0, 600.0);
        let opts = VideoOptions { max_width: Some("400px".into()), ..auto("fit") };
        assert!(v.init(800, 600, opts));
        assert_eq!(v.scale_ratio(), Vector2d::new(0.5, 0.5));
    }

    // ── signals ──────────────────────────────────────────────────────────

    #[test]
    fn resize_signals_are_throttled_with_a_trailing_call() {
        let (probe, clock, mut v) = video(800.0, 600.0);
        assert!(v.init(800, 600, auto("fit")));
        assert_eq!(v.scale_ratio().x, 1.0);

        v.notify(Signal::WindowResize);
        probe.set_parent_bounds(1600.0, 1200.0);
        clock.advance(Duration::from_millis(50));
        v.notify(Signal::WindowResize);
        v.update();
        assert_eq!(v.scale_ratio().x, 1.0);

        clock.advance(Duration::from_millis(50));
        v.update();
        assert_eq!(v.scale_ratio().x, 2.0);
    }

    #[test]
    fn parent_mutation_recomputes_immediately() {
        let (probe, _, mut v) = video(800.0, 600.0);
        assert!(v.init(800, 600, auto("fit")));
        v.notify(Signal::WindowResize);
        probe.set_parent_bounds(400.0, 300.0);
        v.notify(Signal::ParentMutated);
        assert_eq!(v.scale_ratio().x, 0.5);
    }

    #[test]
    fn orientation_change_is_published() {
        let (probe, _, mut v) = video(800.0, 600.0);
        assert!(v.init(80, 60, auto("fit")));
        v.drain_events();
        probe.set_parent_bounds(600.0, 800.0);
        v.notify(Signal::OrientationChange);
        let events = v.drain_events();
        assert_eq!(events[0], VideoEvent::OrientationChanged(crate::device::Orientation::Portrait));
    }

    #[test]
    fn reset_resets_renderer_and_publishes() {
        let (_, _, mut v) = video(800.0, 600.0);
        assert!(v.init(80, 60, VideoOptions::default()));
        v.renderer_mut().unwrap().set_blend_mode(crate::paint::BlendMode::Screen);
        v.drain_events();
        v.reset();
        assert_eq!(v.renderer().unwrap().blend_mode(), crate::paint::BlendMode::Normal);
        assert_eq!(v.drain_events(), vec![VideoEvent::Reset]);
    }

    #[test]
    fn signals_before_init_are_ignored() {
        let (_, _, mut v) = video(800.0, 600.0);
        v.notify(Signal::WindowResize);
        v.update();
        assert!(v.drain_events().is_empty());
    }
}
