use anyhow::Result;
use winit::dpi::LogicalSize;

use easel_engine::core::{App, AppControl, FrameCtx};
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::paint::{BlendMode, Color};
use easel_engine::render::Renderer;
use easel_engine::scene::{Ellipse, Polygon, Shape};
use easel_engine::video::{Scale, VideoEvent, VideoOptions};
use easel_engine::coords::{Rect, Vector2d};
use easel_engine::window::{Runtime, RuntimeConfig};

/// Draws a small test card and reports video events.
struct Studio {
    angle: f32,
}

impl Studio {
    fn draw(&self, r: &mut dyn Renderer) {
        let (w, h) = (r.width() as f32, r.height() as f32);

        r.set_color(Color::from_css("#1e1e2e").unwrap_or_default());
        r.fill(&Shape::Rect(Rect::new(0.0, 0.0, w, h)));

        r.save();
        r.translate(w / 2.0, h / 2.0);
        r.rotate(self.angle);
        r.set_color(Color::from_css("coral").unwrap_or_default());
        r.fill(&Shape::Rect(Rect::new(-60.0, -60.0, 120.0, 120.0)));
        r.restore();

        r.set_blend_mode(BlendMode::Lighter);
        r.set_color(Color::new(40.0, 120.0, 255.0, 0.6));
        r.fill(&Shape::Ellipse(Ellipse::circle(w * 0.3, h * 0.4, h * 0.15)));
        r.fill(&Shape::Ellipse(Ellipse::circle(w * 0.7, h * 0.6, h * 0.15)));
        r.set_blend_mode(BlendMode::Normal);

        r.set_line_width(4.0);
        r.set_color(Color::white());
        let tri = Polygon::new(
            Vector2d::new(w / 2.0, h * 0.1),
            vec![Vector2d::new(0.0, 0.0), Vector2d::new(40.0, 70.0), Vector2d::new(-40.0, 70.0)],
        );
        r.stroke(&Shape::Polygon(tri), false);
        r.stroke(&Shape::Rect(Rect::new(2.0, 2.0, w - 4.0, h - 4.0)), false);
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        for event in ctx.events() {
            match event {
                VideoEvent::Initialized { backend } => log::info!("video ready on the {} backend", backend.as_str()),
                VideoEvent::CanvasResized { width, height } => log::info!("back buffer is now {width}x{height}"),
                VideoEvent::ScaleChanged { scale_x, scale_y } => log::info!("display scale {scale_x:.3} x {scale_y:.3}"),
                VideoEvent::OrientationChanged(o) => log::info!("orientation: {}", o.as_str()),
                VideoEvent::ContextLost => log::warn!("rendering context lost; the canvas is frozen"),
                other => log::debug!("{other:?}"),
            }
        }

        self.angle = (self.angle + ctx.time.dt).rem_euclid(std::f32::consts::TAU);
        ctx.render(|r| self.draw(r))
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "easel studio".to_string(),
        initial_size: LogicalSize::new(1024.0, 640.0),
        design_width: 640,
        design_height: 400,
        video: VideoOptions {
            scale: Scale::Auto,
            scale_method: "fit".to_string(),
            anti_alias: true,
            ..VideoOptions::default()
        }
        .with_env_overrides(),
    };

    Runtime::run(config, Studio { angle: 0.0 })
}
