use std::fmt;
use std::str::FromStr;

use crate::device::PowerPreference;
use crate::paint::BlendMode;

/// Environment variable forcing the renderer preference.
pub const RENDERER_ENV: &str = "EASEL_RENDERER";

/// Backend requested at init.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RendererPreference {
    Canvas,
    Gpu,
    /// GPU when supported, canvas otherwise.
    #[default]
    Auto,
}

impl FromStr for RendererPreference {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canvas" => Ok(RendererPreference::Canvas),
            "gpu" | "webgl" => Ok(RendererPreference::Gpu),
            "auto" => Ok(RendererPreference::Auto),
            _ => Err(()),
        }
    }
}

/// Requested display scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Scale {
    Factor(f32),
    /// Follow the container through the scale method.
    Auto,
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Factor(1.0)
    }
}

/// How the design resolution maps onto the available area.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ScaleMethod {
    /// Uniform scale, whole design visible.
    #[default]
    Fit,
    /// Uniform scale, back buffer trimmed along the longer side.
    FillMin,
    /// Uniform scale, back buffer grown along the shorter side.
    FillMax,
    /// Back buffer follows the area exactly.
    Flex,
    FlexWidth,
    FlexHeight,
    /// Independent X/Y scale; distorts.
    Stretch,
}

impl ScaleMethod {
    pub const ALL: [ScaleMethod; 7] = [
        ScaleMethod::Fit,
        ScaleMethod::FillMin,
        ScaleMethod::FillMax,
        ScaleMethod::Flex,
        ScaleMethod::FlexWidth,
        ScaleMethod::FlexHeight,
        ScaleMethod::Stretch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScaleMethod::Fit => "fit",
            ScaleMethod::FillMin => "fill-min",
            ScaleMethod::FillMax => "fill-max",
            ScaleMethod::Flex => "flex",
            ScaleMethod::FlexWidth => "flex-width",
            ScaleMethod::FlexHeight => "flex-height",
            ScaleMethod::Stretch => "stretch",
        }
    }
}

impl FromStr for ScaleMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        ScaleMethod::ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

impl fmt::Display for ScaleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed to [`Video::init`](super::Video::init).
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOptions {
    pub renderer: RendererPreference,
    pub double_buffering: bool,
    pub scale: Scale,
    /// Validated at init; unknown names fall back to `fit`.
    pub scale_method: String,
    pub transparent: bool,
    pub blend_mode: BlendMode,
    pub anti_alias: bool,
    pub fail_if_major_performance_caveat: bool,
    pub sub_pixel: bool,
    pub power_preference: PowerPreference,
    pub verbose: bool,
    /// Log version and display information at init.
    pub console_header: bool,
    /// CSS `max-width` / `max-height` of the screen canvas.
    pub max_width: Option<String>,
    pub max_height: Option<String>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            renderer: RendererPreference::Auto,
            double_buffering: false,
            scale: Scale::default(),
            scale_method: ScaleMethod::Fit.as_str().to_owned(),
            transparent: false,
            blend_mode: BlendMode::Normal,
            anti_alias: false,
            fail_if_major_performance_caveat: true,
            sub_pixel: false,
            power_preference: PowerPreference::Default,
            verbose: false,
            console_header: true,
            max_width: None,
            max_height: None,
        }
    }
}

impl VideoOptions {
    /// Applies [`RENDERER_ENV`] when set to a known preference.
    pub fn with_env_overrides(self) -> Self {
        self.with_renderer_override(std::env::var(RENDERER_ENV).ok().as_deref())
    }

    fn with_renderer_override(mut self, value: Option<&str>) -> Self {
        let Some(value) = value else { return self };
        match value.parse() {
            Ok(pref) => {
                log::debug!("{RENDERER_ENV}={value} forces renderer {pref:?}");
                self.renderer = pref;
            }
            Err(()) => log::warn!("ignoring unknown {RENDERER_ENV} value {value:?}"),
        }
        self
    }
}

/// Options after init-time normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub renderer: RendererPreference,
    pub scale_method: ScaleMethod,
    pub auto_scale: bool,
    /// Numeric scale; 1 when auto-scaling.
    pub scale: f32,
    pub double_buffering: bool,
    pub verbose: bool,
    pub console_header: bool,
}

impl VideoSettings {
    pub(crate) fn normalize(opts: &VideoOptions) -> Self {
        let scale_method = opts.scale_method.parse::<ScaleMethod>().unwrap_or_else(|()| {
            log::warn!("unknown scale method {:?}, using fit", opts.scale_method);
            ScaleMethod::Fit
        });

        // An unknown method still auto-scales (with fit) when the scale is "auto".
        let auto_scale = opts.scale == Scale::Auto;
        let scale = match opts.scale {
            Scale::Factor(f) if !auto_scale && f.is_finite() && f > 0.0 => f,
            _ => 1.0,
        };

        Self {
            renderer: opts.renderer,
            scale_method,
            auto_scale,
            scale,
            double_buffering: opts.double_buffering || auto_scale || scale != 1.0,
            verbose: opts.verbose,
            console_header: opts.console_header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parsing ──────────────────────────────────────────────────────────

    #[test]
    fn scale_method_names_round_trip() {
        for m in ScaleMethod::ALL {
            assert_eq!(m.as_str().parse::<ScaleMethod>(), Ok(m));
        }
        assert!("Fit".parse::<ScaleMethod>().is_err());
    }

    #[test]
    fn renderer_override_accepts_known_values() {
        let opts = VideoOptions::default().with_renderer_override(Some("canvas"));
        assert_eq!(opts.renderer, RendererPreference::Canvas);
        let opts = opts.with_renderer_override(Some("WebGL"));
        assert_eq!(opts.renderer, RendererPreference::Gpu);
        let opts = opts.with_renderer_override(Some("metal"));
        assert_eq!(opts.renderer, RendererPreference::Gpu);
        let opts = opts.with_renderer_override(None);
        assert_eq!(opts.renderer, RendererPreference::Gpu);
    }

    // ── normalization ────────────────────────────────────────────────────

    #[test]
    fn auto_scale_follows_auto_scale_value() {
        let mut opts = VideoOptions { scale: Scale::Auto, ..Default::default() };
        opts.scale_method = "stretch".into();
        let s = VideoSettings::normalize(&opts);
        assert!(s.auto_scale);
        assert!(s.double_buffering);
        assert_eq!(s.scale, 1.0);

        opts.scale_method = "zoom".into();
        let s = VideoSettings::normalize(&opts);
        assert_eq!(s.scale_method, ScaleMethod::Fit);
        assert!(s.auto_scale);
    }

    #[test]
    fn unknown_method_with_numeric_scale_does_not_auto_scale() {
        let opts = VideoOptions { scale: Scale::Factor(1.0), scale_method: "zoom".into(), ..Default::default() };
        let s = VideoSettings::normalize(&opts);
        assert_eq!(s.scale_method, ScaleMethod::Fit);
        assert!(!s.auto_scale);
    }

    #[test]
    fn numeric_scale_forces_double_buffering() {
        let opts = VideoOptions { scale: Scale::Factor(2.0), ..Default::default() };
        let s = VideoSettings::normalize(&opts);
        assert!(!s.auto_scale);
        assert_eq!(s.scale, 2.0);
        assert!(s.double_buffering);

        let s = VideoSettings::normalize(&VideoOptions::default());
        assert!(!s.double_buffering);
    }

    #[test]
    fn invalid_numeric_scale_is_one() {
        let opts = VideoOptions { scale: Scale::Factor(f32::NAN), ..Default::default() };
        assert_eq!(VideoSettings::normalize(&opts).scale, 1.0);
    }
}
