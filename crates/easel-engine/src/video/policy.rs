//! Scale policy arithmetic, free of any surface or renderer.

use crate::coords::Viewport;

use super::ScaleMethod;

/// Result of one recomputation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScaleOutcome {
    pub scale_x: f32,
    pub scale_y: f32,
    /// New back buffer size, for the policies that resize it.
    pub resize: Option<(u32, u32)>,
}

impl ScaleOutcome {
    fn uniform(scale: f32) -> Self {
        Self { scale_x: scale, scale_y: scale, resize: None }
    }
}

/// Reads a CSS length the way `parseInt` does (`"640px"` is 640).
///
/// Missing, unparseable, zero or negative values mean "no constraint" and
/// yield `f32::INFINITY`.
pub fn parse_css_length(value: Option<&str>) -> f32 {
    let Some(value) = value else { return f32::INFINITY };
    let s = value.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    match digits[..end].parse::<f32>() {
        Ok(n) if !negative && n > 0.0 => n,
        _ => f32::INFINITY,
    }
}

/// Computes scale factors and the optional back buffer resize for `method`.
///
/// `css_max` is the canvas CSS max size (infinite when unconstrained) and
/// `parent` the container's content box. The available area never drops
/// below 1x1.
pub fn compute_scale(
    method: ScaleMethod,
    design: (u32, u32),
    css_max: (f32, f32),
    parent: Viewport,
) -> ScaleOutcome {
    let (design_w, design_h) = (design.0 as f32, design.1 as f32);
    let design_ratio = design_w / design_h;

    let max_w = css_max.0.min(parent.width).max(1.0);
    let max_h = css_max.1.min(parent.height).max(1.0);
    let screen_ratio = max_w / max_h;

    let shrink_width = match method {
        ScaleMethod::FillMin => screen_ratio > design_ratio,
        ScaleMethod::FillMax => screen_ratio < design_ratio,
        ScaleMethod::FlexWidth => true,
        _ => false,
    };
    let shrink_height = match method {
        ScaleMethod::FillMin => screen_ratio < design_ratio,
        ScaleMethod::FillMax => screen_ratio > design_ratio,
        ScaleMethod::FlexHeight => true,
        _ => false,
    };

    if shrink_width {
        let width = css_max.0.min(design_h * screen_ratio).max(1.0);
        ScaleOutcome { resize: Some((width.floor() as u32, design.1)), ..ScaleOutcome::uniform(max_w / width) }
    } else if shrink_height {
        let height = css_max.1.min(design_w * (max_h / max_w)).max(1.0);
        ScaleOutcome { resize: Some((design.0, height.floor() as u32)), ..ScaleOutcome::uniform(max_h / height) }
    } else if method == ScaleMethod::Flex {
        ScaleOutcome { resize: Some((max_w.floor() as u32, max_h.floor() as u32)), ..ScaleOutcome::uniform(1.0) }
    } else if method == ScaleMethod::Stretch {
        ScaleOutcome { scale_x: max_w / design_w, scale_y: max_h / design_h, resize: None }
    } else if screen_ratio < design_ratio {
        ScaleOutcome::uniform(max_w / design_w)
    } else {
        ScaleOutcome::uniform(max_h / design_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIGN: (u32, u32) = (800, 600);
    const NO_MAX: (f32, f32) = (f32::INFINITY, f32::INFINITY);

    fn run(method: ScaleMethod, w: f32, h: f32) -> ScaleOutcome {
        compute_scale(method, DESIGN, NO_MAX, Viewport::new(w, h))
    }

    // ── css lengths ──────────────────────────────────────────────────────

    #[test]
    fn css_length_parses_leading_integer() {
        assert_eq!(parse_css_length(Some("640px")), 640.0);
        assert_eq!(parse_css_length(Some(" 12.9em")), 12.0);
        assert_eq!(parse_css_length(Some("none")), f32::INFINITY);
        assert_eq!(parse_css_length(Some("0")), f32::INFINITY);
        assert_eq!(parse_css_length(Some("-5px")), f32::INFINITY);
        assert_eq!(parse_css_length(None), f32::INFINITY);
    }

    // ── uniform policies ─────────────────────────────────────────────────

    #[test]
    fn fit_is_bounded_by_height_on_wide_screens() {
        assert_eq!(run(ScaleMethod::Fit, 1600.0, 600.0), ScaleOutcome::uniform(1.0));
        assert_eq!(run(ScaleMethod::Fit, 1600.0, 900.0), ScaleOutcome::uniform(1.5));
    }

    #[test]
    fn fit_is_bounded_by_width_on_tall_screens() {
        assert_eq!(run(ScaleMethod::Fit, 400.0, 900.0), ScaleOutcome::uniform(0.5));
    }

    #[test]
    fn css_max_constrains_available_area() {
        let out = compute_scale(ScaleMethod::Fit, DESIGN, (400.0, f32::INFINITY), Viewport::new(1600.0, 600.0));
        assert_eq!(out, ScaleOutcome::uniform(0.5));
    }

    #[test]
    fn fill_min_on_wide_screen_grows_width() {
        let out = run(ScaleMethod::FillMin, 1200.0, 600.0);
        assert_eq!(out.resize, Some((1200, 600)));
        assert_eq!(out.scale_x, 1.0);
    }

    #[test]
    fn fill_max_on_wide_screen_trims_height() {
        let out = run(ScaleMethod::FillMax, 1600.0, 600.0);
        assert_eq!(out.resize, Some((800, 300)));
        assert_eq!((out.scale_x, out.scale_y), (2.0, 2.0));
    }

    #[test]
    fn fill_min_with_matching_ratio_behaves_like_fit() {
        assert_eq!(run(ScaleMethod::FillMin, 1600.0, 1200.0), ScaleOutcome::uniform(2.0));
    }

    #[test]
    fn flex_height_keeps_design_width() {
        let out = run(ScaleMethod::FlexHeight, 800.0, 1200.0);
        assert_eq!(out.resize, Some((800, 1200)));
        assert_eq!(out.scale_y, 1.0);
    }

    #[test]
    fn flex_width_keeps_design_height() {
        let out = run(ScaleMethod::FlexWidth, 600.0, 300.0);
        assert_eq!(out.resize, Some((1200, 600)));
        assert_eq!(out.scale_x, 0.5);
    }

    // ── non-uniform policies ─────────────────────────────────────────────

    #[test]
    fn flex_resizes_to_the_available_area() {
        let out = run(ScaleMethod::Flex, 1000.5, 700.0);
        assert_eq!(out, ScaleOutcome { scale_x: 1.0, scale_y: 1.0, resize: Some((1000, 700)) });
    }

    #[test]
    fn stretch_scales_axes_independently() {
        let out = run(ScaleMethod::Stretch, 1000.0, 900.0);
        assert_eq!((out.scale_x, out.scale_y), (1.25, 1.5));
        assert_eq!(out.resize, None);
    }

    #[test]
    fn zero_area_container_clamps_to_one_pixel() {
        let out = run(ScaleMethod::Flex, 0.0, 0.0);
        assert_eq!(out.resize, Some((1, 1)));
        let out = run(ScaleMethod::Fit, 0.0, 0.0);
        assert!(out.scale_x.is_finite() && out.scale_x > 0.0);
    }
}
