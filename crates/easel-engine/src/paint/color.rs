use std::fmt;
use std::str::FromStr;

use super::css;

/// Error raised when a string matches none of the supported color notations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    InvalidColorFormat(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::InvalidColorFormat(s) => write!(f, "invalid color format: {s:?}"),
        }
    }
}

impl std::error::Error for ColorError {}

/// Straight-alpha RGBA color.
///
/// Invariant:
/// - every stored component lies in `[0, 1]`.
///
/// The red/green/blue accessors work in `0..=255`; alpha works in `[0, 1]`.
/// Exported strings are derived from the 8-bit accessors, so they round to
/// 8-bit precision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    gl: [f32; 4],
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

#[inline]
fn channel_from(v: f32) -> f32 {
    // Non-numeric input coerces to zero.
    let v = if v.is_finite() { v.trunc() } else { 0.0 };
    v.clamp(0.0, 255.0) / 255.0
}

#[inline]
fn alpha_from(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl Color {
    /// Creates a color from `0..=255` channels and a `[0, 1]` alpha (both clamped).
    pub fn new(r: f32, g: f32, b: f32, alpha: f32) -> Self {
        Self { gl: [channel_from(r), channel_from(g), channel_from(b), alpha_from(alpha)] }
    }

    /// Creates a color from normalized `[r, g, b, a]` components (clamped, NaN → 0).
    pub fn from_array(gl: [f32; 4]) -> Self {
        Self { gl: gl.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }) }
    }

    #[inline]
    pub const fn black() -> Self {
        Self { gl: [0.0, 0.0, 0.0, 1.0] }
    }

    #[inline]
    pub const fn white() -> Self {
        Self { gl: [1.0, 1.0, 1.0, 1.0] }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self { gl: [0.0, 0.0, 0.0, 0.0] }
    }

    /// Parses any supported CSS notation (keyword, `rgb()`/`rgba()`, hex).
    pub fn from_css(s: &str) -> Result<Self, ColorError> {
        let mut c = Self::default();
        c.parse_css(s)?;
        Ok(c)
    }

    // ── accessors ────────────────────────────────────────────────────────

    #[inline]
    pub fn r(&self) -> u8 {
        (self.gl[0] * 255.0).round() as u8
    }

    #[inline]
    pub fn g(&self) -> u8 {
        (self.gl[1] * 255.0).round() as u8
    }

    #[inline]
    pub fn b(&self) -> u8 {
        (self.gl[2] * 255.0).round() as u8
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.gl[3]
    }

    pub fn set_r(&mut self, v: f32) -> &mut Self {
        self.gl[0] = channel_from(v);
        self
    }

    pub fn set_g(&mut self, v: f32) -> &mut Self {
        self.gl[1] = channel_from(v);
        self
    }

    pub fn set_b(&mut self, v: f32) -> &mut Self {
        self.gl[2] = channel_from(v);
        self
    }

    pub fn set_alpha(&mut self, v: f32) -> &mut Self {
        self.gl[3] = alpha_from(v);
        self
    }

    /// Normalized `[r, g, b, a]` components, ready for GPU upload.
    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        self.gl
    }

    // ── mutators ─────────────────────────────────────────────────────────

    /// Sets all channels (`0..=255` for rgb, `[0, 1]` for alpha).
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, alpha: f32) -> &mut Self {
        self.gl = [channel_from(r), channel_from(g), channel_from(b), alpha_from(alpha)];
        self
    }

    /// Copies the raw components of `other`.
    pub fn copy(&mut self, other: &Color) -> &mut Self {
        self.gl = other.gl;
        self
    }

    /// Copies a color given in any CSS notation.
    pub fn copy_css(&mut self, s: &str) -> Result<&mut Self, ColorError> {
        self.parse_css(s)
    }

    /// Pool-reuse reset.
    pub fn on_reset_event(&mut self, r: f32, g: f32, b: f32, alpha: f32) -> &mut Self {
        self.set_color(r, g, b, alpha)
    }

    /// Additive blend: rgb sums saturate, alpha is averaged.
    pub fn add(&mut self, other: &Color) -> &mut Self {
        for i in 0..3 {
            self.gl[i] = (self.gl[i] + other.gl[i]).clamp(0.0, 1.0);
        }
        self.gl[3] = (self.gl[3] + other.gl[3]) / 2.0;
        self
    }

    /// Multiplies rgb by `scale` (clamped to `[0, 1]`).
    pub fn darken(&mut self, scale: f32) -> &mut Self {
        let scale = scale.clamp(0.0, 1.0);
        for c in &mut self.gl[..3] {
            *c *= scale;
        }
        self
    }

    /// Moves rgb towards white by `scale` (clamped to `[0, 1]`).
    pub fn lighten(&mut self, scale: f32) -> &mut Self {
        let scale = scale.clamp(0.0, 1.0);
        for c in &mut self.gl[..3] {
            *c = (*c + (1.0 - *c) * scale).clamp(0.0, 1.0);
        }
        self
    }

    /// Interpolates rgb towards `other`; `t = 0` keeps this color, `t = 1` yields `other`.
    pub fn lerp(&mut self, other: &Color, t: f32) -> &mut Self {
        let t = t.clamp(0.0, 1.0);
        for i in 0..3 {
            self.gl[i] += (other.gl[i] - self.gl[i]) * t;
        }
        self
    }

    // ── parsing ──────────────────────────────────────────────────────────

    /// Keyword lookup, then `rgb()`/`rgba()`, then hex.
    pub fn parse_css(&mut self, s: &str) -> Result<&mut Self, ColorError> {
        match css::named_color(s) {
            Some([r, g, b]) => Ok(self.set_color(r as f32, g as f32, b as f32, 1.0)),
            None => self.parse_rgb(s),
        }
    }

    /// `rgb(R,G,B)` / `rgba(R,G,B,A)`, falling through to [`parse_hex`](Self::parse_hex).
    ///
    /// A missing alpha component yields an opaque color.
    pub fn parse_rgb(&mut self, s: &str) -> Result<&mut Self, ColorError> {
        match css::scan_rgb(s) {
            Some((r, g, b, a)) => {
                Ok(self.set_color(r as f32, g as f32, b as f32, a.unwrap_or(1.0)))
            }
            None => self.parse_hex(s, false),
        }
    }

    /// `#RGB`, `#RRGGBB`, and the alpha forms `#RGBA`/`#RRGGBBAA`
    /// (or `#ARGB`/`#AARRGGBB` when `argb` is set).
    ///
    /// Alpha from a hex string is rounded to one decimal.
    pub fn parse_hex(&mut self, s: &str, argb: bool) -> Result<&mut Self, ColorError> {
        let Some(digits) = css::scan_hex(s) else {
            return Err(ColorError::InvalidColorFormat(s.to_owned()));
        };

        let width = if digits.len() >= 6 { 2 } else { 1 };
        let parts: Vec<u8> = (0..digits.len() / width)
            .map(|i| css::hex_component(&digits[i * width..(i + 1) * width]))
            .collect();

        let (rgb, alpha) = match (parts.as_slice(), argb) {
            ([r, g, b], _) => ([*r, *g, *b], 1.0),
            ([r, g, b, a], false) => ([*r, *g, *b], hex_alpha(*a)),
            ([a, r, g, b], true) => ([*r, *g, *b], hex_alpha(*a)),
            _ => return Err(ColorError::InvalidColorFormat(s.to_owned())),
        };

        Ok(self.set_color(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32, alpha))
    }

    // ── export ───────────────────────────────────────────────────────────

    /// `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r(), self.g(), self.b())
    }

    /// `#RRGGBBAA`
    pub fn to_hex8(&self) -> String {
        let a = (self.alpha() * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r(), self.g(), self.b(), a)
    }

    /// `rgb(R,G,B)`
    pub fn to_rgb(&self) -> String {
        format!("rgb({},{},{})", self.r(), self.g(), self.b())
    }

    /// `rgba(R,G,B,A)`
    pub fn to_rgba(&self) -> String {
        format!("rgba({},{},{},{})", self.r(), self.g(), self.b(), self.alpha())
    }
}

fn hex_alpha(a: u8) -> f32 {
    ((a as f32 / 255.0) * 10.0).round() / 10.0
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_css(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rgba())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── construction & accessors ──────────────────────────────────────────

    #[test]
    fn default_is_opaque_black() {
        let c = Color::default();
        assert_eq!((c.r(), c.g(), c.b(), c.alpha()), (0, 0, 0, 1.0));
    }

    #[test]
    fn setters_clamp_and_coerce() {
        let mut c = Color::default();
        c.set_r(300.0).set_g(-5.0).set_b(f32::NAN).set_alpha(2.0);
        assert_eq!((c.r(), c.g(), c.b(), c.alpha()), (255, 0, 0, 1.0));
        c.set_alpha(-1.0);
        assert_eq!(c.alpha(), 0.0);
        assert!(c.to_array().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    // ── parsing ──────────────────────────────────────────────────────────

    #[test]
    fn hex6_round_trips() {
        for hex in ["#55AA00", "#000000", "#FFFFFF", "#12AB9F"] {
            let c: Color = hex.parse().unwrap();
            assert_eq!(c.to_hex(), hex);
        }
    }

    #[test]
    fn hex_short_forms_expand() {
        let c = Color::from_css("#f80").unwrap();
        assert_eq!((c.r(), c.g(), c.b(), c.alpha()), (255, 136, 0, 1.0));

        let mut c = Color::default();
        c.parse_hex("#f808", false).unwrap();
        assert_eq!((c.r(), c.g(), c.b()), (255, 136, 0));
        assert_eq!(c.alpha(), 0.5);

        c.parse_hex("#8f80", true).unwrap();
        assert_eq!((c.r(), c.g(), c.b()), (255, 136, 0));
        assert_eq!(c.alpha(), 0.5);
    }

    #[test]
    fn hex8_alpha_rounds_to_one_decimal() {
        let c = Color::from_css("#FF000080").unwrap();
        assert_eq!(c.r(), 255);
        assert_eq!(c.alpha(), 0.5);

        let mut c = Color::default();
        c.parse_hex("#80FF0000", true).unwrap();
        assert_eq!((c.r(), c.g(), c.b()), (255, 0, 0));
        assert_eq!(c.alpha(), 0.5);
    }

    #[test]
    fn named_colors_match_table() {
        for (name, [r, g, b]) in css::NAMED_COLORS {
            let c = Color::from_css(name).unwrap();
            assert_eq!((c.r(), c.g(), c.b()), (*r, *g, *b), "{name}");
            assert_eq!(c.alpha(), 1.0);
        }
    }

    #[test]
    fn rgb_and_rgba_notation() {
        let c = Color::from_css("rgb(10, 20, 30)").unwrap();
        assert_eq!((c.r(), c.g(), c.b(), c.alpha()), (10, 20, 30, 1.0));

        let c = Color::from_css("rgba(10,20,30,0.25)").unwrap();
        assert_eq!(c.alpha(), 0.25);

        let c = Color::from_css("rgb(999,0,0)").unwrap();
        assert_eq!(c.r(), 255);
    }

    #[test]
    fn unmatched_string_is_an_error() {
        let err = Color::from_css("not-a-color").unwrap_err();
        assert_eq!(err, ColorError::InvalidColorFormat("not-a-color".into()));
        assert!(Color::from_css("#12345").is_err());
    }

    #[test]
    fn failed_parse_leaves_color_untouched() {
        let mut c = Color::white();
        assert!(c.copy_css("nope").is_err());
        assert_eq!(c, Color::white());
    }

    // ── blending ─────────────────────────────────────────────────────────

    #[test]
    fn add_saturates_and_averages_alpha() {
        let mut a = Color::new(200.0, 100.0, 0.0, 1.0);
        a.add(&Color::new(100.0, 100.0, 0.0, 0.0));
        assert_eq!((a.r(), a.g(), a.b()), (255, 200, 0));
        assert_eq!(a.alpha(), 0.5);
    }

    #[test]
    fn darken_and_lighten_clamp_scale() {
        let mut c = Color::new(200.0, 100.0, 50.0, 1.0);
        c.darken(0.5);
        assert_eq!((c.r(), c.g(), c.b()), (100, 50, 25));
        c.darken(2.0);
        assert_eq!((c.r(), c.g(), c.b()), (100, 50, 25));

        let mut c = Color::new(0.0, 255.0, 55.0, 1.0);
        c.lighten(0.5);
        assert_eq!((c.r(), c.g(), c.b()), (128, 255, 155));
        c.lighten(1.0);
        assert_eq!(c.to_hex(), "#FFFFFF");
    }

    #[test]
    fn lerp_interpolates_rgb_only() {
        let mut c = Color::new(0.0, 0.0, 0.0, 1.0);
        c.lerp(&Color::new(255.0, 100.0, 0.0, 0.0), 0.5);
        assert_eq!((c.r(), c.g(), c.b()), (128, 50, 0));
        assert_eq!(c.alpha(), 1.0);
    }

    // ── export ───────────────────────────────────────────────────────────

    #[test]
    fn string_exports() {
        let c = Color::new(255.0, 128.0, 0.0, 0.5);
        assert_eq!(c.to_hex(), "#FF8000");
        assert_eq!(c.to_hex8(), "#FF800080");
        assert_eq!(c.to_rgb(), "rgb(255,128,0)");
        assert_eq!(c.to_rgba(), "rgba(255,128,0,0.5)");
        assert_eq!(Color::white().to_rgba(), "rgba(255,255,255,1)");
    }
}
