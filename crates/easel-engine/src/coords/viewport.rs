/// Width/height pair in logical (CSS) pixels.
///
/// Used for container bounds sampled from the platform; never cached past one
/// resize computation.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width / height ratio. Zero-height viewports report `f32::INFINITY`.
    #[inline]
    pub fn ratio(self) -> f32 {
        if self.height == 0.0 { f32::INFINITY } else { self.width / self.height }
    }
}
