use core::fmt;
use core::ops::{AddAssign, DivAssign, Mul, MulAssign, Neg, SubAssign};

/// Error returned when a vector is assigned a non-numeric component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VectorError {
    NotANumber,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorError::NotANumber => write!(f, "invalid x,y parameters (not a number)"),
        }
    }
}

impl std::error::Error for VectorError {}

/// Mutable 2D vector.
///
/// Mutating methods update `self` in place and return `&mut Self` so calls can be
/// chained. Methods without the `_self` suffix in the `floor`/`ceil`/`negate`/`clamp`
/// families return a new vector and leave `self` untouched.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vector2d {
    pub x: f32,
    pub y: f32,
}

impl Vector2d {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Reinitializes a pooled vector.
    #[inline]
    pub fn on_reset_event(&mut self, x: f32, y: f32) -> &mut Self {
        self.assign(x, y)
    }

    #[inline]
    fn assign(&mut self, x: f32, y: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Sets both components, rejecting `NaN`.
    pub fn set(&mut self, x: f32, y: f32) -> Result<&mut Self, VectorError> {
        if x.is_nan() || y.is_nan() {
            return Err(VectorError::NotANumber);
        }
        Ok(self.assign(x, y))
    }

    #[inline]
    pub fn set_zero(&mut self) -> &mut Self {
        self.assign(0.0, 0.0)
    }

    #[inline]
    pub fn set_v(&mut self, v: Vector2d) -> &mut Self {
        self.assign(v.x, v.y)
    }

    #[inline]
    pub fn copy(&mut self, v: &Vector2d) -> &mut Self {
        self.assign(v.x, v.y)
    }

    #[inline]
    pub fn add(&mut self, v: Vector2d) -> &mut Self {
        self.assign(self.x + v.x, self.y + v.y)
    }

    #[inline]
    pub fn sub(&mut self, v: Vector2d) -> &mut Self {
        self.assign(self.x - v.x, self.y - v.y)
    }

    #[inline]
    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.assign(self.x * x, self.y * y)
    }

    #[inline]
    pub fn scale_v(&mut self, v: Vector2d) -> &mut Self {
        self.assign(self.x * v.x, self.y * v.y)
    }

    #[inline]
    pub fn div(&mut self, n: f32) -> &mut Self {
        self.assign(self.x / n, self.y / n)
    }

    /// Converts cartesian coordinates to isometric.
    #[inline]
    pub fn to_iso(&mut self) -> &mut Self {
        self.assign(self.x - self.y, (self.x + self.y) * 0.5)
    }

    /// Converts isometric coordinates back to cartesian.
    #[inline]
    pub fn to_2d(&mut self) -> &mut Self {
        self.assign(self.y + self.x / 2.0, self.y - self.x / 2.0)
    }

    #[inline]
    pub fn abs(&mut self) -> &mut Self {
        self.assign(self.x.abs(), self.y.abs())
    }

    pub fn clamp(&self, low: f32, high: f32) -> Vector2d {
        Vector2d::new(clamp(self.x, low, high), clamp(self.y, low, high))
    }

    pub fn clamp_self(&mut self, low: f32, high: f32) -> &mut Self {
        self.assign(clamp(self.x, low, high), clamp(self.y, low, high))
    }

    #[inline]
    pub fn min_v(&mut self, v: Vector2d) -> &mut Self {
        self.assign(self.x.min(v.x), self.y.min(v.y))
    }

    #[inline]
    pub fn max_v(&mut self, v: Vector2d) -> &mut Self {
        self.assign(self.x.max(v.x), self.y.max(v.y))
    }

    #[inline]
    pub fn floor(&self) -> Vector2d {
        Vector2d::new(self.x.floor(), self.y.floor())
    }

    #[inline]
    pub fn floor_self(&mut self) -> &mut Self {
        self.assign(self.x.floor(), self.y.floor())
    }

    #[inline]
    pub fn ceil(&self) -> Vector2d {
        Vector2d::new(self.x.ceil(), self.y.ceil())
    }

    #[inline]
    pub fn ceil_self(&mut self) -> &mut Self {
        self.assign(self.x.ceil(), self.y.ceil())
    }

    #[inline]
    pub fn negate(&self) -> Vector2d {
        Vector2d::new(-self.x, -self.y)
    }

    #[inline]
    pub fn negate_self(&mut self) -> &mut Self {
        self.assign(-self.x, -self.y)
    }

    /// Exact component-wise comparison.
    #[inline]
    pub fn equals(&self, v: &Vector2d) -> bool {
        self.x == v.x && self.y == v.y
    }

    #[inline]
    pub fn equals_xy(&self, x: f32, y: f32) -> bool {
        self.x == x && self.y == y
    }

    /// Scales to unit length. The zero vector is left unchanged.
    pub fn normalize(&mut self) -> &mut Self {
        let len = self.length();
        self.div(if len == 0.0 { 1.0 } else { len })
    }

    /// Replaces `self` with its perpendicular `(y, -x)`.
    #[inline]
    pub fn perp(&mut self) -> &mut Self {
        self.assign(self.y, -self.x)
    }

    /// Rotates counter-clockwise by `angle` radians around `pivot` (origin when `None`).
    pub fn rotate(&mut self, angle: f32, pivot: Option<Vector2d>) -> &mut Self {
        let (cx, cy) = pivot.map_or((0.0, 0.0), |p| (p.x, p.y));
        let x = self.x - cx;
        let y = self.y - cy;
        let (s, c) = angle.sin_cos();
        self.assign(x * c - y * s + cx, x * s + y * c + cy)
    }

    #[inline]
    pub fn dot(&self, v: &Vector2d) -> f32 {
        self.x * v.x + self.y * v.y
    }

    #[inline]
    pub fn length2(&self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length2().sqrt()
    }

    /// Moves `self` toward `v` by `alpha` (0 = unchanged, 1 = `v`).
    pub fn lerp(&mut self, v: &Vector2d, alpha: f32) -> &mut Self {
        self.x += (v.x - self.x) * alpha;
        self.y += (v.y - self.y) * alpha;
        self
    }

    pub fn distance(&self, v: &Vector2d) -> f32 {
        let dx = self.x - v.x;
        let dy = self.y - v.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle in radians between `self` and `v`.
    ///
    /// The cosine is clamped to `[-1, 1]` before `acos`, so rounding on nearly
    /// parallel vectors never yields `NaN`.
    pub fn angle(&self, v: &Vector2d) -> f32 {
        clamp(self.dot(v) / (self.length() * v.length()), -1.0, 1.0).acos()
    }

    /// Projects `self` onto `v`.
    pub fn project(&mut self, v: &Vector2d) -> &mut Self {
        let k = self.dot(v) / v.length2();
        self.assign(v.x * k, v.y * k)
    }

    /// Projects `self` onto `v`, which must already be unit length.
    pub fn project_n(&mut self, v: &Vector2d) -> &mut Self {
        let k = self.dot(v);
        self.assign(v.x * k, v.y * k)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[inline]
fn clamp(v: f32, low: f32, high: f32) -> f32 {
    v.max(low).min(high)
}

impl fmt::Display for Vector2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x:{},y:{}", self.x, self.y)
    }
}

impl AddAssign for Vector2d {
    #[inline]
    fn add_assign(&mut self, rhs: Vector2d) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2d {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector2d) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f32> for Vector2d {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl DivAssign<f32> for Vector2d {
    #[inline]
    fn div_assign(&mut self, rhs: f32) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

impl Mul<f32> for Vector2d {
    type Output = Vector2d;
    #[inline]
    fn mul(self, rhs: f32) -> Vector2d {
        Vector2d::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2d {
    type Output = Vector2d;
    #[inline]
    fn neg(self) -> Vector2d {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::{FRAC_PI_2, PI};

    fn v(x: f32, y: f32) -> Vector2d { Vector2d::new(x, y) }

    fn close(a: f32, b: f32) -> bool { (a - b).abs() < 1e-5 }

    // ── set ───────────────────────────────────────────────────────────────

    #[test]
    fn set_assigns_components() {
        let mut a = Vector2d::zero();
        a.set(1.5, -2.0).unwrap();
        assert_eq!(a, v(1.5, -2.0));
    }

    #[test]
    fn set_rejects_nan() {
        let mut a = v(1.0, 2.0);
        assert_eq!(a.set(f32::NAN, 0.0).unwrap_err(), VectorError::NotANumber);
        assert_eq!(a.set(0.0, f32::NAN).unwrap_err(), VectorError::NotANumber);
        // Unchanged on failure.
        assert_eq!(a, v(1.0, 2.0));
    }

    #[test]
    fn mutators_chain() {
        let mut a = v(1.0, 1.0);
        a.add(v(1.0, 2.0)).scale(2.0, 3.0).sub(v(1.0, 1.0));
        assert_eq!(a, v(3.0, 8.0));
    }

    // ── length / normalize ────────────────────────────────────────────────

    #[test]
    fn length_of_three_four_is_five() {
        assert_eq!(v(3.0, 4.0).length(), 5.0);
        assert_eq!(v(3.0, 4.0).length2(), 25.0);
    }

    #[test]
    fn normalize_zero_vector_is_noop() {
        let mut z = Vector2d::zero();
        z.normalize();
        assert_eq!(z, Vector2d::zero());
    }

    #[test]
    fn normalize_yields_unit_length() {
        let mut a = v(3.0, 4.0);
        a.normalize();
        assert!(close(a.x, 0.6) && close(a.y, 0.8));
    }

    // ── rotate ────────────────────────────────────────────────────────────

    #[test]
    fn rotate_quarter_turn_about_origin() {
        let mut a = v(1.0, 0.0);
        a.rotate(FRAC_PI_2, None);
        assert!(close(a.x, 0.0) && close(a.y, 1.0));
    }

    #[test]
    fn rotate_about_pivot() {
        let mut a = v(2.0, 1.0);
        a.rotate(PI, Some(v(1.0, 1.0)));
        assert!(close(a.x, 0.0) && close(a.y, 1.0));
    }

    // ── angle ─────────────────────────────────────────────────────────────

    #[test]
    fn angle_between_perpendicular_vectors() {
        assert!(close(v(1.0, 0.0).angle(&v(0.0, 5.0)), FRAC_PI_2));
    }

    #[test]
    fn angle_never_nan_for_near_parallel_vectors() {
        let a = v(0.1, 0.3);
        for k in [1.0f32, 3.0, 7.0, 1e-3, 1e3] {
            assert!(!a.angle(&v(0.1 * k, 0.3 * k)).is_nan());
            assert!(!a.angle(&v(-0.1 * k, -0.3 * k)).is_nan());
        }
        assert!((a.angle(&v(-0.2, -0.6)) - PI).abs() < 1e-3);
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn project_onto_axis() {
        let mut a = v(3.0, 4.0);
        a.project(&v(10.0, 0.0));
        assert_eq!(a, v(3.0, 0.0));
    }

    #[test]
    fn project_n_assumes_unit_vector() {
        let mut a = v(3.0, 4.0);
        a.project_n(&v(0.0, 1.0));
        assert_eq!(a, v(0.0, 4.0));
    }

    // ── non-mutating counterparts ─────────────────────────────────────────

    #[test]
    fn floor_and_floor_self() {
        let mut a = v(1.7, -1.2);
        assert_eq!(a.floor(), v(1.0, -2.0));
        assert_eq!(a, v(1.7, -1.2));
        a.floor_self();
        assert_eq!(a, v(1.0, -2.0));
    }

    #[test]
    fn clamp_and_negate() {
        let a = v(-5.0, 5.0);
        assert_eq!(a.clamp(-1.0, 1.0), v(-1.0, 1.0));
        assert_eq!(a.negate(), v(5.0, -5.0));
        assert_eq!(-a, v(5.0, -5.0));
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn iso_round_trip() {
        let mut a = v(4.0, 2.0);
        a.to_iso().to_2d();
        assert!(close(a.x, 4.0) && close(a.y, 2.0));
    }

    #[test]
    fn lerp_and_distance() {
        let mut a = v(0.0, 0.0);
        a.lerp(&v(10.0, 20.0), 0.5);
        assert_eq!(a, v(5.0, 10.0));
        assert_eq!(a.distance(&v(8.0, 14.0)), 5.0);
    }

    #[test]
    fn display_format() {
        assert_eq!(v(1.5, -2.0).to_string(), "x:1.5,y:-2");
    }
}
