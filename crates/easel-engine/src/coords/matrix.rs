use super::Vector2d;

/// 2D affine transform.
///
/// Layout follows the canvas convention:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix2d {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix2d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix2d {
    #[inline]
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Orthographic projection mapping `[left, right] x [top, bottom]` onto clip space.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let w = right - left;
        let h = top - bottom;
        Self {
            a: 2.0 / w,
            b: 0.0,
            c: 0.0,
            d: 2.0 / h,
            e: -(right + left) / w,
            f: -(top + bottom) / h,
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// True when the transform keeps rectangles axis-aligned.
    #[inline]
    pub fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.c == 0.0
    }

    /// Returns `self * rhs` (`rhs` is applied first).
    pub fn multiply(&self, rhs: &Matrix2d) -> Matrix2d {
        Matrix2d {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        *self = self.multiply(&Matrix2d::new(1.0, 0.0, 0.0, 1.0, x, y));
        self
    }

    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        *self = self.multiply(&Matrix2d::new(x, 0.0, 0.0, y, 0.0, 0.0));
        self
    }

    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        let (s, c) = angle.sin_cos();
        *self = self.multiply(&Matrix2d::new(c, s, -s, c, 0.0, 0.0));
        self
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Matrix2d> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix2d {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    #[inline]
    pub fn apply(&self, p: Vector2d) -> Vector2d {
        Vector2d::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Column-major 3x3 with each column padded to four floats (WGSL `mat3x3<f32>` layout).
    pub fn to_padded_columns(&self) -> [[f32; 4]; 3] {
        [
            [self.a, self.b, 0.0, 0.0],
            [self.c, self.d, 0.0, 0.0],
            [self.e, self.f, 1.0, 0.0],
        ]
    }
}
