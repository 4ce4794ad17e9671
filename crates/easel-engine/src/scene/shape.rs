use crate::coords::{Rect, Vector2d};

/// Point list relative to `pos`.
///
/// `closed` is false for polylines (`Shape::Line`), in which case the outline
/// does not connect the last point back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub pos: Vector2d,
    pub points: Vec<Vector2d>,
    pub closed: bool,
}

impl Polygon {
    pub fn new(pos: Vector2d, points: Vec<Vector2d>) -> Self {
        Self { pos, points, closed: true }
    }

    /// Open polyline.
    pub fn line(pos: Vector2d, points: Vec<Vector2d>) -> Self {
        Self { pos, points, closed: false }
    }

    /// Points translated by `pos`.
    pub fn world_points(&self) -> Vec<Vector2d> {
        self.points
            .iter()
            .map(|p| Vector2d::new(p.x + self.pos.x, p.y + self.pos.y))
            .collect()
    }

    /// Axis-aligned bounds in world space.
    pub fn bounds(&self) -> Rect {
        let mut min = Vector2d::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vector2d::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in self.world_points() {
            min.min_v(p);
            max.max_v(p);
        }
        if !min.is_finite() || !max.is_finite() {
            return Rect::new(self.pos.x, self.pos.y, 0.0, 0.0);
        }
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

/// Axis-aligned ellipse centered on `pos`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipse {
    pub pos: Vector2d,
    pub radius: Vector2d,
}

impl Ellipse {
    #[inline]
    pub const fn new(x: f32, y: f32, rx: f32, ry: f32) -> Self {
        Self { pos: Vector2d::new(x, y), radius: Vector2d::new(rx, ry) }
    }

    #[inline]
    pub fn circle(x: f32, y: f32, r: f32) -> Self {
        Self::new(x, y, r, r)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.pos.x - self.radius.x,
            self.pos.y - self.radius.y,
            self.radius.x * 2.0,
            self.radius.y * 2.0,
        )
    }
}

/// Drawable shape kinds understood by every renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Rectangle or bounding box.
    Rect(Rect),
    Polygon(Polygon),
    Line(Polygon),
    Ellipse(Ellipse),
}

impl Shape {
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect(r) => r.normalized(),
            Shape::Polygon(p) | Shape::Line(p) => p.bounds(),
            Shape::Ellipse(e) => e.bounds(),
        }
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

impl From<Ellipse> for Shape {
    fn from(e: Ellipse) -> Self {
        Shape::Ellipse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_bounds_include_position() {
        let p = Polygon::new(
            Vector2d::new(10.0, 20.0),
            vec![Vector2d::new(0.0, 0.0), Vector2d::new(5.0, -2.0), Vector2d::new(3.0, 4.0)],
        );
        assert_eq!(p.bounds(), Rect::new(10.0, 18.0, 5.0, 6.0));
    }

    #[test]
    fn empty_polygon_bounds_collapse_to_position() {
        let p = Polygon::new(Vector2d::new(1.0, 2.0), Vec::new());
        assert_eq!(p.bounds(), Rect::new(1.0, 2.0, 0.0, 0.0));
    }

    #[test]
    fn ellipse_bounds() {
        assert_eq!(Ellipse::new(5.0, 5.0, 2.0, 3.0).bounds(), Rect::new(3.0, 2.0, 4.0, 6.0));
    }
}
