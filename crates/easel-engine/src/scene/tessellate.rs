//! CPU tessellation of shapes into triangle lists and outline quads.
//!
//! Output convention: a flat `Vec<Vector2d>` where every three consecutive points
//! form one triangle (no index buffer).

use crate::coords::{Rect, Vector2d};

use super::{Ellipse, Polygon, Shape};

const MIN_ELLIPSE_SEGMENTS: usize = 12;
const MAX_ELLIPSE_SEGMENTS: usize = 128;

/// Segment count scaled with the larger radius.
pub fn ellipse_segments(e: &Ellipse) -> usize {
    let r = e.radius.x.abs().max(e.radius.y.abs());
    ((r.sqrt() * 4.0).ceil() as usize).clamp(MIN_ELLIPSE_SEGMENTS, MAX_ELLIPSE_SEGMENTS)
}

/// Ellipse outline, counter-clockwise in screen space, without repeating the first point.
pub fn ellipse_points(e: &Ellipse) -> Vec<Vector2d> {
    let n = ellipse_segments(e);
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32 * std::f32::consts::TAU;
            Vector2d::new(e.pos.x + e.radius.x * t.cos(), e.pos.y + e.radius.y * t.sin())
        })
        .collect()
}

pub fn rect_points(r: &Rect) -> Vec<Vector2d> {
    let r = r.normalized();
    vec![
        Vector2d::new(r.left(), r.top()),
        Vector2d::new(r.right(), r.top()),
        Vector2d::new(r.right(), r.bottom()),
        Vector2d::new(r.left(), r.bottom()),
    ]
}

/// Outline points of a shape and whether the outline closes.
pub fn outline(shape: &Shape) -> (Vec<Vector2d>, bool) {
    match shape {
        Shape::Rect(r) => (rect_points(r), true),
        Shape::Polygon(p) | Shape::Line(p) => (p.world_points(), p.closed),
        Shape::Ellipse(e) => (ellipse_points(e), true),
    }
}

/// Twice the signed area (positive when clockwise in +Y-down space).
fn signed_area2(points: &[Vector2d]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

#[inline]
fn cross(o: Vector2d, a: Vector2d, b: Vector2d) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn point_in_triangle(p: Vector2d, a: Vector2d, b: Vector2d, c: Vector2d) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple polygon (either winding).
///
/// Degenerate input (fewer than 3 points, zero area) yields no triangles.
/// Self-intersecting input falls back to a fan for the remaining vertices.
pub fn triangulate(points: &[Vector2d]) -> Vec<Vector2d> {
    if points.len() < 3 {
        return Vec::new();
    }
    let area = signed_area2(points);
    if area == 0.0 || !area.is_finite() {
        return Vec::new();
    }
    let orient = area.signum();

    let mut idx: Vec<usize> = (0..points.len()).collect();
    let mut out = Vec::with_capacity((points.len() - 2) * 3);

    while idx.len() > 3 {
        let n = idx.len();
        let ear = (0..n).find(|&i| {
            let a = points[idx[(i + n - 1) % n]];
            let b = points[idx[i]];
            let c = points[idx[(i + 1) % n]];
            if cross(a, b, c) * orient <= 0.0 {
                return false;
            }
            idx.iter()
                .enumerate()
                .filter(|&(j, _)| j != i && j != (i + n - 1) % n && j != (i + 1) % n)
                .all(|(_, &k)| !point_in_triangle(points[k], a, b, c))
        });

        match ear {
            Some(i) => {
                out.push(points[idx[(i + n - 1) % n]]);
                out.push(points[idx[i]]);
                out.push(points[idx[(i + 1) % n]]);
                idx.remove(i);
            }
            None => {
                for w in 1..n - 1 {
                    out.extend([points[idx[0]], points[idx[w]], points[idx[w + 1]]]);
                }
                return out;
            }
        }
    }

    out.extend([points[idx[0]], points[idx[1]], points[idx[2]]]);
    out
}

/// One quad per segment, `width` thick, centered on the segment.
///
/// Each quad is returned as its four corners.
pub fn stroke_quads(points: &[Vector2d], closed: bool, width: f32) -> Vec<[Vector2d; 4]> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let half = width.max(0.0) * 0.5;
    let segments = if closed && n > 2 { n } else { n - 1 };

    (0..segments)
        .filter_map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            let mut dir = Vector2d::new(b.x - a.x, b.y - a.y);
            if dir.length2() == 0.0 {
                return None;
            }
            dir.normalize();
            // Extend along the segment so neighbouring quads meet at corners.
            let ext = dir * half;
            let normal = Vector2d::new(-dir.y * half, dir.x * half);
            let a = Vector2d::new(a.x - ext.x, a.y - ext.y);
            let b = Vector2d::new(b.x + ext.x, b.y + ext.y);
            Some([
                Vector2d::new(a.x + normal.x, a.y + normal.y),
                Vector2d::new(b.x + normal.x, b.y + normal.y),
                Vector2d::new(b.x - normal.x, b.y - normal.y),
                Vector2d::new(a.x - normal.x, a.y - normal.y),
            ])
        })
        .collect()
}

/// Triangle list for a filled shape.
pub fn fill_triangles(shape: &Shape) -> Vec<Vector2d> {
    match shape {
        Shape::Rect(r) => {
            let p = rect_points(r);
            vec![p[0], p[1], p[2], p[0], p[2], p[3]]
        }
        Shape::Ellipse(e) => {
            // Convex: fan from the center.
            let pts = ellipse_points(e);
            let n = pts.len();
            let mut out = Vec::with_capacity(n * 3);
            for i in 0..n {
                out.extend([e.pos, pts[i], pts[(i + 1) % n]]);
            }
            out
        }
        Shape::Polygon(p) | Shape::Line(p) => triangulate(&p.world_points()),
    }
}

/// Triangle list for a stroked outline.
pub fn stroke_triangles(shape: &Shape, width: f32) -> Vec<Vector2d> {
    let (points, closed) = outline(shape);
    stroke_quads(&points, closed, width)
        .into_iter()
        .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
        .collect()
}

/// Convenience used by tests and callers that only need a polygon's fill.
pub fn triangulate_polygon(p: &Polygon) -> Vec<Vector2d> {
    triangulate(&p.world_points())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(tris: &[Vector2d]) -> f32 {
        tris.chunks(3).map(|t| cross(t[0], t[1], t[2]).abs() * 0.5).sum()
    }

    // ── triangulation ─────────────────────────────────────────────────────

    #[test]
    fn square_becomes_two_triangles() {
        let tris = fill_triangles(&Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(tris.len(), 6);
        assert!((area_of(&tris) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn concave_polygon_area_is_preserved() {
        // L-shape, area 3.
        let l = Polygon::new(
            Vector2d::zero(),
            vec![
                Vector2d::new(0.0, 0.0),
                Vector2d::new(2.0, 0.0),
                Vector2d::new(2.0, 1.0),
                Vector2d::new(1.0, 1.0),
                Vector2d::new(1.0, 2.0),
                Vector2d::new(0.0, 2.0),
            ],
        );
        let tris = triangulate_polygon(&l);
        assert_eq!(tris.len(), 12);
        assert!((area_of(&tris) - 3.0).abs() < 1e-4);

        let mut reversed = l.clone();
        reversed.points.reverse();
        assert!((area_of(&triangulate_polygon(&reversed)) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_polygons_produce_nothing() {
        assert!(triangulate(&[Vector2d::zero(), Vector2d::new(1.0, 1.0)]).is_empty());
        let collinear = [Vector2d::zero(), Vector2d::new(1.0, 1.0), Vector2d::new(2.0, 2.0)];
        assert!(triangulate(&collinear).is_empty());
    }

    // ── ellipses & strokes ───────────────────────────────────────────────

    #[test]
    fn ellipse_points_lie_on_the_ellipse() {
        let e = Ellipse::new(10.0, 10.0, 4.0, 2.0);
        for p in ellipse_points(&e) {
            let nx = (p.x - 10.0) / 4.0;
            let ny = (p.y - 10.0) / 2.0;
            assert!((nx * nx + ny * ny - 1.0).abs() < 1e-4);
        }
        assert!(ellipse_points(&e).len() >= MIN_ELLIPSE_SEGMENTS);
    }

    #[test]
    fn open_line_has_one_quad_per_segment() {
        let pts = [Vector2d::zero(), Vector2d::new(10.0, 0.0), Vector2d::new(10.0, 10.0)];
        assert_eq!(stroke_quads(&pts, false, 2.0).len(), 2);
        assert_eq!(stroke_quads(&pts, true, 2.0).len(), 3);
    }

    #[test]
    fn stroke_quad_is_width_thick() {
        let q = stroke_quads(&[Vector2d::zero(), Vector2d::new(10.0, 0.0)], false, 4.0);
        assert_eq!(q[0][0], Vector2d::new(-2.0, 2.0));
        assert_eq!(q[0][2], Vector2d::new(12.0, -2.0));
    }
}
