use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::{Matrix2d, Vector2d};
use crate::paint::{BlendMode, Color};
use crate::render::Scissor;

// ── vertex ────────────────────────────────────────────────────────────────

/// Back buffer pixel position, straight-alpha color and texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4, // color
        2 => Float32x2  // uv
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── batches ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) enum BatchKind {
    Solid,
    /// Index into the renderer's pending image uploads.
    Image(usize),
}

/// Consecutive vertices sharing pipeline, texture and scissor.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Batch {
    pub kind: BatchKind,
    pub blend: BlendMode,
    pub scissor: Scissor,
    pub range: Range<u32>,
}

/// Vertex stream recorded between two flushes.
#[derive(Debug, Default)]
pub(super) struct BatchList {
    pub vertices: Vec<Vertex>,
    pub batches: Vec<Batch>,
}

impl BatchList {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.batches.clear();
    }

    /// Appends a triangle list, transforming each point by `transform`.
    ///
    /// Merges into the previous batch when kind, blend and scissor match.
    pub fn push(
        &mut self,
        kind: BatchKind,
        blend: BlendMode,
        scissor: Scissor,
        transform: &Matrix2d,
        color: Color,
        triangles: &[(Vector2d, [f32; 2])],
    ) {
        if triangles.is_empty() || scissor.width == 0 || scissor.height == 0 {
            return;
        }
        let start = self.vertices.len() as u32;
        let rgba = color.to_array();
        self.vertices.extend(triangles.iter().map(|(p, uv)| {
            let p = transform.apply(*p);
            Vertex { pos: [p.x, p.y], color: rgba, uv: *uv }
        }));
        let end = self.vertices.len() as u32;

        if let Some(last) = self.batches.last_mut() {
            if last.kind == kind && last.blend == blend && last.scissor == scissor && last.range.end == start {
                last.range.end = end;
                return;
            }
        }
        self.batches.push(Batch { kind, blend, scissor, range: start..end });
    }

    pub fn push_solid(
        &mut self,
        blend: BlendMode,
        scissor: Scissor,
        transform: &Matrix2d,
        color: Color,
        points: &[Vector2d],
    ) {
        let tris: Vec<(Vector2d, [f32; 2])> = points.iter().map(|p| (*p, [0.0, 0.0])).collect();
        self.push(BatchKind::Solid, blend, scissor, transform, color, &tris);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Vec<Vector2d> {
        vec![Vector2d::new(0.0, 0.0), Vector2d::new(1.0, 0.0), Vector2d::new(0.0, 1.0)]
    }

    #[test]
    fn same_state_merges_into_one_batch() {
        let mut list = BatchList::default();
        let s = Scissor::full(10, 10);
        let m = Matrix2d::identity();
        list.push_solid(BlendMode::Normal, s, &m, Color::white(), &tri());
        list.push_solid(BlendMode::Normal, s, &m, Color::black(), &tri());
        assert_eq!(list.batches.len(), 1);
        assert_eq!(list.batches[0].range, 0..6);
    }

    #[test]
    fn state_changes_split_batches() {
        let mut list = BatchList::default();
        let m = Matrix2d::identity();
        list.push_solid(BlendMode::Normal, Scissor::full(10, 10), &m, Color::white(), &tri());
        list.push_solid(BlendMode::Multiply, Scissor::full(10, 10), &m, Color::white(), &tri());
        list.push_solid(BlendMode::Multiply, Scissor::full(5, 5), &m, Color::white(), &tri());
        assert_eq!(list.batches.len(), 3);
        assert_eq!(list.batches[2].range, 6..9);
    }

    #[test]
    fn vertices_are_transformed_and_empty_scissor_is_skipped() {
        let mut list = BatchList::default();
        let mut m = Matrix2d::identity();
        m.translate(5.0, 5.0);
        list.push_solid(BlendMode::Normal, Scissor::full(10, 10), &m, Color::white(), &tri());
        assert_eq!(list.vertices[1].pos, [6.0, 5.0]);

        list.push_solid(BlendMode::Normal, Scissor::default(), &m, Color::white(), &tri());
        assert_eq!(list.vertices.len(), 3);
    }
}
