//! Geometry tessellation.
//!
//! Every function here is pure: a shape description goes in, an indexed
//! triangle [`Mesh`] in user space comes out. UVs are normalized against the
//! shape's own bounding box (or, for images, are texture coordinates), so
//! paint sources can be evaluated per fragment independently of size.

pub mod arc;
pub mod dash;
pub mod nine_slice;
pub(crate) mod path;
pub mod polygon;
pub mod round_rect;
pub mod stroke;

use crate::coords::{Affine, Rect, Vec2};

pub use arc::{MAX_ARC_SEGMENTS, arc_angles, arc_step, fill_arc, stroke_arc};
pub use dash::dash_boundaries;
pub use nine_slice::{image_quad, nine_slice};
pub use polygon::{fill_polygon, polygon_uvs, stroke_polygon};
pub use round_rect::{PerimeterLocation, RoundRect};
pub use stroke::{stroke_line, stroke_polyline};

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MeshVertex {
    pub pos: Vec2,
    pub uv: Vec2,
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub(crate) fn vertex(&mut self, pos: Vec2) -> u32 {
        self.vertex_uv(pos, Vec2::zero())
    }

    #[inline]
    pub(crate) fn vertex_uv(&mut self, pos: Vec2, uv: Vec2) -> u32 {
        let i = self.vertices.len() as u32;
        self.vertices.push(MeshVertex { pos, uv });
        i
    }

    #[inline]
    pub(crate) fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Two triangles over the loop `a b c d`.
    #[inline]
    pub(crate) fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
    }

    /// Triangle fan from `center` over consecutive `rim` points.
    pub(crate) fn fan(&mut self, center: Vec2, rim: &[Vec2]) {
        if rim.len() < 2 {
            return;
        }
        let c = self.vertex(center);
        let first = self.vertices.len() as u32;
        for p in rim {
            self.vertex(*p);
        }
        for i in 0..rim.len() as u32 - 1 {
            self.triangle(c, first + i, first + i + 1);
        }
    }

    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    pub fn bounds(&self) -> Option<Rect> {
        Rect::bounding(self.vertices.iter().map(|v| v.pos))
    }

    /// Sets every UV to the vertex position relative to `rect`.
    pub fn map_uv_to(&mut self, rect: Rect) {
        for v in &mut self.vertices {
            v.uv = rect.uv_of(v.pos);
        }
    }

    pub(crate) fn with_own_uv(mut self) -> Self {
        if let Some(b) = self.bounds() {
            self.map_uv_to(b);
        }
        self
    }

    pub fn transform(&mut self, m: Affine) {
        if m.is_identity() {
            return;
        }
        for v in &mut self.vertices {
            v.pos = m.apply(v.pos);
        }
    }
}

/// Drops consecutive points closer than a small epsilon, and the closing
/// duplicate of a closed loop.
pub(crate) fn dedup_points(points: &[Vec2], closed: bool) -> Vec<Vec2> {
    const EPS: f32 = 1e-5;
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_none_or(|q| q.distance(p) > EPS) {
            out.push(p);
        }
    }
    if closed && out.len() > 1 && out[0].distance(out[out.len() - 1]) <= EPS {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_rebases_indices() {
        let mut a = Mesh::new();
        let (i0, i1, i2) = (a.vertex(Vec2::zero()), a.vertex(Vec2::new(1.0, 0.0)), a.vertex(Vec2::new(0.0, 1.0)));
        a.triangle(i0, i1, i2);
        let b = a.clone();
        a.append(&b);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn dedup_drops_repeats_and_closing_point() {
        let p = |x: f32, y: f32| Vec2::new(x, y);
        let pts = [p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        assert_eq!(dedup_points(&pts, true).len(), 3);
        assert_eq!(dedup_points(&pts, false).len(), 4);
    }
}
