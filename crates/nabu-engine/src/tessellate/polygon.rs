use crate::coords::{Rect, Vec2};
use crate::paint::Stroke;

use super::Mesh;
use super::stroke::stroke_polyline;

/// Per-vertex UVs normalized against the points' bounding box.
pub fn polygon_uvs(points: &[Vec2]) -> Vec<Vec2> {
    match Rect::bounding(points.iter().copied()) {
        Some(b) => points.iter().map(|p| b.uv_of(*p)).collect(),
        None => Vec::new(),
    }
}

/// Fills a simple polygon.
///
/// - 3 points: one triangle.
/// - 4 points: two triangles sharing the diagonal with the larger
///   dominant-axis extent.
/// - more: a fan from the vertex centroid.
///
/// `uvs` pairs with `points`; when the lengths differ they are recomputed
/// from the bounding box.
pub fn fill_polygon(points: &[Vec2], uvs: &[Vec2]) -> Mesh {
    let mut mesh = Mesh::new();
    let n = points.len();
    if n < 3 {
        return mesh;
    }

    let computed;
    let uvs = if uvs.len() == n {
        uvs
    } else {
        computed = polygon_uvs(points);
        &computed
    };

    for (p, uv) in points.iter().zip(uvs) {
        mesh.vertex_uv(*p, *uv);
    }

    match n {
        3 => mesh.triangle(0, 1, 2),
        4 => {
            let extent = |d: Vec2| d.x.abs().max(d.y.abs());
            if extent(points[2] - points[0]) >= extent(points[3] - points[1]) {
                mesh.quad(0, 1, 2, 3);
            } else {
                mesh.triangle(0, 1, 3);
                mesh.triangle(1, 2, 3);
            }
        }
        _ => {
            let count = n as f32;
            let centroid = points.iter().fold(Vec2::zero(), |acc, p| acc + *p) / count;
            let centroid_uv = uvs.iter().fold(Vec2::zero(), |acc, p| acc + *p) / count;
            let c = mesh.vertex_uv(centroid, centroid_uv);
            for i in 0..n as u32 {
                mesh.triangle(c, i, (i + 1) % n as u32);
            }
        }
    }
    mesh
}

/// Closed outline of a polygon.
pub fn stroke_polygon(points: &[Vec2], stroke: &Stroke) -> Mesh {
    stroke_polyline(points, true, stroke)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn rect_fill_is_single_quad_with_corner_uvs() {
        let pts = [p(10.0, 10.0), p(60.0, 10.0), p(60.0, 60.0), p(10.0, 60.0)];
        let m = fill_polygon(&pts, &polygon_uvs(&pts));
        assert_eq!(m.vertices.len(), 4);
        assert_eq!(m.triangle_count(), 2);

        let mut uvs: Vec<(f32, f32)> = m.vertices.iter().map(|v| (v.uv.x, v.uv.y)).collect();
        uvs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(uvs, vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn quad_splits_along_longer_diagonal() {
        // Kite: 0-2 is short, 1-3 is long.
        let pts = [p(0.0, 0.0), p(10.0, -2.0), p(20.0, 0.0), p(10.0, 30.0)];
        let m = fill_polygon(&pts, &[]);
        assert_eq!(m.indices, vec![0, 1, 3, 1, 2, 3]);
    }

    #[test]
    fn pentagon_fans_from_centroid() {
        let pts = [p(0.0, 0.0), p(10.0, 0.0), p(12.0, 8.0), p(5.0, 12.0), p(-2.0, 8.0)];
        let m = fill_polygon(&pts, &[]);
        assert_eq!(m.vertices.len(), 6);
        assert_eq!(m.triangle_count(), 5);
        assert_eq!(m.vertices[5].pos, p(5.0, 5.6));
    }

    #[test]
    fn fewer_than_three_points_is_empty() {
        assert!(fill_polygon(&[p(0.0, 0.0), p(1.0, 1.0)], &[]).is_empty());
    }
}
