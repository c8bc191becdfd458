use std::f32::consts::{PI, TAU};

use crate::coords::Vec2;
use crate::paint::{LineCap, LineJoin, Stroke};

use super::arc::{arc_angles, arc_step};
use super::dash::dash_boundaries;
use super::path::Path1D;
use super::{Mesh, dedup_points};

/// Width used for zero-width strokes.
const HAIRLINE: f32 = 1.0;

#[inline]
pub(crate) fn half_width(stroke: &Stroke) -> f32 {
    if stroke.width > 0.0 { stroke.width * 0.5 } else { HAIRLINE * 0.5 }
}

/// Stroke of the segment `a → b`, dashed if the stroke has a pattern.
pub fn stroke_line(a: Vec2, b: Vec2, stroke: &Stroke) -> Mesh {
    stroke_polyline(&[a, b], false, stroke)
}

pub fn stroke_polyline(points: &[Vec2], closed: bool, stroke: &Stroke) -> Mesh {
    let pts = dedup_points(points, closed);
    let mut mesh = Mesh::new();
    if stroke.is_dashed() {
        dash_path(&mut mesh, &Path1D::polyline(&pts, closed && pts.len() > 2), stroke);
    } else {
        solid_polyline(&mut mesh, &pts, closed, stroke);
    }
    mesh.with_own_uv()
}

/// Strokes each on-interval of the dash pattern as an open polyline.
pub(crate) fn dash_path(mesh: &mut Mesh, path: &Path1D, stroke: &Stroke) {
    dash_path_with(mesh, path, stroke, |d| path.point_at(d));
}

/// Dashes `path`, taking each dash's endpoints from `at(distance)`.
pub(crate) fn dash_path_with(mesh: &mut Mesh, path: &Path1D, stroke: &Stroke, at: impl Fn(f32) -> Vec2) {
    let bounds = dash_boundaries(path.length(), &stroke.dash, stroke.dash_phase);
    for pair in bounds.chunks_exact(2) {
        let sub = path.slice_with(pair[0], pair[1], &at);
        solid_polyline(mesh, &sub, false, stroke);
    }
}

/// Offset strip along `points` with joins and (when open) caps.
pub(crate) fn solid_polyline(mesh: &mut Mesh, points: &[Vec2], closed: bool, stroke: &Stroke) {
    let pts = dedup_points(points, closed);
    let hw = half_width(stroke);

    match pts.len() {
        0 => return,
        1 => {
            dot(mesh, pts[0], hw, stroke.cap);
            return;
        }
        _ => {}
    }

    let n = pts.len();
    let closed = closed && n > 2;
    let seg_count = if closed { n } else { n - 1 };
    let dirs: Vec<Vec2> = (0..seg_count).map(|k| (pts[(k + 1) % n] - pts[k]).normalized()).collect();

    let base = mesh.vertices.len() as u32;
    for i in 0..n {
        let off = if closed {
            join_offset(dirs[(i + n - 1) % n], dirs[i], hw, stroke)
        } else if i == 0 {
            dirs[0].perp() * hw
        } else if i == n - 1 {
            dirs[n - 2].perp() * hw
        } else {
            join_offset(dirs[i - 1], dirs[i], hw, stroke)
        };
        mesh.vertex(pts[i] + off);
        mesh.vertex(pts[i] - off);
    }

    for k in 0..seg_count {
        let a = base + 2 * k as u32;
        let b = base + 2 * ((k + 1) % n) as u32;
        mesh.quad(a, b, b + 1, a + 1);
    }

    if stroke.join == LineJoin::Round {
        let joints = if closed { 0..n } else { 1..n - 1 };
        for i in joints {
            disc(mesh, pts[i], hw);
        }
    }

    if !closed {
        cap(mesh, pts[0], -dirs[0], hw, stroke.cap);
        cap(mesh, pts[n - 1], dirs[n - 2], hw, stroke.cap);
    }
}

/// Offset of a joint between unit directions `d_in` and `d_out`.
///
/// The averaged normal `(n1 + n2) / 2` is used unless a miter join is
/// requested and its length ratio stays within the miter limit.
fn join_offset(d_in: Vec2, d_out: Vec2, hw: f32, stroke: &Stroke) -> Vec2 {
    let m = (d_in.perp() + d_out.perp()) * 0.5;
    let len2 = m.dot(m);
    if len2 < 1e-8 {
        // Full reversal.
        return d_in.perp() * hw;
    }
    if stroke.join == LineJoin::Miter && 1.0 / len2.sqrt() <= stroke.miter_limit {
        return m * (hw / len2);
    }
    m * hw
}

/// End decoration at `p`; `dir` is the unit direction pointing away from the stroke.
pub(crate) fn cap(mesh: &mut Mesh, p: Vec2, dir: Vec2, hw: f32, cap: LineCap) {
    let n = dir.perp() * hw;
    match cap {
        LineCap::None | LineCap::Butt => {}
        LineCap::Square => {
            let e = dir * hw;
            let a = mesh.vertex(p + n);
            let b = mesh.vertex(p + n + e);
            let c = mesh.vertex(p - n + e);
            let d = mesh.vertex(p - n);
            mesh.quad(a, b, c, d);
        }
        LineCap::Round => {
            let e = dir * hw;
            let rim: Vec<Vec2> = arc_angles(0.0, PI, arc_step(2.0 * hw, 2.0 * hw))
                .into_iter()
                .map(|phi| {
                    let (s, c) = phi.sin_cos();
                    p + n * c + e * s
                })
                .collect();
            mesh.fan(p, &rim);
        }
    }
}

pub(crate) fn disc(mesh: &mut Mesh, center: Vec2, r: f32) {
    let rim: Vec<Vec2> = arc_angles(0.0, TAU, arc_step(2.0 * r, 2.0 * r))
        .into_iter()
        .map(|a| {
            let (s, c) = a.sin_cos();
            center + Vec2::new(c, s) * r
        })
        .collect();
    mesh.fan(center, &rim);
}

/// A zero-length stroke: round and square caps still mark the point.
fn dot(mesh: &mut Mesh, p: Vec2, hw: f32, cap: LineCap) {
    match cap {
        LineCap::Round => disc(mesh, p, hw),
        LineCap::Square => {
            let a = mesh.vertex(p + Vec2::new(-hw, -hw));
            let b = mesh.vertex(p + Vec2::new(hw, -hw));
            let c = mesh.vertex(p + Vec2::new(hw, hw));
            let d = mesh.vertex(p + Vec2::new(-hw, hw));
            mesh.quad(a, b, c, d);
        }
        LineCap::None | LineCap::Butt => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::StrokeHandle;

    fn stroke(width: f32, cap: LineCap, join: LineJoin) -> StrokeHandle {
        Stroke::builder().width(width).cap(cap).join(join).build().unwrap()
    }

    fn p(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    // ── segments ──────────────────────────────────────────────────────────

    #[test]
    fn butt_segment_is_one_quad() {
        let m = stroke_line(p(0.0, 0.0), p(10.0, 0.0), &stroke(4.0, LineCap::Butt, LineJoin::Miter));
        assert_eq!(m.vertices.len(), 4);
        assert_eq!(m.triangle_count(), 2);
        let b = m.bounds().unwrap();
        assert_eq!((b.origin.x, b.origin.y, b.size.x, b.size.y), (0.0, -2.0, 10.0, 4.0));
    }

    #[test]
    fn square_cap_extends_by_half_width() {
        let m = stroke_line(p(0.0, 0.0), p(10.0, 0.0), &stroke(4.0, LineCap::Square, LineJoin::Miter));
        let b = m.bounds().unwrap();
        assert_eq!(b.origin.x, -2.0);
        assert_eq!(b.max().x, 12.0);
    }

    #[test]
    fn round_cap_stays_within_half_width() {
        let m = stroke_line(p(0.0, 0.0), p(10.0, 0.0), &stroke(4.0, LineCap::Round, LineJoin::Miter));
        let b = m.bounds().unwrap();
        assert!(b.origin.x >= -2.0 - 1e-4 && b.origin.x < -1.9);
        assert!(b.max().x <= 12.0 + 1e-4 && b.max().x > 11.9);
        assert!(m.vertices.iter().all(|v| v.pos.y.abs() <= 2.0 + 1e-4));
    }

    #[test]
    fn dashed_line_emits_one_quad_per_dash() {
        let s = Stroke::builder()
            .width(10.0)
            .cap(LineCap::None)
            .join(LineJoin::None)
            .dash([20.0, 10.0], 0.0)
            .build()
            .unwrap();
        let m = stroke_line(p(0.0, 0.0), p(100.0, 0.0), &s);
        assert_eq!(m.vertices.len(), 16);
        assert_eq!(m.triangle_count(), 8);

        let expected = [0.0, 20.0, 30.0, 50.0, 60.0, 80.0, 90.0, 100.0];
        for v in &m.vertices {
            assert!(expected.iter().any(|x| (v.pos.x - x).abs() < 1e-4), "stray x {}", v.pos.x);
        }
        for x in expected {
            assert!(m.vertices.iter().any(|v| (v.pos.x - x).abs() < 1e-4), "missing x {x}");
        }
    }

    // ── joins ─────────────────────────────────────────────────────────────

    #[test]
    fn miter_within_limit_reaches_corner() {
        let s = stroke(2.0, LineCap::Butt, LineJoin::Miter);
        let m = stroke_polyline(&[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)], false, &s);
        // Outer miter corner of a right angle sits at (11, -1).
        assert!(m.vertices.iter().any(|v| v.pos.distance(p(11.0, -1.0)) < 1e-4));
    }

    #[test]
    fn bevel_uses_averaged_offset() {
        let s = stroke(2.0, LineCap::Butt, LineJoin::Bevel);
        let m = stroke_polyline(&[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)], false, &s);
        // (n1 + n2) / 2 = (0.5, -0.5) scaled by half width 1.
        assert!(m.vertices.iter().any(|v| v.pos.distance(p(10.5, -0.5)) < 1e-4));
        assert!(!m.vertices.iter().any(|v| v.pos.distance(p(11.0, -1.0)) < 1e-4));
    }

    #[test]
    fn miter_over_limit_falls_back() {
        let s = Stroke::builder().width(2.0).join(LineJoin::Miter).miter_limit(1.0).build().unwrap();
        let m = stroke_polyline(&[p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)], false, &s);
        assert!(m.vertices.iter().any(|v| v.pos.distance(p(10.5, -0.5)) < 1e-4));
    }

    #[test]
    fn round_join_adds_fan() {
        let pts = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        let bevel = stroke_polyline(&pts, false, &stroke(2.0, LineCap::Butt, LineJoin::Bevel));
        let round = stroke_polyline(&pts, false, &stroke(2.0, LineCap::Butt, LineJoin::Round));
        assert!(round.triangle_count() > bevel.triangle_count());
    }

    #[test]
    fn closed_square_has_one_quad_per_edge() {
        let sq = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        let m = stroke_polyline(&sq, true, &stroke(2.0, LineCap::Round, LineJoin::Miter));
        assert_eq!(m.vertices.len(), 8);
        assert_eq!(m.triangle_count(), 8);
    }

    // ── degenerate ────────────────────────────────────────────────────────

    #[test]
    fn zero_length_round_cap_is_a_dot() {
        let m = stroke_line(p(5.0, 5.0), p(5.0, 5.0), &stroke(4.0, LineCap::Round, LineJoin::Miter));
        assert!(!m.is_empty());
        let butt = stroke_line(p(5.0, 5.0), p(5.0, 5.0), &stroke(4.0, LineCap::Butt, LineJoin::Miter));
        assert!(butt.is_empty());
    }
}
