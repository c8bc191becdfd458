use std::f32::consts::{FRAC_PI_2, TAU};

use crate::coords::{Rect, Vec2};
use crate::paint::Stroke;

use super::Mesh;
use super::path::Path1D;
use super::stroke::{cap, dash_path, half_width};

/// Most segments any arc uses per full turn, whatever its bounds.
pub const MAX_ARC_SEGMENTS: u32 = 4096;

#[inline]
fn min_step() -> f32 {
    TAU / MAX_ARC_SEGMENTS as f32
}

/// Angular step for an ellipse inscribed in a `w × h` box: `asin(min(1, 1/(w+h)))`.
///
/// Larger shapes get finer steps so the chord error stays below a pixel,
/// down to [`MAX_ARC_SEGMENTS`] per turn.
#[inline]
pub fn arc_step(w: f32, h: f32) -> f32 {
    let extent = w.abs() + h.abs();
    if !extent.is_finite() {
        return min_step();
    }
    (1.0 / extent).min(1.0).asin().max(min_step())
}

/// Sample angles (radians) from `start` through `start + sweep`.
///
/// Angles advance by `step` in the sweep's direction; the last one lands
/// exactly on `start + sweep`. A sweep beyond a full turn samples only the
/// final turn, so the end angle is kept and the rim is covered once.
pub fn arc_angles(start: f32, sweep: f32, step: f32) -> Vec<f32> {
    if !start.is_finite() || !sweep.is_finite() {
        return Vec::new();
    }
    let step = if step.is_finite() && step > 0.0 { step.max(min_step()) } else { FRAC_PI_2 };
    let end = start + sweep;
    let sign = sweep.signum();
    let (from, span) = if sweep.abs() > TAU { (end - sign * TAU, TAU) } else { (start, sweep.abs()) };

    let mut out = Vec::with_capacity(((span / step) as usize).saturating_add(2));
    let mut i = 0u32;
    loop {
        let a = i as f32 * step;
        if a >= span {
            break;
        }
        out.push(from + sign * a);
        i += 1;
    }
    out.push(end);
    out
}

/// Ellipse inscribed in a bounding box; angles follow the y-up convention
/// (counter-clockwise from 3 o'clock on screen).
#[derive(Debug, Copy, Clone)]
struct Ellipse {
    center: Vec2,
    rx: f32,
    ry: f32,
}

impl Ellipse {
    fn inscribed(r: Rect) -> Self {
        Self { center: r.center(), rx: r.size.x * 0.5, ry: r.size.y * 0.5 }
    }

    fn grown(self, d: f32) -> Self {
        Self { rx: (self.rx + d).max(0.0), ry: (self.ry + d).max(0.0), ..self }
    }

    #[inline]
    fn point(&self, theta: f32) -> Vec2 {
        let (s, c) = theta.sin_cos();
        Vec2::new(self.center.x + self.rx * c, self.center.y - self.ry * s)
    }
}

struct ArcSamples {
    bounds: Rect,
    ellipse: Ellipse,
    angles: Vec<f32>,
    full: bool,
}

fn sample(bounds: Rect, start_deg: f32, sweep_deg: f32) -> ArcSamples {
    let bounds = bounds.normalized();
    let angles = arc_angles(
        start_deg.to_radians(),
        sweep_deg.to_radians(),
        arc_step(bounds.size.x, bounds.size.y),
    );
    ArcSamples { bounds, ellipse: Ellipse::inscribed(bounds), angles, full: sweep_deg.abs() >= 360.0 }
}

/// Pie-shaped fill: a fan from the ellipse center over the sampled arc.
///
/// `start_deg` and `sweep_deg` are in degrees; a positive sweep runs
/// counter-clockwise on screen.
pub fn fill_arc(bounds: Rect, start_deg: f32, sweep_deg: f32) -> Mesh {
    let s = sample(bounds, start_deg, sweep_deg);
    let mut mesh = Mesh::new();
    if s.angles.len() < 2 || s.bounds.is_empty() {
        return mesh;
    }
    let rim: Vec<Vec2> = s.angles.iter().map(|a| s.ellipse.point(*a)).collect();
    mesh.fan(s.ellipse.center, &rim);
    mesh.map_uv_to(s.bounds);
    mesh
}

/// Outline of the arc: a quad strip between the ellipse grown and shrunk by
/// half the stroke width, with caps on open arcs.
pub fn stroke_arc(bounds: Rect, start_deg: f32, sweep_deg: f32, stroke: &Stroke) -> Mesh {
    let s = sample(bounds, start_deg, sweep_deg);
    let mut mesh = Mesh::new();
    if s.angles.len() < 2 {
        return mesh;
    }

    if stroke.is_dashed() {
        let center: Vec<Vec2> = s.angles.iter().map(|a| s.ellipse.point(*a)).collect();
        dash_path(&mut mesh, &Path1D::polyline(&center, false), stroke);
        return mesh.with_own_uv();
    }

    let hw = half_width(stroke);
    let outer = s.ellipse.grown(hw);
    let inner = s.ellipse.grown(-hw);

    let base = mesh.vertices.len() as u32;
    for a in &s.angles {
        mesh.vertex(outer.point(*a));
        mesh.vertex(inner.point(*a));
    }
    for k in 0..s.angles.len() as u32 - 1 {
        let a = base + 2 * k;
        let b = a + 2;
        mesh.quad(a, b, b + 1, a + 1);
    }

    if !s.full {
        let n = s.angles.len();
        let p0 = s.ellipse.point(s.angles[0]);
        let p1 = s.ellipse.point(s.angles[1]);
        let q0 = s.ellipse.point(s.angles[n - 1]);
        let q1 = s.ellipse.point(s.angles[n - 2]);
        cap(&mut mesh, p0, (p0 - p1).normalized(), hw, stroke.cap);
        cap(&mut mesh, q0, (q0 - q1).normalized(), hw, stroke.cap);
    }

    mesh.with_own_uv()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{LineCap, LineJoin};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    // ── angles ────────────────────────────────────────────────────────────

    #[test]
    fn step_formula() {
        assert!(approx(arc_step(50.0, 50.0), (0.01f32).asin()));
        assert!(approx(arc_step(0.3, 0.2), FRAC_PI_2));
        assert!(approx(arc_step(0.0, 0.0), FRAC_PI_2));
    }

    #[test]
    fn angles_end_exactly_and_stay_in_range() {
        for (start, sweep) in [(0.0, 1.0), (0.3, -2.0), (1.0, TAU), (-0.5, 0.37)] {
            let step = 0.1;
            let a = arc_angles(start, sweep, step);
            assert_eq!(*a.last().unwrap(), start + sweep);
            let (lo, hi) = if sweep >= 0.0 { (start, start + sweep) } else { (start + sweep, start) };
            assert!(a.iter().all(|x| *x >= lo - 1e-6 && *x <= hi + 1e-6));
            assert!(a.windows(2).all(|w| (w[1] - w[0]).abs() <= step + 1e-6));
        }
    }

    #[test]
    fn zero_sweep_yields_single_angle() {
        assert_eq!(arc_angles(1.0, 0.0, 0.1), vec![1.0]);
    }

    #[test]
    fn multi_turn_sweep_keeps_its_end_angle() {
        let a = arc_angles(0.5, 2.0 * TAU, 0.1);
        assert_eq!(*a.last().unwrap(), 0.5 + 2.0 * TAU);
        // Only the last turn is sampled.
        assert!(approx(a[0], 0.5 + TAU));
        assert!(a.len() <= (TAU / 0.1) as usize + 2);

        let back = arc_angles(1.0, -2.5 * TAU, 0.1);
        assert_eq!(*back.last().unwrap(), 1.0 - 2.5 * TAU);
        assert!(approx(back[0], 1.0 - 1.5 * TAU));
        assert!(back.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn multi_turn_arc_ends_where_its_sweep_says() {
        let s = Stroke::builder().width(2.0).cap(LineCap::Butt).build().unwrap();
        // 450° from 3 o'clock ends at 12 o'clock, not back at 3 o'clock.
        let m = stroke_arc(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, 450.0, &s);
        let last_outer = m.vertices[m.vertices.len() - 2].pos;
        assert!(last_outer.distance(Vec2::new(10.0, -1.0)) < 1e-3, "{last_outer:?}");
    }

    #[test]
    fn step_is_floored_for_huge_bounds() {
        assert!(approx(arc_step(1e20, 1e20), TAU / MAX_ARC_SEGMENTS as f32));
        assert!(approx(arc_step(f32::INFINITY, 0.0), TAU / MAX_ARC_SEGMENTS as f32));
        assert!(approx(arc_step(f32::NAN, 1.0), TAU / MAX_ARC_SEGMENTS as f32));
        assert!(arc_angles(0.0, TAU, arc_step(1e6, 1e6)).len() <= MAX_ARC_SEGMENTS as usize + 2);
        assert!(arc_angles(0.0, TAU, 1e-30).len() <= MAX_ARC_SEGMENTS as usize + 2);
    }

    // ── fill ──────────────────────────────────────────────────────────────

    #[test]
    fn quarter_pie_points_up_and_right() {
        let m = fill_arc(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, 90.0);
        // Center plus rim; rim starts at 3 o'clock and ends at 12 o'clock.
        assert_eq!(m.vertices[0].pos, Vec2::new(10.0, 10.0));
        assert!(m.vertices[1].pos.distance(Vec2::new(20.0, 10.0)) < 1e-4);
        assert!(m.vertices.last().unwrap().pos.distance(Vec2::new(10.0, 0.0)) < 1e-4);
        assert!(m.vertices.iter().all(|v| v.pos.x >= 10.0 - 1e-4 && v.pos.y <= 10.0 + 1e-4));
    }

    #[test]
    fn huge_oval_has_bounded_vertex_count() {
        let m = fill_arc(Rect::new(0.0, 0.0, 1e20, 1e20), 0.0, 360.0);
        assert!(!m.is_empty());
        assert!(m.vertices.len() <= MAX_ARC_SEGMENTS as usize + 3);
    }

    #[test]
    fn full_ellipse_fill_uvs_cover_box() {
        let m = fill_arc(Rect::new(10.0, 20.0, 40.0, 20.0), 0.0, 360.0);
        assert!(m.vertices.iter().all(|v| (0.0..=1.0001).contains(&v.uv.x) && (0.0..=1.0001).contains(&v.uv.y)));
        assert_eq!(m.vertices[0].uv, Vec2::new(0.5, 0.5));
    }

    // ── stroke ────────────────────────────────────────────────────────────

    #[test]
    fn stroke_strip_spans_radii() {
        let s = Stroke::builder().width(2.0).cap(LineCap::Butt).join(LineJoin::Miter).build().unwrap();
        let m = stroke_arc(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, 360.0, &s);
        let c = Vec2::new(10.0, 10.0);
        for v in &m.vertices {
            let r = v.pos.distance(c);
            assert!(approx(r, 11.0) || approx(r, 9.0), "radius {r}");
        }
    }

    #[test]
    fn dashed_arc_is_split() {
        let solid = Stroke::new(2.0).unwrap();
        let dashed = Stroke::builder().width(2.0).dash([5.0, 5.0], 0.0).build().unwrap();
        let r = Rect::new(0.0, 0.0, 40.0, 40.0);
        let a = stroke_arc(r, 0.0, 180.0, &solid);
        let b = stroke_arc(r, 0.0, 180.0, &dashed);
        assert!(!b.is_empty());
        assert!(b.bounds().unwrap().size.x <= a.bounds().unwrap().size.x + 1e-3);
        assert_ne!(a.vertices.len(), b.vertices.len());
    }
}
