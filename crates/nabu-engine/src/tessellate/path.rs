use crate::coords::Vec2;

/// Sampled curve parameterized by distance along it.
///
/// Dashing works on this 1-D domain: any shape that can report its samples
/// with their distances (chord length for polylines and arcs, the analytic
/// perimeter for round rects) shares the same dash walk.
#[derive(Debug, Clone, Default)]
pub(crate) struct Path1D {
    points: Vec<Vec2>,
    dists: Vec<f32>,
}

impl Path1D {
    /// Chord-length parameterization; a closed path repeats its first point.
    pub fn polyline(points: &[Vec2], closed: bool) -> Self {
        let mut pts = points.to_vec();
        if closed && pts.len() > 1 {
            pts.push(pts[0]);
        }
        let mut dists = Vec::with_capacity(pts.len());
        let mut acc = 0.0;
        for (i, p) in pts.iter().enumerate() {
            if i > 0 {
                acc += pts[i - 1].distance(*p);
            }
            dists.push(acc);
        }
        Self { points: pts, dists }
    }

    /// Samples with caller-supplied, non-decreasing distances.
    pub fn from_samples(points: Vec<Vec2>, dists: Vec<f32>) -> Self {
        debug_assert_eq!(points.len(), dists.len());
        Self { points, dists }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.dists.last().copied().unwrap_or(0.0)
    }

    pub fn point_at(&self, d: f32) -> Vec2 {
        let Some(&last) = self.points.last() else {
            return Vec2::zero();
        };
        let i = self.dists.partition_point(|&x| x < d);
        if i == 0 {
            return self.points[0];
        }
        if i >= self.points.len() {
            return last;
        }
        let (d0, d1) = (self.dists[i - 1], self.dists[i]);
        let t = if d1 > d0 { (d - d0) / (d1 - d0) } else { 0.0 };
        self.points[i - 1].lerp(self.points[i], t)
    }

    /// Open sub-path covering `[start, end]`.
    pub fn slice(&self, start: f32, end: f32) -> Vec<Vec2> {
        self.slice_with(start, end, |d| self.point_at(d))
    }

    /// Like [`slice`](Self::slice), but the two endpoints come from `at`
    /// instead of interpolating between samples.
    pub fn slice_with(&self, start: f32, end: f32, at: impl Fn(f32) -> Vec2) -> Vec<Vec2> {
        let lo = self.dists.partition_point(|&d| d <= start);
        let hi = self.dists.partition_point(|&d| d < end).max(lo);
        let mut out = Vec::with_capacity(hi - lo + 2);
        out.push(at(start));
        out.extend_from_slice(&self.points[lo..hi]);
        out.push(at(end));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_polyline_length_includes_closing_edge() {
        let sq = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)];
        assert_eq!(Path1D::polyline(&sq, true).length(), 40.0);
        assert_eq!(Path1D::polyline(&sq, false).length(), 30.0);
    }

    #[test]
    fn slice_keeps_interior_corners() {
        let l = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let path = Path1D::polyline(&l, false);
        assert_eq!(
            path.slice(5.0, 15.0),
            vec![Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 5.0)]
        );
    }
}
