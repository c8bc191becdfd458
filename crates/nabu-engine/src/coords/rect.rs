use super::Vec2;

/// Axis-aligned rectangle: `origin` is the top-left corner, `size` may be
/// negative until [`normalized`](Rect::normalized).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { origin: min, size: max - min }
    }

    /// Tight bounding box of `points`, or `None` for an empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = Vec2>) -> Option<Rect> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), p| {
            (Vec2::new(lo.x.min(p.x), lo.y.min(p.y)), Vec2::new(hi.x.max(p.x), hi.y.max(p.y)))
        });
        Some(Rect::from_min_max(lo, hi))
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0)
    }

    /// Flips negative extents so the origin is the true top-left corner.
    pub fn normalized(self) -> Self {
        let (x, w) = if self.size.x < 0.0 { (self.origin.x + self.size.x, -self.size.x) } else { (self.origin.x, self.size.x) };
        let (y, h) = if self.size.y < 0.0 { (self.origin.y + self.size.y, -self.size.y) } else { (self.origin.y, self.size.y) };
        Rect::new(x, y, w, h)
    }

    /// Overlap of two rects; `None` when they only touch or are disjoint.
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let (a, b) = (self.normalized(), other.normalized());
        let lo = Vec2::new(a.origin.x.max(b.origin.x), a.origin.y.max(b.origin.y));
        let hi = Vec2::new(a.max().x.min(b.max().x), a.max().y.min(b.max().y));
        let r = Rect::from_min_max(lo, hi);
        (!r.is_empty()).then_some(r)
    }

    /// Position of `p` relative to this rect, with `min → (0,0)` and `max → (1,1)`.
    ///
    /// A degenerate axis maps to 0 so zero-height lines still get finite UVs.
    #[inline]
    pub fn uv_of(self, p: Vec2) -> Vec2 {
        let rel = |v: f32, o: f32, s: f32| if s != 0.0 { (v - o) / s } else { 0.0 };
        Vec2::new(rel(p.x, self.origin.x, self.size.x), rel(p.y, self.origin.y, self.size.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_flips_negative_extents() {
        assert_eq!(Rect::new(10.0, 0.0, -4.0, 5.0).normalized(), Rect::new(6.0, 0.0, 4.0, 5.0));
        assert_eq!(Rect::new(0.0, 10.0, 5.0, -3.0).normalized(), Rect::new(0.0, 7.0, 5.0, 3.0));
    }

    #[test]
    fn center_is_midpoint_of_extents() {
        assert_eq!(Rect::new(10.0, 20.0, 40.0, 20.0).center(), Vec2::new(30.0, 30.0));
        assert_eq!(Rect::new(10.0, 0.0, -4.0, 6.0).center(), Vec2::new(8.0, 3.0));
    }

    #[test]
    fn intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersect(Rect::new(5.0, 5.0, 10.0, 10.0)), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(Rect::new(10.0, 0.0, 10.0, 10.0)), None);
        assert_eq!(a.intersect(Rect::new(8.0, 2.0, -6.0, 2.0)), Some(Rect::new(2.0, 2.0, 6.0, 2.0)));
    }

    #[test]
    fn bounding_of_points() {
        let pts = [Vec2::new(3.0, 7.0), Vec2::new(-1.0, 2.0), Vec2::new(5.0, 4.0)];
        assert_eq!(Rect::bounding(pts), Some(Rect::new(-1.0, 2.0, 6.0, 5.0)));
        assert_eq!(Rect::bounding(std::iter::empty()), None);
    }

    #[test]
    fn uv_of_corners_and_midpoints() {
        let rect = Rect::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(rect.uv_of(Vec2::new(10.0, 10.0)), Vec2::new(0.0, 0.0));
        assert_eq!(rect.uv_of(Vec2::new(60.0, 60.0)), Vec2::new(1.0, 1.0));
        assert_eq!(rect.uv_of(Vec2::new(35.0, 10.0)), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn degenerate_axis_maps_to_zero() {
        let line = Rect::new(0.0, 5.0, 100.0, 0.0);
        assert_eq!(line.uv_of(Vec2::new(50.0, 5.0)), Vec2::new(0.5, 0.0));
        assert!(line.is_empty());
    }
}
