use super::{Rect, Vec2};

/// 2D affine transform stored as the top two rows of a 3×3 matrix:
///
/// ```text
/// | m00 m01 m02 |   | x |
/// | m10 m11 m12 | × | y |
/// |  0   0   1  |   | 1 |
/// ```
///
/// The canvas composes operations in call order: each `rotate`/`scale`/
/// `translate`/`shear` post-multiplies, so it applies to geometry drawn after
/// it in the coordinate space established by the calls before it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub m00: f32,
    pub m01: f32,
    pub m02: f32,
    pub m10: f32,
    pub m11: f32,
    pub m12: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine =
        Affine { m00: 1.0, m01: 0.0, m02: 0.0, m10: 0.0, m11: 1.0, m12: 0.0 };

    #[inline]
    pub const fn new(m00: f32, m01: f32, m02: f32, m10: f32, m11: f32, m12: f32) -> Self {
        Self { m00, m01, m02, m10, m11, m12 }
    }

    /// Builds a transform from a row-major 3×3 matrix. The bottom row is ignored.
    #[inline]
    pub fn from_rows(m: [[f32; 3]; 3]) -> Self {
        Self::new(m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2])
    }

    #[inline]
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    #[inline]
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Rotation by `theta` radians (clockwise on screen, since +Y points down).
    #[inline]
    pub fn rotation(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(c, -s, 0.0, s, c, 0.0)
    }

    #[inline]
    pub fn shearing(shx: f32, shy: f32) -> Self {
        Self::new(1.0, shx, 0.0, shy, 1.0, 0.0)
    }

    /// Returns `self × rhs`: `rhs` is applied to points first.
    #[inline]
    pub fn then(self, rhs: Affine) -> Affine {
        Affine {
            m00: self.m00 * rhs.m00 + self.m01 * rhs.m10,
            m01: self.m00 * rhs.m01 + self.m01 * rhs.m11,
            m02: self.m00 * rhs.m02 + self.m01 * rhs.m12 + self.m02,
            m10: self.m10 * rhs.m00 + self.m11 * rhs.m10,
            m11: self.m10 * rhs.m01 + self.m11 * rhs.m11,
            m12: self.m10 * rhs.m02 + self.m11 * rhs.m12 + self.m12,
        }
    }

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        [self.m00, self.m01, self.m02, self.m10, self.m11, self.m12]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Axis-aligned bounds of `rect` after transformation.
    pub fn map_rect(self, rect: Rect) -> Rect {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        let corners = [
            self.apply(min),
            self.apply(Vec2::new(max.x, min.y)),
            self.apply(max),
            self.apply(Vec2::new(min.x, max.y)),
        ];
        Rect::bounding(corners).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn translate_then_scale_applies_scale_first() {
        // translate(10, 0); scale(2, 2); → point is scaled, then translated.
        let t = Affine::IDENTITY
            .then(Affine::translation(10.0, 0.0))
            .then(Affine::scaling(2.0, 2.0));
        assert!(close(t.apply(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0)));
    }

    #[test]
    fn quarter_rotation_maps_x_axis_to_y_axis() {
        let t = Affine::rotation(std::f32::consts::FRAC_PI_2);
        assert!(close(t.apply(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn shear_offsets_by_other_axis() {
        let t = Affine::shearing(0.5, 0.0);
        assert!(close(t.apply(Vec2::new(0.0, 10.0)), Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn from_rows_ignores_projective_row() {
        let t = Affine::from_rows([[1.0, 0.0, 3.0], [0.0, 1.0, 4.0], [9.0, 9.0, 9.0]]);
        assert_eq!(t, Affine::translation(3.0, 4.0));
    }

    #[test]
    fn map_rect_of_rotated_square_grows() {
        let t = Affine::rotation(std::f32::consts::FRAC_PI_4);
        let b = t.map_rect(Rect::new(-1.0, -1.0, 2.0, 2.0));
        assert!((b.size.x - 2.0 * 2f32.sqrt()).abs() < 1e-4);
    }
}
