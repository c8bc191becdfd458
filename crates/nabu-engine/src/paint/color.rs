/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
///
/// The executor writes these values straight into vertex data and blends with
/// `One, OneMinusSrcAlpha`, so gradient lookups interpolate in this space too.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::from_premul(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::from_premul(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    /// Creates a premultiplied color from straight RGBA bytes (`0`–`255`).
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Creates an opaque color from a `0xRRGGBB` literal.
    #[inline]
    pub fn from_rgb_hex(hex: u32) -> Self {
        Self::from_rgba8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
    }

    /// Creates a premultiplied color from premultiplied components.
    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a premultiplied color from straight alpha components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: (r.clamp(0.0, 1.0)) * a,
            g: (g.clamp(0.0, 1.0)) * a,
            b: (b.clamp(0.0, 1.0)) * a,
            a,
        }
    }

    /// Returns a straight-alpha representation.
    ///
    /// For `a == 0`, RGB is returned as 0.
    #[inline]
    pub fn to_straight(self) -> (f32, f32, f32, f32) {
        if self.a <= 0.0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let inv = 1.0 / self.a;
            (self.r * inv, self.g * inv, self.b * inv, self.a)
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Clamps all channels to [0, 1] and enforces premultiplication.
    #[inline]
    pub fn clamped(self) -> Self {
        let a = self.a.clamp(0.0, 1.0);
        Self { r: self.r.clamp(0.0, a), g: self.g.clamp(0.0, a), b: self.b.clamp(0.0, a), a }
    }

    /// Component-wise mix; `t = 0` yields `self`, `t = 1` yields `rhs`.
    #[inline]
    pub fn lerp(self, rhs: Color, t: f32) -> Color {
        Color {
            r: self.r + (rhs.r - self.r) * t,
            g: self.g + (rhs.g - self.g) * t,
            b: self.b + (rhs.b - self.b) * t,
            a: self.a + (rhs.a - self.a) * t,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Premultiplied bytes, suitable for an `Rgba8Unorm` texel.
    #[inline]
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        let q = |v: f32| (v * 255.0 + 0.5) as u8;
        [q(c.r), q(c.g), q(c.b), q(c.a)]
    }
}
