use std::fmt;
use std::sync::Arc;

use crate::coords::Vec2;
use crate::id::resource_id;

use super::Color;

/// Width of the lookup row a gradient is baked into for GPU shading.
pub const GRADIENT_LUT_WIDTH: u32 = 256;

resource_id! {
    /// Identity of a [`Gradient`]; the executor caches baked lookup rows by it.
    GradientId
}

/// Shared, immutable gradient reference.
pub type GradientHandle = Arc<Gradient>;

/// A single gradient stop.
///
/// `midpoint` is the position, relative to the segment that starts at this
/// stop, where the two colors mix 50/50. `0.5` gives a plain linear blend.
/// It is ignored on the last stop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GradientStop {
    pub color: Color,
    pub offset: f32,
    pub midpoint: f32,
}

impl GradientStop {
    #[inline]
    pub const fn new(color: Color, offset: f32) -> Self {
        Self { color, offset, midpoint: 0.5 }
    }

    #[inline]
    pub const fn with_midpoint(mut self, midpoint: f32) -> Self {
        self.midpoint = midpoint;
        self
    }
}

/// Rejection reasons for [`Gradient::new`].
#[derive(Debug, Clone, PartialEq)]
pub enum GradientError {
    NoStops,
    NonFinite { index: usize },
    OffsetOutOfRange { index: usize, offset: f32 },
    NonMonotonicStops { index: usize },
    InvalidMidpoint { index: usize, midpoint: f32 },
    InvalidRadius(f32),
}

impl fmt::Display for GradientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStops => write!(f, "gradient has no stops"),
            Self::NonFinite { index } => write!(f, "gradient stop {index} is not finite"),
            Self::OffsetOutOfRange { index, offset } => {
                write!(f, "gradient stop {index} offset {offset} is outside [0, 1]")
            }
            Self::NonMonotonicStops { index } => {
                write!(f, "gradient stop {index} offset decreases from the previous stop")
            }
            Self::InvalidMidpoint { index, midpoint } => {
                write!(f, "gradient stop {index} midpoint {midpoint} is outside (0, 1)")
            }
            Self::InvalidRadius(r) => write!(f, "gradient radius {r} must be finite and >= 0"),
        }
    }
}

impl std::error::Error for GradientError {}

/// Gradient shape, derived from the radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GradientKind {
    /// Projects onto the direction `angle` (radians).
    Linear { angle: f32 },
    /// Distance from the origin divided by `radius`.
    Radial { radius: f32 },
}

/// Multi-stop gradient evaluated in the shape's normalized UV space.
///
/// Semantics:
/// - `radius == 0` → linear along `angle`; `radius > 0` → radial.
/// - `origin` is in UV space (`(0,0)` top-left, `(1,1)` bottom-right of the
///   shape's bounding box), so shading is resolution-independent.
/// - offsets are in [0, 1] and non-decreasing; anything else is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    id: GradientId,
    stops: Vec<GradientStop>,
    radius: f32,
    angle: f32,
    origin: Vec2,
}

impl Gradient {
    pub fn new(
        stops: Vec<GradientStop>,
        radius: f32,
        angle: f32,
        origin_u: f32,
        origin_v: f32,
    ) -> Result<GradientHandle, GradientError> {
        if stops.is_empty() {
            return Err(GradientError::NoStops);
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(GradientError::InvalidRadius(radius));
        }

        let mut prev = f32::NEG_INFINITY;
        for (index, s) in stops.iter().enumerate() {
            if !s.offset.is_finite() || !s.midpoint.is_finite() || !s.color.is_finite() {
                return Err(GradientError::NonFinite { index });
            }
            if !(0.0..=1.0).contains(&s.offset) {
                return Err(GradientError::OffsetOutOfRange { index, offset: s.offset });
            }
            if s.offset < prev {
                return Err(GradientError::NonMonotonicStops { index });
            }
            if s.midpoint <= 0.0 || s.midpoint >= 1.0 {
                return Err(GradientError::InvalidMidpoint { index, midpoint: s.midpoint });
            }
            prev = s.offset;
        }

        let angle = if angle.is_finite() { angle } else { 0.0 };
        let origin = Vec2::new(origin_u, origin_v);
        let origin = if origin.is_finite() { origin } else { Vec2::zero() };

        Ok(Arc::new(Self { id: GradientId::fresh(), stops, radius, angle, origin }))
    }

    /// Two-stop linear gradient along `angle` starting at the top-left corner.
    pub fn linear(from: Color, to: Color, angle: f32) -> Result<GradientHandle, GradientError> {
        Self::new(vec![GradientStop::new(from, 0.0), GradientStop::new(to, 1.0)], 0.0, angle, 0.0, 0.0)
    }

    #[inline]
    pub fn id(&self) -> GradientId {
        self.id
    }

    #[inline]
    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn kind(&self) -> GradientKind {
        if self.radius > 0.0 {
            GradientKind::Radial { radius: self.radius }
        } else {
            GradientKind::Linear { angle: self.angle }
        }
    }

    /// Position along the gradient for a fragment at normalized `uv`, in [0, 1].
    pub fn percent_at(&self, uv: Vec2) -> f32 {
        let d = uv - self.origin;
        let p = match self.kind() {
            GradientKind::Linear { angle } => {
                let (s, c) = angle.sin_cos();
                let p = d.x * c + d.y * s;
                if p < 0.0 { p + 1.0 } else { p }
            }
            GradientKind::Radial { radius } => d.length() / radius,
        };
        p.clamp(0.0, 1.0)
    }

    /// Color at `percent`, honoring each segment's midpoint bias.
    pub fn color_at(&self, percent: f32) -> Color {
        let stops = &self.stops;
        let first = stops[0];
        let last = stops[stops.len() - 1];

        if percent <= first.offset {
            return first.color;
        }
        if percent >= last.offset {
            return last.color;
        }

        // First segment whose end reaches `percent`; exists because of the
        // bounds checks above.
        let i = stops
            .windows(2)
            .position(|w| percent <= w[1].offset)
            .unwrap_or(stops.len() - 2);
        let (s0, s1) = (stops[i], stops[i + 1]);

        let span = s1.offset - s0.offset;
        if span <= 0.0 {
            return s1.color;
        }

        let t = (percent - s0.offset) / span;
        let m = s0.midpoint;
        let biased = if t < m { 0.5 * t / m } else { 0.5 + 0.5 * (t - m) / (1.0 - m) };
        s0.color.lerp(s1.color, biased)
    }

    /// Color of the fragment at `uv`; what a CPU shading backend would write.
    #[inline]
    pub fn shade(&self, uv: Vec2) -> Color {
        self.color_at(self.percent_at(uv))
    }

    /// Bakes [`color_at`](Self::color_at) into `width` premultiplied RGBA8 texels.
    pub fn bake_lut(&self, width: u32) -> Vec<u8> {
        let width = width.max(2);
        let mut out = Vec::with_capacity(width as usize * 4);
        for i in 0..width {
            let p = i as f32 / (width - 1) as f32;
            out.extend_from_slice(&self.color_at(p).to_premul_rgba8());
        }
        out
    }
}
