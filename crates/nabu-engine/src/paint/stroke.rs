use std::fmt;
use std::sync::Arc;

/// Shared, immutable stroke reference.
pub type StrokeHandle = Arc<Stroke>;

/// End decoration of an open stroke.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum LineCap {
    None,
    #[default]
    Butt,
    Round,
    Square,
}

/// Decoration where two stroked segments meet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum LineJoin {
    None,
    Bevel,
    #[default]
    Miter,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrokeError {
    InvalidWidth(f32),
    InvalidMiterLimit(f32),
    InvalidDash { index: usize, value: f32 },
    InvalidDashPhase(f32),
}

impl fmt::Display for StrokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWidth(w) => write!(f, "stroke width {w} must be finite and >= 0"),
            Self::InvalidMiterLimit(m) => write!(f, "miter limit {m} must be finite and >= 1"),
            Self::InvalidDash { index, value } => {
                write!(f, "dash entry {index} ({value}) must be finite and >= 0")
            }
            Self::InvalidDashPhase(p) => write!(f, "dash phase {p} must be finite"),
        }
    }
}

impl std::error::Error for StrokeError {}

/// Outline description used by every `draw_*` call.
///
/// Compared by value; two strokes built from the same parameters are equal
/// even though they are separate allocations.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Alternating on/off lengths; empty means a solid stroke.
    pub dash: Vec<f32>,
    pub dash_phase: f32,
}

impl Stroke {
    pub const DEFAULT_MITER_LIMIT: f32 = 10.0;

    /// Solid stroke of `width` with default cap and join.
    pub fn new(width: f32) -> Result<StrokeHandle, StrokeError> {
        Self::builder().width(width).build()
    }

    pub fn builder() -> StrokeBuilder {
        StrokeBuilder::default()
    }

    #[inline]
    pub fn is_dashed(&self) -> bool {
        !self.dash.is_empty()
    }
}

/// Builder for [`Stroke`]; validation happens once in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    width: f32,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
    dash: Vec<f32>,
    dash_phase: f32,
}

impl Default for StrokeBuilder {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: Stroke::DEFAULT_MITER_LIMIT,
            dash: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

impl StrokeBuilder {
    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn miter_limit(mut self, limit: f32) -> Self {
        self.miter_limit = limit;
        self
    }

    pub fn dash(mut self, dash: impl Into<Vec<f32>>, phase: f32) -> Self {
        self.dash = dash.into();
        self.dash_phase = phase;
        self
    }

    pub fn build(self) -> Result<StrokeHandle, StrokeError> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(StrokeError::InvalidWidth(self.width));
        }
        if !self.miter_limit.is_finite() || self.miter_limit < 1.0 {
            return Err(StrokeError::InvalidMiterLimit(self.miter_limit));
        }
        if !self.dash_phase.is_finite() {
            return Err(StrokeError::InvalidDashPhase(self.dash_phase));
        }
        if let Some((index, &value)) =
            self.dash.iter().enumerate().find(|(_, d)| !d.is_finite() || **d < 0.0)
        {
            return Err(StrokeError::InvalidDash { index, value });
        }

        let dash = if self.dash.iter().all(|d| *d == 0.0) { Vec::new() } else { self.dash };

        Ok(Arc::new(Stroke {
            width: self.width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            dash,
            dash_phase: self.dash_phase,
        }))
    }
}
