//! Paint model: how covered pixels get their color, and how outlines are shaped.
//!
//! Scope:
//! - color representation (premultiplied alpha)
//! - paint sources (solid, gradient, image texture)
//! - stroke description
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod gradient;
pub mod image;
pub mod stroke;

pub use self::color::Color;
pub use self::gradient::{GRADIENT_LUT_WIDTH, Gradient, GradientError, GradientHandle, GradientId, GradientKind, GradientStop};
pub use self::image::{ImageError, ImageFilter, ImageId, ImageOptions, ImageTexture, ImageTextureHandle, ImageTiling, Margins};
pub use self::stroke::{LineCap, LineJoin, Stroke, StrokeBuilder, StrokeError, StrokeHandle};

/// Paint source for filled and stroked geometry.
///
/// Gradient and image texture are mutually exclusive: selecting one replaces
/// the other. `Solid` uses the state's foreground color.
#[derive(Debug, Clone, Default)]
pub enum PaintSource {
    #[default]
    Solid,
    Gradient(GradientHandle),
    Image(ImageTextureHandle),
}

impl PaintSource {
    #[inline]
    pub fn gradient(&self) -> Option<&GradientHandle> {
        match self {
            PaintSource::Gradient(g) => Some(g),
            _ => None,
        }
    }

    #[inline]
    pub fn image(&self) -> Option<&ImageTextureHandle> {
        match self {
            PaintSource::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Selects `gradient`, or falls back to `Solid` when `None` clears an
    /// active gradient. Clearing leaves an active image untouched.
    pub fn with_gradient(self, gradient: Option<GradientHandle>) -> PaintSource {
        match (gradient, self) {
            (Some(g), _) => PaintSource::Gradient(g),
            (None, PaintSource::Gradient(_)) => PaintSource::Solid,
            (None, other) => other,
        }
    }

    /// Image counterpart of [`with_gradient`](Self::with_gradient).
    pub fn with_image(self, image: Option<ImageTextureHandle>) -> PaintSource {
        match (image, self) {
            (Some(i), _) => PaintSource::Image(i),
            (None, PaintSource::Image(_)) => PaintSource::Solid,
            (None, other) => other,
        }
    }
}
