//! Coordinate and geometry types shared by the recorder, tessellator and executor.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The executor applies the recorded [`Affine`] on the CPU; the vertex shader
//! only converts logical px to NDC using a viewport uniform.

mod rect;
mod transform;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use transform::Affine;
pub use vec2::Vec2;
pub use viewport::Viewport;
