//! Frame execution: CPU replay of recorded commands, then one wgpu pass.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shader converts to NDC using a viewport uniform.
//! - Every batch samples one texture; solid fills sample a white texel.

mod common;
mod ctx;
mod executor;
mod renderer;
mod replay;
mod textures;
mod vertex;

pub use common::BlendMode;
pub use ctx::{RenderCtx, RenderTarget};
pub use executor::RenderExecutor;
pub use renderer::{CanvasRenderer, DrawReport};
pub use replay::{replay, DrawBatch, FrameGeometry, ReplayError, TextureId, TextureKey};
pub use vertex::{mode, CanvasVertex};
