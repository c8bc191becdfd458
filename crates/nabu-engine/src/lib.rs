//! Nabu engine: a deferred 2D canvas.
//!
//! A producer thread records drawing calls into a [`canvas::Canvas`]; each
//! call becomes an opcode plus operands in a command buffer. A render thread
//! later replays the finished buffer, tessellating shapes and text into
//! triangles, and draws them with wgpu onto a [`device::CanvasSurface`].
//!
//! Resources (fonts, gradients, images) are immutable and shared by handle;
//! the GPU copies are created on first use.

mod id;

pub mod coords;
pub mod paint;
pub mod text;
pub mod tessellate;
pub mod canvas;
pub mod render;
pub mod device;
pub mod logging;
