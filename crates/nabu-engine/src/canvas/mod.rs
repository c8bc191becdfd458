//! Deferred recording surface.
//!
//! A producer thread records a frame through a [`Canvas`] between `reset()`
//! and `done()`; the recording lands in a [`CommandBuffer`] that the render
//! thread later takes from the [`CommandStore`] and replays.

pub mod buffer;
pub mod config;
pub mod error;
pub mod observer;
pub mod opcode;
pub mod recorder;
pub mod state;
pub mod store;

pub use buffer::{Command, CommandBuffer, CommandView, Operand};
pub use config::{BufferLimits, CanvasConfig};
pub use error::{CanvasError, Pool};
pub use observer::{FrameObserver, FrameStats};
pub use opcode::{Arity, FloatArity, IMAGE_FLAG_BACKGROUND, Opcode, VERTEX_STRIDE};
pub use recorder::Canvas;
pub use state::GraphicsState;
pub use store::{CommandStore, RecordedFrame};
