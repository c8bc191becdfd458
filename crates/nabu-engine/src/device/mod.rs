//! GPU device and surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating and configuring surfaces (swapchains) from any `SurfaceTarget`
//! - the global render lock under which frames are executed and presented

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::{Gpu, RenderContext, RenderOutcome};
pub use error::{GpuError, GpuErrorCode, SurfaceErrorAction};
pub use frame::SurfaceFrame;
pub use init::GpuInit;
pub use surface::CanvasSurface;
