use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::canvas::{Canvas, FrameStats};
use crate::render::RenderExecutor;

use super::{CanvasSurface, GpuError, GpuErrorCode, GpuInit, SurfaceErrorAction};

/// Device and queue, reachable only through [`RenderContext::lock`].
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// Process-wide GPU context shared by every canvas.
///
/// The device lives behind a mutex that doubles as the global render lock:
/// acquiring a surface texture, executing a frame, submitting and presenting
/// all happen while it is held, so frames of different canvases never
/// interleave on the queue.
pub struct RenderContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    init: GpuInit,
    gpu: Mutex<Gpu>,
}

/// Result of one [`RenderContext::render`] call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderOutcome {
    /// No frame was pending.
    Idle,
    Rendered(FrameStats),
    /// The surface has zero size; the frame was dropped so the producer is
    /// not stalled.
    Discarded,
    /// The surface could not provide a texture; the frame stays pending.
    SurfaceError(SurfaceErrorAction),
}

impl RenderContext {
    /// Opens a device without a surface to check compatibility against.
    pub fn open(init: GpuInit) -> Result<Arc<Self>> {
        let (ctx, _) = pollster::block_on(Self::request(init, None))?;
        Ok(ctx)
    }

    /// Opens a device able to present to `target`, plus the configured
    /// surface for it. `size` is in physical pixels.
    pub fn open_with_surface(
        init: GpuInit,
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<(Arc<Self>, CanvasSurface)> {
        let (ctx, surface) = pollster::block_on(Self::request(init, Some((target.into(), size))))?;
        let surface = surface.ok_or_else(|| GpuError::new(GpuErrorCode::SurfaceCreate, "surface missing"))?;
        Ok((ctx, surface))
    }

    async fn request(
        init: GpuInit,
        target: Option<(wgpu::SurfaceTarget<'static>, (u32, u32))>,
    ) -> Result<(Arc<Self>, Option<CanvasSurface>)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let pending = match target {
            Some((target, size)) => {
                let surface = instance
                    .create_surface(target)
                    .map_err(|e| GpuError::new(GpuErrorCode::SurfaceCreate, e.to_string()))?;
                Some((surface, size))
            }
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: pending.as_ref().map(|(s, _)| s),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuError::new(GpuErrorCode::NoAdapter, e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nabu-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GpuError::new(GpuErrorCode::DeviceRequest, e.to_string()))?;

        let info = adapter.get_info();
        log::info!("using {} ({:?})", info.name, info.backend);

        let surface = match pending {
            Some((surface, size)) => Some(CanvasSurface::configure(surface, &adapter, &device, &init, size)?),
            None => None,
        };

        let ctx = Arc::new(Self { instance, adapter, init, gpu: Mutex::new(Gpu { device, queue }) });
        Ok((ctx, surface))
    }

    /// Creates a surface for another window on this device.
    pub fn create_surface(
        &self,
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<CanvasSurface, GpuError> {
        let surface = self
            .instance
            .create_surface(target)
            .map_err(|e| GpuError::new(GpuErrorCode::SurfaceCreate, e.to_string()))?;
        if !self.adapter.is_surface_supported(&surface) {
            return Err(GpuError::new(GpuErrorCode::SurfaceUnsupported, ""));
        }
        let gpu = self.lock();
        CanvasSurface::configure(surface, &self.adapter, &gpu.device, &self.init, size)
    }

    /// Takes the global render lock.
    pub fn lock(&self) -> MutexGuard<'_, Gpu> {
        self.gpu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Resizes `surface` under the render lock.
    pub fn resize(&self, surface: &mut CanvasSurface, width: u32, height: u32) {
        let gpu = self.lock();
        surface.resize(&gpu.device, width, height);
    }

    /// Executes the pending frame of `canvas` onto `surface` and presents it.
    ///
    /// On success the frame is completed (releasing a producer blocked in
    /// `reset()`) and the canvas's observers get `frame_rendered`.
    pub fn render(&self, canvas: &Canvas, executor: &mut RenderExecutor, surface: &CanvasSurface) -> RenderOutcome {
        let store = canvas.store();
        if !store.has_pending_frame() {
            return RenderOutcome::Idle;
        }

        let gpu = self.lock();

        if !surface.is_drawable() {
            if let Some(frame) = store.take_frame() {
                log::debug!("surface not drawable; dropping frame {}", frame.index);
                store.complete_frame(frame.buffer);
            }
            return RenderOutcome::Discarded;
        }

        let mut target = match surface.begin_frame(&gpu.device) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("surface texture unavailable: {e}");
                return RenderOutcome::SurfaceError(surface.handle_error(&gpu.device, e));
            }
        };

        let Some(frame) = store.take_frame() else {
            return RenderOutcome::Idle;
        };

        let stats = executor.execute(&gpu, surface, &mut target, &frame);
        surface.present(&gpu.queue, target);
        drop(gpu);

        store.complete_frame(frame.buffer);
        log::trace!(
            "frame {} rendered: {} commands, {} triangles, {} draw calls",
            frame.index,
            stats.commands,
            stats.triangles,
            stats.draw_calls
        );
        canvas.notify_rendered(frame.index, &stats);
        RenderOutcome::Rendered(stats)
    }
}
