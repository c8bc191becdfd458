use std::time::Instant;

use crate::canvas::{FrameStats, RecordedFrame};
use crate::device::{CanvasSurface, Gpu, SurfaceFrame};

use super::renderer::CanvasRenderer;
use super::{RenderCtx, RenderTarget, replay};

/// Turns recorded frames into GPU work for one surface.
///
/// Owned by the render thread; holds the pipelines and the texture cache so
/// they survive from frame to frame.
#[derive(Default)]
pub struct RenderExecutor {
    renderer: CanvasRenderer,
}

impl RenderExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays `frame` and encodes it into `target`. Called with the render
    /// lock held; never fails, individual bad commands are skipped and
    /// counted.
    pub(crate) fn execute(
        &mut self,
        gpu: &Gpu,
        surface: &CanvasSurface,
        target: &mut SurfaceFrame,
        frame: &RecordedFrame,
    ) -> FrameStats {
        let viewport = surface.viewport();

        let start = Instant::now();
        let geo = replay(&frame.buffer, &frame.initial_state, viewport);
        let replay_time = start.elapsed();

        let mut stats = FrameStats {
            commands: geo.commands,
            skipped: geo.skipped,
            triangles: geo.triangle_count(),
            draw_calls: 0,
            replay_time,
        };

        let ctx = RenderCtx::new(&gpu.device, &gpu.queue, surface.format(), viewport, surface.scale_factor());
        let mut rt = RenderTarget::new(&mut target.encoder, &target.view);

        match self.renderer.draw(&ctx, &mut rt, &geo) {
            Ok(report) => {
                stats.draw_calls = report.draw_calls;
                if report.skipped_batches > 0 {
                    log::warn!("frame {}: {} batches skipped", frame.index, report.skipped_batches);
                }
            }
            Err(e) => log::error!("frame {}: {e}", frame.index),
        }

        stats
    }
}
