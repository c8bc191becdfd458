use std::time::Duration;

use super::Canvas;

/// Outcome of executing one frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub commands: usize,
    /// Commands that failed and were skipped.
    pub skipped: usize,
    pub triangles: usize,
    pub draw_calls: usize,
    /// CPU time spent replaying and tessellating.
    pub replay_time: Duration,
}

/// Frame lifecycle notifications for one canvas.
///
/// Called on the thread that drives the transition: `frame_recorded` on the
/// producer thread inside `done()`, `frame_rendered` on the render thread
/// after presentation. Implementations must not call back into the canvas's
/// session methods.
pub trait FrameObserver: Send + Sync {
    fn frame_recorded(&self, _canvas: &Canvas, _frame_index: u64) {}

    fn frame_rendered(&self, _canvas: &Canvas, _frame_index: u64, _stats: &FrameStats) {}
}
