use crate::paint::{Color, PaintSource, Stroke, StrokeHandle};
use crate::text::FontHandle;

use super::config::CanvasConfig;

/// Client-visible drawing state.
///
/// The recorder keeps a "current" copy; the executor replays from a snapshot
/// taken at `reset()` and mutates it only through recorded state changes.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub color: Color,
    pub background: Color,
    pub font: Option<FontHandle>,
    pub paint: PaintSource,
    pub stroke: StrokeHandle,
}

impl GraphicsState {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            color: config.foreground,
            background: config.background,
            font: None,
            paint: PaintSource::Solid,
            stroke: default_stroke(config),
        }
    }

    /// Restores colors and stroke to the configured defaults. Font and paint
    /// source are left alone.
    pub fn reapply_defaults(&mut self, config: &CanvasConfig) {
        self.color = config.foreground;
        self.background = config.background;
        self.stroke = default_stroke(config);
    }
}

fn default_stroke(config: &CanvasConfig) -> StrokeHandle {
    Stroke::new(config.stroke_width).unwrap_or_else(|e| {
        log::warn!("invalid default stroke width ({e}); using 1.0");
        std::sync::Arc::new(Stroke {
            width: 1.0,
            cap: Default::default(),
            join: Default::default(),
            miter_limit: Stroke::DEFAULT_MITER_LIMIT,
            dash: Vec::new(),
            dash_phase: 0.0,
        })
    })
}
