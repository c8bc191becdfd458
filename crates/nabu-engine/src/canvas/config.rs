use crate::paint::Color;

/// Upper bounds for one frame's command buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferLimits {
    pub max_commands: usize,
    pub max_floats: usize,
    pub max_ints: usize,
    pub max_handles: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_commands: 1 << 16,
            max_floats: 1 << 20,
            max_ints: 1 << 16,
            max_handles: 1 << 16,
        }
    }
}

/// Per-canvas configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    pub limits: BufferLimits,

    /// Foreground color re-applied at every `reset()`.
    pub foreground: Color,

    /// Background color re-applied at every `reset()`; used by clears.
    pub background: Color,

    /// Width of the stroke re-applied at every `reset()`.
    pub stroke_width: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            limits: BufferLimits::default(),
            foreground: Color::BLACK,
            background: Color::WHITE,
            stroke_width: 1.0,
        }
    }
}
