//! Shared GPU types and helpers of the canvas pipeline.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Viewport};

// ── blend ─────────────────────────────────────────────────────────────────

/// How a batch combines with what is already in the target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Premultiplied source-over.
    Over,
    /// Overwrites the target; used by clears.
    Replace,
}

impl BlendMode {
    pub(super) fn state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Over => premul_alpha_blend(),
            BlendMode::Replace => wgpu::BlendState::REPLACE,
        }
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let over = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: over, alpha: over }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl ViewportUniform {
    pub(super) fn new(viewport: Viewport) -> Self {
        Self {
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            _pad: [0.0; 2],
        }
    }

    #[inline]
    pub(super) fn binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(std::mem::size_of::<Self>() as u64)
    }
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a logical-pixel clip rect to physical scissor arguments.
///
/// `None` clip means the whole viewport. Returns `None` when the clipped area
/// is empty; the batch is then skipped.
pub(super) fn logical_clip_to_scissor(
    clip: Option<Rect>,
    viewport: Viewport,
    scale: f32,
) -> Option<(u32, u32, u32, u32)> {
    let phys_vw = (viewport.width * scale).max(1.0) as u32;
    let phys_vh = (viewport.height * scale).max(1.0) as u32;

    let (x, y, w, h) = match clip {
        None => (0, 0, phys_vw, phys_vh),
        Some(r) => {
            let x  = ((r.origin.x * scale).max(0.0) as u32).min(phys_vw);
            let y  = ((r.origin.y * scale).max(0.0) as u32).min(phys_vh);
            let x2 = (((r.origin.x + r.size.x) * scale).max(0.0).ceil() as u32).min(phys_vw);
            let y2 = (((r.origin.y + r.size.y) * scale).max(0.0).ceil() as u32).min(phys_vh);
            (x, y, x2.saturating_sub(x), y2.saturating_sub(y))
        }
    };

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}
