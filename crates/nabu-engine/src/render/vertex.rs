use bytemuck::{Pod, Zeroable};

/// Fragment paint modes, carried in `CanvasVertex::paint[0]`.
pub mod mode {
    pub const SOLID: f32 = 0.0;
    pub const IMAGE: f32 = 1.0;
    /// R8 coverage times the vertex color.
    pub const GLYPH: f32 = 2.0;
    /// `paint[1..3]` = origin u, origin v, angle.
    pub const LINEAR: f32 = 3.0;
    /// `paint[1..3]` = origin u, origin v, radius.
    pub const RADIAL: f32 = 4.0;
}

/// Vertex layout (48 bytes):
///
///  offset  0  pos    [f32; 2]   loc 0   logical px
///  offset  8  uv     [f32; 2]   loc 1
///  offset 16  color  [f32; 4]   loc 2   premultiplied
///  offset 32  paint  [f32; 4]   loc 3   mode + parameters
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct CanvasVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub paint: [f32; 4],
}

impl CanvasVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Float32x4, // color
        3 => Float32x4  // paint
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CanvasVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    #[inline]
    pub fn mode(&self) -> f32 {
        self.paint[0]
    }
}
