/// One acquired surface texture plus the encoder recording into it.
///
/// Short-lived: holding the surface texture blocks acquisition of the next
/// one. Finish it with [`CanvasSurface::present`](super::CanvasSurface::present).
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
