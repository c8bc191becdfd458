use crate::coords::Viewport;

use super::{GpuError, GpuErrorCode, GpuInit, SurfaceErrorAction, SurfaceFrame};

/// Swapchain a canvas is presented to.
///
/// Created by [`RenderContext`](super::RenderContext) from any
/// `wgpu::SurfaceTarget`; sizes are physical pixels, and the canvas draws in
/// logical pixels (`physical / scale_factor`).
pub struct CanvasSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    scale_factor: f32,
}

impl CanvasSurface {
    pub(super) fn configure(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        init: &GpuInit,
        (width, height): (u32, u32),
    ) -> Result<Self, GpuError> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .ok_or_else(|| GpuError::new(GpuErrorCode::SurfaceUnsupported, "no supported surface formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        if width > 0 && height > 0 {
            surface.configure(device, &config);
        }
        log::debug!("surface configured: {width}x{height} {format:?}");

        Ok(Self { surface, config, size: (width, height), scale_factor: 1.0 })
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.size.0 > 0 && self.size.1 > 0
    }

    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Drawable size in logical pixels.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.size.0 as f32 / self.scale_factor, self.size.1 as f32 / self.scale_factor)
    }

    /// Reconfigures the swapchain. A zero size is recorded but configuration
    /// is deferred until the surface is drawable again.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.size = (width, height);
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
    }

    pub(crate) fn begin_frame(&self, device: &wgpu::Device) -> Result<SurfaceFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nabu frame encoder"),
        });
        Ok(SurfaceFrame { surface_texture, view, encoder })
    }

    /// Submits the frame's commands and presents its texture.
    pub(crate) fn present(&self, queue: &wgpu::Queue, frame: SurfaceFrame) {
        let SurfaceFrame { surface_texture, view, encoder } = frame;
        queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    pub(crate) fn handle_error(&self, device: &wgpu::Device, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = map_surface_error(err);
        if action == SurfaceErrorAction::Reconfigured && self.is_drawable() {
            self.surface.configure(device, &self.config);
        }
        action
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;
    let wanted = |f: &wgpu::TextureFormat| f.is_srgb() == prefer_srgb;
    Some(caps.formats.iter().copied().find(wanted).unwrap_or(first))
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(crate) fn map_surface_error(err: wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    fn caps(formats: Vec<F>, alpha: Vec<wgpu::CompositeAlphaMode>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities { formats, alpha_modes: alpha, ..Default::default() }
    }

    #[test]
    fn format_follows_srgb_preference() {
        let c = caps(vec![F::Bgra8UnormSrgb, F::Bgra8Unorm], vec![]);
        assert_eq!(choose_surface_format(&c, false), Some(F::Bgra8Unorm));
        assert_eq!(choose_surface_format(&c, true), Some(F::Bgra8UnormSrgb));
        let only = caps(vec![F::Rgba8UnormSrgb], vec![]);
        assert_eq!(choose_surface_format(&only, false), Some(F::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&caps(vec![], vec![]), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        use wgpu::CompositeAlphaMode as A;
        let c = caps(vec![F::Bgra8Unorm], vec![A::Opaque, A::PreMultiplied]);
        assert_eq!(choose_alpha_mode(&c, Some(A::PreMultiplied)), A::PreMultiplied);
        assert_eq!(choose_alpha_mode(&c, Some(A::PostMultiplied)), A::Opaque);
        assert_eq!(choose_alpha_mode(&caps(vec![], vec![]), None), A::Auto);
    }

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(map_surface_error(wgpu::SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(map_surface_error(wgpu::SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
        assert_eq!(map_surface_error(wgpu::SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
    }
}
