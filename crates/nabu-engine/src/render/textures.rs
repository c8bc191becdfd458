//! GPU copies of paint resources, keyed by resource id.
//!
//! Uploads happen on first use. Entries not drawn for a while are evicted;
//! resources are immutable, so a later draw simply uploads again.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::device::{GpuError, GpuErrorCode};
use crate::paint::{GRADIENT_LUT_WIDTH, ImageFilter, ImageTiling};

use super::RenderCtx;
use super::replay::{TextureId, TextureKey};

const EVICT_AFTER_FRAMES: u64 = 600;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct SamplerKey {
    pub address: wgpu::AddressMode,
    pub filter: wgpu::FilterMode,
}

impl SamplerKey {
    const CLAMP_LINEAR: Self = Self { address: wgpu::AddressMode::ClampToEdge, filter: wgpu::FilterMode::Linear };
    const CLAMP_NEAREST: Self = Self { address: wgpu::AddressMode::ClampToEdge, filter: wgpu::FilterMode::Nearest };

    fn for_image(filter: ImageFilter, tiling: ImageTiling) -> Self {
        Self {
            address: match tiling {
                ImageTiling::Clamp => wgpu::AddressMode::ClampToEdge,
                ImageTiling::Repeat => wgpu::AddressMode::Repeat,
                ImageTiling::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
            },
            filter: match filter {
                ImageFilter::Linear => wgpu::FilterMode::Linear,
                ImageFilter::Nearest => wgpu::FilterMode::Nearest,
            },
        }
    }
}

/// Pixels and sampling of one texture, ready for upload.
pub(super) struct TextureSource<'a> {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub data: Cow<'a, [u8]>,
    pub sampler: SamplerKey,
}

impl TextureSource<'_> {
    fn bytes_per_row(&self) -> u32 {
        match self.format {
            wgpu::TextureFormat::R8Unorm => self.width,
            _ => self.width * 4,
        }
    }
}

pub(super) fn texture_source(key: &TextureKey) -> TextureSource<'_> {
    match key {
        TextureKey::White => TextureSource {
            label: "nabu white texel",
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            data: Cow::Borrowed(&[255; 4]),
            sampler: SamplerKey::CLAMP_NEAREST,
        },
        TextureKey::Gradient(g) => TextureSource {
            label: "nabu gradient lut",
            width: GRADIENT_LUT_WIDTH,
            height: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            data: Cow::Owned(g.bake_lut(GRADIENT_LUT_WIDTH)),
            sampler: SamplerKey::CLAMP_LINEAR,
        },
        TextureKey::Image(i) => TextureSource {
            label: "nabu image",
            width: i.width(),
            height: i.height(),
            format: wgpu::TextureFormat::Rgba8Unorm,
            data: Cow::Owned(i.premultiplied_pixels()),
            sampler: SamplerKey::for_image(i.options().filter, i.options().tiling),
        },
        TextureKey::FontAtlas(f) => {
            let atlas = f.atlas();
            TextureSource {
                label: "nabu glyph atlas",
                width: atlas.width,
                height: atlas.height,
                format: wgpu::TextureFormat::R8Unorm,
                data: Cow::Borrowed(&atlas.pixels),
                sampler: SamplerKey::CLAMP_LINEAR,
            }
        }
    }
}

pub(super) fn check_dimensions(width: u32, height: u32, max: u32) -> Result<(), GpuError> {
    if width == 0 || height == 0 || width > max || height > max {
        return Err(GpuError::new(
            GpuErrorCode::TextureTooLarge,
            format!("{width}x{height} (limit {max})"),
        ));
    }
    Ok(())
}

struct CachedTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    last_used: u64,
}

#[derive(Default)]
pub(super) struct TextureCache {
    entries: HashMap<TextureId, CachedTexture>,
    samplers: HashMap<SamplerKey, wgpu::Sampler>,
    frame: u64,
}

impl TextureCache {
    /// Advances the frame counter and drops stale entries.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        let frame = self.frame;
        let before = self.entries.len();
        self.entries.retain(|_, e| frame - e.last_used <= EVICT_AFTER_FRAMES);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("evicted {evicted} idle textures");
        }
    }

    /// Uploads `key` if it is not resident yet and marks it used this frame.
    pub fn prepare(
        &mut self,
        ctx: &RenderCtx<'_>,
        layout: &wgpu::BindGroupLayout,
        key: &TextureKey,
    ) -> Result<(), GpuError> {
        let id = key.id();
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.last_used = self.frame;
            return Ok(());
        }

        let src = texture_source(key);
        check_dimensions(src.width, src.height, ctx.device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d { width: src.width, height: src.height, depth_or_array_layers: 1 };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(src.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: src.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &src.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(src.bytes_per_row()),
                rows_per_image: Some(src.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.samplers.entry(src.sampler).or_insert_with(|| {
            ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("nabu paint sampler"),
                address_mode_u: src.sampler.address,
                address_mode_v: src.sampler.address,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: src.sampler.filter,
                min_filter: src.sampler.filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu paint bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        log::debug!("uploaded {} {}x{}", src.label, src.width, src.height);
        self.entries.insert(id, CachedTexture { _texture: texture, bind_group, last_used: self.frame });
        Ok(())
    }

    #[inline]
    pub fn bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        self.entries.get(&id).map(|e| &e.bind_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Color, Gradient, ImageOptions, ImageTexture};
    use crate::text::tests::ab_font;

    #[test]
    fn gradient_source_is_one_lut_row() {
        let g = Gradient::linear(Color::BLACK, Color::WHITE, 0.0).unwrap();
        let key = TextureKey::Gradient(g);
        let src = texture_source(&key);
        assert_eq!((src.width, src.height), (GRADIENT_LUT_WIDTH, 1));
        assert_eq!(src.data.len(), GRADIENT_LUT_WIDTH as usize * 4);
        assert_eq!(&src.data[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn atlas_source_is_single_channel() {
        let font = ab_font();
        let key = TextureKey::FontAtlas(font.clone());
        let src = texture_source(&key);
        assert_eq!(src.format, wgpu::TextureFormat::R8Unorm);
        assert_eq!(src.bytes_per_row(), font.atlas().width);
        assert_eq!(src.data.len(), (font.atlas().width * font.atlas().height) as usize);
    }

    #[test]
    fn image_sampler_follows_options() {
        let opts = ImageOptions { filter: ImageFilter::Nearest, tiling: ImageTiling::Repeat, ..ImageOptions::default() };
        let img = ImageTexture::new(::image::RgbaImage::new(3, 2), opts).unwrap();
        let key = TextureKey::Image(img);
        let src = texture_source(&key);
        assert_eq!(src.sampler.address, wgpu::AddressMode::Repeat);
        assert_eq!(src.sampler.filter, wgpu::FilterMode::Nearest);
        assert_eq!(src.bytes_per_row(), 12);
    }

    #[test]
    fn oversized_textures_are_rejected() {
        assert!(check_dimensions(4096, 16, 8192).is_ok());
        let err = check_dimensions(9000, 16, 8192).unwrap_err();
        assert_eq!(err.code, GpuErrorCode::TextureTooLarge);
        assert!(check_dimensions(0, 16, 8192).is_err());
    }
}
