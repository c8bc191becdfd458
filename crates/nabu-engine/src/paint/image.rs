use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;

use crate::id::resource_id;

resource_id! {
    /// Identity of an [`ImageTexture`]; the executor uploads each id once.
    ImageId
}

/// Shared, immutable image reference.
pub type ImageTextureHandle = Arc<ImageTexture>;

/// Sampling filter used when the image is scaled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ImageFilter {
    #[default]
    Linear,
    Nearest,
}

/// Addressing outside the [0, 1] UV range when used as a paint source.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ImageTiling {
    #[default]
    Clamp,
    Repeat,
    MirrorRepeat,
}

/// Nine-slice margins in source pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Margins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margins {
    pub const fn uniform(m: u32) -> Self {
        Self { left: m, top: m, right: m, bottom: m }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::default()
    }
}

/// Sampling options attached to an image at creation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ImageOptions {
    pub filter: ImageFilter,
    pub tiling: ImageTiling,
    /// Repetitions across the shape when used as a paint source.
    pub u_scale: f32,
    pub v_scale: f32,
    pub margins: Margins,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            filter: ImageFilter::default(),
            tiling: ImageTiling::default(),
            u_scale: 1.0,
            v_scale: 1.0,
            margins: Margins::default(),
        }
    }
}

#[derive(Debug)]
pub enum ImageError {
    Codec(image::ImageError),
    Empty,
    InvalidScale { u: f32, v: f32 },
    MarginsExceedImage { margins: Margins, width: u32, height: u32 },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "image codec error: {e}"),
            Self::Empty => write!(f, "image has zero width or height"),
            Self::InvalidScale { u, v } => write!(f, "image scale ({u}, {v}) must be finite and > 0"),
            Self::MarginsExceedImage { margins, width, height } => write!(
                f,
                "nine-slice margins {margins:?} do not fit a {width}x{height} image"
            ),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        Self::Codec(e)
    }
}

/// Decodes any supported file into RGBA8.
pub fn decode_file(path: impl AsRef<Path>) -> Result<RgbaImage, ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Decodes an in-memory encoded image into RGBA8.
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encodes `image`; the format follows the path extension.
pub fn encode_file(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), ImageError> {
    image.save(path)?;
    Ok(())
}

/// Decoded bitmap plus the sampling policy it is drawn with.
#[derive(Debug)]
pub struct ImageTexture {
    id: ImageId,
    image: RgbaImage,
    options: ImageOptions,
}

impl ImageTexture {
    pub fn new(image: RgbaImage, options: ImageOptions) -> Result<ImageTextureHandle, ImageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }

        let (u, v) = (options.u_scale, options.v_scale);
        if !(u.is_finite() && v.is_finite() && u > 0.0 && v > 0.0) {
            return Err(ImageError::InvalidScale { u, v });
        }

        let m = options.margins;
        if m.left.saturating_add(m.right) > width || m.top.saturating_add(m.bottom) > height {
            return Err(ImageError::MarginsExceedImage { margins: m, width, height });
        }

        Ok(Arc::new(Self { id: ImageId::fresh(), image, options }))
    }

    pub fn open(path: impl AsRef<Path>, options: ImageOptions) -> Result<ImageTextureHandle, ImageError> {
        let path = path.as_ref();
        let image = decode_file(path)?;
        log::debug!("decoded image {} ({}x{})", path.display(), image.width(), image.height());
        Self::new(image, options)
    }

    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA8 with color channels multiplied by alpha, the layout the GPU blend expects.
    pub fn premultiplied_pixels(&self) -> Vec<u8> {
        let mut out = self.image.as_raw().clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 255]) }
        })
    }

    #[test]
    fn rejects_empty_and_oversized_margins() {
        assert!(matches!(
            ImageTexture::new(RgbaImage::new(0, 4), ImageOptions::default()),
            Err(ImageError::Empty)
        ));

        let opts = ImageOptions { margins: Margins::uniform(3), ..Default::default() };
        assert!(matches!(
            ImageTexture::new(checker(4, 4), opts),
            Err(ImageError::MarginsExceedImage { .. })
        ));
    }

    #[test]
    fn premultiplies_on_demand() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 128, 0, 128]));
        let tex = ImageTexture::new(img, ImageOptions::default()).unwrap();
        assert_eq!(tex.premultiplied_pixels(), vec![128, 64, 0, 128]);
        // Source stays straight alpha.
        assert_eq!(tex.image().get_pixel(0, 0).0, [255, 128, 0, 128]);
    }

    #[test]
    fn png_encode_decode_through_files() {
        let dir = std::env::temp_dir().join(format!("nabu-image-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checker.png");

        let img = checker(3, 2);
        encode_file(&img, &path).unwrap();
        let back = decode_file(&path).unwrap();
        assert_eq!(back, img);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
