use std::path::Path;

use super::FontError;

/// Coverage bitmap and pixel metrics for one rasterized glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterGlyph {
    pub width: usize,
    pub height: usize,
    /// Horizontal pen advance in pixels.
    pub advance: f32,
    /// Left bearing in pixels.
    pub xmin: f32,
    /// Distance from the baseline to the bitmap's bottom edge (y-up).
    pub ymin: f32,
    /// `width * height` 8-bit coverage values, row-major, top row first.
    pub coverage: Vec<u8>,
}

/// Rasterization engine seam used by the atlas builder.
pub trait FontFace: Send + Sync {
    /// Every code point the face maps to a glyph, in ascending order.
    fn chars(&self) -> Vec<char>;

    fn has_glyph(&self, ch: char) -> bool;

    fn rasterize(&self, ch: char, px: f32) -> RasterGlyph;

    /// Horizontal adjustment in pixels applied between `left` and `right`.
    fn kerning(&self, left: char, right: char, px: f32) -> f32;
}

/// [`FontFace`] over a TrueType/OpenType face parsed by `fontdue`.
pub struct FontdueFace {
    font: fontdue::Font,
}

impl FontdueFace {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn open(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|e| FontError::io(path, e))?;
        Self::from_bytes(&bytes)
    }
}

impl FontFace for FontdueFace {
    fn chars(&self) -> Vec<char> {
        let mut chars: Vec<char> = self.font.chars().keys().copied().collect();
        chars.sort_unstable();
        chars
    }

    fn has_glyph(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch) != 0
    }

    fn rasterize(&self, ch: char, px: f32) -> RasterGlyph {
        let (m, coverage) = self.font.rasterize(ch, px);
        RasterGlyph {
            width: m.width,
            height: m.height,
            advance: m.advance_width,
            xmin: m.xmin as f32,
            ymin: m.ymin as f32,
            coverage,
        }
    }

    fn kerning(&self, left: char, right: char, px: f32) -> f32 {
        self.font.horizontal_kern(left, right, px).unwrap_or(0.0)
    }
}
