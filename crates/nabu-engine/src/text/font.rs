use std::collections::HashMap;
use std::sync::Arc;

use crate::coords::{Rect, Vec2};
use crate::id::resource_id;

use super::atlas::Atlas;

resource_id! {
    /// Identity of a [`Font`]; the executor caches the atlas texture by it.
    FontId
}

/// Shared, immutable font reference.
pub type FontHandle = Arc<Font>;

/// Per-glyph metrics in points, plus its atlas location.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub advance: f32,
    pub width: f32,
    pub height: f32,
    pub uv: Rect,
    /// Left bearing.
    pub offset_x: f32,
    /// Top of the bitmap relative to the baseline, y-down (negative above).
    pub offset_y: f32,
}

/// Dense `n × n` pair adjustments, indexed by glyph index.
#[derive(Debug, Clone, PartialEq)]
pub struct KerningTable {
    n: usize,
    values: Vec<f32>,
}

impl KerningTable {
    pub(crate) fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(n * n);
        for l in 0..n {
            for r in 0..n {
                values.push(f(l, r));
            }
        }
        Self { n, values }
    }

    /// Number of rows (and columns).
    #[inline]
    pub fn dimension(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, left: usize, right: usize) -> f32 {
        self.values[left * self.n + right]
    }
}

/// A glyph positioned by [`Font::layout`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph<'a> {
    pub glyph: &'a Glyph,
    /// Pen x at which the glyph's origin sits.
    pub x: f32,
}

/// Rasterized face at one point size: glyph metrics, kerning, and atlas.
#[derive(Debug)]
pub struct Font {
    id: FontId,
    point_size: f32,
    dpi: f32,
    glyphs: Vec<Glyph>,
    index: HashMap<char, usize>,
    kerning: KerningTable,
    atlas: Atlas,
}

impl Font {
    pub(crate) fn new(point_size: f32, dpi: f32, glyphs: Vec<Glyph>, kerning: KerningTable, atlas: Atlas) -> Self {
        let index = glyphs.iter().enumerate().map(|(i, g)| (g.ch, i)).collect();
        Self { id: FontId::fresh(), point_size, dpi, glyphs, index, kerning, atlas }
    }

    #[inline]
    pub fn id(&self) -> FontId {
        self.id
    }

    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    #[inline]
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    #[inline]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[inline]
    pub fn kerning_table(&self) -> &KerningTable {
        &self.kerning
    }

    #[inline]
    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    #[inline]
    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.index.get(&ch).copied()
    }

    #[inline]
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.index_of(ch).map(|i| &self.glyphs[i])
    }

    /// Pair adjustment in points; 0 when either character is unsupported.
    pub fn kerning(&self, left: char, right: char) -> f32 {
        match (self.index_of(left), self.index_of(right)) {
            (Some(l), Some(r)) => self.kerning.get(l, r),
            _ => 0.0,
        }
    }

    /// Pen positions for `text`.
    ///
    /// Characters the font does not carry are skipped: they add no advance and
    /// the kerning chain continues from the last supported character.
    pub fn layout<'a>(&'a self, text: &'a str) -> impl Iterator<Item = PlacedGlyph<'a>> + 'a {
        let mut pen = 0.0f32;
        let mut prev: Option<usize> = None;
        text.chars().filter_map(move |ch| {
            let i = self.index_of(ch)?;
            if let Some(p) = prev {
                pen += self.kerning.get(p, i);
            }
            let glyph = &self.glyphs[i];
            let placed = PlacedGlyph { glyph, x: pen };
            pen += glyph.advance;
            prev = Some(i);
            Some(placed)
        })
    }

    /// Width (final pen position) and height (tallest glyph) of `text` in points.
    pub fn measure(&self, text: &str) -> Vec2 {
        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for p in self.layout(text) {
            width = p.x + p.glyph.advance;
            height = height.max(p.glyph.height);
        }
        Vec2::new(width, height)
    }
}
