use crate::coords::Rect;

use super::FontError;
use super::face::RasterGlyph;

/// Grid columns × rows keyed by the maximum glyph count they hold.
const GRID_TABLE: [(usize, u32, u32); 10] = [
    (128, 16, 8),
    (256, 16, 16),
    (512, 32, 16),
    (1024, 32, 32),
    (2048, 64, 32),
    (4096, 64, 64),
    (8192, 128, 64),
    (16384, 128, 128),
    (32768, 256, 128),
    (65536, 256, 256),
];

/// Padding added to the widest/tallest glyph to form a cell.
const CELL_PADDING: u32 = 1;

/// Smallest grid that holds `count` glyphs, as `(cols, rows)`.
pub fn grid_for(count: usize) -> Option<(u32, u32)> {
    GRID_TABLE.iter().find(|(max, _, _)| count <= *max).map(|&(_, c, r)| (c, r))
}

/// Single-channel coverage bitmap holding every glyph of a font.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Atlas {
    #[inline]
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Packs rasterized glyphs into a uniform grid.
///
/// Returns the atlas and, in input order, each glyph's UV rectangle.
pub(crate) fn pack(glyphs: &[RasterGlyph]) -> Result<(Atlas, Vec<Rect>), FontError> {
    let (cols, rows) = grid_for(glyphs.len()).ok_or(FontError::TooManyGlyphs(glyphs.len()))?;

    let max_w = glyphs.iter().map(|g| g.width).max().unwrap_or(0) as u32;
    let max_h = glyphs.iter().map(|g| g.height).max().unwrap_or(0) as u32;
    let cell_w = max_w + CELL_PADDING;
    let cell_h = max_h + CELL_PADDING;

    let width = (cols * cell_w).next_power_of_two();
    let height = (rows * cell_h).next_power_of_two();
    let mut pixels = vec![0u8; width as usize * height as usize];

    let (fw, fh) = (width as f32, height as f32);
    let mut uvs = Vec::with_capacity(glyphs.len());

    for (i, g) in glyphs.iter().enumerate() {
        let x0 = (i as u32 % cols) * cell_w;
        let y0 = (i as u32 / cols) * cell_h;

        for row in 0..g.height {
            let src = &g.coverage[row * g.width..(row + 1) * g.width];
            let dst = (y0 as usize + row) * width as usize + x0 as usize;
            pixels[dst..dst + g.width].copy_from_slice(src);
        }

        uvs.push(Rect::new(
            x0 as f32 / fw,
            y0 as f32 / fh,
            g.width as f32 / fw,
            g.height as f32 / fh,
        ));
    }

    log::debug!(
        "packed {} glyphs into {width}x{height} atlas ({cols}x{rows} grid, {cell_w}x{cell_h} cells)",
        glyphs.len()
    );

    Ok((Atlas { width, height, pixels }, uvs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(w: usize, h: usize, fill: u8) -> RasterGlyph {
        RasterGlyph { width: w, height: h, advance: w as f32, coverage: vec![fill; w * h], ..Default::default() }
    }

    // ── grid table ────────────────────────────────────────────────────────

    #[test]
    fn grid_lookup_boundaries() {
        assert_eq!(grid_for(1), Some((16, 8)));
        assert_eq!(grid_for(128), Some((16, 8)));
        assert_eq!(grid_for(129), Some((16, 16)));
        assert_eq!(grid_for(1000), Some((32, 32)));
        assert_eq!(grid_for(65536), Some((256, 256)));
        assert_eq!(grid_for(65537), None);
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn atlas_dimensions_are_powers_of_two() {
        let glyphs = vec![glyph(7, 10, 255), glyph(5, 12, 128)];
        let (atlas, _) = pack(&glyphs).unwrap();
        // 16 cols × 8 px cells, 8 rows × 13 px cells.
        assert_eq!(atlas.width, 128);
        assert_eq!(atlas.height, 128);
        assert_eq!(atlas.pixels.len(), 128 * 128);
    }

    #[test]
    fn glyphs_land_in_their_cells() {
        let glyphs = vec![glyph(3, 3, 200), glyph(2, 2, 90)];
        let (atlas, uvs) = pack(&glyphs).unwrap();

        // Cell width is 4; second glyph starts at x = 4.
        assert_eq!(atlas.coverage_at(0, 0), 200);
        assert_eq!(atlas.coverage_at(3, 0), 0);
        assert_eq!(atlas.coverage_at(4, 0), 90);
        assert_eq!(atlas.coverage_at(5, 1), 90);

        let w = atlas.width as f32;
        assert_eq!(uvs[1].origin.x, 4.0 / w);
        assert_eq!(uvs[1].size.x, 2.0 / w);
    }
}
