//! Font atlas construction and text measurement.
//!
//! A [`Font`] is built once from a face at a fixed point size and DPI: every
//! requested glyph is rasterized into a single coverage atlas, and a dense
//! kerning table is precomputed for every ordered pair. Drawing text is then
//! a matter of emitting one textured quad per glyph.

pub mod afm;
pub mod atlas;
pub mod face;
pub mod font;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use afm::AfmKerning;
pub use atlas::Atlas;
pub use face::{FontFace, FontdueFace, RasterGlyph};
pub use font::{Font, FontHandle, FontId, Glyph, KerningTable, PlacedGlyph};

#[derive(Debug)]
pub enum FontError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(String),
    UnsupportedMetrics(String),
    InvalidSize { point_size: f32, dpi: f32 },
    NoGlyphs,
    TooManyGlyphs(usize),
}

impl FontError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse(msg) => write!(f, "font parse error: {msg}"),
            Self::UnsupportedMetrics(msg) => write!(f, "unsupported metrics attachment: {msg}"),
            Self::InvalidSize { point_size, dpi } => {
                write!(f, "invalid font size {point_size}pt at {dpi} dpi")
            }
            Self::NoGlyphs => write!(f, "none of the requested characters are in the font"),
            Self::TooManyGlyphs(n) => write!(f, "{n} glyphs do not fit the largest atlas grid"),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Characters to rasterize into the atlas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Charset {
    /// Every code point the face maps.
    #[default]
    All,
    /// The distinct characters of the string, in first-appearance order.
    Only(String),
}

impl Charset {
    fn candidates(&self, face: &dyn FontFace) -> Vec<char> {
        let chars = match self {
            Charset::All => face.chars(),
            Charset::Only(s) => {
                let mut seen = std::collections::HashSet::new();
                s.chars().filter(|c| seen.insert(*c)).collect()
            }
        };
        chars.into_iter().filter(|c| face.has_glyph(*c)).collect()
    }
}

/// Loads the face at `path` and builds a font for `charset`.
///
/// `metrics_path` optionally attaches an AFM file whose kerning pairs
/// override the face's own.
pub fn create_font(
    path: impl AsRef<Path>,
    metrics_path: Option<&Path>,
    point_size: f32,
    dpi: f32,
    charset: &Charset,
) -> Result<FontHandle, FontError> {
    let path = path.as_ref();
    let face = FontdueFace::open(path)?;

    let metrics = match metrics_path {
        Some(p) => {
            let bytes = std::fs::read(p).map_err(|e| FontError::io(p, e))?;
            Some(AfmKerning::parse(&String::from_utf8_lossy(&bytes))?)
        }
        None => None,
    };

    let font = build_font(&face, metrics.as_ref(), point_size, dpi, charset)?;
    log::debug!(
        "created font {} at {point_size}pt/{dpi}dpi: {} glyphs, {}x{} atlas",
        path.display(),
        font.glyphs().len(),
        font.atlas().width,
        font.atlas().height
    );
    Ok(font)
}

/// Builds a font from an already-parsed face.
pub fn build_font(
    face: &dyn FontFace,
    metrics: Option<&AfmKerning>,
    point_size: f32,
    dpi: f32,
    charset: &Charset,
) -> Result<FontHandle, FontError> {
    if !(point_size.is_finite() && dpi.is_finite() && point_size > 0.0 && dpi > 0.0) {
        return Err(FontError::InvalidSize { point_size, dpi });
    }

    let chars = charset.candidates(face);
    if chars.is_empty() {
        return Err(FontError::NoGlyphs);
    }

    let px = point_size * dpi / 72.0;
    let scale = dpi / 72.0;

    let rasters: Vec<RasterGlyph> = chars.iter().map(|&c| face.rasterize(c, px)).collect();
    let (atlas, uvs) = atlas::pack(&rasters)?;

    let glyphs = chars
        .iter()
        .zip(&rasters)
        .zip(uvs)
        .map(|((&ch, r), uv)| Glyph {
            ch,
            advance: r.advance / scale,
            width: r.width as f32 / scale,
            height: r.height as f32 / scale,
            uv,
            offset_x: r.xmin / scale,
            offset_y: -(r.ymin + r.height as f32) / scale,
        })
        .collect();

    let kerning = KerningTable::from_fn(chars.len(), |l, r| {
        let (cl, cr) = (chars[l], chars[r]);
        match metrics.and_then(|m| m.get(cl, cr)) {
            Some(milli_em) => milli_em * point_size / 1000.0,
            None => face.kerning(cl, cr, px) / scale,
        }
    });

    Ok(Arc::new(Font::new(point_size, dpi, glyphs, kerning, atlas)))
}
