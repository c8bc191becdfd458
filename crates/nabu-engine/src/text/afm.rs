//! Adobe Font Metrics attachments.
//!
//! Only kerning is read: `KPX` (and `KP`, x component) pairs override the
//! face's own kerning. Values are in 1/1000 em.

use std::collections::HashMap;

use super::FontError;

/// Kerning pairs parsed from an AFM file, keyed by code point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AfmKerning {
    pairs: HashMap<(char, char), f32>,
}

impl AfmKerning {
    pub fn parse(src: &str) -> Result<Self, FontError> {
        let mut lines = src.lines().map(str::trim).filter(|l| !l.is_empty());

        match lines.next() {
            Some(first) if first.starts_with("StartFontMetrics") => {}
            _ => {
                return Err(FontError::UnsupportedMetrics(
                    "metrics attachment is not an AFM file".into(),
                ));
            }
        }

        let mut pairs = HashMap::new();
        for line in lines {
            let mut tok = line.split_whitespace();
            let (Some(kw), Some(l), Some(r), Some(v)) = (tok.next(), tok.next(), tok.next(), tok.next())
            else {
                continue;
            };
            if kw != "KPX" && kw != "KP" {
                continue;
            }
            let (Some(l), Some(r)) = (glyph_name_to_char(l), glyph_name_to_char(r)) else {
                log::trace!("afm: skipping pair with unmapped glyph names: {line}");
                continue;
            };
            let Ok(v) = v.parse::<f32>() else {
                return Err(FontError::UnsupportedMetrics(format!("bad kerning value in `{line}`")));
            };
            pairs.insert((l, r), v);
        }

        Ok(Self { pairs })
    }

    /// Adjustment in 1/1000 em, if the pair is listed.
    #[inline]
    pub fn get(&self, left: char, right: char) -> Option<f32> {
        self.pairs.get(&(left, right)).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Maps a PostScript glyph name to its code point.
///
/// Covers single-character names, `uniXXXX`/`uXXXX[XX]` forms, and the
/// standard names for ASCII punctuation and digits.
fn glyph_name_to_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c);
    }

    let hex = name
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())));
    if let Some(h) = hex {
        if let Some(c) = u32::from_str_radix(h, 16).ok().and_then(char::from_u32) {
            return Some(c);
        }
    }

    let c = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" | "quoteright" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" | "quoteleft" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "StartFontMetrics 4.1
FontName Test-Regular
StartKernData
StartKernPairs 3
KPX A V -80
KPX T period -120
KP uni0041 uni0042 -15 0
EndKernPairs
EndKernData
EndFontMetrics
";

    #[test]
    fn parses_kpx_pairs_by_glyph_name() {
        let k = AfmKerning::parse(SAMPLE).unwrap();
        assert_eq!(k.len(), 3);
        assert_eq!(k.get('A', 'V'), Some(-80.0));
        assert_eq!(k.get('T', '.'), Some(-120.0));
        assert_eq!(k.get('A', 'B'), Some(-15.0));
        assert_eq!(k.get('V', 'A'), None);
    }

    #[test]
    fn rejects_non_afm_content() {
        let err = AfmKerning::parse("\u{1}\u{0}binary pfm").unwrap_err();
        assert!(matches!(err, FontError::UnsupportedMetrics(_)));
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_name_to_char("x"), Some('x'));
        assert_eq!(glyph_name_to_char("uni00E9"), Some('é'));
        assert_eq!(glyph_name_to_char("u1F600"), Some('😀'));
        assert_eq!(glyph_name_to_char("seven"), Some('7'));
        assert_eq!(glyph_name_to_char("fi"), None);
    }
}
