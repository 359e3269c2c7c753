//! Font Face, Font Family, and Font Collection: the set of faces the
//! renderer may draw from, with a stable primary family plus fallbacks.

use std::sync::Arc;

use term_core::{FontMetrics, FontSize, FontStyle};

use crate::error::{FontError, Result};

/// A coarse hint about what a fallback face is good for, used only to pick a
/// sensible scan order; it does not gate resolution (the resolver always
/// checks `char_index` directly).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverageHint {
    Latin,
    Cjk,
    Emoji,
    Symbols,
    FullCoverage,
}

/// Where a face's bytes came from, kept for diagnostics only.
#[derive(Clone, Debug)]
pub enum FontSource {
    Embedded(&'static str),
    SystemPath(String),
    SystemName(String),
}

/// A loaded rasterizer face plus its source and coverage hint.
///
/// `ttf_parser::Face` is self-referential over its backing bytes, so rather
/// than storing a parsed `Face<'_>` (which would need unsafe lifetime
/// erasure), `FontFace` holds the owned bytes and re-parses on demand; this
/// mirrors how `fontdb`/`rustybuzz` font refs are built lazily from stored
/// bytes rather than kept alive as a borrowed struct.
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    face_index: u32,
    pub source: FontSource,
    pub coverage: CoverageHint,
    metrics: FontMetrics,
    units_per_em: f32,
}

impl FontFace {
    pub fn load(
        data: Arc<Vec<u8>>,
        face_index: u32,
        source: FontSource,
        coverage: CoverageHint,
        size: FontSize,
    ) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| FontError::ParseFailed(e.to_string()))?;

        let units_per_em = face.units_per_em() as f32;
        let scale = size.to_pixels() / units_per_em;
        let metrics = FontMetrics {
            ascent: face.ascender() as f32 * scale,
            descent: face.descender() as f32 * scale,
            line_gap: face.line_gap() as f32 * scale,
            cap_height: face.capital_height().unwrap_or(0) as f32 * scale,
            x_height: face.x_height().unwrap_or(0) as f32 * scale,
            average_width: face
                .glyph_hor_advance(face.glyph_index(' ').unwrap_or(ttf_parser::GlyphId(0)))
                .unwrap_or(0) as f32
                * scale,
            max_width: face
                .glyph_hor_advance(face.glyph_index('M').unwrap_or(ttf_parser::GlyphId(0)))
                .unwrap_or((units_per_em * 0.6) as u16) as f32
                * scale,
            underline_position: face
                .underline_metrics()
                .map(|m| m.position as f32 * scale)
                .unwrap_or(-scale * units_per_em * 0.1),
            underline_thickness: face
                .underline_metrics()
                .map(|m| m.thickness as f32 * scale)
                .unwrap_or(scale * units_per_em * 0.05),
        };

        Ok(Self {
            data,
            face_index,
            source,
            coverage,
            metrics,
            units_per_em,
        })
    }

    /// Re-parse and borrow the underlying `ttf_parser::Face` for this call.
    pub fn with_face<R>(&self, f: impl FnOnce(&ttf_parser::Face) -> R) -> Option<R> {
        ttf_parser::Face::parse(&self.data, self.face_index)
            .ok()
            .map(|face| f(&face))
    }

    pub fn char_index(&self, codepoint: char) -> Option<u32> {
        self.with_face(|face| face.glyph_index(codepoint).map(|g| g.0 as u32))
            .flatten()
    }

    pub fn has_fixed_sizes(&self) -> bool {
        self.with_face(|face| face.tables().sbix.is_some() || face.tables().cbdt.is_some())
            .unwrap_or(false)
    }

    pub fn is_scalable(&self) -> bool {
        self.with_face(|face| face.tables().glyf.is_some() || face.tables().cff.is_some())
            .unwrap_or(true)
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    pub fn raw_data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }
}

/// Up to four optional faces keyed by style; falls back to regular when a
/// requested style is absent.
#[derive(Clone, Default)]
pub struct FontFamily {
    regular: Option<FontFace>,
    bold: Option<FontFace>,
    italic: Option<FontFace>,
    bold_italic: Option<FontFace>,
}

impl FontFamily {
    pub fn set(&mut self, style: FontStyle, face: FontFace) {
        match style {
            FontStyle::Regular => self.regular = Some(face),
            FontStyle::Bold => self.bold = Some(face),
            FontStyle::Italic => self.italic = Some(face),
            FontStyle::BoldItalic => self.bold_italic = Some(face),
        }
    }

    /// Returns the requested style, falling back to regular when absent.
    pub fn get(&self, style: FontStyle) -> Option<&FontFace> {
        let direct = match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        };
        direct.as_ref().or(self.regular.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.bold_italic.is_none()
    }
}

/// Stable index into a [`FontCollection`]: `0` is the primary family, `1+k`
/// is fallback family `k`. Caching this instead of a face reference means
/// the cache survives restructuring and never dangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceIndex(pub u32);

impl FaceIndex {
    pub const PRIMARY: Self = Self(0);

    pub fn fallback(k: usize) -> Self {
        Self(1 + k as u32)
    }

    pub fn is_fallback(self) -> bool {
        self.0 > 0
    }

    pub fn fallback_index(self) -> Option<usize> {
        if self.0 > 0 {
            Some((self.0 - 1) as usize)
        } else {
            None
        }
    }
}

/// Primary family plus ordered fallback families, pre-sized so fallback
/// indices are stable for the collection's lifetime.
pub struct FontCollection {
    primary: FontFamily,
    fallbacks: Vec<FontFamily>,
    pub size: FontSize,
}

impl FontCollection {
    pub fn new(primary: FontFamily, fallbacks: Vec<FontFamily>, size: FontSize) -> Result<Self> {
        if primary.get(FontStyle::Regular).is_none() {
            return Err(FontError::PrimaryFaceMissing);
        }
        Ok(Self {
            primary,
            fallbacks,
            size,
        })
    }

    pub fn primary_face(&self, style: FontStyle) -> Option<&FontFace> {
        self.primary.get(style)
    }

    pub fn family(&self, index: FaceIndex) -> Option<&FontFamily> {
        match index.fallback_index() {
            None => Some(&self.primary),
            Some(k) => self.fallbacks.get(k),
        }
    }

    pub fn face(&self, index: FaceIndex, style: FontStyle) -> Option<&FontFace> {
        self.family(index)?.get(style)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    /// Scans primary then fallbacks in order, returning the first face whose
    /// `char_index` covers `codepoint`. Used only during initial resolution;
    /// hot-path lookups go through the resolver's cache instead.
    pub fn find_font_for_codepoint(
        &self,
        codepoint: char,
        style: FontStyle,
    ) -> Option<(FaceIndex, u32)> {
        if let Some(face) = self.primary.get(style) {
            if let Some(gid) = face.char_index(codepoint) {
                if gid != 0 {
                    return Some((FaceIndex::PRIMARY, gid));
                }
            }
        }
        for (k, family) in self.fallbacks.iter().enumerate() {
            if let Some(face) = family.get(style) {
                if let Some(gid) = face.char_index(codepoint) {
                    if gid != 0 {
                        return Some((FaceIndex::fallback(k), gid));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_index_roundtrip() {
        assert!(!FaceIndex::PRIMARY.is_fallback());
        let fb = FaceIndex::fallback(2);
        assert!(fb.is_fallback());
        assert_eq!(fb.fallback_index(), Some(2));
    }

    #[test]
    fn family_falls_back_to_regular() {
        // Without real font bytes we can only exercise the empty case here;
        // loading behavior is covered in font_system.rs's integration tests
        // where embedded test fonts are available.
        let family = FontFamily::default();
        assert!(family.is_empty());
        assert!(family.get(FontStyle::Bold).is_none());
    }
}
