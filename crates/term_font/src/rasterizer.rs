//! Glyph rasterization. Abstracted behind a [`Rasterizer`] trait (the
//! spec's "FreeType-like" dynamic dispatch point) with a concrete
//! [`SwashRasterizer`] and a canned-output [`StubRasterizer`] for tests that
//! don't need real font files.

use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;
use swash::{FontRef, GlyphId};

use crate::face::FontFace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphFormat {
    Grayscale,
    Rgba,
}

/// A rasterized glyph bitmap with placement metrics, owned by the Glyph
/// Cache until LRU-evicted.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedGlyph {
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: GlyphFormat,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
}

impl RenderedGlyph {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            GlyphFormat::Grayscale => 1,
            GlyphFormat::Rgba => 4,
        }
    }

    /// Byte cost charged against the glyph cache's budget: the bitmap size
    /// plus a fixed per-entry bookkeeping overhead.
    pub fn cache_cost(&self) -> usize {
        self.bitmap.len() + 64
    }
}

/// Rasterizes one glyph from one face at one pixel size.
pub trait Rasterizer {
    fn rasterize(&mut self, face: &FontFace, glyph_id: u32, size_px: f32) -> RenderedGlyph;
    /// Prefer color output (COLR/CPAL, color bitmap strikes) when the face
    /// provides it; falls back to a grayscale-as-RGBA conversion otherwise.
    fn rasterize_color(&mut self, face: &FontFace, glyph_id: u32, size_px: f32) -> RenderedGlyph;
}

/// Real rasterizer backed by `swash`.
#[derive(Default)]
pub struct SwashRasterizer {
    context: ScaleContext,
}

impl SwashRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(face: &FontFace, glyph_id: u32, size_px: f32) -> f32 {
        let upem = face.units_per_em().max(1.0);
        let scale = size_px / upem;
        face.with_face(|f| {
            f.glyph_hor_advance(ttf_parser::GlyphId(glyph_id as u16))
                .unwrap_or(0) as f32
                * scale
        })
        .unwrap_or(0.0)
    }
}

impl Rasterizer for SwashRasterizer {
    fn rasterize(&mut self, face: &FontFace, glyph_id: u32, size_px: f32) -> RenderedGlyph {
        let data = face.raw_data();
        let advance = Self::advance(face, glyph_id, size_px);

        let Some(font_ref) = FontRef::from_index(data, face.face_index() as usize) else {
            return RenderedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                format: GlyphFormat::Grayscale,
                bearing_x: 0,
                bearing_y: 0,
                advance: advance.round() as i32,
            };
        };

        let mut scaler = self
            .context
            .builder(font_ref)
            .size(size_px)
            .hint(true)
            .build();

        let image = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ])
        .format(Format::Alpha)
        .render(&mut scaler, GlyphId::new(glyph_id as u16));

        match image {
            Some(img) if img.placement.width > 0 && img.placement.height > 0 => RenderedGlyph {
                width: img.placement.width,
                height: img.placement.height,
                bearing_x: img.placement.left,
                bearing_y: img.placement.top,
                advance: advance.round() as i32,
                format: GlyphFormat::Grayscale,
                bitmap: img.data,
            },
            _ => RenderedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                format: GlyphFormat::Grayscale,
                bearing_x: 0,
                bearing_y: 0,
                advance: advance.round() as i32,
            },
        }
    }

    fn rasterize_color(&mut self, face: &FontFace, glyph_id: u32, size_px: f32) -> RenderedGlyph {
        let data = face.raw_data();
        let advance = Self::advance(face, glyph_id, size_px);

        let Some(font_ref) = FontRef::from_index(data, face.face_index() as usize) else {
            return self.rasterize(face, glyph_id, size_px);
        };

        let mut scaler = self.context.builder(font_ref).size(size_px).build();

        let image = Render::new(&[
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::ColorOutline(0),
            Source::Outline,
        ])
        .format(Format::Subpixel)
        .render(&mut scaler, GlyphId::new(glyph_id as u16));

        match image {
            Some(img) if img.placement.width > 0 && img.placement.height > 0 => {
                let is_color = img.data.len()
                    == img.placement.width as usize * img.placement.height as usize * 4;
                if is_color {
                    RenderedGlyph {
                        width: img.placement.width,
                        height: img.placement.height,
                        bearing_x: img.placement.left,
                        bearing_y: img.placement.top,
                        advance: advance.round() as i32,
                        format: GlyphFormat::Rgba,
                        bitmap: img.data,
                    }
                } else {
                    // Not actually color data; convert grayscale alpha into
                    // white-with-alpha RGBA so the caller can treat both
                    // atlases uniformly.
                    let mut rgba =
                        Vec::with_capacity(img.placement.width as usize * img.placement.height as usize * 4);
                    for a in &img.data {
                        rgba.extend_from_slice(&[255, 255, 255, *a]);
                    }
                    RenderedGlyph {
                        width: img.placement.width,
                        height: img.placement.height,
                        bearing_x: img.placement.left,
                        bearing_y: img.placement.top,
                        advance: advance.round() as i32,
                        format: GlyphFormat::Rgba,
                        bitmap: rgba,
                    }
                }
            }
            _ => RenderedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                format: GlyphFormat::Rgba,
                bearing_x: 0,
                bearing_y: 0,
                advance: advance.round() as i32,
            },
        }
    }
}

/// Returns a fixed-size checkerboard bitmap regardless of input; used in
/// tests that exercise the cache/atlas/assembler without needing real font
/// files or a scaler.
pub struct StubRasterizer {
    pub width: u32,
    pub height: u32,
}

impl Default for StubRasterizer {
    fn default() -> Self {
        Self {
            width: 8,
            height: 12,
        }
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&mut self, _face: &FontFace, _glyph_id: u32, _size_px: f32) -> RenderedGlyph {
        RenderedGlyph {
            bitmap: vec![128u8; (self.width * self.height) as usize],
            width: self.width,
            height: self.height,
            format: GlyphFormat::Grayscale,
            bearing_x: 0,
            bearing_y: self.height as i32,
            advance: self.width as i32,
        }
    }

    fn rasterize_color(&mut self, face: &FontFace, glyph_id: u32, size_px: f32) -> RenderedGlyph {
        let mut glyph = self.rasterize(face, glyph_id, size_px);
        let mut rgba = Vec::with_capacity(glyph.bitmap.len() * 4);
        for a in &glyph.bitmap {
            rgba.extend_from_slice(&[255, 255, 255, *a]);
        }
        glyph.bitmap = rgba;
        glyph.format = GlyphFormat::Rgba;
        glyph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_rasterizer_cache_cost_matches_bitmap_len() {
        let glyph = RenderedGlyph {
            bitmap: vec![0u8; 96],
            width: 8,
            height: 12,
            format: GlyphFormat::Grayscale,
            bearing_x: 0,
            bearing_y: 12,
            advance: 8,
        };
        assert_eq!(glyph.cache_cost(), 96 + 64);
    }

    #[test]
    fn empty_glyph_detection() {
        let glyph = RenderedGlyph {
            bitmap: Vec::new(),
            width: 0,
            height: 0,
            format: GlyphFormat::Grayscale,
            bearing_x: 0,
            bearing_y: 0,
            advance: 4,
        };
        assert!(glyph.is_empty());
    }
}
