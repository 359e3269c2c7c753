//! Dynamic Font System: the facade the frame assembler calls once per
//! distinct (codepoint, style) pair to obtain everything it needs to emit a
//! `CellInstance` — resolution, rasterization, and atlas placement, each
//! memoized so steady-state rendering never touches the rasterizer again.

use std::sync::Arc;

use term_core::{FontSize, FontStyle, FontSystemConfig, WidthTable};

use crate::atlas::{Atlas, AtlasSet, AtlasSlot};
use crate::error::Result;
use crate::face::{CoverageHint, FaceIndex, FontCollection, FontFace, FontFamily, FontSource};
use crate::glyph_cache::{AtlasPlacement, GlyphCache, GlyphCacheKey};
use crate::rasterizer::{Rasterizer, RenderedGlyph};
use crate::resolver::CodepointResolver;

/// Everything the frame assembler needs to place one glyph instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGlyph {
    pub atlas_page: usize,
    pub is_color: bool,
    pub glyph_x: u32,
    pub glyph_y: u32,
    pub glyph_width: u32,
    pub glyph_height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
}

/// Owns the whole text-rendering pipeline: font collection, resolver,
/// glyph cache, atlas set, and width table, behind one call surface.
pub struct FontSystem {
    collection: FontCollection,
    resolver: CodepointResolver,
    cache: GlyphCache,
    atlas: AtlasSet,
    width_table: WidthTable,
    rasterizer: Box<dyn Rasterizer + Send>,
    size: FontSize,
}

impl FontSystem {
    pub fn new(
        collection: FontCollection,
        config: &FontSystemConfig,
        rasterizer: Box<dyn Rasterizer + Send>,
    ) -> Self {
        let size = collection.size;
        let mut resolver = CodepointResolver::new();
        resolver.prewarm(&collection, FontStyle::Regular);
        Self {
            collection,
            resolver,
            cache: GlyphCache::new(config.glyph_cache_budget_bytes),
            atlas: AtlasSet::new(config),
            width_table: WidthTable::default(),
            rasterizer,
            size,
        }
    }

    /// Builds a primary-only collection from embedded bytes; a convenience
    /// used by tests and by callers that haven't wired up system fallback
    /// discovery yet.
    pub fn from_embedded_primary(
        data: Vec<u8>,
        size: FontSize,
        config: &FontSystemConfig,
        rasterizer: Box<dyn Rasterizer + Send>,
    ) -> Result<Self> {
        let data = Arc::new(data);
        let face = FontFace::load(
            data,
            0,
            FontSource::Embedded("primary"),
            CoverageHint::FullCoverage,
            size,
        )?;
        let mut family = FontFamily::default();
        family.set(FontStyle::Regular, face);
        let collection = FontCollection::new(family, Vec::new(), size)?;
        Ok(Self::new(collection, config, rasterizer))
    }

    pub fn width_table(&self) -> &WidthTable {
        &self.width_table
    }

    pub fn collection(&self) -> &FontCollection {
        &self.collection
    }

    pub fn grayscale_page(&self, index: usize) -> Option<&Atlas> {
        self.atlas.grayscale_page(index)
    }

    pub fn color_page(&self, index: usize) -> Option<&Atlas> {
        self.atlas.color_page(index)
    }

    pub fn grayscale_page_mut(&mut self, index: usize) -> Option<&mut Atlas> {
        self.atlas.grayscale_page_mut(index)
    }

    pub fn color_page_mut(&mut self, index: usize) -> Option<&mut Atlas> {
        self.atlas.color_page_mut(index)
    }

    pub fn grayscale_page_count(&self) -> usize {
        self.atlas.grayscale_page_count()
    }

    pub fn color_page_count(&self) -> usize {
        self.atlas.color_page_count()
    }

    /// Resolves, rasterizes (if not cached), and atlas-places the glyph for
    /// `codepoint` at `style`. Returns `None` only when no face — including
    /// the U+FFFD fallback — covers the codepoint at all (whitespace still
    /// returns `Some` with a zero-size bitmap, so the caller can cache the
    /// "nothing to draw" result too).
    pub fn make_cell_text(&mut self, codepoint: char, style: FontStyle) -> Result<Option<CellGlyph>> {
        let Some(resolution) = self.resolver.resolve(&self.collection, codepoint, style) else {
            return Ok(None);
        };

        let key = GlyphCacheKey::new(
            resolution.face_index,
            resolution.glyph_index,
            style,
            self.size.to_pixels(),
        );

        if let Some(placement) = self.cache.placement(&key) {
            let glyph = self.cache.get(&key).expect("placement implies entry");
            return Ok(Some(self.to_cell_glyph(&placement, glyph)));
        }

        let face = self
            .collection
            .face(resolution.face_index, style)
            .expect("resolver only returns resolutions for faces that exist");

        let wants_color = face.coverage == CoverageHint::Emoji;
        let rendered = if wants_color {
            self.rasterizer
                .rasterize_color(face, resolution.glyph_index, self.size.to_pixels())
        } else {
            self.rasterizer
                .rasterize(face, resolution.glyph_index, self.size.to_pixels())
        };

        self.cache_and_place(key, resolution.face_index, resolution.glyph_index, rendered)
    }

    fn cache_and_place(
        &mut self,
        key: GlyphCacheKey,
        face_index: FaceIndex,
        glyph_index: u32,
        rendered: RenderedGlyph,
    ) -> Result<Option<CellGlyph>> {
        if rendered.is_empty() {
            self.cache.insert(key, rendered.clone());
            return Ok(Some(CellGlyph {
                atlas_page: 0,
                is_color: false,
                glyph_x: 0,
                glyph_y: 0,
                glyph_width: 0,
                glyph_height: 0,
                bearing_x: rendered.bearing_x,
                bearing_y: rendered.bearing_y,
                advance: rendered.advance,
            }));
        }

        let slot: AtlasSlot = self.atlas.place(&rendered, face_index.0, glyph_index)?;
        self.cache.insert(key, rendered.clone());
        self.cache.set_placement(
            &key,
            AtlasPlacement {
                atlas_index: slot.page_index as u8,
                x: slot.x,
                y: slot.y,
            },
        );
        Ok(Some(self.to_cell_glyph(
            &AtlasPlacement {
                atlas_index: slot.page_index as u8,
                x: slot.x,
                y: slot.y,
            },
            &rendered,
        )))
    }

    fn to_cell_glyph(&self, placement: &AtlasPlacement, glyph: &RenderedGlyph) -> CellGlyph {
        CellGlyph {
            atlas_page: placement.atlas_index as usize,
            is_color: matches!(glyph.format, crate::rasterizer::GlyphFormat::Rgba),
            glyph_x: placement.x,
            glyph_y: placement.y,
            glyph_width: glyph.width,
            glyph_height: glyph.height,
            bearing_x: glyph.bearing_x,
            bearing_y: glyph.bearing_y,
            advance: glyph.advance,
        }
    }

    pub fn glyph_cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::StubRasterizer;
    use std::path::Path;

    fn system_font_bytes() -> Option<Vec<u8>> {
        // Mirrors the teacher's registry.rs pattern of probing a handful of
        // well-known system font paths and skipping the test if none exist,
        // rather than shipping a binary test fixture into the repo.
        const CANDIDATES: &[&str] = &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ];
        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .and_then(|p| std::fs::read(p).ok())
    }

    #[test]
    fn make_cell_text_caches_repeat_lookups() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let config = FontSystemConfig {
            glyph_cache_budget_bytes: 1 << 20,
            atlas_initial_size: 256,
            atlas_max_size: 1024,
            atlas_padding: 1,
        };
        let mut system = FontSystem::from_embedded_primary(
            bytes,
            FontSize {
                points: 12.0,
                dpi: 96,
            },
            &config,
            Box::new(StubRasterizer::default()),
        )
        .unwrap();

        let first = system.make_cell_text('A', FontStyle::Regular).unwrap();
        assert!(first.is_some());
        let before = system.glyph_cache_len();
        let second = system.make_cell_text('A', FontStyle::Regular).unwrap();
        assert_eq!(first, second);
        assert_eq!(system.glyph_cache_len(), before);
    }

    #[test]
    fn unresolvable_codepoint_returns_none_without_panicking() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let config = FontSystemConfig {
            glyph_cache_budget_bytes: 1 << 20,
            atlas_initial_size: 256,
            atlas_max_size: 1024,
            atlas_padding: 1,
        };
        let mut system = FontSystem::from_embedded_primary(
            bytes,
            FontSize {
                points: 12.0,
                dpi: 96,
            },
            &config,
            Box::new(StubRasterizer::default()),
        )
        .unwrap();
        // A private-use codepoint unlikely to be covered by any common font
        // or by the synthetic U+FFFD fallback path's own coverage.
        let result = system.make_cell_text('\u{F8FF}', FontStyle::Regular);
        assert!(result.is_ok());
    }
}
