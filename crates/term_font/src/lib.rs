//! Font collection, codepoint resolution, glyph rasterization, and the
//! dynamic texture atlas that backs terminal text rendering.

pub mod atlas;
pub mod error;
pub mod face;
pub mod fallback;
pub mod font_system;
pub mod glyph_cache;
pub mod rasterizer;
pub mod registry;
pub mod resolver;

pub use atlas::{Atlas, AtlasSet, AtlasSlot};
pub use error::{FontError, Result};
pub use face::{CoverageHint, FaceIndex, FontCollection, FontFace, FontFamily, FontSource};
pub use fallback::{fallback_bucket_key, FallbackBucketCache};
pub use font_system::{CellGlyph, FontSystem};
pub use glyph_cache::{AtlasPlacement, GlyphCache, GlyphCacheKey};
pub use rasterizer::{GlyphFormat, Rasterizer, RenderedGlyph, StubRasterizer, SwashRasterizer};
pub use registry::discover_fallback_families;
pub use resolver::{CodepointResolver, Resolution};
