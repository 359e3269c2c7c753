//! Codepoint Resolver: `(codepoint, style) → Resolution`, aggressively
//! cached because text rendering hits this millions of times per second in
//! steady state.

use rustc_hash::FxHashMap;
use term_core::FontStyle;

use crate::face::{FaceIndex, FontCollection};
use crate::fallback::{fallback_bucket_key, FallbackBucketCache};

/// Result of resolving a codepoint: which face to use and the glyph index
/// within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub face_index: FaceIndex,
    pub glyph_index: u32,
    pub is_fallback: bool,
}

fn cache_key(codepoint: char, style: FontStyle) -> u64 {
    ((codepoint as u64) << 2) | style.tag() as u64
}

/// Tiered (codepoint, style) → Resolution cache.
#[derive(Default)]
pub struct CodepointResolver {
    cache: FxHashMap<u64, Resolution>,
    fallback_buckets: FallbackBucketCache,
}

impl CodepointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `codepoint` at `style` against `collection`. Recurses once
    /// into U+FFFD on total miss; if the replacement character also misses,
    /// returns `None` (caller renders nothing for this cell).
    pub fn resolve(
        &mut self,
        collection: &FontCollection,
        codepoint: char,
        style: FontStyle,
    ) -> Option<Resolution> {
        self.resolve_inner(collection, codepoint, style, true)
    }

    fn resolve_inner(
        &mut self,
        collection: &FontCollection,
        codepoint: char,
        style: FontStyle,
        allow_replacement_fallback: bool,
    ) -> Option<Resolution> {
        let key = cache_key(codepoint, style);

        if let Some(resolution) = self.cache.get(&key).copied() {
            let still_valid = collection
                .face(resolution.face_index, style)
                .map(|face| face.char_index(codepoint) == Some(resolution.glyph_index))
                .unwrap_or(false);
            if still_valid {
                return Some(resolution);
            }
            self.cache.remove(&key);
        }

        // Primary always wins over fallback: check it directly before
        // touching the bucket hint, which only ever names a fallback face.
        if let Some(face) = collection.primary_face(style) {
            if let Some(gid) = face.char_index(codepoint) {
                if gid != 0 {
                    let resolution = Resolution {
                        face_index: FaceIndex::PRIMARY,
                        glyph_index: gid,
                        is_fallback: false,
                    };
                    self.cache.insert(key, resolution);
                    return Some(resolution);
                }
            }
        }

        // Primary missed. Try the script-bucket hint as an ordering
        // shortcut before scanning every fallback family in turn: if this
        // bucket was already resolved to some fallback family, try that one
        // first rather than re-scanning from the start of the list.
        let bucket = fallback_bucket_key(codepoint);
        if let Some(hint) = self.fallback_buckets.get(bucket) {
            if let Some(face) = collection.face(hint, style) {
                if let Some(gid) = face.char_index(codepoint) {
                    if gid != 0 {
                        let resolution = Resolution {
                            face_index: hint,
                            glyph_index: gid,
                            is_fallback: hint.is_fallback(),
                        };
                        self.cache.insert(key, resolution);
                        return Some(resolution);
                    }
                }
            }
        }

        if let Some((face_index, glyph_index)) =
            collection.find_font_for_codepoint(codepoint, style)
        {
            let resolution = Resolution {
                face_index,
                glyph_index,
                is_fallback: face_index.is_fallback(),
            };
            self.cache.insert(key, resolution);
            if face_index.is_fallback() {
                self.fallback_buckets.record(bucket, face_index);
            }
            return Some(resolution);
        }

        if allow_replacement_fallback && codepoint != '\u{FFFD}' {
            return self.resolve_inner(collection, '\u{FFFD}', style, false);
        }
        None
    }

    /// Resolve a batch of codepoints at init time to pre-populate the cache
    /// (ASCII printable range and common box-drawing characters).
    pub fn prewarm(&mut self, collection: &FontCollection, style: FontStyle) {
        for cp in 0x20u32..=0x7E {
            if let Some(ch) = char::from_u32(cp) {
                self.resolve(collection, ch, style);
            }
        }
        for cp in 0x2500u32..=0x257F {
            if let Some(ch) = char::from_u32(cp) {
                self.resolve(collection, ch, style);
            }
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_separates_styles() {
        let a = cache_key('A', FontStyle::Regular);
        let b = cache_key('A', FontStyle::Bold);
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_separates_codepoints() {
        let a = cache_key('A', FontStyle::Regular);
        let b = cache_key('B', FontStyle::Regular);
        assert_ne!(a, b);
    }
}
