//! Glyph Cache: a byte-budgeted LRU over rasterized glyph bitmaps.
//!
//! Unlike the ordinary glyph-instance cache in the teacher's text renderer
//! (which wraps the `lru` crate), this cache must hand out *stable* keys
//! that the atlas and frame assembler can hold onto across frames without
//! them dangling if the map reallocates. A `HashMap<GlyphCacheKey, Slot>`
//! index plus a slab of slots threaded by slot index (not by pointer)
//! gives both: the slab never invalidates a slot's identity on insertion,
//! and the doubly linked list is just indices into that slab.

use rustc_hash::FxHashMap;
use term_core::FontStyle;

use crate::face::FaceIndex;
use crate::rasterizer::RenderedGlyph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphCacheKey {
    pub face_index: FaceIndex,
    pub glyph_id: u32,
    pub style: FontStyle,
    pub size_bits: u32,
}

impl GlyphCacheKey {
    pub fn new(face_index: FaceIndex, glyph_id: u32, style: FontStyle, size_px: f32) -> Self {
        Self {
            face_index,
            glyph_id,
            style,
            size_bits: size_px.to_bits(),
        }
    }
}

/// Where in an atlas page a cached glyph's bitmap was placed, recorded once
/// the glyph cache hands the bitmap off to the atlas packer. `None` until
/// placement happens or if the glyph is empty (whitespace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasPlacement {
    pub atlas_index: u8,
    pub x: u32,
    pub y: u32,
}

const NONE: usize = usize::MAX;

struct Slot {
    key: GlyphCacheKey,
    glyph: RenderedGlyph,
    placement: Option<AtlasPlacement>,
    cost: usize,
    prev: usize,
    next: usize,
    occupied: bool,
}

/// Intrusive doubly linked list of slab slots, most-recently-used at
/// `head`, least-recently-used (eviction candidate) at `tail`. Slot indices
/// are stable across insertions: a slot's index never changes once
/// assigned, satisfying the invariant that holders of a `GlyphCacheKey` can
/// look it back up without the entry having moved.
pub struct GlyphCache {
    slots: Vec<Slot>,
    index: FxHashMap<GlyphCacheKey, usize>,
    free_list: Vec<usize>,
    head: usize,
    tail: usize,
    budget_bytes: usize,
    used_bytes: usize,
}

impl GlyphCache {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: FxHashMap::default(),
            free_list: Vec::new(),
            head: NONE,
            tail: NONE,
            budget_bytes,
            used_bytes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn get(&mut self, key: &GlyphCacheKey) -> Option<&RenderedGlyph> {
        let slot_idx = *self.index.get(key)?;
        self.touch(slot_idx);
        Some(&self.slots[slot_idx].glyph)
    }

    pub fn placement(&self, key: &GlyphCacheKey) -> Option<AtlasPlacement> {
        let slot_idx = *self.index.get(key)?;
        self.slots[slot_idx].placement
    }

    pub fn set_placement(&mut self, key: &GlyphCacheKey, placement: AtlasPlacement) {
        if let Some(&slot_idx) = self.index.get(key) {
            self.slots[slot_idx].placement = Some(placement);
        }
    }

    pub fn contains(&self, key: &GlyphCacheKey) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts a freshly rasterized glyph, evicting least-recently-used
    /// entries until the new one fits under budget. Returns the evicted
    /// keys so the caller (the atlas) can reclaim their shelf space.
    pub fn insert(&mut self, key: GlyphCacheKey, glyph: RenderedGlyph) -> Vec<GlyphCacheKey> {
        let cost = glyph.cache_cost();
        let mut evicted = Vec::new();

        if let Some(&slot_idx) = self.index.get(&key) {
            self.used_bytes -= self.slots[slot_idx].cost;
            self.used_bytes += cost;
            self.slots[slot_idx].glyph = glyph;
            self.slots[slot_idx].cost = cost;
            self.slots[slot_idx].placement = None;
            self.touch(slot_idx);
            self.evict_to_budget(&mut evicted);
            return evicted;
        }

        while self.used_bytes + cost > self.budget_bytes && self.tail != NONE {
            let victim = self.tail;
            evicted.push(self.slots[victim].key);
            self.remove_slot(victim);
        }

        let slot_idx = self.alloc_slot(Slot {
            key,
            glyph,
            placement: None,
            cost,
            prev: NONE,
            next: NONE,
            occupied: true,
        });
        self.index.insert(key, slot_idx);
        self.used_bytes += cost;
        self.push_front(slot_idx);
        evicted
    }

    fn evict_to_budget(&mut self, evicted: &mut Vec<GlyphCacheKey>) {
        while self.used_bytes > self.budget_bytes && self.tail != NONE {
            let victim = self.tail;
            evicted.push(self.slots[victim].key);
            self.remove_slot(victim);
        }
    }

    fn alloc_slot(&mut self, slot: Slot) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = slot;
            idx
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    fn remove_slot(&mut self, slot_idx: usize) {
        self.unlink(slot_idx);
        let key = self.slots[slot_idx].key;
        self.used_bytes -= self.slots[slot_idx].cost;
        self.index.remove(&key);
        self.slots[slot_idx].occupied = false;
        self.free_list.push(slot_idx);
    }

    fn unlink(&mut self, slot_idx: usize) {
        let (prev, next) = (self.slots[slot_idx].prev, self.slots[slot_idx].next);
        if prev != NONE {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NONE {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[slot_idx].prev = NONE;
        self.slots[slot_idx].next = NONE;
    }

    fn push_front(&mut self, slot_idx: usize) {
        self.slots[slot_idx].prev = NONE;
        self.slots[slot_idx].next = self.head;
        if self.head != NONE {
            self.slots[self.head].prev = slot_idx;
        }
        self.head = slot_idx;
        if self.tail == NONE {
            self.tail = slot_idx;
        }
    }

    fn touch(&mut self, slot_idx: usize) {
        if self.head == slot_idx {
            return;
        }
        self.unlink(slot_idx);
        self.push_front(slot_idx);
    }

    /// Returns cache keys from most- to least-recently-used, for tests that
    /// assert LRU ordering directly.
    #[cfg(test)]
    fn order(&self) -> Vec<GlyphCacheKey> {
        let mut out = Vec::new();
        let mut cur = self.head;
        while cur != NONE {
            out.push(self.slots[cur].key);
            cur = self.slots[cur].next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::GlyphFormat;

    fn glyph(bytes: usize) -> RenderedGlyph {
        RenderedGlyph {
            bitmap: vec![0u8; bytes],
            width: 4,
            height: 4,
            format: GlyphFormat::Grayscale,
            bearing_x: 0,
            bearing_y: 4,
            advance: 4,
        }
    }

    fn key(id: u32) -> GlyphCacheKey {
        GlyphCacheKey::new(FaceIndex::PRIMARY, id, FontStyle::Regular, 16.0)
    }

    #[test]
    fn insert_and_get_roundtrips() {
        let mut cache = GlyphCache::new(4096);
        let evicted = cache.insert(key(1), glyph(32));
        assert!(evicted.is_empty());
        assert!(cache.get(&key(1)).is_some());
    }

    #[test]
    fn lru_monotonic_eviction_order() {
        // Budget fits exactly two 96-byte entries (32 bytes + 64 overhead each).
        let mut cache = GlyphCache::new(192);
        cache.insert(key(1), glyph(32));
        cache.insert(key(2), glyph(32));
        // Touch key(1) so key(2) becomes least-recently-used.
        cache.get(&key(1));
        let evicted = cache.insert(key(3), glyph(32));
        assert_eq!(evicted, vec![key(2)]);
        assert!(cache.contains(&key(1)));
        assert!(cache.contains(&key(3)));
        assert!(!cache.contains(&key(2)));
    }

    #[test]
    fn budget_enforced_after_insert() {
        let mut cache = GlyphCache::new(200);
        cache.insert(key(1), glyph(32));
        cache.insert(key(2), glyph(32));
        cache.insert(key(3), glyph(32));
        assert!(cache.used_bytes() <= cache.budget_bytes());
    }

    #[test]
    fn touching_reorders_to_front() {
        let mut cache = GlyphCache::new(4096);
        cache.insert(key(1), glyph(16));
        cache.insert(key(2), glyph(16));
        cache.insert(key(3), glyph(16));
        cache.get(&key(1));
        assert_eq!(cache.order(), vec![key(1), key(3), key(2)]);
    }

    #[test]
    fn slot_reuse_keeps_indices_stable_for_survivors() {
        let mut cache = GlyphCache::new(192);
        cache.insert(key(1), glyph(32));
        cache.insert(key(2), glyph(32));
        cache.insert(key(3), glyph(32)); // evicts key(1)
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn placement_tracks_independently_of_lru_order() {
        let mut cache = GlyphCache::new(4096);
        cache.insert(key(1), glyph(16));
        assert!(cache.placement(&key(1)).is_none());
        cache.set_placement(
            &key(1),
            AtlasPlacement {
                atlas_index: 0,
                x: 10,
                y: 20,
            },
        );
        assert_eq!(
            cache.placement(&key(1)),
            Some(AtlasPlacement {
                atlas_index: 0,
                x: 10,
                y: 20
            })
        );
    }
}
