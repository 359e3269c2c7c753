//! Script-bucket classification used to memoize "which fallback family
//! first satisfied this script" so the resolver can skip straight to a
//! known-good fallback for unseen codepoints in an already-resolved script,
//! rather than rescanning every fallback face.

use rustc_hash::FxHashMap;

use crate::face::FaceIndex;

/// Coarse script bucket for a codepoint. Values above the Unicode range are
/// used as synthetic bucket tags; codepoints outside any named bucket use
/// their own value so they never collide with a tag and are effectively
/// unbucketed (each gets its own resolver cache entry, no cross-codepoint
/// memoization).
pub fn fallback_bucket_key(c: char) -> u32 {
    let cp = c as u32;
    match cp {
        0xAC00..=0xD7A3 | 0x1100..=0x11FF => 0x11_0000, // Hangul
        0x3040..=0x30FF => 0x11_0001,                   // Hiragana/Katakana
        0x3400..=0x9FFF | 0xF900..=0xFAFF => 0x11_0002,  // Han/CJK
        0x0600..=0x06FF | 0x0750..=0x077F => 0x11_0003,  // Arabic
        0x0900..=0x097F => 0x11_0004,                    // Devanagari
        0x0E00..=0x0E7F => 0x11_0005,                    // Thai
        0x0590..=0x05FF => 0x11_0006,                    // Hebrew
        0x0400..=0x04FF => 0x11_0007,                    // Cyrillic
        0x0370..=0x03FF => 0x11_0008,                    // Greek
        0x1F300..=0x1FAFF | 0x2600..=0x27BF => 0x11_0009, // Emoji / pictographs
        _ => cp,
    }
}

/// Memoizes the first fallback family that satisfied a given script bucket.
#[derive(Default)]
pub struct FallbackBucketCache {
    bucket_to_fallback: FxHashMap<u32, FaceIndex>,
}

impl FallbackBucketCache {
    pub fn get(&self, bucket: u32) -> Option<FaceIndex> {
        self.bucket_to_fallback.get(&bucket).copied()
    }

    pub fn record(&mut self, bucket: u32, face: FaceIndex) {
        self.bucket_to_fallback.entry(bucket).or_insert(face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangul_and_han_are_distinct_buckets() {
        assert_ne!(fallback_bucket_key('가'), fallback_bucket_key('中'));
    }

    #[test]
    fn same_script_shares_a_bucket() {
        assert_eq!(fallback_bucket_key('一'), fallback_bucket_key('二'));
    }

    #[test]
    fn unbucketed_codepoints_use_their_own_value() {
        assert_eq!(fallback_bucket_key('A'), 'A' as u32);
    }

    #[test]
    fn cache_remembers_first_winner() {
        let mut cache = FallbackBucketCache::default();
        let bucket = fallback_bucket_key('中');
        assert!(cache.get(bucket).is_none());
        cache.record(bucket, FaceIndex::fallback(1));
        cache.record(bucket, FaceIndex::fallback(2)); // should not overwrite
        assert_eq!(cache.get(bucket), Some(FaceIndex::fallback(1)));
    }
}
