//! Environment-overridable resource limits, following the same
//! `env_u64`/`env_usize` pattern the wider Blinc GPU stack uses for tunables
//! like `BLINC_WGPU_MAX_BUFFER_MB`.

use std::env;

pub fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Glyph cache and atlas sizing, overridable via environment variables so a
/// low-memory device can be configured without a recompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSystemConfig {
    /// Byte budget for the glyph bitmap cache (invariant #2 in the spec).
    pub glyph_cache_budget_bytes: usize,
    /// Side length of a freshly created atlas page.
    pub atlas_initial_size: u32,
    /// Largest an atlas page is allowed to grow to.
    pub atlas_max_size: u32,
    /// Padding in pixels added around each packed glyph.
    pub atlas_padding: u32,
}

impl Default for FontSystemConfig {
    fn default() -> Self {
        Self {
            glyph_cache_budget_bytes: env_usize("TERM_GLYPH_CACHE_BUDGET_BYTES", 16 * 1024 * 1024),
            atlas_initial_size: env_u32("TERM_ATLAS_INITIAL_SIZE", 1024),
            atlas_max_size: env_u32("TERM_ATLAS_MAX_SIZE", 4096),
            atlas_padding: env_u32("TERM_ATLAS_PADDING", 2),
        }
    }
}

impl FontSystemConfig {
    /// Clamp `atlas_max_size` to whatever the GPU adapter actually supports.
    pub fn clamp_to_device_limit(mut self, max_texture_dimension_2d: u32) -> Self {
        self.atlas_max_size = self.atlas_max_size.min(max_texture_dimension_2d);
        self.atlas_initial_size = self.atlas_initial_size.min(self.atlas_max_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = FontSystemConfig::default();
        assert!(cfg.atlas_initial_size <= cfg.atlas_max_size);
        assert!(cfg.glyph_cache_budget_bytes > 0);
    }

    #[test]
    fn clamp_never_exceeds_device_limit() {
        let cfg = FontSystemConfig::default().clamp_to_device_limit(512);
        assert_eq!(cfg.atlas_max_size, 512);
        assert_eq!(cfg.atlas_initial_size, 512);
    }
}
