//! Font-subsystem error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to parse embedded font data: {0}")]
    ParseFailed(String),

    #[error("primary regular face failed to load, renderer cannot start")]
    PrimaryFaceMissing,

    #[error("no face covers codepoint U+{0:04X}")]
    NoCoverage(u32),

    #[error("glyph {glyph_index} from face {face_index} exceeds the atlas's maximum dimensions ({max}x{max})")]
    GlyphTooLarge {
        face_index: u32,
        glyph_index: u32,
        max: u32,
    },

    #[error("atlas set exhausted: could not place a new atlas page")]
    AtlasSetExhausted,
}

pub type Result<T> = std::result::Result<T, FontError>;
