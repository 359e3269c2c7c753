//! Renderer-facing cell representation: the flat, palette-resolved record
//! the frame assembler consumes one of per visible cell.

use term_core::{Rgba8, UnderlineStyle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellData {
    pub col: u16,
    pub row: u16,
    pub codepoint: char,
    pub width: u8,
    pub is_wide_continuation: bool,
    pub fg: Rgba8,
    pub bg: Rgba8,
    pub bold: bool,
    pub italic: bool,
    pub dim: bool,
    pub strikethrough: bool,
    pub inverse: bool,
    pub underline: UnderlineStyle,
}

impl CellData {
    /// True for cells with no glyph to render regardless of styling: the
    /// tail half of a wide character, and the null-codepoint placeholder a
    /// prior wide write leaves behind. Unstyled plain spaces are a separate,
    /// context-dependent skip (they still need a glyph when styled), so
    /// that check lives with the caller instead of here.
    pub fn is_glyph_empty(&self) -> bool {
        self.is_wide_continuation || self.codepoint == '\0'
    }
}
