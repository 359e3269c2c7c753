//! Grid cell content and resolved style, as produced by the VT terminal and
//! consumed by the Screen Extractor.

use term_core::{Rgba8, UnderlineStyle};

/// What a cell displays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellContent {
    /// Never written; the extractor skips these.
    #[default]
    Empty,
    /// A single codepoint (or the base codepoint of a grapheme cluster —
    /// combining marks beyond the base are a non-goal, see SPEC_FULL.md).
    Char(char),
    /// The tail of a double-width character. Skipped by the extractor;
    /// the wide character was already emitted as the lead cell with `width=2`.
    WideSpacer,
}

/// A color reference as stored by the terminal; resolved against a
/// [`term_core::Palette`] by the Screen Extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpec {
    Default,
    Indexed(u8),
    Rgb(Rgba8),
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::Default
    }
}

/// Style flags plus unresolved fg/bg color references for one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub fg: ColorSpec,
    pub bg: ColorSpec,
    pub bold: bool,
    pub italic: bool,
    pub dim: bool,
    pub strikethrough: bool,
    pub inverse: bool,
    pub underline: UnderlineStyle,
}

/// One grid cell: content plus its style.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    pub content: CellContent,
    pub style: CellStyle,
}

impl Cell {
    pub const EMPTY: Self = Self {
        content: CellContent::Empty,
        style: CellStyle {
            fg: ColorSpec::Default,
            bg: ColorSpec::Default,
            bold: false,
            italic: false,
            dim: false,
            strikethrough: false,
            inverse: false,
            underline: UnderlineStyle::None,
        },
    };
}
