//! Screen Extractor: walks a `Terminal`'s viewport and flattens it into a
//! `Vec<CellData>` the renderer can iterate without touching the VT grid
//! again. Kept a pure function of `(Terminal, Palette)` so it can be
//! unit-tested against a `GridTerminal` without any GPU or font machinery.

use term_core::{Palette, Rgba8, WidthTable};
use term_vt::{Cell, CellContent, ColorSpec, Terminal};

use crate::cell_data::CellData;
use crate::error::{ExtractError, Result};

const MAX_VIEWPORT_CELLS: u32 = 1 << 20;

fn resolve_color(spec: ColorSpec, palette: &Palette, default: Rgba8) -> Rgba8 {
    match spec {
        ColorSpec::Default => default,
        ColorSpec::Indexed(i) => palette.get(i),
        ColorSpec::Rgb(c) => c,
    }
}

fn cell_data_for(col: u16, row: u16, cell: &Cell, palette: &Palette, width_table: &WidthTable) -> CellData {
    let (codepoint, is_wide_continuation) = match cell.content {
        CellContent::Empty => (' ', false),
        CellContent::Char(c) => (c, false),
        CellContent::WideSpacer => (' ', true),
    };

    let width = if is_wide_continuation {
        0
    } else {
        width_table.width(codepoint).max(1)
    };

    let fg = resolve_color(cell.style.fg, palette, palette.default_fg);
    let bg = resolve_color(cell.style.bg, palette, palette.default_bg);

    CellData {
        col,
        row,
        codepoint,
        width,
        is_wide_continuation,
        fg,
        bg,
        bold: cell.style.bold,
        italic: cell.style.italic,
        dim: cell.style.dim,
        strikethrough: cell.style.strikethrough,
        inverse: cell.style.inverse,
        underline: cell.style.underline,
    }
}

/// Flattens `terminal`'s current viewport into row-major `CellData`,
/// resolving indexed/default colors against `palette`. Inverse video is
/// carried through as a flag only — fg/bg stay the cell's own resolved
/// colors; the frame assembler and shader realize the swap by painting a
/// block glyph and reading the background buffer, not by pre-swapping
/// here (see `term_gpu::frame_assembler`).
pub fn extract_screen(
    terminal: &dyn Terminal,
    palette: &Palette,
    width_table: &WidthTable,
) -> Result<Vec<CellData>> {
    let (cols, rows) = terminal.dimensions();
    let total = cols as u32 * rows as u32;
    if total > MAX_VIEWPORT_CELLS {
        tracing::warn!(cols, rows, max = MAX_VIEWPORT_CELLS, "viewport exceeds extractor buffer limit");
        return Err(ExtractError::ViewportTooLarge {
            cols,
            rows,
            max: MAX_VIEWPORT_CELLS,
        });
    }

    let mut out = Vec::with_capacity(total as usize);
    terminal.iterate_viewport(&mut |col, row, cell| {
        out.push(cell_data_for(col, row, cell, palette, width_table));
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use term_vt::GridTerminal;

    #[test]
    fn ascii_hello_extracts_in_row_major_order() {
        let mut term = GridTerminal::new(10, 2);
        term.feed(b"HELLO");
        let palette = Palette::default();
        let width_table = WidthTable::default();
        let cells = extract_screen(&term, &palette, &width_table).unwrap();
        let text: String = cells
            .iter()
            .take(5)
            .map(|c| c.codepoint)
            .collect();
        assert_eq!(text, "HELLO");
        assert_eq!(cells[0].row, 0);
        assert_eq!(cells[0].col, 0);
    }

    #[test]
    fn inverse_video_flag_is_carried_without_swapping_colors() {
        let mut term = GridTerminal::new(10, 1);
        term.feed(b"\x1b[7mX\x1b[0m");
        let palette = Palette::default();
        let width_table = WidthTable::default();
        let cells = extract_screen(&term, &palette, &width_table).unwrap();
        assert_eq!(cells[0].fg, palette.default_fg);
        assert_eq!(cells[0].bg, palette.default_bg);
        assert!(cells[0].inverse);
    }

    #[test]
    fn wide_character_marks_continuation_cell() {
        let mut term = GridTerminal::new(10, 1);
        term.feed("中".as_bytes());
        let palette = Palette::default();
        let width_table = WidthTable::default();
        let cells = extract_screen(&term, &palette, &width_table).unwrap();
        assert_eq!(cells[0].width, 2);
        assert!(!cells[0].is_wide_continuation);
        assert!(cells[1].is_wide_continuation);
        assert_eq!(cells[1].width, 0);
    }

    #[test]
    fn viewport_size_matches_cell_count() {
        let term = GridTerminal::new(4, 3);
        let palette = Palette::default();
        let width_table = WidthTable::default();
        let cells = extract_screen(&term, &palette, &width_table).unwrap();
        assert_eq!(cells.len(), 12);
    }
}
