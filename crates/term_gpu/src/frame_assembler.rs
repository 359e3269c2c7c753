//! Frame Assembler: turns one frame's extracted `CellData` plus the Dynamic
//! Font System's glyph lookups into the two GPU payloads the renderer
//! uploads each frame — a flat per-cell background color buffer and the
//! instanced glyph buffer.
//!
//! Inverse video is realized here as the spec describes it, not as a
//! straight color swap: an extra block-character (`U+2588`) instance is
//! emitted first, colored with the cell's own foreground, painting a solid
//! fill; the actual glyph is then drawn on top with `attributes.inverse`
//! set, and the fragment shader (not this module) chooses the background
//! color for that glyph's coverage instead of its stored foreground.

use term_core::{CellAttributes, CellInstance, FontStyle, Rgba8};
use term_extract::CellData;
use term_font::FontSystem;

/// Block character painted behind an inverse-video glyph.
const INVERSE_BLOCK_CODEPOINT: char = '\u{2588}';

/// The two GPU payloads for one frame: a flat `cols * rows` background
/// color buffer (storage buffer, binding 1 on the `cell_bg`/`cell_text`
/// pipelines) and the instanced glyph buffer.
#[derive(Default)]
pub struct AssembledFrame {
    pub bg_colors: Vec<u32>,
    pub text_instances: Vec<CellInstance>,
}

fn style_for(cell: &CellData) -> FontStyle {
    FontStyle::from_bold_italic(cell.bold, cell.italic)
}

fn is_unstyled_space(cell: &CellData, default_fg: Rgba8) -> bool {
    cell.codepoint == ' '
        && cell.fg == default_fg
        && !cell.bold
        && !cell.italic
        && !cell.dim
        && !cell.strikethrough
        && !cell.inverse
        && cell.underline == term_core::UnderlineStyle::None
}

fn push_glyph_instance(
    instances: &mut Vec<CellInstance>,
    font_system: &mut FontSystem,
    codepoint: char,
    style: FontStyle,
    grid_pos: [u16; 2],
    color: Rgba8,
    attrs: CellAttributes,
) {
    match font_system.make_cell_text(codepoint, style) {
        Ok(Some(glyph)) if glyph.glyph_width > 0 && glyph.glyph_height > 0 => {
            instances.push(CellInstance::new(
                [glyph.glyph_x, glyph.glyph_y],
                [glyph.glyph_width, glyph.glyph_height],
                [glyph.bearing_x as i16, glyph.bearing_y as i16],
                grid_pos,
                color,
                glyph.atlas_page as u8,
                glyph.is_color,
                attrs,
            ));
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!("glyph rasterization failed for U+{:04X}: {err}", codepoint as u32);
        }
    }
}

/// Builds one frame's GPU payloads from the extracted cell grid.
///
/// `cols`/`rows` size the background buffer (cells outside `cells`' own
/// coordinates, e.g. never-written rows, stay zeroed/transparent).
/// `default_fg` drives the unstyled-space skip the spec calls out as an
/// optimization.
pub fn assemble_frame(
    cells: &[CellData],
    cols: u16,
    rows: u16,
    font_system: &mut FontSystem,
    default_fg: Rgba8,
) -> AssembledFrame {
    let mut frame = AssembledFrame {
        bg_colors: vec![0u32; cols as usize * rows as usize],
        text_instances: Vec::new(),
    };

    for cell in cells {
        if cell.row >= rows || cell.col >= cols {
            continue;
        }
        let index = cell.row as usize * cols as usize + cell.col as usize;
        frame.bg_colors[index] = cell.bg.pack();

        if cell.is_glyph_empty() {
            continue;
        }
        if is_unstyled_space(cell, default_fg) {
            continue;
        }

        let style = style_for(cell);
        let grid_pos = [cell.col, cell.row];

        if cell.inverse {
            push_glyph_instance(
                &mut frame.text_instances,
                font_system,
                INVERSE_BLOCK_CODEPOINT,
                FontStyle::Regular,
                grid_pos,
                cell.fg,
                CellAttributes::CLEARED,
            );
        }

        let attrs = CellAttributes {
            bold: cell.bold,
            italic: cell.italic,
            dim: cell.dim,
            strikethrough: cell.strikethrough,
            inverse: cell.inverse,
            underline: cell.underline,
        };
        push_glyph_instance(
            &mut frame.text_instances,
            font_system,
            cell.codepoint,
            style,
            grid_pos,
            cell.fg,
            attrs,
        );
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use term_core::{FontSize, FontSystemConfig, Palette, UnderlineStyle};
    use term_font::StubRasterizer;

    fn cell(col: u16, row: u16, ch: char) -> CellData {
        let palette = Palette::default();
        CellData {
            col,
            row,
            codepoint: ch,
            width: 1,
            is_wide_continuation: false,
            fg: palette.default_fg,
            bg: palette.default_bg,
            bold: false,
            italic: false,
            dim: false,
            strikethrough: false,
            inverse: false,
            underline: UnderlineStyle::None,
        }
    }

    fn system_font_bytes() -> Option<Vec<u8>> {
        const CANDIDATES: &[&str] = &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ];
        CANDIDATES
            .iter()
            .map(std::path::Path::new)
            .find(|p| p.exists())
            .and_then(|p| std::fs::read(p).ok())
    }

    fn test_system(bytes: Vec<u8>) -> FontSystem {
        let config = FontSystemConfig {
            glyph_cache_budget_bytes: 1 << 20,
            atlas_initial_size: 256,
            atlas_max_size: 1024,
            atlas_padding: 1,
        };
        FontSystem::from_embedded_primary(
            bytes,
            FontSize { points: 12.0, dpi: 96 },
            &config,
            Box::new(StubRasterizer::default()),
        )
        .unwrap()
    }

    #[test]
    fn wide_continuation_cells_are_skipped() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let mut system = test_system(bytes);

        let mut continuation = cell(1, 0, ' ');
        continuation.is_wide_continuation = true;
        let cells = vec![cell(0, 0, '中'), continuation];
        let palette = Palette::default();
        let frame = assemble_frame(&cells, 4, 1, &mut system, palette.default_fg);
        assert_eq!(frame.text_instances.len(), 1);
        assert_eq!(frame.bg_colors.len(), 4);
    }

    #[test]
    fn unstyled_blank_cells_produce_no_glyph_instance() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let mut system = test_system(bytes);
        let cells = vec![cell(0, 0, ' ')];
        let palette = Palette::default();
        let frame = assemble_frame(&cells, 4, 1, &mut system, palette.default_fg);
        assert!(frame.text_instances.is_empty());
    }

    #[test]
    fn inverse_video_emits_block_then_glyph() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let mut system = test_system(bytes);
        let mut c = cell(0, 0, 'X');
        c.inverse = true;
        let palette = Palette::default();
        let frame = assemble_frame(&[c], 4, 1, &mut system, palette.default_fg);
        assert_eq!(frame.text_instances.len(), 2);
        let block = &frame.text_instances[0];
        let glyph = &frame.text_instances[1];
        assert_eq!(block.attributes, CellAttributes::CLEARED.pack());
        assert_ne!(glyph.attributes & (1 << 4), 0, "second instance should carry the inverse bit");
    }

    #[test]
    fn background_buffer_records_every_cells_bg_color() {
        let Some(bytes) = system_font_bytes() else {
            eprintln!("skipping: no system font found");
            return;
        };
        let mut system = test_system(bytes);
        let palette = Palette::default();
        let mut c = cell(1, 0, 'A');
        c.bg = Rgba8::rgb(10, 20, 30);
        let frame = assemble_frame(&[c], 3, 1, &mut system, palette.default_fg);
        assert_eq!(frame.bg_colors[1], Rgba8::rgb(10, 20, 30).pack());
        assert_eq!(frame.bg_colors[0], 0);
    }
}
