//! Minimal reference `Terminal` implementation: a fixed grid plus just
//! enough SGR parsing to exercise bold/italic/underline/inverse/dim/
//! strikethrough and 8/16/256-color and truecolor foreground/background.
//!
//! The real VT escape-sequence parser is out of scope for this crate; this
//! exists so the rest of the pipeline (extraction, assembly, rendering) has
//! something concrete to run against in development and tests.

use term_core::{UnderlineStyle, WidthTable};

use crate::cell::{Cell, CellContent, CellStyle, ColorSpec};
use crate::terminal::Terminal;

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParserState {
    Ground,
    Escape,
    Csi { params: Vec<u32>, current: Option<u32> },
}

/// A fixed-size grid terminal with plain text + SGR support.
pub struct GridTerminal {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    cursor_col: u16,
    cursor_row: u16,
    style: CellStyle,
    state: ParserState,
    width_table: WidthTable,
    /// Bytes of a UTF-8 sequence split across `feed()` calls.
    pending_utf8: Vec<u8>,
}

impl GridTerminal {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cells: vec![Cell::EMPTY; cols as usize * rows as usize],
            cursor_col: 0,
            cursor_row: 0,
            style: CellStyle::default(),
            state: ParserState::Ground,
            width_table: WidthTable::default(),
            pending_utf8: Vec::new(),
        }
    }

    fn index(&self, col: u16, row: u16) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    fn put_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newline();
            return;
        }
        if ch == '\r' {
            self.cursor_col = 0;
            return;
        }
        if (ch as u32) < 0x20 {
            // Other control characters are consumed silently (tab, bell, etc.
            // are out of scope for this reference implementation).
            return;
        }

        let width = self.width_table.width(ch);
        if width == 0 {
            return;
        }
        if self.cursor_col >= self.cols {
            self.newline();
        }

        let idx = self.index(self.cursor_col, self.cursor_row);
        self.cells[idx] = Cell {
            content: CellContent::Char(ch),
            style: self.style,
        };

        if width == 2 && self.cursor_col + 1 < self.cols {
            let spacer_idx = self.index(self.cursor_col + 1, self.cursor_row);
            self.cells[spacer_idx] = Cell {
                content: CellContent::WideSpacer,
                style: self.style,
            };
            self.cursor_col += 2;
        } else {
            self.cursor_col += 1;
        }
    }

    fn newline(&mut self) {
        self.cursor_col = 0;
        if self.cursor_row + 1 < self.rows {
            self.cursor_row += 1;
        } else {
            // Scroll up by one row.
            let cols = self.cols as usize;
            self.cells.drain(0..cols);
            self.cells.resize(self.cols as usize * self.rows as usize, Cell::EMPTY);
        }
    }

    fn apply_sgr(&mut self, params: &[u32]) {
        if params.is_empty() {
            self.style = CellStyle::default();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.style = CellStyle::default(),
                1 => self.style.bold = true,
                2 => self.style.dim = true,
                3 => self.style.italic = true,
                4 => self.style.underline = UnderlineStyle::Single,
                7 => self.style.inverse = true,
                9 => self.style.strikethrough = true,
                21 => self.style.underline = UnderlineStyle::Double,
                22 => {
                    self.style.bold = false;
                    self.style.dim = false;
                }
                23 => self.style.italic = false,
                24 => self.style.underline = UnderlineStyle::None,
                27 => self.style.inverse = false,
                29 => self.style.strikethrough = false,
                n @ 30..=37 => self.style.fg = ColorSpec::Indexed((n - 30) as u8),
                38 => {
                    if let Some(consumed) = self.parse_extended_color(&params[i..], true) {
                        i += consumed;
                        continue;
                    }
                }
                39 => self.style.fg = ColorSpec::Default,
                n @ 40..=47 => self.style.bg = ColorSpec::Indexed((n - 40) as u8),
                48 => {
                    if let Some(consumed) = self.parse_extended_color(&params[i..], false) {
                        i += consumed;
                        continue;
                    }
                }
                49 => self.style.bg = ColorSpec::Default,
                n @ 90..=97 => self.style.fg = ColorSpec::Indexed((n - 90) as u8 + 8),
                n @ 100..=107 => self.style.bg = ColorSpec::Indexed((n - 100) as u8 + 8),
                _ => {}
            }
            i += 1;
        }
    }

    /// Parses `38;5;n` / `38;2;r;g;b` (or the `48;...` background form)
    /// starting at `params[0]`. Returns the number of params consumed.
    fn parse_extended_color(&mut self, params: &[u32], is_fg: bool) -> Option<usize> {
        match params.get(1) {
            Some(5) => {
                let idx = *params.get(2)? as u8;
                let spec = ColorSpec::Indexed(idx);
                if is_fg {
                    self.style.fg = spec;
                } else {
                    self.style.bg = spec;
                }
                Some(3)
            }
            Some(2) => {
                let r = *params.get(2)? as u8;
                let g = *params.get(3)? as u8;
                let b = *params.get(4)? as u8;
                let spec = ColorSpec::Rgb(term_core::Rgba8::rgb(r, g, b));
                if is_fg {
                    self.style.fg = spec;
                } else {
                    self.style.bg = spec;
                }
                Some(5)
            }
            _ => None,
        }
    }

    fn feed_byte(&mut self, byte: u8) {
        match &mut self.state {
            ParserState::Ground => {
                if byte == 0x1B {
                    self.state = ParserState::Escape;
                }
            }
            ParserState::Escape => {
                if byte == b'[' {
                    self.state = ParserState::Csi {
                        params: Vec::new(),
                        current: None,
                    };
                } else {
                    self.state = ParserState::Ground;
                }
            }
            ParserState::Csi { params, current } => {
                match byte {
                    b'0'..=b'9' => {
                        let digit = (byte - b'0') as u32;
                        *current = Some(current.unwrap_or(0) * 10 + digit);
                    }
                    b';' => {
                        params.push(current.take().unwrap_or(0));
                    }
                    b'm' => {
                        params.push(current.take().unwrap_or(0));
                        let params = std::mem::take(params);
                        self.state = ParserState::Ground;
                        self.apply_sgr(&params);
                    }
                    0x40..=0x7E => {
                        // Any other final byte (cursor movement, clears, ...):
                        // out of scope, discard the sequence.
                        self.state = ParserState::Ground;
                    }
                    _ => {}
                }
            }
        }
    }
}

impl Terminal for GridTerminal {
    fn dimensions(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut new_cells = vec![Cell::EMPTY; cols as usize * rows as usize];
        for row in 0..self.rows.min(rows) {
            for col in 0..self.cols.min(cols) {
                let old_idx = self.index(col, row);
                new_cells[row as usize * cols as usize + col as usize] = self.cells[old_idx];
            }
        }
        self.cols = cols;
        self.rows = rows;
        self.cells = new_cells;
        self.cursor_col = self.cursor_col.min(cols.saturating_sub(1));
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
    }

    fn feed(&mut self, bytes: &[u8]) {
        let mut combined;
        let input: &[u8] = if self.pending_utf8.is_empty() {
            bytes
        } else {
            combined = std::mem::take(&mut self.pending_utf8);
            combined.extend_from_slice(bytes);
            &combined
        };

        let mut i = 0;
        while i < input.len() {
            let byte = input[i];
            if byte == 0x1B || !matches!(self.state, ParserState::Ground) {
                self.feed_byte(byte);
                i += 1;
                continue;
            }
            if byte < 0x80 {
                self.put_char(byte as char);
                i += 1;
                continue;
            }
            // Multi-byte UTF-8 sequence: find its length from the lead byte.
            let len = utf8_seq_len(byte);
            if i + len > input.len() {
                // Incomplete sequence at the end of this chunk; carry it
                // over to the next `feed()` call.
                self.pending_utf8 = input[i..].to_vec();
                break;
            }
            match std::str::from_utf8(&input[i..i + len]) {
                Ok(s) => {
                    for ch in s.chars() {
                        self.put_char(ch);
                    }
                }
                Err(_) => {
                    tracing::warn!("invalid UTF-8 sequence in terminal input, skipping");
                }
            }
            i += len;
        }
    }

    fn iterate_viewport(&self, f: &mut dyn FnMut(u16, u16, &Cell)) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = &self.cells[self.index(col, row)];
                f(row, col, cell);
            }
        }
    }
}

fn utf8_seq_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(term: &GridTerminal) -> Vec<(u16, u16, Cell)> {
        let mut out = Vec::new();
        term.iterate_viewport(&mut |row, col, cell| out.push((row, col, *cell)));
        out
    }

    #[test]
    fn ascii_hello_lands_at_row_zero() {
        let mut term = GridTerminal::new(80, 24);
        term.feed(b"HELLO");
        let cells = collect(&term);
        let expected = "HELLO";
        for (i, ch) in expected.chars().enumerate() {
            let (row, col, cell) = cells[i];
            assert_eq!((row, col), (0, i as u16));
            assert_eq!(cell.content, CellContent::Char(ch));
        }
    }

    #[test]
    fn sgr_inverse_sets_flag() {
        let mut term = GridTerminal::new(10, 1);
        term.feed(b"\x1b[7mX");
        let cells = collect(&term);
        assert_eq!(cells[0].2.content, CellContent::Char('X'));
        assert!(cells[0].2.style.inverse);
    }

    #[test]
    fn sgr_reset_clears_attributes() {
        let mut term = GridTerminal::new(10, 1);
        term.feed(b"\x1b[1;4mA\x1b[0mB");
        let cells = collect(&term);
        assert!(cells[0].2.style.bold);
        assert_eq!(cells[0].2.style.underline, UnderlineStyle::Single);
        assert!(!cells[1].2.style.bold);
        assert_eq!(cells[1].2.style.underline, UnderlineStyle::None);
    }

    #[test]
    fn truecolor_fg_sgr() {
        let mut term = GridTerminal::new(10, 1);
        term.feed(b"\x1b[38;2;10;20;30mA");
        let cells = collect(&term);
        assert_eq!(
            cells[0].2.style.fg,
            ColorSpec::Rgb(term_core::Rgba8::rgb(10, 20, 30))
        );
    }

    #[test]
    fn wide_character_emits_spacer_tail() {
        let mut term = GridTerminal::new(10, 1);
        term.feed("你".as_bytes());
        let cells = collect(&term);
        assert_eq!(cells[0].2.content, CellContent::Char('你'));
        assert_eq!(cells[1].2.content, CellContent::WideSpacer);
    }

    #[test]
    fn split_utf8_sequence_across_feed_calls() {
        let mut term = GridTerminal::new(10, 1);
        let bytes = "你".as_bytes();
        term.feed(&bytes[..1]);
        term.feed(&bytes[1..]);
        let cells = collect(&term);
        assert_eq!(cells[0].2.content, CellContent::Char('你'));
    }

    #[test]
    fn newline_wraps_to_next_row() {
        let mut term = GridTerminal::new(5, 3);
        term.feed(b"AB\nCD");
        let cells = collect(&term);
        assert_eq!(cells[0].2.content, CellContent::Char('A'));
        assert_eq!(cells[5].2.content, CellContent::Char('C'));
    }

    #[test]
    fn resize_preserves_overlap() {
        let mut term = GridTerminal::new(5, 2);
        term.feed(b"AB");
        term.resize(3, 3);
        let cells = collect(&term);
        assert_eq!(cells[0].2.content, CellContent::Char('A'));
    }
}
