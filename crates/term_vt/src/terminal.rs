//! The VT terminal interface consumed by the Screen Extractor.
//!
//! The real escape-sequence parser lives outside this workspace; this trait
//! is the seam it plugs into. [`crate::GridTerminal`] is a reference
//! implementation good enough to develop and test the rest of the pipeline
//! against.

use crate::cell::Cell;

/// A terminal grid: feed bytes in, iterate resolved cells out.
pub trait Terminal {
    /// Current viewport dimensions in cells.
    fn dimensions(&self) -> (u16, u16);

    /// Resize the viewport. Implementations should preserve as much of the
    /// existing content as practical; the reference implementation simply
    /// reflows into a freshly sized grid, clearing cells outside the old
    /// bounds.
    fn resize(&mut self, cols: u16, rows: u16);

    /// Ingest raw bytes, including escape sequences.
    fn feed(&mut self, bytes: &[u8]);

    /// Visit every visible cell in row-major order. `f(row, col, cell)`.
    fn iterate_viewport(&self, f: &mut dyn FnMut(u16, u16, &Cell));
}
