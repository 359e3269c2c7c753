//! VT Terminal Interface
//!
//! The subsystem boundary this workspace consumes rather than implements:
//! the VT escape-sequence parser proper is out of scope (see SPEC_FULL.md
//! §1). This crate defines the [`Terminal`] trait the Screen Extractor reads
//! from, plus [`GridTerminal`], a reference implementation with just enough
//! SGR support to drive and test the renderer.

pub mod cell;
pub mod error;
pub mod grid;
pub mod terminal;

pub use cell::{Cell, CellContent, CellStyle, ColorSpec};
pub use error::{Result, VtError};
pub use grid::GridTerminal;
pub use terminal::Terminal;
