//! Screen extraction: turns a live `Terminal` viewport into flat,
//! palette-resolved `CellData` ready for the frame assembler.

pub mod cell_data;
pub mod error;
pub mod extractor;

pub use cell_data::CellData;
pub use error::{ExtractError, Result};
pub use extractor::extract_screen;
