//! VT-boundary error taxonomy (the "VT error" kind in the error handling design).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtError {
    #[error("viewport coordinate ({col}, {row}) out of range for a {cols}x{rows} grid")]
    OutOfRange {
        col: u16,
        row: u16,
        cols: u16,
        rows: u16,
    },
}

pub type Result<T> = std::result::Result<T, VtError>;
