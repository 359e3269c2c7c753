//! Screen-extraction error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("terminal reported {cols}x{rows}, which exceeds the extractor's buffer limit of {max}")]
    ViewportTooLarge { cols: u16, rows: u16, max: u32 },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
