//! Terminal Core
//!
//! Shared data types for the terminal text rendering core: packed colors,
//! font-size/metrics math, cell style attributes, GPU-facing packed structs,
//! and environment-overridable resource configuration. Every other crate in
//! this workspace depends on this one; it holds no GPU device, no font
//! loading, and no VT state of its own.

pub mod attrs;
pub mod color;
pub mod config;
pub mod font_size;
pub mod gpu_types;
pub mod style;
pub mod width;

pub use attrs::{CellAttributes, UnderlineStyle};
pub use color::{Palette, Rgba8};
pub use config::FontSystemConfig;
pub use font_size::{CellMetrics, FontMetrics, FontSize};
pub use gpu_types::{AtlasDimensions, CellInstance, Uniforms};
pub use style::FontStyle;
pub use width::WidthTable;
