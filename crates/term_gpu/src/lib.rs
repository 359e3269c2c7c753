//! Terminal GPU Renderer
//!
//! wgpu-based rendering of one terminal frame: a background clear pass,
//! an instanced cell-background pass, and an instanced glyph pass sampling
//! the Dynamic Font System's atlas textures.

pub mod frame_assembler;
pub mod renderer;
pub mod shaders;

pub use frame_assembler::{assemble_frame, AssembledFrame};
pub use renderer::{GpuRenderer, RendererConfig, RendererError};
