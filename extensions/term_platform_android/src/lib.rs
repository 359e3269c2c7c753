//! Android platform boundary.
//!
//! Splits into a pure-Rust, independently testable half (`registry`,
//! `renderer_state`, `platform_api`, `window`) and an Android-only half
//! (`assets`, `jni_bridge`) gated on `target_os = "android"` so the former
//! builds and tests on a host machine.

pub mod error;
pub mod platform_api;
pub mod registry;
pub mod renderer_state;
pub mod window;

#[cfg(target_os = "android")]
pub mod assets;
#[cfg(target_os = "android")]
pub mod jni_bridge;

pub use error::{PlatformError, Result};
pub use registry::RendererHandle;
pub use renderer_state::FontAssetBytes;
