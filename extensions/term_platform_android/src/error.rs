//! Platform-boundary error taxonomy. Never crosses the JNI boundary as a
//! panic: every `#[no_mangle]` entry point catches unwinds and maps
//! whatever went wrong to a log line plus a default/empty return value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("unknown renderer handle {0}")]
    UnknownHandle(u64),

    #[error("renderer for handle {0} has no surface yet (on_surface_changed not called)")]
    NoSurface(u64),

    #[error("font system error: {0}")]
    Font(#[from] term_font::FontError),

    #[error("GPU renderer error: {0}")]
    Renderer(#[from] term_gpu::RendererError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("invalid UTF-8 crossing the platform boundary")]
    InvalidUtf8,

    #[error("asset load failed: {0}")]
    AssetLoad(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
