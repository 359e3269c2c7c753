//! Embedded font bytes, read from the APK's `assets/` folder via the NDK
//! `AssetManager`. The JNI bridge hands over the Java `AssetManager` object
//! once per process; everything after that is synchronous NDK I/O.

use std::ffi::CString;
use std::io::Read;
use std::ptr::NonNull;

use ndk::asset::AssetManager;

use crate::error::{PlatformError, Result};
use crate::renderer_state::FontAssetBytes;

/// Wraps the `AAssetManager*` obtained from the Java `AssetManager` so
/// `load` calls don't need a `JNIEnv` on hand.
pub struct AndroidAssetLoader {
    manager: AssetManager,
}

impl AndroidAssetLoader {
    /// # Safety
    /// `ptr` must be a valid, non-null `*mut ndk_sys::AAssetManager` obtained
    /// from `AAssetManager_fromJava` and kept alive by the caller (the JVM
    /// owns the underlying Java `AssetManager` for the app's lifetime).
    pub unsafe fn from_raw(ptr: NonNull<ndk_sys::AAssetManager>) -> Self {
        Self {
            manager: AssetManager::from_ptr(ptr.cast()),
        }
    }

    pub fn load(&self, path: &str) -> Result<Vec<u8>> {
        let c_path = CString::new(path).map_err(|e| PlatformError::AssetLoad(format!("invalid path {path:?}: {e}")))?;
        let mut asset = self
            .manager
            .open(&c_path)
            .ok_or_else(|| PlatformError::AssetLoad(format!("asset not found: {path}")))?;
        let mut buffer = Vec::new();
        asset.read_to_end(&mut buffer).map_err(|e| PlatformError::AssetLoad(format!("reading {path}: {e}")))?;
        Ok(buffer)
    }

    /// Loads `assets/fonts/{regular,bold,italic,bold_italic}.ttf`, treating
    /// everything but `regular.ttf` as optional.
    pub fn load_font_bytes(&self) -> Result<FontAssetBytes> {
        Ok(FontAssetBytes {
            regular: self.load("fonts/regular.ttf")?,
            bold: self.load("fonts/bold.ttf").ok(),
            italic: self.load("fonts/italic.ttf").ok(),
            bold_italic: self.load("fonts/bold_italic.ttf").ok(),
        })
    }
}
