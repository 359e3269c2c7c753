//! A `raw-window-handle` wrapper around a raw `ANativeWindow*`, so a window
//! obtained from a Java `Surface` via JNI (see `jni_bridge`) can be handed
//! straight to `wgpu::Instance::create_surface`.

use std::ptr::NonNull;

use raw_window_handle::{
    AndroidDisplayHandle, AndroidNdkWindowHandle, DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle,
    WindowHandle,
};

/// Owns a `*mut ANativeWindow` for the lifetime of the `wgpu::Surface` built
/// from it. The pointer came from `ANativeWindow_fromSurface`, which bumps
/// the native window's refcount; dropping this releases it.
pub struct AndroidWindowHandle {
    native_window: NonNull<std::ffi::c_void>,
}

// The pointer is only ever read to build a `RawWindowHandle`; it's not
// dereferenced by this crate, so sharing it across threads is sound.
unsafe impl Send for AndroidWindowHandle {}
unsafe impl Sync for AndroidWindowHandle {}

impl AndroidWindowHandle {
    /// # Safety
    /// `native_window` must be a valid `ANativeWindow*` whose refcount the
    /// caller has already incremented (e.g. via `ANativeWindow_fromSurface`)
    /// and is transferring ownership of to this handle.
    pub unsafe fn from_raw(native_window: NonNull<std::ffi::c_void>) -> Self {
        Self { native_window }
    }
}

impl HasWindowHandle for AndroidWindowHandle {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let raw = RawWindowHandle::AndroidNdk(AndroidNdkWindowHandle::new(self.native_window));
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for AndroidWindowHandle {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::Android(AndroidDisplayHandle::new());
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

#[cfg(target_os = "android")]
impl Drop for AndroidWindowHandle {
    fn drop(&mut self) {
        unsafe { ndk_sys::ANativeWindow_release(self.native_window.as_ptr().cast()) };
    }
}
