//! Pure-Rust, JNI-free façade over the renderer registry. Every operation
//! the embedding Android view dispatches funds through here; the JNI
//! bridge is a thin, panic-catching translation layer on top of this.
//!
//! Each call looks the handle up (briefly holding the registry lock), then
//! locks that one renderer for the duration of the operation — see
//! `registry`'s module docs for the two-level locking rationale.

use crate::error::{PlatformError, Result};
use crate::registry::{self, RendererHandle};
use crate::renderer_state::{FontAssetBytes, RendererState};
use crate::window::AndroidWindowHandle;

fn with_renderer<T>(handle: RendererHandle, f: impl FnOnce(&mut RendererState) -> T) -> Result<T> {
    let state = registry::get(handle).ok_or(PlatformError::UnknownHandle(handle))?;
    let mut state = state.lock().unwrap();
    Ok(f(&mut state))
}

/// Allocates a new renderer, returning the handle the caller threads
/// through every other call. The surface itself isn't built until the
/// first `on_surface_changed`.
pub fn on_surface_created(font_bytes: FontAssetBytes) -> RendererHandle {
    registry::insert(RendererState::new(font_bytes))
}

pub async fn on_surface_changed(handle: RendererHandle, window: AndroidWindowHandle, width_px: u32, height_px: u32, dpi: u16, font_size_px: f32) -> Result<()> {
    let state = registry::get(handle).ok_or(PlatformError::UnknownHandle(handle))?;
    // Held across the `await`: `on_surface_changed` does real GPU setup work,
    // which is exactly the "GPU operation" the registry's own lock must
    // never be held across — this is the per-renderer lock, not that one.
    let mut state = state.lock().unwrap();
    state.on_surface_changed(window, width_px, height_px, dpi, font_size_px).await
}

pub fn on_draw_frame(handle: RendererHandle) -> Result<()> {
    with_renderer(handle, |r| r.on_draw_frame())?
}

pub fn on_destroy(handle: RendererHandle) {
    let _ = with_renderer(handle, |r| r.on_destroy());
    registry::remove(handle);
}

pub fn process_input(handle: RendererHandle, bytes: &[u8]) -> Result<()> {
    with_renderer(handle, |r| r.process_input(bytes))
}

pub fn set_font_size(handle: RendererHandle, px: f32) -> Result<()> {
    with_renderer(handle, |r| r.set_font_size(px))
}

pub fn set_terminal_size(handle: RendererHandle, cols: u16, rows: u16) -> Result<()> {
    with_renderer(handle, |r| r.set_terminal_size(cols, rows))
}

pub fn set_show_fps(handle: RendererHandle, show: bool) -> Result<()> {
    with_renderer(handle, |r| r.set_show_fps(show))
}

pub fn scroll_delta(handle: RendererHandle, rows: i32) -> Result<()> {
    with_renderer(handle, |r| r.scroll_delta(rows))
}

pub fn scroll_to_bottom(handle: RendererHandle) -> Result<()> {
    with_renderer(handle, |r| r.scroll_to_bottom())
}

pub fn is_viewport_at_bottom(handle: RendererHandle) -> Result<bool> {
    with_renderer(handle, |r| r.is_viewport_at_bottom())
}

pub fn get_viewport_offset(handle: RendererHandle) -> Result<u32> {
    with_renderer(handle, |r| r.get_viewport_offset())
}

pub fn get_scrollback_rows(handle: RendererHandle) -> Result<u32> {
    with_renderer(handle, |r| r.get_scrollback_rows())
}

pub fn get_content_height(handle: RendererHandle) -> Result<u32> {
    with_renderer(handle, |r| r.get_content_height())
}

pub fn get_font_line_spacing(handle: RendererHandle) -> Result<f32> {
    with_renderer(handle, |r| r.get_font_line_spacing())
}

pub fn set_scroll_pixel_offset(handle: RendererHandle, px: f32) -> Result<()> {
    with_renderer(handle, |r| r.set_scroll_pixel_offset(px))
}

pub fn get_grid_size(handle: RendererHandle) -> Result<(u16, u16)> {
    with_renderer(handle, |r| r.get_grid_size())
}

pub fn get_cell_size(handle: RendererHandle) -> Result<(u32, u32)> {
    with_renderer(handle, |r| r.get_cell_size())
}

pub fn start_selection(handle: RendererHandle, col: u16, row: u16) -> Result<()> {
    with_renderer(handle, |r| r.start_selection(col, row))
}

pub fn update_selection(handle: RendererHandle, col: u16, row: u16) -> Result<()> {
    with_renderer(handle, |r| r.update_selection(col, row))
}

pub fn clear_selection(handle: RendererHandle) -> Result<()> {
    with_renderer(handle, |r| r.clear_selection())
}

pub fn has_selection(handle: RendererHandle) -> Result<bool> {
    with_renderer(handle, |r| r.has_selection())
}

pub fn get_selection_text(handle: RendererHandle) -> Result<String> {
    with_renderer(handle, |r| r.get_selection_text())
}

pub fn get_selection_bounds(handle: RendererHandle) -> Result<Option<(u16, u16, u16, u16)>> {
    with_renderer(handle, |r| r.get_selection_bounds())
}

pub fn hyperlink_at_cell(handle: RendererHandle, col: u16, row: u16) -> Result<Option<String>> {
    with_renderer(handle, |r| r.hyperlink_at_cell(col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handle_errors_cleanly() {
        let err = process_input(999_999, b"x").unwrap_err();
        assert!(matches!(err, PlatformError::UnknownHandle(999_999)));
    }

    #[test]
    fn lifecycle_round_trip_without_a_surface() {
        let handle = on_surface_created(FontAssetBytes::default());
        process_input(handle, b"hello").unwrap();
        assert_eq!(get_grid_size(handle).unwrap(), (80, 24));
        on_destroy(handle);
        assert!(matches!(get_grid_size(handle), Err(PlatformError::UnknownHandle(_))));
    }
}
