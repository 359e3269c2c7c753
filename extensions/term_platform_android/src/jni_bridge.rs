//! JNI entry points. Every `nativeXxx` function is called directly by the
//! JVM, so a Rust panic unwinding through it is undefined behavior — each
//! body is wrapped in `catch_unwind` and falls back to a logged no-op /
//! default return on panic, per SPEC_FULL §5's "never let a panic cross
//! the JNI boundary" rule.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;

use jni::objects::{JClass, JObject, JString};
use jni::sys::{jboolean, jfloat, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;

use crate::assets::AndroidAssetLoader;
use crate::platform_api;
use crate::renderer_state::FontAssetBytes;
use crate::window::AndroidWindowHandle;

fn catch<T>(env: &mut JNIEnv, default: T, f: impl FnOnce(&mut JNIEnv) -> T) -> T {
    match catch_unwind(AssertUnwindSafe(|| f(env))) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("panic caught at JNI boundary");
            default
        }
    }
}

fn jstring_to_string(env: &mut JNIEnv, s: &JString) -> String {
    env.get_string(s).map(|s| s.into()).unwrap_or_default()
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeOnSurfaceCreated(mut env: JNIEnv, _class: JClass, asset_manager: JObject) -> jlong {
    catch(&mut env, 0, |env| {
        let font_bytes = load_embedded_fonts(env, &asset_manager).unwrap_or_default();
        platform_api::on_surface_created(font_bytes) as jlong
    })
}

fn load_embedded_fonts(env: &mut JNIEnv, asset_manager: &JObject) -> Option<FontAssetBytes> {
    let am_ptr = unsafe { ndk_sys::AAssetManager_fromJava(env.get_raw(), asset_manager.as_raw()) };
    let ptr = NonNull::new(am_ptr)?;
    let loader = unsafe { AndroidAssetLoader::from_raw(ptr) };
    loader.load_font_bytes().ok()
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeOnSurfaceChanged(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    surface: JObject,
    width: jint,
    height: jint,
    dpi: jint,
    font_size_px: jfloat,
) -> jboolean {
    catch(&mut env, JNI_FALSE, |env| {
        let native_window = unsafe { ndk_sys::ANativeWindow_fromSurface(env.get_raw(), surface.as_raw()) };
        let Some(ptr) = NonNull::new(native_window.cast::<std::ffi::c_void>()) else {
            return JNI_FALSE;
        };
        let window = unsafe { AndroidWindowHandle::from_raw(ptr) };
        let result = pollster::block_on(platform_api::on_surface_changed(handle as u64, window, width.max(0) as u32, height.max(0) as u32, dpi.max(0) as u16, font_size_px));
        match result {
            Ok(()) => JNI_TRUE,
            Err(err) => {
                tracing::error!(%err, "on_surface_changed failed");
                JNI_FALSE
            }
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeOnDrawFrame(mut env: JNIEnv, _class: JClass, handle: jlong) {
    catch(&mut env, (), |_env| {
        if let Err(err) = platform_api::on_draw_frame(handle as u64) {
            tracing::error!(%err, "on_draw_frame failed");
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeOnDestroy(mut env: JNIEnv, _class: JClass, handle: jlong) {
    catch(&mut env, (), |_env| platform_api::on_destroy(handle as u64))
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeProcessInput(mut env: JNIEnv, _class: JClass, handle: jlong, bytes: JString) {
    catch(&mut env, (), |env| {
        let text = jstring_to_string(env, &bytes);
        if let Err(err) = platform_api::process_input(handle as u64, text.as_bytes()) {
            tracing::error!(%err, "process_input failed");
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeSetFontSize(mut env: JNIEnv, _class: JClass, handle: jlong, px: jfloat) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::set_font_size(handle as u64, px);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeSetTerminalSize(mut env: JNIEnv, _class: JClass, handle: jlong, cols: jint, rows: jint) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::set_terminal_size(handle as u64, cols.max(0) as u16, rows.max(0) as u16);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeSetShowFps(mut env: JNIEnv, _class: JClass, handle: jlong, show: jboolean) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::set_show_fps(handle as u64, show == JNI_TRUE);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeScrollDelta(mut env: JNIEnv, _class: JClass, handle: jlong, rows: jint) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::scroll_delta(handle as u64, rows);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeScrollToBottom(mut env: JNIEnv, _class: JClass, handle: jlong) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::scroll_to_bottom(handle as u64);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeIsViewportAtBottom(mut env: JNIEnv, _class: JClass, handle: jlong) -> jboolean {
    catch(&mut env, JNI_FALSE, |_env| {
        if platform_api::is_viewport_at_bottom(handle as u64).unwrap_or(true) {
            JNI_TRUE
        } else {
            JNI_FALSE
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetViewportOffset(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_viewport_offset(handle as u64).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetScrollbackRows(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_scrollback_rows(handle as u64).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetContentHeight(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_content_height(handle as u64).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetFontLineSpacing(mut env: JNIEnv, _class: JClass, handle: jlong) -> jfloat {
    catch(&mut env, 0.0, |_env| platform_api::get_font_line_spacing(handle as u64).unwrap_or(0.0))
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeSetScrollPixelOffset(mut env: JNIEnv, _class: JClass, handle: jlong, px: jfloat) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::set_scroll_pixel_offset(handle as u64, px);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetGridCols(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_grid_size(handle as u64).map(|(cols, _)| cols).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetGridRows(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_grid_size(handle as u64).map(|(_, rows)| rows).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetCellWidth(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_cell_size(handle as u64).map(|(w, _)| w).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetCellHeight(mut env: JNIEnv, _class: JClass, handle: jlong) -> jint {
    catch(&mut env, 0, |_env| platform_api::get_cell_size(handle as u64).map(|(_, h)| h).unwrap_or(0) as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeStartSelection(mut env: JNIEnv, _class: JClass, handle: jlong, col: jint, row: jint) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::start_selection(handle as u64, col.max(0) as u16, row.max(0) as u16);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeUpdateSelection(mut env: JNIEnv, _class: JClass, handle: jlong, col: jint, row: jint) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::update_selection(handle as u64, col.max(0) as u16, row.max(0) as u16);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeClearSelection(mut env: JNIEnv, _class: JClass, handle: jlong) {
    catch(&mut env, (), |_env| {
        let _ = platform_api::clear_selection(handle as u64);
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeHasSelection(mut env: JNIEnv, _class: JClass, handle: jlong) -> jboolean {
    catch(&mut env, JNI_FALSE, |_env| {
        if platform_api::has_selection(handle as u64).unwrap_or(false) {
            JNI_TRUE
        } else {
            JNI_FALSE
        }
    })
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeGetSelectionText<'local>(mut env: JNIEnv<'local>, _class: JClass<'local>, handle: jlong) -> jstring {
    let text = catch(&mut env, String::new(), |_env| platform_api::get_selection_text(handle as u64).unwrap_or_default());
    env.new_string(text).map(|s| s.into_raw()).unwrap_or(std::ptr::null_mut())
}

#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeHyperlinkAtCell<'local>(mut env: JNIEnv<'local>, _class: JClass<'local>, handle: jlong, col: jint, row: jint) -> jstring {
    let link = catch(&mut env, None, |_env| platform_api::hyperlink_at_cell(handle as u64, col.max(0) as u16, row.max(0) as u16).unwrap_or(None));
    match link {
        Some(text) => env.new_string(text).map(|s| s.into_raw()).unwrap_or(std::ptr::null_mut()),
        None => std::ptr::null_mut(),
    }
}

/// Installs `android_logger` as the `tracing` backend, so `tracing::info!`
/// et al. surface in `adb logcat`. Called once from `nativeOnSurfaceCreated`
/// the first time a handle is allocated in the process.
#[no_mangle]
pub extern "system" fn Java_com_blinc_terminal_TerminalNative_nativeInitLogging(_env: JNIEnv, _class: JClass) {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).try_init();
}
