//! Process-wide renderer registry: maps opaque numeric handles to renderer
//! instances. A `once_cell`-style lazily-initialized, mutex-guarded map, per
//! SPEC_FULL §5/§9 — entries are created by `on_surface_created` and
//! destroyed by `on_destroy`.
//!
//! The outer map lock is held only long enough to look up or insert an
//! `Arc`, never across a draw call or other GPU work; the renderer itself
//! is guarded by its own inner mutex, locked only for the duration of the
//! single operation being dispatched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::renderer_state::RendererState;

pub type RendererHandle = u64;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

type Registry = Mutex<HashMap<RendererHandle, Arc<Mutex<RendererState>>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Allocates a fresh handle for `state` and inserts it into the registry.
pub fn insert(state: RendererState) -> RendererHandle {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    registry().lock().unwrap().insert(handle, Arc::new(Mutex::new(state)));
    handle
}

/// Removes the slot for `handle`, dropping the renderer (and its GPU
/// resources) when the last reference goes away.
pub fn remove(handle: RendererHandle) {
    registry().lock().unwrap().remove(&handle);
}

/// Clones out the `Arc` for `handle`, if it still exists. Callers lock the
/// returned `Arc` themselves for the duration of their operation.
pub fn get(handle: RendererHandle) -> Option<Arc<Mutex<RendererState>>> {
    registry().lock().unwrap().get(&handle).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer_state::RendererState;

    #[test]
    fn insert_then_get_round_trips() {
        let handle = insert(RendererState::new_headless_for_test());
        assert!(get(handle).is_some());
        remove(handle);
        assert!(get(handle).is_none());
    }

    #[test]
    fn unknown_handle_returns_none() {
        assert!(get(999_999).is_none());
    }
}
