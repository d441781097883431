//! ローカルストレージ
//!
//! Browser side of the preference port, plus the bearer token that the login
//! flow leaves in local storage.

use score_scan_common::prefs::PreferenceStore;

pub const TOKEN_KEY: &str = "token";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// `window.localStorage` as a [`PreferenceStore`]. Unavailable storage
/// (private mode, sandboxed frames) reads as empty and drops writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl PreferenceStore for LocalStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set_raw(&self, key: &str, value: &str) {
        let Some(storage) = local_storage() else {
            return;
        };
        if storage.set_item(key, value).is_err() {
            leptos::logging::warn!("localStorage への保存に失敗: {}", key);
        }
    }
}

pub fn token() -> Option<String> {
    LocalStore.get_raw(TOKEN_KEY).filter(|t| !t.trim().is_empty())
}

pub fn viewport_width() -> Option<f64> {
    web_sys::window()?.inner_width().ok()?.as_f64()
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use score_scan_common::prefs::SIDEBAR_COLLAPSED;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_local_store_round_trip() {
        SIDEBAR_COLLAPSED.set(&LocalStore, &true);
        assert_eq!(SIDEBAR_COLLAPSED.get(&LocalStore), Some(true));
        SIDEBAR_COLLAPSED.set(&LocalStore, &false);
        assert_eq!(SIDEBAR_COLLAPSED.get(&LocalStore), Some(false));
    }

    #[wasm_bindgen_test]
    fn wasm_blank_token_is_none() {
        LocalStore.set_raw(TOKEN_KEY, "  ");
        assert_eq!(token(), None);
        LocalStore.set_raw(TOKEN_KEY, "abc");
        assert_eq!(token().as_deref(), Some("abc"));
    }
}
