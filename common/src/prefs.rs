//! UI設定の永続化ポート
//!
//! Small key-value port with typed access. The browser plugs in local
//! storage; tests use [`MemoryStore`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Raw string storage.
pub trait PreferenceStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str);
}

/// A typed preference stored as JSON under a fixed key.
#[derive(Debug, Clone, Copy)]
pub struct Preference<T> {
    pub key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Preference<T> {
    pub const fn new(key: &'static str) -> Self {
        Self { key, _marker: PhantomData }
    }

    /// Saved value, `None` if missing or unreadable.
    pub fn get(&self, store: &dyn PreferenceStore) -> Option<T> {
        let raw = store.get_raw(self.key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key = self.key, error = %e, "ignoring unreadable preference");
                None
            }
        }
    }

    pub fn set(&self, store: &dyn PreferenceStore, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => store.set_raw(self.key, &raw),
            Err(e) => tracing::warn!(key = self.key, error = %e, "preference not saved"),
        }
    }
}

pub const SIDEBAR_COLLAPSED: Preference<bool> = Preference::new("sidebarCollapsed");

/// Viewport width at or below which the sidebar starts collapsed.
pub const NARROW_VIEWPORT_PX: f64 = 1024.0;

/// Saved value, else collapsed on narrow viewports, else `default`.
pub fn initial_sidebar_collapsed(
    store: &dyn PreferenceStore,
    viewport_width: Option<f64>,
    default: bool,
) -> bool {
    SIDEBAR_COLLAPSED
        .get(store)
        .or_else(|| viewport_width.map(|w| w <= NARROW_VIEWPORT_PX))
        .unwrap_or(default)
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}
