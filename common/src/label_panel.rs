//! ラベル割り当てパネル
//!
//! One selector per label key, options are the box texts. Holds no state of
//! its own: rows are derived from the store, changes go back to the model.

use crate::box_store::BoxStore;
use crate::types::LabelKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelOption {
    /// Box index as a string, the value of the `<option>`.
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    pub key: LabelKey,
    pub color: &'static str,
    /// Selected value, empty when the label is unassigned.
    pub value: String,
    pub options: Vec<LabelOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    Assign(LabelKey, usize),
    Clear(LabelKey),
}

/// Rows for all five keys in display order.
pub fn rows(store: &BoxStore) -> Vec<LabelRow> {
    let options: Vec<LabelOption> = store
        .boxes()
        .iter()
        .enumerate()
        .map(|(i, b)| LabelOption { value: i.to_string(), text: b.text.clone() })
        .collect();
    LabelKey::ALL
        .into_iter()
        .map(|key| LabelRow {
            key,
            color: key.color(),
            value: store
                .label_index(key)
                .map(|i| i.to_string())
                .unwrap_or_default(),
            options: options.clone(),
        })
        .collect()
}

/// Interprets a selector value: empty clears, a valid index assigns,
/// anything else is ignored.
pub fn parse_selection(store: &BoxStore, key: LabelKey, value: &str) -> Option<LabelChange> {
    let value = value.trim();
    if value.is_empty() {
        return Some(LabelChange::Clear(key));
    }
    let index: usize = value.parse().ok()?;
    store.get(index).map(|_| LabelChange::Assign(key, index))
}
