//! ボックスストア
//!
//! Ordered OCR boxes plus the label → box mapping. On the wire a box is
//! identified by its index; inside the store every box also carries a
//! client-only [`BoxId`] so labels follow their box across removals, even
//! when two boxes share the same OCR text.

use std::collections::BTreeMap;

use crate::types::{BoxPatch, LabelKey, OcrBox, Suggestions, WireLabels};

/// Stable identity of a box for the lifetime of one store load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(u64);

#[derive(Debug, Clone, Default)]
pub struct BoxStore {
    ids: Vec<BoxId>,
    boxes: Vec<OcrBox>,
    labels: BTreeMap<LabelKey, BoxId>,
    next_id: u64,
}

impl BoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a server payload. Label indices outside the box list are dropped.
    pub fn from_wire(boxes: Vec<OcrBox>, labels: &WireLabels) -> Self {
        let mut store = Self::new();
        store.replace(boxes, labels);
        store
    }

    /// Replaces the whole content, e.g. after a server refresh. All previous ids become stale.
    pub fn replace(&mut self, boxes: Vec<OcrBox>, labels: &WireLabels) {
        self.ids = boxes.iter().map(|_| self.allocate_id()).collect();
        self.boxes = boxes;
        self.labels.clear();
        for (name, &index) in labels {
            let Some(key) = LabelKey::from_wire(name) else {
                tracing::debug!(label = %name, "ignoring unknown label key");
                continue;
            };
            match self.ids.get(index) {
                Some(&id) => {
                    self.labels.insert(key, id);
                }
                None => {
                    tracing::debug!(label = %name, index, "dropping label pointing outside box list");
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.boxes.clear();
        self.labels.clear();
    }

    fn allocate_id(&mut self) -> BoxId {
        let id = BoxId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, b: OcrBox) -> BoxId {
        let id = self.allocate_id();
        self.ids.push(id);
        self.boxes.push(b);
        id
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[OcrBox] {
        &self.boxes
    }

    pub fn get(&self, index: usize) -> Option<&OcrBox> {
        self.boxes.get(index)
    }

    pub fn id_at(&self, index: usize) -> Option<BoxId> {
        self.ids.get(index).copied()
    }

    pub fn index_of(&self, id: BoxId) -> Option<usize> {
        self.ids.iter().position(|&i| i == id)
    }

    /// Replaces only the given fields. Out-of-range indices are ignored: drag
    /// events may arrive after the list was swapped by a server refresh.
    pub fn update_box(&mut self, index: usize, patch: BoxPatch) -> bool {
        match self.boxes.get_mut(index) {
            Some(target) => {
                patch.apply(target);
                true
            }
            None => {
                tracing::debug!(index, len = self.boxes.len(), "update_box out of range");
                false
            }
        }
    }

    pub fn update_by_id(&mut self, id: BoxId, patch: BoxPatch) -> bool {
        match self.index_of(id) {
            Some(index) => self.update_box(index, patch),
            None => false,
        }
    }

    /// Removes the box at `index`. Labels on it are cleared; labels on later
    /// boxes keep pointing at the same box, whose index drops by one.
    pub fn remove_box(&mut self, index: usize) -> Option<OcrBox> {
        if index >= self.boxes.len() {
            return None;
        }
        let id = self.ids.remove(index);
        let removed = self.boxes.remove(index);
        self.labels.retain(|_, target| *target != id);
        Some(removed)
    }

    /// Assigns `key` to the box at `index`; no-op for an invalid index.
    pub fn assign_label(&mut self, key: LabelKey, index: usize) -> bool {
        match self.id_at(index) {
            Some(id) => {
                self.labels.insert(key, id);
                true
            }
            None => false,
        }
    }

    pub fn clear_label(&mut self, key: LabelKey) -> bool {
        self.labels.remove(&key).is_some()
    }

    pub fn label_index(&self, key: LabelKey) -> Option<usize> {
        self.labels.get(&key).and_then(|&id| self.index_of(id))
    }

    /// Label → current index.
    pub fn labels(&self) -> BTreeMap<LabelKey, usize> {
        self.labels
            .iter()
            .filter_map(|(&key, &id)| self.index_of(id).map(|index| (key, index)))
            .collect()
    }

    pub fn wire_labels(&self) -> WireLabels {
        self.labels()
            .into_iter()
            .map(|(key, index)| (key.wire_name().to_string(), index))
            .collect()
    }

    /// The label pointing at `index`, if any (first in key order).
    pub fn label_for(&self, index: usize) -> Option<LabelKey> {
        let id = self.id_at(index)?;
        self.labels
            .iter()
            .find(|(_, &target)| target == id)
            .map(|(&key, _)| key)
    }

    /// Label → text of the labelled box.
    pub fn label_texts(&self) -> BTreeMap<LabelKey, String> {
        self.labels()
            .into_iter()
            .filter_map(|(key, index)| self.boxes.get(index).map(|b| (key, b.text.clone())))
            .collect()
    }

    pub fn label_text(&self, key: LabelKey) -> Option<&str> {
        self.label_index(key)
            .and_then(|index| self.boxes.get(index))
            .map(|b| b.text.as_str())
    }

    /// Replaces all labels with the server suggestions, each resolved to the
    /// first box whose trimmed text equals the trimmed suggestion. Returns how
    /// many labels were resolved.
    pub fn apply_suggestions(&mut self, suggestions: &Suggestions) -> usize {
        let mut resolved = BTreeMap::new();
        for (name, text) in suggestions {
            let Some(key) = LabelKey::from_wire(name) else {
                continue;
            };
            let wanted = text.trim();
            let hit = self
                .boxes
                .iter()
                .position(|b| !b.text.is_empty() && b.text.trim() == wanted);
            if let Some(index) = hit {
                resolved.insert(key, self.ids[index]);
            }
        }
        let count = resolved.len();
        self.labels = resolved;
        count
    }
}
