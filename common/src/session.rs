//! 注釈状態の所有者
//!
//! Who owns the boxes and labels shown by a viewer is decided once, when the
//! viewer is built, by handing it one [`AnnotationModel`]:
//!
//! - [`InternalModel`]: the viewer keeps everything in memory (voice scan page).
//! - [`DocumentSession`]: the document detail view owns the state and every
//!   edit yields a full [`SaveBoxesRequest`] to persist.
//!
//! Edits never perform I/O themselves; they return what the caller should
//! send. Persistence is fire-and-forget.

use std::fmt;

use crate::api::{ExtractTextRequest, ExtractTextResponse, OcrLoad, OcrResponse, SaveBoxesRequest};
use crate::box_store::{BoxId, BoxStore};
use crate::types::{BoxPatch, LabelKey, Suggestions};

/// Work to do after a box update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOutcome {
    pub save: Option<SaveBoxesRequest>,
    /// Set when the geometry changed: re-OCR this box and apply the text with
    /// [`AnnotationModel::apply_extracted_text`].
    pub reocr: Option<(BoxId, ExtractTextRequest)>,
}

/// Result of installing an OCR load for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// 404 from the backend: not an error, OCR has simply not been run.
    NoOcrYet,
    /// The response belongs to a page that is no longer shown.
    Stale,
}

/// State owner strategy.
pub trait AnnotationModel: fmt::Debug + Send + Sync {
    fn page(&self) -> usize;
    fn set_page(&mut self, page: usize);
    fn store(&self) -> &BoxStore;
    fn store_mut(&mut self) -> &mut BoxStore;
    fn suggestions(&self) -> &Suggestions;
    fn set_suggestions(&mut self, suggestions: Suggestions);

    /// Task whose boxes are shown, if known.
    fn task_id(&self) -> Option<&str>;

    /// Full state to persist after an edit. `None` if the owner does not persist.
    fn snapshot(&self) -> Option<SaveBoxesRequest>;

    /// Whether a moved or resized box should be re-OCRed.
    fn reocr_on_commit(&self) -> bool {
        false
    }

    fn update_box(&mut self, index: usize, patch: BoxPatch) -> EditOutcome {
        let Some(before) = self.store().get(index).cloned() else {
            return EditOutcome::default();
        };
        if !self.store_mut().update_box(index, patch) {
            return EditOutcome::default();
        }
        let save = self.snapshot();
        let mut reocr = None;
        if self.reocr_on_commit() {
            if let (Some(after), Some(id), Some(task_id)) =
                (self.store().get(index), self.store().id_at(index), self.task_id())
            {
                if after.geometry_changed(&before) {
                    reocr = Some((
                        id,
                        ExtractTextRequest {
                            task_id: task_id.to_string(),
                            page: self.page() + 1,
                            boxes: vec![after.rounded_rect()],
                        },
                    ));
                }
            }
        }
        EditOutcome { save, reocr }
    }

    /// Applies the re-OCR result to the box it was requested for. A box that
    /// was removed meanwhile is left alone.
    fn apply_extracted_text(&mut self, id: BoxId, response: ExtractTextResponse) -> Option<SaveBoxesRequest> {
        let [recognized] = <[_; 1]>::try_from(response.boxes).ok()?;
        if !self.store_mut().update_by_id(id, BoxPatch::text(recognized.text)) {
            tracing::debug!(?id, "re-OCR result for a box that no longer exists");
            return None;
        }
        self.snapshot()
    }

    fn remove_box(&mut self, index: usize) -> Option<SaveBoxesRequest> {
        self.store_mut().remove_box(index)?;
        self.snapshot()
    }

    fn assign_label(&mut self, key: LabelKey, index: usize) -> Option<SaveBoxesRequest> {
        if !self.store_mut().assign_label(key, index) {
            return None;
        }
        self.snapshot()
    }

    fn clear_label(&mut self, key: LabelKey) -> Option<SaveBoxesRequest> {
        self.store_mut().clear_label(key);
        self.snapshot()
    }

    /// Installs the stored OCR state of `page`. Nothing is persisted on load.
    fn apply_load(&mut self, page: usize, load: OcrLoad) -> LoadOutcome {
        if page != self.page() {
            return LoadOutcome::Stale;
        }
        match load {
            OcrLoad::Loaded(response) => {
                self.store_mut().replace(response.boxes, &response.labels);
                self.set_suggestions(response.suggestions);
                LoadOutcome::Loaded
            }
            OcrLoad::NotRunYet => {
                self.store_mut().clear();
                self.set_suggestions(Suggestions::new());
                LoadOutcome::NoOcrYet
            }
        }
    }

    /// Installs a fresh OCR run. Labels are resolved from the suggestions when
    /// the server sent any, otherwise taken from the response as is.
    fn apply_ocr_result(&mut self, response: OcrResponse) -> Option<SaveBoxesRequest> {
        let OcrResponse { boxes, labels, suggestions } = response;
        self.store_mut().replace(boxes, &labels);
        if !suggestions.is_empty() {
            let resolved = self.store_mut().apply_suggestions(&suggestions);
            if resolved == 0 {
                // nothing matched: fall back to the server labels
                let current = self.store().boxes().to_vec();
                self.store_mut().replace(current, &labels);
            }
        }
        self.set_suggestions(suggestions);
        self.snapshot()
    }
}

/// Viewer-owned state; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct InternalModel {
    task_id: Option<String>,
    page: usize,
    store: BoxStore,
    suggestions: Suggestions,
}

impl InternalModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_task(&mut self, task_id: Option<String>) {
        if self.task_id != task_id {
            self.store.clear();
            self.suggestions.clear();
            self.page = 0;
        }
        self.task_id = task_id;
    }
}

impl AnnotationModel for InternalModel {
    fn page(&self) -> usize {
        self.page
    }

    fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    fn store(&self) -> &BoxStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut BoxStore {
        &mut self.store
    }

    fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    fn set_suggestions(&mut self, suggestions: Suggestions) {
        self.suggestions = suggestions;
    }

    fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    fn snapshot(&self) -> Option<SaveBoxesRequest> {
        None
    }
}

/// Document-owned state of one task, persisted after every edit.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    task_id: String,
    page: usize,
    store: BoxStore,
    suggestions: Suggestions,
}

impl DocumentSession {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            page: 0,
            store: BoxStore::new(),
            suggestions: Suggestions::new(),
        }
    }
}

impl AnnotationModel for DocumentSession {
    fn page(&self) -> usize {
        self.page
    }

    fn set_page(&mut self, page: usize) {
        if page != self.page {
            // boxes belong to one page; the next load fills them again
            self.store.clear();
            self.suggestions.clear();
        }
        self.page = page;
    }

    fn store(&self) -> &BoxStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut BoxStore {
        &mut self.store
    }

    fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    fn set_suggestions(&mut self, suggestions: Suggestions) {
        self.suggestions = suggestions;
    }

    fn task_id(&self) -> Option<&str> {
        Some(&self.task_id)
    }

    fn snapshot(&self) -> Option<SaveBoxesRequest> {
        Some(SaveBoxesRequest {
            task_id: self.task_id.clone(),
            boxes: self.store.boxes().to_vec(),
            suggestions: self.suggestions.clone(),
            labels: self.store.wire_labels(),
        })
    }

    fn reocr_on_commit(&self) -> bool {
        true
    }
}
