//! ページ単位の注釈編集
//!
//! Every command loads the stored OCR state of one page into a
//! [`DocumentSession`], applies one edit through the [`AnnotationModel`]
//! operations and writes the resulting snapshot back.

use score_scan_common::session::{AnnotationModel, DocumentSession, LoadOutcome};
use score_scan_common::{BoxPatch, Error as CommonError, LabelKey, SaveBoxesRequest};

use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

/// A page of one task with its annotations loaded.
#[derive(Debug)]
pub struct PageSession {
    pub session: DocumentSession,
    pub outcome: LoadOutcome,
}

impl PageSession {
    pub fn has_ocr(&self) -> bool {
        self.outcome == LoadOutcome::Loaded
    }

    /// 1-based page number as shown to the user.
    pub fn page_number(&self) -> usize {
        self.session.page() + 1
    }
}

/// 1-based page number from the command line to a page index.
pub fn page_index(page: usize) -> Result<usize> {
    page.checked_sub(1).ok_or_else(|| {
        CommonError::UserInput("ページ番号は1から始まります".to_string()).into()
    })
}

/// Loads the stored OCR state of `page` (1-based). Never triggers OCR.
pub async fn open_page(backend: &dyn Backend, task_id: &str, page: usize) -> Result<PageSession> {
    let index = page_index(page)?;
    let mut session = DocumentSession::new(task_id);
    session.set_page(index);
    let load = backend.load_ocr(task_id, page, false).await?;
    let outcome = session.apply_load(index, load);
    tracing::debug!(task_id, page, ?outcome, boxes = session.store().len(), "page loaded");
    Ok(PageSession { session, outcome })
}

/// Writes a snapshot. Failures are logged and reported as `false`.
pub async fn persist(backend: &dyn Backend, snapshot: Option<SaveBoxesRequest>) -> bool {
    let Some(request) = snapshot else {
        return true;
    };
    match backend.save_boxes(&request).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task_id = %request.task_id, error = %e, "saving boxes failed");
            false
        }
    }
}

/// Runs OCR for the page and persists the result.
pub async fn recognize(backend: &dyn Backend, task_id: &str, page: usize) -> Result<PageSession> {
    let index = page_index(page)?;
    let mut session = DocumentSession::new(task_id);
    session.set_page(index);
    let response = match backend.load_ocr(task_id, page, true).await? {
        score_scan_common::OcrLoad::Loaded(response) => response,
        score_scan_common::OcrLoad::NotRunYet => {
            return Err(ScoreScanError::TaskFailed(format!(
                "{task_id}: {page}ページのOCRに失敗しました"
            )))
        }
    };
    let snapshot = session.apply_ocr_result(response);
    persist(backend, snapshot).await;
    Ok(PageSession { session, outcome: LoadOutcome::Loaded })
}

fn require_ocr(page: &PageSession) -> Result<()> {
    if page.has_ocr() {
        Ok(())
    } else {
        Err(ScoreScanError::CliExecution(format!(
            "{}ページはまだOCRされていません。`scorescan ocr --trigger` を先に実行してください",
            page.page_number()
        )))
    }
}

fn box_out_of_range(index: usize, len: usize) -> ScoreScanError {
    CommonError::UserInput(format!("ボックス番号 {index} は範囲外です (0..{len})")).into()
}

pub async fn assign_label(
    backend: &dyn Backend,
    page: &mut PageSession,
    key: LabelKey,
    index: usize,
) -> Result<bool> {
    require_ocr(page)?;
    let len = page.session.store().len();
    if index >= len {
        return Err(box_out_of_range(index, len));
    }
    let snapshot = page.session.assign_label(key, index);
    Ok(persist(backend, snapshot).await)
}

pub async fn clear_label(backend: &dyn Backend, page: &mut PageSession, key: LabelKey) -> Result<bool> {
    require_ocr(page)?;
    let snapshot = page.session.clear_label(key);
    Ok(persist(backend, snapshot).await)
}

pub async fn remove_box(backend: &dyn Backend, page: &mut PageSession, index: usize) -> Result<bool> {
    require_ocr(page)?;
    let len = page.session.store().len();
    if index >= len {
        return Err(box_out_of_range(index, len));
    }
    let snapshot = page.session.remove_box(index);
    Ok(persist(backend, snapshot).await)
}

/// Edits a box and, when its geometry changed, re-recognizes its text.
pub async fn edit_box(
    backend: &dyn Backend,
    page: &mut PageSession,
    index: usize,
    patch: BoxPatch,
) -> Result<bool> {
    require_ocr(page)?;
    let len = page.session.store().len();
    if index >= len {
        return Err(box_out_of_range(index, len));
    }
    let outcome = page.session.update_box(index, patch);
    let mut saved = persist(backend, outcome.save).await;

    if let Some((id, request)) = outcome.reocr {
        match backend.extract_text(&request).await {
            Ok(response) => {
                let snapshot = page.session.apply_extracted_text(id, response);
                saved &= persist(backend, snapshot).await;
            }
            Err(e) => tracing::warn!(error = %e, "text extraction failed"),
        }
    }
    Ok(saved)
}

/// Box listing for the terminal.
pub fn describe_boxes(page: &PageSession) -> Vec<String> {
    let store = page.session.store();
    store
        .boxes()
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let label = store
                .label_for(i)
                .map(|k| format!(" [{}]", k.display_name()))
                .unwrap_or_default();
            format!(
                "{:>3}: {:<30} ({:.0}, {:.0}, {:.0}×{:.0}){}",
                i, b.text, b.x, b.y, b.width, b.height, label
            )
        })
        .collect()
}
