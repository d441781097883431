//! ページ傾き補正
use score_scan_common::deskew::DeskewDialog;

use crate::annotate::page_index;
use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

/// Fine angle plus quarter turns (positive = clockwise), as the dialog combines them.
pub fn dialog_for(angle: f64, quarter_turns: i32) -> DeskewDialog {
    let mut dialog = DeskewDialog::default();
    dialog.open();
    dialog.set_fine(angle);
    for _ in 0..quarter_turns.unsigned_abs() {
        if quarter_turns > 0 {
            dialog.rotate_right();
        } else {
            dialog.rotate_left();
        }
    }
    dialog
}

/// Rotates a stored page on the server. Returns the applied angle.
pub async fn deskew_page(
    backend: &dyn Backend,
    task_id: &str,
    page: usize,
    angle: f64,
    quarter_turns: i32,
) -> Result<f64> {
    let index = page_index(page)?;
    let pages = backend.pages(task_id).await?.pages;
    let page_url = pages.get(index).ok_or_else(|| {
        ScoreScanError::CliExecution(format!("{page}ページは存在しません (全{}ページ)", pages.len()))
    })?;

    let mut dialog = dialog_for(angle, quarter_turns);
    let request = dialog.save_request(page_url, index)?;
    tracing::debug!(?request, "deskew");
    let result = backend.deskew(&request).await;
    dialog.finish_save(result.is_ok());
    result?;
    Ok(request.angle)
}
