//! アップロードとタスク監視
//!
//! Drives the sans-IO pollers from `score_scan_common::poller` with
//! `tokio::time`. The CLI runs one command at a time, so the generation token
//! only matters for the states the poller refuses to leave.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use score_scan_common::poller::{PollState, PollStep, TaskListWatcher, TaskPoller};
use score_scan_common::{AsyncTask, TaskSummary};

use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

/// A task that finished processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTask {
    pub task: AsyncTask,
    pub pages: Vec<String>,
}

pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Polls a task until it is done or failed.
pub async fn poll_task(
    backend: &dyn Backend,
    task_id: &str,
    interval: Duration,
    progress: &ProgressBar,
) -> Result<ProcessedTask> {
    let mut poller = TaskPoller::new();
    let generation = poller.start(task_id);

    loop {
        let status = backend.status(task_id).await;
        match poller.on_status(generation, status) {
            PollStep::Wait => {
                if let PollState::Processing(task) = poller.state() {
                    progress.set_message(format!("{} ({})", task.task_id, task.status));
                }
                tokio::time::sleep(interval).await;
            }
            PollStep::FetchPages(id) => {
                progress.set_message(format!("{id}: ページ一覧を取得中..."));
                let pages = backend.pages(&id).await;
                poller.on_pages(generation, pages);
                break;
            }
            PollStep::Stop | PollStep::Ignored => break,
        }
    }

    match poller.state().clone() {
        PollState::Done { task, pages } => Ok(ProcessedTask { task, pages }),
        PollState::Error { message, .. } => Err(ScoreScanError::TaskFailed(message)),
        PollState::Idle | PollState::Processing(_) => Err(ScoreScanError::TaskFailed(format!(
            "{task_id}: ポーリングが中断されました"
        ))),
    }
}

/// Uploads one PDF and waits for processing.
pub async fn upload_and_wait(
    backend: &dyn Backend,
    path: &Path,
    interval: Duration,
    progress: &ProgressBar,
) -> Result<ProcessedTask> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ScoreScanError::FileNotFound(path.display().to_string()))?;
    let bytes = tokio::fs::read(path).await?;

    progress.set_message(format!("{file_name}: アップロード中..."));
    let response = backend.upload(&file_name, bytes).await?;
    let task_id = response.task_id.ok_or_else(|| {
        ScoreScanError::TaskFailed(format!("{file_name}: task_id がレスポンスにありません"))
    })?;
    tracing::info!(%task_id, file_name, "uploaded");

    poll_task(backend, &task_id, interval, progress).await
}

/// Polls the task list and reports tasks that finished in between.
///
/// Runs `rounds` polls, or forever when `None`.
pub async fn watch_tasks(
    backend: &dyn Backend,
    interval: Duration,
    rounds: Option<usize>,
    mut on_change: impl FnMut(&[TaskSummary], &[TaskSummary]),
) -> Result<()> {
    let mut watcher = TaskListWatcher::new();
    let mut round = 0;

    loop {
        match backend.list_tasks().await {
            Ok(tasks) => {
                let (finished, changed) = watcher.observe(tasks);
                if changed || !finished.is_empty() {
                    on_change(watcher.tasks(), &finished);
                }
            }
            // the next round retries
            Err(e) => tracing::warn!(error = %e, "task list refresh failed"),
        }

        round += 1;
        if rounds.is_some_and(|max| round >= max) {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}
