//! 非同期タスクのポーリング
//!
//! Sans-IO state machines; the browser drives them with `gloo` timers and
//! the CLI with `tokio::time`.
//!
//! [`TaskPoller`] follows one uploaded task: `Idle → Processing → {Done | Error}`.
//! Every [`TaskPoller::start`] hands out a new [`Generation`]; responses
//! carrying an older generation are ignored, which is how late answers for a
//! replaced or torn-down task are kept out.
//!
//! [`TaskListWatcher`] diffs successive task lists and reports tasks that
//! just finished processing.

use std::collections::HashMap;

use crate::api::{PagesResponse, StatusResponse};
use crate::error::{Error, Result};
use crate::types::{AsyncTask, TaskStatus, TaskSummary};

pub const POLL_INTERVAL_MS: u32 = 1_500;
pub const TASK_LIST_INTERVAL_MS: u32 = 5_000;

/// Identifies one `start` of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PollState {
    #[default]
    Idle,
    Processing(AsyncTask),
    Done {
        task: AsyncTask,
        pages: Vec<String>,
    },
    Error {
        task_id: Option<String>,
        message: String,
    },
}

impl PollState {
    pub fn is_processing(&self) -> bool {
        matches!(self, PollState::Processing(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Done { .. } | PollState::Error { .. })
    }
}

/// Next step for the driver after a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Poll again after [`POLL_INTERVAL_MS`].
    Wait,
    /// Server reports done: fetch the page list for this task.
    FetchPages(String),
    /// Terminal; stop the timer.
    Stop,
    /// Response from a discarded generation.
    Ignored,
}

#[derive(Debug, Default)]
pub struct TaskPoller {
    state: PollState,
    generation: u64,
}

impl TaskPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.generation
    }

    /// Tracks a freshly uploaded task, discarding any previous one.
    pub fn start(&mut self, task_id: impl Into<String>) -> Generation {
        self.generation += 1;
        let task = AsyncTask::new(task_id);
        tracing::debug!(task_id = %task.task_id, generation = self.generation, "polling task");
        self.state = PollState::Processing(task);
        Generation(self.generation)
    }

    /// Upload itself failed; there is no task to poll.
    pub fn fail_upload(&mut self, message: impl Into<String>) {
        self.generation += 1;
        self.state = PollState::Error { task_id: None, message: message.into() };
    }

    /// Teardown: back to idle, late responses become inert.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = PollState::Idle;
    }

    /// Feeds a status poll result.
    pub fn on_status(&mut self, generation: Generation, result: Result<StatusResponse>) -> PollStep {
        if !self.is_current(generation) {
            return PollStep::Ignored;
        }
        let PollState::Processing(task) = &mut self.state else {
            return PollStep::Ignored;
        };
        let status = match result {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(task_id = %task.task_id, error = %e, "status poll failed");
                let task_id = Some(task.task_id.clone());
                self.state = PollState::Error { task_id, message: e.to_string() };
                return PollStep::Stop;
            }
        };
        task.status = status.status;
        task.num_pages = status.num_pages.or(task.num_pages);
        task.error_message = status.error_message.clone();
        match status.status {
            TaskStatus::Pending | TaskStatus::Processing => PollStep::Wait,
            TaskStatus::Done => PollStep::FetchPages(task.task_id.clone()),
            TaskStatus::Error => {
                let message = status
                    .error_message
                    .unwrap_or_else(|| "processing failed".to_string());
                let task_id = Some(task.task_id.clone());
                self.state = PollState::Error { task_id, message };
                PollStep::Stop
            }
        }
    }

    /// Feeds the page list fetched after `done`. A failure here is terminal.
    pub fn on_pages(&mut self, generation: Generation, result: Result<PagesResponse>) -> PollStep {
        if !self.is_current(generation) {
            return PollStep::Ignored;
        }
        let PollState::Processing(task) = &self.state else {
            return PollStep::Ignored;
        };
        let task = task.clone();
        self.state = match result {
            Ok(pages) => PollState::Done { task, pages: pages.pages },
            Err(e) => PollState::Error {
                task_id: Some(task.task_id),
                message: e.to_string(),
            },
        };
        PollStep::Stop
    }

    /// Pages of a finished task.
    pub fn pages(&self) -> &[String] {
        match &self.state {
            PollState::Done { pages, .. } => pages,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PollState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Maps a non-OK HTTP status to the error taxonomy.
pub fn http_error(status: u16, url: &str) -> Error {
    if status == 404 {
        Error::NotFound(url.to_string())
    } else {
        Error::Network(format!("HTTP {status} for {url}"))
    }
}

/// Remembers the last seen status per task.
#[derive(Debug, Default)]
pub struct TaskListWatcher {
    previous: HashMap<String, TaskStatus>,
    last: Vec<TaskSummary>,
}

impl TaskListWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[TaskSummary] {
        &self.last
    }

    /// Installs a fresh task list. Returns the tasks that went from a known
    /// non-done status to done since the previous list, and whether the list
    /// changed at all.
    pub fn observe(&mut self, tasks: Vec<TaskSummary>) -> (Vec<TaskSummary>, bool) {
        let finished = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .filter(|t| matches!(self.previous.get(&t.id), Some(prev) if *prev != TaskStatus::Done))
            .cloned()
            .collect();
        let changed = tasks != self.last;
        self.previous = tasks.iter().map(|t| (t.id.clone(), t.status)).collect();
        self.last = tasks;
        (finished, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: TaskStatus) -> Result<StatusResponse> {
        Ok(StatusResponse { status: s, num_pages: Some(4), error_message: None })
    }

    #[test]
    fn test_done_after_two_polls() {
        let mut poller = TaskPoller::new();
        assert_eq!(poller.state(), &PollState::Idle);
        let gen = poller.start("t1");
        assert!(poller.state().is_processing());

        assert_eq!(poller.on_status(gen, status(TaskStatus::Processing)), PollStep::Wait);
        assert_eq!(poller.on_status(gen, status(TaskStatus::Processing)), PollStep::Wait);
        assert_eq!(
            poller.on_status(gen, status(TaskStatus::Done)),
            PollStep::FetchPages("t1".into())
        );
        let pages = PagesResponse { pages: vec!["/static/t1/pages/1.png".into(), "/static/t1/pages/2.png".into()] };
        assert_eq!(poller.on_pages(gen, Ok(pages)), PollStep::Stop);
        assert_eq!(poller.pages().len(), 2);
        match poller.state() {
            PollState::Done { task, .. } => assert_eq!(task.num_pages, Some(4)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_server_error_captures_message() {
        let mut poller = TaskPoller::new();
        let gen = poller.start("t1");
        let step = poller.on_status(
            gen,
            Ok(StatusResponse {
                status: TaskStatus::Error,
                num_pages: None,
                error_message: Some("PDF beschädigt".into()),
            }),
        );
        assert_eq!(step, PollStep::Stop);
        assert_eq!(poller.error(), Some("PDF beschädigt"));
    }

    #[test]
    fn test_transport_failure_is_terminal() {
        let mut poller = TaskPoller::new();
        let gen = poller.start("t1");
        let step = poller.on_status(gen, Err(Error::Network("connection refused".into())));
        assert_eq!(step, PollStep::Stop);
        assert!(poller.state().is_terminal());
        assert_eq!(poller.on_status(gen, status(TaskStatus::Done)), PollStep::Ignored);
    }

    #[test]
    fn test_pages_failure_is_terminal() {
        let mut poller = TaskPoller::new();
        let gen = poller.start("t1");
        poller.on_status(gen, status(TaskStatus::Done));
        poller.on_pages(gen, Err(Error::Network("HTTP 500".into())));
        assert!(poller.error().is_some());
        assert!(poller.pages().is_empty());
    }

    #[test]
    fn test_new_start_discards_old_responses() {
        let mut poller = TaskPoller::new();
        let old = poller.start("t1");
        let new = poller.start("t2");
        assert_eq!(poller.on_status(old, status(TaskStatus::Done)), PollStep::Ignored);
        assert_eq!(
            poller.on_status(new, status(TaskStatus::Done)),
            PollStep::FetchPages("t2".into())
        );
    }

    #[test]
    fn test_cancel_makes_late_response_inert() {
        let mut poller = TaskPoller::new();
        let gen = poller.start("t1");
        poller.cancel();
        assert_eq!(poller.on_status(gen, status(TaskStatus::Done)), PollStep::Ignored);
        assert_eq!(poller.on_pages(gen, Ok(PagesResponse::default())), PollStep::Ignored);
        assert_eq!(poller.state(), &PollState::Idle);
    }

    #[test]
    fn test_http_error_mapping() {
        assert!(http_error(404, "/ocr/").is_not_found());
        assert!(matches!(http_error(502, "/ocr/"), Error::Network(_)));
    }

    fn summary(id: &str, status: TaskStatus) -> TaskSummary {
        TaskSummary {
            id: id.into(),
            filename: format!("{id}.pdf"),
            status,
            num_pages: None,
            created_at: None,
            error_message: None,
        }
    }

    #[test]
    fn test_watcher_reports_done_transitions_only() {
        let mut watcher = TaskListWatcher::new();
        let (finished, changed) = watcher.observe(vec![
            summary("1", TaskStatus::Processing),
            summary("2", TaskStatus::Done),
        ]);
        assert!(finished.is_empty());
        assert!(changed);

        let (finished, _) = watcher.observe(vec![
            summary("1", TaskStatus::Done),
            summary("2", TaskStatus::Done),
            summary("3", TaskStatus::Done),
        ]);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, "1");

        let (finished, changed) = watcher.observe(watcher.tasks().to_vec());
        assert!(finished.is_empty());
        assert!(!changed);
    }
}
