//! テスト用のインメモリバックエンド

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use score_scan::client::Backend;
use score_scan_common::api::{
    DeskewRequest, ExtractTextRequest, ExtractTextResponse, OcrLoad, OcrResponse, PagesResponse,
    SaveBoxesRequest, SplitRequest, SplitResponse, StatusResponse, UploadResponse, VoicesRequest,
    VoicesResponse, ZipResponse,
};
use score_scan_common::{Error, LabelKey, OcrBox, Result, TaskStatus, TaskSummary};

pub const SERVER: &str = "http://scores.test";

#[derive(Default)]
pub struct FakeState {
    pub upload_task_id: Option<String>,
    pub uploads: Vec<(String, usize)>,
    pub statuses: VecDeque<StatusResponse>,
    pub task_lists: VecDeque<Vec<TaskSummary>>,
    pub pages: Vec<String>,
    /// Stored OCR per 1-based page; missing pages answer 404.
    pub ocr: HashMap<usize, OcrResponse>,
    /// Returned when OCR is triggered.
    pub triggered: Option<OcrResponse>,
    pub ocr_calls: Vec<(usize, bool)>,
    pub saved: Vec<SaveBoxesRequest>,
    pub fail_save: bool,
    pub extract_requests: Vec<ExtractTextRequest>,
    pub extract_response: ExtractTextResponse,
    pub deskews: Vec<DeskewRequest>,
    pub voice_requests: Vec<VoicesRequest>,
    pub voices: VoicesResponse,
    pub split_requests: Vec<SplitRequest>,
    pub split_response: SplitResponse,
    pub zip_response: ZipResponse,
    pub files: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(f: impl FnOnce(&mut FakeState)) -> Self {
        let backend = Self::new();
        f(&mut backend.state.lock().unwrap());
        backend
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

pub fn status(status: TaskStatus) -> StatusResponse {
    StatusResponse { status, num_pages: Some(3), error_message: None }
}

pub fn task(id: &str, status: TaskStatus) -> TaskSummary {
    TaskSummary {
        id: id.into(),
        filename: format!("{id}.pdf"),
        status,
        num_pages: None,
        created_at: None,
        error_message: None,
    }
}

/// Title "Marsch", composer, and three voice candidates; Voice on box 2.
pub fn labelled_page() -> OcrResponse {
    let mut labels = std::collections::BTreeMap::new();
    labels.insert(LabelKey::Title.wire_name().to_string(), 0);
    labels.insert(LabelKey::Composer.wire_name().to_string(), 1);
    labels.insert(LabelKey::Voice.wire_name().to_string(), 2);
    OcrResponse {
        boxes: vec![
            OcrBox::new(100.0, 40.0, 300.0, 60.0, "Marsch"),
            OcrBox::new(500.0, 40.0, 200.0, 30.0, "Carl Teike"),
            OcrBox::new(50.0, 120.0, 160.0, 30.0, "1. Klarinette"),
        ],
        labels,
        suggestions: Default::default(),
    }
}

pub fn page_urls(task_id: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| format!("/static/{task_id}/pages/{task_id}_page_{i:05}.png"))
        .collect()
}

fn not_found(what: &str) -> Error {
    Error::NotFound(what.to_string())
}

#[async_trait]
impl Backend for FakeBackend {
    fn server_url(&self) -> &str {
        SERVER
    }

    async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        let mut state = self.state();
        match state.task_lists.len() {
            0 => Err(Error::Network("no task list".into())),
            1 => Ok(state.task_lists[0].clone()),
            _ => Ok(state.task_lists.pop_front().unwrap_or_default()),
        }
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        let mut state = self.state();
        state.uploads.push((file_name.to_string(), bytes.len()));
        Ok(UploadResponse { task_id: state.upload_task_id.clone() })
    }

    async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        self.state()
            .statuses
            .pop_front()
            .ok_or_else(|| not_found(task_id))
    }

    async fn pages(&self, task_id: &str) -> Result<PagesResponse> {
        let state = self.state();
        if state.pages.is_empty() {
            return Err(not_found(task_id));
        }
        Ok(PagesResponse { pages: state.pages.clone() })
    }

    async fn load_ocr(&self, _task_id: &str, page: usize, trigger: bool) -> Result<OcrLoad> {
        let mut state = self.state();
        state.ocr_calls.push((page, trigger));
        if trigger {
            if let Some(response) = state.triggered.clone() {
                state.ocr.insert(page, response.clone());
                return Ok(OcrLoad::Loaded(response));
            }
        }
        Ok(match state.ocr.get(&page) {
            Some(response) => OcrLoad::Loaded(response.clone()),
            None => OcrLoad::NotRunYet,
        })
    }

    async fn save_boxes(&self, request: &SaveBoxesRequest) -> Result<()> {
        let mut state = self.state();
        if state.fail_save {
            return Err(Error::Network("HTTP 500".into()));
        }
        state.saved.push(request.clone());
        Ok(())
    }

    async fn extract_text(&self, request: &ExtractTextRequest) -> Result<ExtractTextResponse> {
        let mut state = self.state();
        state.extract_requests.push(request.clone());
        Ok(state.extract_response.clone())
    }

    async fn deskew(&self, request: &DeskewRequest) -> Result<()> {
        self.state().deskews.push(request.clone());
        Ok(())
    }

    async fn detect_voices(&self, request: &VoicesRequest) -> Result<VoicesResponse> {
        let mut state = self.state();
        state.voice_requests.push(request.clone());
        Ok(state.voices.clone())
    }

    async fn split(&self, request: &SplitRequest) -> Result<SplitResponse> {
        let mut state = self.state();
        state.split_requests.push(request.clone());
        Ok(state.split_response.clone())
    }

    async fn split_zip(&self, request: &SplitRequest) -> Result<ZipResponse> {
        let mut state = self.state();
        state.split_requests.push(request.clone());
        Ok(state.zip_response.clone())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let state = self.state();
        let key = url.trim_start_matches(SERVER);
        state
            .files
            .get(key)
            .or_else(|| state.files.get(url))
            .cloned()
            .ok_or_else(|| not_found(url))
    }
}
