//! バックエンドAPIクライアント（fetch版）
//!
//! Same endpoints as the CLI client, over `window.fetch`. Bodies are
//! (de)serialized with `serde_json` so the shared DTOs behave identically on
//! both sides.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

use score_scan_common::api::{
    DeskewRequest, Endpoints, ExtractTextRequest, ExtractTextResponse, OcrLoad, OcrResponse,
    PagesResponse, SaveBoxesRequest, SplitRequest, SplitResponse, StatusResponse, UploadResponse,
    VoicesRequest, VoicesResponse, ZipResponse,
};
use score_scan_common::poller::http_error;
use score_scan_common::{Error, Result, TaskSummary};

use crate::storage;

enum Body {
    Json(String),
    Form(FormData),
}

/// JsValue failures are network errors.
pub fn js_error(value: JsValue) -> Error {
    Error::Network(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiClient {
    endpoints: Endpoints,
    server_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server_url: &str, token: Option<String>) -> Self {
        Self {
            endpoints: Endpoints::new(server_url),
            server_url: server_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Same origin as the page, token from local storage.
    pub fn from_window() -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Self::new(&origin, storage::token())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn send(&self, method: &str, url: &str, body: Option<Body>) -> Result<Response> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        let is_json = matches!(body, Some(Body::Json(_)));
        match body {
            Some(Body::Json(text)) => opts.set_body(&JsValue::from_str(&text)),
            Some(Body::Form(form)) => opts.set_body(&form),
            None => {}
        }

        let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;
        if is_json {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }
        if let Some(token) = &self.token {
            request
                .headers()
                .set("Authorization", &format!("Bearer {token}"))
                .map_err(js_error)?;
        }

        let window = web_sys::window().ok_or_else(|| Error::Network("no window".into()))?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let response: Response = value.dyn_into().map_err(js_error)?;
        if !response.ok() {
            return Err(http_error(response.status(), url));
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, method: &str, url: &str, body: Option<Body>) -> Result<T> {
        let response = self.send(method, url, body).await?;
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        Ok(serde_json::from_str(&text)?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let text = serde_json::to_string(body)?;
        self.json("POST", url, Some(Body::Json(text))).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        self.json("GET", &self.endpoints.task_list(), None).await
    }

    pub async fn upload(&self, file: &web_sys::File) -> Result<UploadResponse> {
        let form = FormData::new().map_err(js_error)?;
        form.append_with_blob_and_filename("file", file, &file.name())
            .map_err(js_error)?;
        self.json("POST", &self.endpoints.upload(), Some(Body::Form(form))).await
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        self.json("GET", &self.endpoints.status(task_id), None).await
    }

    pub async fn pages(&self, task_id: &str) -> Result<PagesResponse> {
        self.json("GET", &self.endpoints.pages(task_id), None).await
    }

    /// `page` is 0-based here; the backend gets it 1-based.
    pub async fn load_ocr(&self, task_id: &str, page: usize, trigger: bool) -> Result<OcrLoad> {
        let url = self.endpoints.ocr(task_id, page + 1, trigger);
        match self.json::<OcrResponse>("GET", &url, None).await {
            Ok(response) => Ok(OcrLoad::Loaded(response)),
            Err(e) if e.is_not_found() => Ok(OcrLoad::NotRunYet),
            Err(e) => Err(e),
        }
    }

    pub async fn save_boxes(&self, request: &SaveBoxesRequest) -> Result<()> {
        let text = serde_json::to_string(request)?;
        self.send("PUT", &self.endpoints.save_boxes(), Some(Body::Json(text)))
            .await
            .map(|_| ())
    }

    pub async fn extract_text(&self, request: &ExtractTextRequest) -> Result<ExtractTextResponse> {
        self.post(&self.endpoints.extract_text(), request).await
    }

    pub async fn deskew(&self, request: &DeskewRequest) -> Result<()> {
        let text = serde_json::to_string(request)?;
        self.send("POST", &self.endpoints.deskew(), Some(Body::Json(text)))
            .await
            .map(|_| ())
    }

    pub async fn detect_voices(&self, request: &VoicesRequest) -> Result<VoicesResponse> {
        self.post(&self.endpoints.voices(), request).await
    }

    pub async fn split(&self, request: &SplitRequest) -> Result<SplitResponse> {
        self.post(&self.endpoints.split(), request).await
    }

    pub async fn split_zip(&self, request: &SplitRequest) -> Result<ZipResponse> {
        self.post(&self.endpoints.split_zip(), request).await
    }
}

/// Fire-and-forget save; failures are only logged.
pub fn persist(api: &ApiClient, snapshot: Option<SaveBoxesRequest>) {
    let Some(request) = snapshot else {
        return;
    };
    let api = api.clone();
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = api.save_boxes(&request).await {
            leptos::logging::warn!("saving boxes for task {} failed: {}", request.task_id, e);
        }
    });
}
