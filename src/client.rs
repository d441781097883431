//! バックエンドAPIクライアント
//!
//! [`Backend`] is the seam between the command handlers and the REST
//! backend; [`HttpBackend`] is the reqwest implementation. Every method
//! returns the shared error taxonomy so the sans-IO state machines in
//! `score_scan_common` can consume the results directly.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use score_scan_common::api::{
    DeskewRequest, Endpoints, ExtractTextRequest, ExtractTextResponse, OcrLoad, OcrResponse,
    PagesResponse, SaveBoxesRequest, SplitRequest, SplitResponse, StatusResponse, UploadResponse,
    VoicesRequest, VoicesResponse, ZipResponse,
};
use score_scan_common::poller::http_error;
use score_scan_common::{Error as CommonError, Result as CommonResult, TaskSummary};

use crate::error::Result;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Origin the backend is served from, used to absolutize download links.
    fn server_url(&self) -> &str;

    async fn list_tasks(&self) -> CommonResult<Vec<TaskSummary>>;
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> CommonResult<UploadResponse>;
    async fn status(&self, task_id: &str) -> CommonResult<StatusResponse>;
    async fn pages(&self, task_id: &str) -> CommonResult<PagesResponse>;

    /// `page` is 1-based. A 404 means OCR has not been run yet.
    async fn load_ocr(&self, task_id: &str, page: usize, trigger: bool) -> CommonResult<OcrLoad>;
    async fn save_boxes(&self, request: &SaveBoxesRequest) -> CommonResult<()>;
    async fn extract_text(&self, request: &ExtractTextRequest) -> CommonResult<ExtractTextResponse>;
    async fn deskew(&self, request: &DeskewRequest) -> CommonResult<()>;

    async fn detect_voices(&self, request: &VoicesRequest) -> CommonResult<VoicesResponse>;
    async fn split(&self, request: &SplitRequest) -> CommonResult<SplitResponse>;
    async fn split_zip(&self, request: &SplitRequest) -> CommonResult<ZipResponse>;

    /// Raw bytes of a page image or an exported file.
    async fn download(&self, url: &str) -> CommonResult<Vec<u8>>;
}

/// Absolute URL for a link the backend may have sent as a path.
pub fn absolute_url(server_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", server_url.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}

pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
    server_url: String,
    token: String,
}

fn network(e: reqwest::Error) -> CommonError {
    CommonError::Network(e.to_string())
}

async fn check(response: Response) -> CommonResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(http_error(status.as_u16(), response.url().as_str()))
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> CommonResult<T> {
    let body = check(response).await?.text().await.map_err(network)?;
    Ok(serde_json::from_str(&body)?)
}

impl HttpBackend {
    pub fn new(server_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoints: Endpoints::new(server_url),
            server_url: server_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> CommonResult<T> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(network)?;
        json(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> CommonResult<T> {
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(network)?;
        json(response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn list_tasks(&self) -> CommonResult<Vec<TaskSummary>> {
        self.get(&self.endpoints.task_list()).await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> CommonResult<UploadResponse> {
        let url = self.endpoints.upload();
        tracing::debug!(%url, file_name, size = bytes.len(), "upload");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(network)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        json(response).await
    }

    async fn status(&self, task_id: &str) -> CommonResult<StatusResponse> {
        self.get(&self.endpoints.status(task_id)).await
    }

    async fn pages(&self, task_id: &str) -> CommonResult<PagesResponse> {
        self.get(&self.endpoints.pages(task_id)).await
    }

    async fn load_ocr(&self, task_id: &str, page: usize, trigger: bool) -> CommonResult<OcrLoad> {
        match self.get::<OcrResponse>(&self.endpoints.ocr(task_id, page, trigger)).await {
            Ok(response) => Ok(OcrLoad::Loaded(response)),
            Err(e) if e.is_not_found() => Ok(OcrLoad::NotRunYet),
            Err(e) => Err(e),
        }
    }

    async fn save_boxes(&self, request: &SaveBoxesRequest) -> CommonResult<()> {
        let url = self.endpoints.save_boxes();
        tracing::debug!(%url, boxes = request.boxes.len(), "PUT");
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(network)?;
        check(response).await?;
        Ok(())
    }

    async fn extract_text(&self, request: &ExtractTextRequest) -> CommonResult<ExtractTextResponse> {
        self.post(&self.endpoints.extract_text(), request).await
    }

    async fn deskew(&self, request: &DeskewRequest) -> CommonResult<()> {
        let _: serde_json::Value = self.post(&self.endpoints.deskew(), request).await?;
        Ok(())
    }

    async fn detect_voices(&self, request: &VoicesRequest) -> CommonResult<VoicesResponse> {
        self.post(&self.endpoints.voices(), request).await
    }

    async fn split(&self, request: &SplitRequest) -> CommonResult<SplitResponse> {
        self.post(&self.endpoints.split(), request).await
    }

    async fn split_zip(&self, request: &SplitRequest) -> CommonResult<ZipResponse> {
        self.post(&self.endpoints.split_zip(), request).await
    }

    async fn download(&self, url: &str) -> CommonResult<Vec<u8>> {
        let url = absolute_url(&self.server_url, url);
        tracing::debug!(%url, "download");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(network)?;
        let bytes = check(response).await?.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}
