//! バックエンドAPIの型定義
//!
//! Request/response bodies of the REST backend and the endpoint paths,
//! shared by the browser fetch client and the CLI reqwest client.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{BoxGeometry, OcrBox, Suggestions, TaskStatus, WireLabels};

pub const API_PREFIX: &str = "/api/v1";

/// Accepts ids sent either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Endpoint paths relative to the server origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(server_url: &str) -> Self {
        Self {
            base: format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX),
        }
    }

    pub fn server_url(&self) -> &str {
        self.base.trim_end_matches(API_PREFIX)
    }

    pub fn task_list(&self) -> String {
        format!("{}/pdf_tasks/", self.base)
    }

    pub fn upload(&self) -> String {
        format!("{}/pdf_tasks/upload", self.base)
    }

    pub fn status(&self, task_id: &str) -> String {
        format!("{}/pdf_tasks/status/{}", self.base, urlencoding::encode(task_id))
    }

    pub fn pages(&self, task_id: &str) -> String {
        format!("{}/pdf_tasks/pages/{}", self.base, urlencoding::encode(task_id))
    }

    pub fn deskew(&self) -> String {
        format!("{}/pdf_tasks/deskew", self.base)
    }

    /// `page` is 1-based as the backend expects.
    pub fn ocr(&self, task_id: &str, page: usize, trigger_ocr: bool) -> String {
        format!(
            "{}/ocr/?task_id={}&page={}&trigger_ocr={}",
            self.base,
            urlencoding::encode(task_id),
            page,
            trigger_ocr
        )
    }

    pub fn save_boxes(&self) -> String {
        format!("{}/ocr/boxes/", self.base)
    }

    pub fn extract_text(&self) -> String {
        format!("{}/ocr/extract_text/", self.base)
    }

    pub fn voices(&self) -> String {
        format!("{}/ocr/voices", self.base)
    }

    pub fn split(&self) -> String {
        format!("{}/ocr/voices/split", self.base)
    }

    pub fn split_zip(&self) -> String {
        format!("{}/ocr/voices/split_zip", self.base)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub num_pages: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagesResponse {
    #[serde(default)]
    pub pages: Vec<String>,
}

/// `GET /ocr/` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub boxes: Vec<OcrBox>,
    #[serde(default)]
    pub labels: WireLabels,
    #[serde(default)]
    pub suggestions: Suggestions,
}

/// Result of loading OCR state for a page.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrLoad {
    Loaded(OcrResponse),
    /// The backend answered 404: OCR has not been run for this task yet.
    NotRunYet,
}

/// `PUT /ocr/boxes/` body. Always carries the full annotation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveBoxesRequest {
    pub task_id: String,
    pub boxes: Vec<OcrBox>,
    pub suggestions: Suggestions,
    pub labels: WireLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTextRequest {
    pub task_id: String,
    pub page: usize,
    pub boxes: Vec<BoxGeometry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    #[serde(default)]
    pub boxes: Vec<OcrBox>,
    #[serde(default)]
    pub suggestions: Suggestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&OcrBox> for RegionRect {
    fn from(b: &OcrBox) -> Self {
        Self { x: b.x, y: b.y, width: b.width, height: b.height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicesRequest {
    pub title_box: RegionRect,
    pub voice_box: RegionRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedVoice {
    pub page: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub num_pages: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoicesResponse {
    #[serde(default)]
    pub voices: Vec<DetectedVoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePage {
    pub page: u32,
    pub voice: String,
}

/// Body for both `/ocr/voices/split` and `/ocr/voices/split_zip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub voices: Vec<VoicePage>,
    pub title: String,
    pub genre: String,
    #[serde(rename = "komponist")]
    pub composer: String,
    #[serde(rename = "arrangeur")]
    pub arranger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default)]
    pub pdf_files: Vec<String>,
}

impl SplitResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipResponse {
    #[serde(default)]
    pub zip_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskewRequest {
    pub task_id: String,
    pub page: usize,
    pub angle: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let e = Endpoints::new("http://localhost:8000/");
        assert_eq!(e.upload(), "http://localhost:8000/api/v1/pdf_tasks/upload");
        assert_eq!(e.status("abc"), "http://localhost:8000/api/v1/pdf_tasks/status/abc");
        assert_eq!(
            e.ocr("abc", 3, false),
            "http://localhost:8000/api/v1/ocr/?task_id=abc&page=3&trigger_ocr=false"
        );
        assert_eq!(e.server_url(), "http://localhost:8000");
    }

    #[test]
    fn test_endpoints_relative_origin() {
        let e = Endpoints::new("");
        assert_eq!(e.save_boxes(), "/api/v1/ocr/boxes/");
        assert_eq!(e.server_url(), "");
    }

    #[test]
    fn test_split_request_wire_names() {
        let req = SplitRequest {
            voices: vec![VoicePage { page: 3, voice: "Tenorhorn".into() }],
            title: "Marsch".into(),
            genre: "Polka".into(),
            composer: "Mustermann".into(),
            arranger: String::new(),
            start_page: None,
            end_page: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["komponist"], "Mustermann");
        assert_eq!(json["arrangeur"], "");
        assert!(json.get("start_page").is_none());
    }

    #[test]
    fn test_status_response_optional_fields() {
        let s: StatusResponse = serde_json::from_str(r#"{"status": "error", "error_message": "kaputt"}"#).unwrap();
        assert_eq!(s.status, TaskStatus::Error);
        assert_eq!(s.error_message.as_deref(), Some("kaputt"));
        assert_eq!(s.num_pages, None);
    }

    #[test]
    fn test_ocr_response_message_only() {
        let r: OcrResponse =
            serde_json::from_str(r#"{"message": "No stored boxes", "boxes": [], "suggestions": {}, "labels": {}}"#)
                .unwrap();
        assert!(r.boxes.is_empty());
    }

    #[test]
    fn test_detected_voice_null_title() {
        let v: VoicesResponse =
            serde_json::from_str(r#"{"voices": [{"page": 1, "title": null, "voice": "Tuba", "num_pages": 2}]}"#)
                .unwrap();
        assert_eq!(v.voices[0].title, None);
        assert_eq!(v.voices[0].num_pages, Some(2));
    }
}
