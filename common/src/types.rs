//! 注釈データの型定義
//!
//! Web(WASM)とCLIで共有される型:
//! - OcrBox: OCRで検出されたテキスト領域
//! - LabelKey: 5種類の固定ラベル
//! - TaskStatus / AsyncTask: サーバー側の非同期ジョブ

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::Rect;

/// A recognized text region in native (unscaled) page pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text: String,
}

impl OcrBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self { x, y, width, height, text: text.into() }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Geometry only, rounded to whole pixels for the re-OCR endpoint.
    pub fn rounded_rect(&self) -> BoxGeometry {
        BoxGeometry {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round() as i64,
            height: self.height.round() as i64,
        }
    }

    fn same_geometry(&self, other: &OcrBox) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
    }

    pub(crate) fn geometry_changed(&self, other: &OcrBox) -> bool {
        !self.same_geometry(other)
    }
}

/// Integer rectangle sent to endpoints that crop the page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Partial update for a box; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
}

impl BoxPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    pub fn rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub(crate) fn apply(self, target: &mut OcrBox) {
        if let Some(x) = self.x {
            target.x = x;
        }
        if let Some(y) = self.y {
            target.y = y;
        }
        if let Some(width) = self.width {
            target.width = width;
        }
        if let Some(height) = self.height {
            target.height = height;
        }
        if let Some(text) = self.text {
            target.text = text;
        }
    }
}

/// The closed set of semantic labels a box can carry.
///
/// The backend stores them under their German names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LabelKey {
    #[serde(rename = "Titel")]
    Title,
    #[serde(rename = "Komponist")]
    Composer,
    #[serde(rename = "Arrangeur")]
    Arranger,
    #[serde(rename = "Stimme")]
    Voice,
    #[serde(rename = "Genre")]
    Genre,
}

impl LabelKey {
    pub const ALL: [LabelKey; 5] = [
        LabelKey::Title,
        LabelKey::Composer,
        LabelKey::Arranger,
        LabelKey::Voice,
        LabelKey::Genre,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            LabelKey::Title => "Titel",
            LabelKey::Composer => "Komponist",
            LabelKey::Arranger => "Arrangeur",
            LabelKey::Voice => "Stimme",
            LabelKey::Genre => "Genre",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }

    /// Overlay border colour.
    pub fn color(&self) -> &'static str {
        match self {
            LabelKey::Title => "#0ea5e9",
            LabelKey::Composer => "#22c55e",
            LabelKey::Arranger => "#eab308",
            LabelKey::Voice => "#8b5cf6",
            LabelKey::Genre => "#ec4899",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LabelKey::Title => "Title",
            LabelKey::Composer => "Composer",
            LabelKey::Arranger => "Arranger",
            LabelKey::Voice => "Voice",
            LabelKey::Genre => "Genre",
        }
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for LabelKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" | "titel" => Ok(LabelKey::Title),
            "composer" | "komponist" => Ok(LabelKey::Composer),
            "arranger" | "arrangeur" => Ok(LabelKey::Arranger),
            "voice" | "stimme" | "part" => Ok(LabelKey::Voice),
            "genre" => Ok(LabelKey::Genre),
            _ => Err(format!(
                "Unknown label: {}. Use title, composer, arranger, voice, or genre",
                s
            )),
        }
    }
}

/// Label map as exchanged with the backend: wire label name → box index.
pub type WireLabels = BTreeMap<String, usize>;

/// Server-proposed label values: wire label name → recognized text.
pub type Suggestions = BTreeMap<String, String>;

/// Status of a server-side PDF ingestion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one task the poller tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncTask {
    pub task_id: String,
    pub status: TaskStatus,
    pub num_pages: Option<u32>,
    pub error_message: Option<String>,
}

impl AsyncTask {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            num_pages: None,
            error_message: None,
        }
    }
}

/// A row of the document list (`GET /pdf_tasks/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    #[serde(deserialize_with = "crate::api::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub num_pages: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_box_deserialize_ignores_extra_fields() {
        let json = r#"{"x": 10, "y": 20, "width": 30, "height": 5, "text": "Trompete 1", "selected": false}"#;
        let b: OcrBox = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(b, OcrBox::new(10.0, 20.0, 30.0, 5.0, "Trompete 1"));
    }

    #[test]
    fn test_ocr_box_missing_text_defaults_empty() {
        let b: OcrBox = serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4}"#).unwrap();
        assert_eq!(b.text, "");
    }

    #[test]
    fn test_rounded_rect() {
        let b = OcrBox::new(10.4, 20.5, 30.49, 5.51, "");
        assert_eq!(
            b.rounded_rect(),
            BoxGeometry { x: 10, y: 21, width: 30, height: 6 }
        );
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut b = OcrBox::new(1.0, 2.0, 3.0, 4.0, "Tuba");
        BoxPatch::position(7.0, 8.0).apply(&mut b);
        assert_eq!(b, OcrBox::new(7.0, 8.0, 3.0, 4.0, "Tuba"));
    }

    #[test]
    fn test_label_key_wire_names() {
        let json = serde_json::to_string(&LabelKey::Composer).unwrap();
        assert_eq!(json, "\"Komponist\"");
        assert_eq!(LabelKey::from_wire("Stimme"), Some(LabelKey::Voice));
        assert_eq!(LabelKey::from_wire("Stimmung"), None);
    }

    #[test]
    fn test_label_key_from_str_accepts_both_languages() {
        assert_eq!("voice".parse::<LabelKey>(), Ok(LabelKey::Voice));
        assert_eq!("Titel".parse::<LabelKey>(), Ok(LabelKey::Title));
        assert!("tempo".parse::<LabelKey>().is_err());
    }

    #[test]
    fn test_task_status_lowercase() {
        let s: TaskStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(s, TaskStatus::Processing);
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }

    #[test]
    fn test_task_summary_numeric_id() {
        let json = r#"{"id": 42, "filename": "marsch.pdf", "status": "done", "num_pages": 12}"#;
        let t: TaskSummary = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "42");
        assert_eq!(t.num_pages, Some(12));
        assert_eq!(t.created_at, None);
    }
}
