//! 声部（パート）検出とPDF分割
//!
//! Builds the voice detection request from the Title and Voice boxes, keeps
//! the detected voice table, and builds the split requests for the batch,
//! ZIP and single-voice exports.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::{DetectedVoice, RegionRect, SplitRequest, VoicePage, VoicesRequest};
use crate::box_store::BoxStore;
use crate::error::{Result, ValidationError};
use crate::types::LabelKey;

/// A row of the voice table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceRow {
    /// 1-based start page.
    pub page: u32,
    pub num_pages: Option<u32>,
    pub title_found: bool,
    pub voice: String,
}

impl From<DetectedVoice> for VoiceRow {
    fn from(v: DetectedVoice) -> Self {
        Self {
            page: v.page,
            num_pages: v.num_pages,
            title_found: v.title.as_deref().is_some_and(|t| !t.trim().is_empty()),
            voice: v.voice,
        }
    }
}

impl VoiceRow {
    /// Last page of this voice, assuming one page when the count is unknown.
    pub fn end_page(&self) -> u32 {
        self.page + self.num_pages.unwrap_or(1).max(1) - 1
    }

    /// 0-based page index for jumping the viewer to this voice.
    pub fn page_index(&self) -> usize {
        self.page.saturating_sub(1) as usize
    }
}

/// Score metadata sent with every split request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMeta {
    pub title: String,
    pub genre: String,
    pub composer: String,
    pub arranger: String,
}

impl ExportMeta {
    /// Texts of the labelled boxes; missing labels become empty strings.
    pub fn from_labels(texts: &BTreeMap<LabelKey, String>) -> Self {
        let get = |key: LabelKey| texts.get(&key).cloned().unwrap_or_default();
        Self {
            title: get(LabelKey::Title),
            genre: get(LabelKey::Genre),
            composer: get(LabelKey::Composer),
            arranger: get(LabelKey::Arranger),
        }
    }

    pub fn from_store(store: &BoxStore) -> Self {
        Self::from_labels(&store.label_texts())
    }
}

/// Needs both Title and Voice labelled.
pub fn detect_request(store: &BoxStore) -> Result<VoicesRequest> {
    let title = store.label_index(LabelKey::Title);
    let voice = store.label_index(LabelKey::Voice);
    let (Some(title), Some(voice)) = (title, voice) else {
        return Err(ValidationError::MissingTitleOrVoice.into());
    };
    let title_box = store
        .get(title)
        .ok_or(ValidationError::LabelledBoxMissing(LabelKey::Title.display_name()))?;
    let voice_box = store
        .get(voice)
        .ok_or(ValidationError::LabelledBoxMissing(LabelKey::Voice.display_name()))?;
    Ok(VoicesRequest {
        title_box: RegionRect::from(title_box),
        voice_box: RegionRect::from(voice_box),
    })
}

/// The detected voice table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceTable {
    rows: Vec<VoiceRow>,
}

impl VoiceTable {
    pub fn new(detected: Vec<DetectedVoice>) -> Self {
        Self { rows: detected.into_iter().map(VoiceRow::from).collect() }
    }

    pub fn rows(&self) -> &[VoiceRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn voice_pages(&self) -> Vec<VoicePage> {
        self.rows
            .iter()
            .map(|r| VoicePage { page: r.page, voice: r.voice.clone() })
            .collect()
    }

    /// Split every voice (`/split` and `/split_zip`).
    pub fn split_all(&self, meta: &ExportMeta) -> Result<SplitRequest> {
        if self.rows.is_empty() {
            return Err(ValidationError::NoVoices.into());
        }
        Ok(SplitRequest {
            voices: self.voice_pages(),
            title: meta.title.clone(),
            genre: meta.genre.clone(),
            composer: meta.composer.clone(),
            arranger: meta.arranger.clone(),
            start_page: None,
            end_page: None,
        })
    }

    /// Split a single voice over its page range.
    pub fn split_one(&self, index: usize, meta: &ExportMeta) -> Result<SplitRequest> {
        if self.rows.is_empty() {
            return Err(ValidationError::NoVoices.into());
        }
        let row = self
            .rows
            .get(index)
            .ok_or(ValidationError::VoiceOutOfRange(index))?;
        Ok(SplitRequest {
            voices: vec![VoicePage { page: row.page, voice: row.voice.clone() }],
            title: meta.title.clone(),
            genre: meta.genre.clone(),
            composer: meta.composer.clone(),
            arranger: meta.arranger.clone(),
            start_page: Some(row.page),
            end_page: Some(row.end_page()),
        })
    }
}

/// Absolute download URL for a `zip_url`; relative paths get the server prefix.
pub fn zip_download_url(server_url: &str, zip_url: &str) -> String {
    if zip_url.starts_with('/') {
        format!("{}{}", server_url.trim_end_matches('/'), zip_url)
    } else {
        zip_url.to_string()
    }
}

/// Download URL of a single exported voice PDF.
pub fn voice_pdf_url(server_url: &str, file_name: &str) -> String {
    format!(
        "{}/static/voices_export/{}",
        server_url.trim_end_matches('/'),
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{OcrBox, WireLabels};

    fn detected() -> Vec<DetectedVoice> {
        vec![
            DetectedVoice { page: 1, title: Some("Marsch".into()), voice: "Flöte".into(), num_pages: Some(2) },
            DetectedVoice { page: 3, title: Some("  ".into()), voice: "Tuba".into(), num_pages: None },
        ]
    }

    #[test]
    fn test_rows_from_detected() {
        let table = VoiceTable::new(detected());
        assert!(table.rows()[0].title_found);
        assert!(!table.rows()[1].title_found);
        assert_eq!(table.rows()[0].end_page(), 2);
        assert_eq!(table.rows()[1].end_page(), 3);
        assert_eq!(table.rows()[1].page_index(), 2);
    }

    #[test]
    fn test_detect_requires_title_and_voice() {
        let mut store = BoxStore::from_wire(
            vec![
                OcrBox::new(10.0, 10.0, 300.0, 40.0, "Marsch"),
                OcrBox::new(10.0, 60.0, 100.0, 20.0, "Flöte"),
            ],
            &WireLabels::new(),
        );
        store.assign_label(LabelKey::Title, 0);
        let err = detect_request(&store).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingTitleOrVoice)));

        store.assign_label(LabelKey::Voice, 1);
        let req = detect_request(&store).unwrap();
        assert_eq!(req.title_box.width, 300.0);
        assert_eq!(req.voice_box.y, 60.0);
    }

    #[test]
    fn test_split_one_page_range() {
        let table = VoiceTable::new(detected());
        let meta = ExportMeta { title: "Marsch".into(), ..Default::default() };
        let req = table.split_one(0, &meta).unwrap();
        assert_eq!(req.voices.len(), 1);
        assert_eq!((req.start_page, req.end_page), (Some(1), Some(2)));
        assert!(matches!(
            table.split_one(5, &meta),
            Err(Error::Validation(ValidationError::VoiceOutOfRange(5)))
        ));
    }

    #[test]
    fn test_split_all_needs_voices() {
        let empty = VoiceTable::default();
        assert!(empty.split_all(&ExportMeta::default()).is_err());
        let table = VoiceTable::new(detected());
        let req = table.split_all(&ExportMeta::default()).unwrap();
        assert_eq!(req.voices.len(), 2);
        assert_eq!(req.start_page, None);
    }

    #[test]
    fn test_meta_from_labels() {
        let mut texts = BTreeMap::new();
        texts.insert(LabelKey::Composer, "J. F. Wagner".to_string());
        let meta = ExportMeta::from_labels(&texts);
        assert_eq!(meta.composer, "J. F. Wagner");
        assert_eq!(meta.title, "");
    }

    #[test]
    fn test_download_urls() {
        assert_eq!(
            zip_download_url("http://host:8000", "/static/zips/a.zip"),
            "http://host:8000/static/zips/a.zip"
        );
        assert_eq!(zip_download_url("http://host", "https://cdn/a.zip"), "https://cdn/a.zip");
        assert_eq!(
            voice_pdf_url("http://host/", "Marsch - Flöte 1.pdf"),
            "http://host/static/voices_export/Marsch%20-%20Fl%C3%B6te%201.pdf"
        );
    }
}
