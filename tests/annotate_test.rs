//! ページ注釈編集の統合テスト

mod common;

use common::{labelled_page, FakeBackend};
use score_scan::annotate;
use score_scan::error::ScoreScanError;
use score_scan_common::api::ExtractTextResponse;
use score_scan_common::session::AnnotationModel;
use score_scan_common::{BoxPatch, LabelKey, OcrBox, OcrResponse};

fn backend_with_page() -> FakeBackend {
    FakeBackend::with(|s| {
        s.ocr.insert(1, labelled_page());
    })
}

/// OCR未実行（404）はエラーではない
#[tokio::test]
async fn test_open_page_without_ocr() {
    let backend = FakeBackend::new();
    let page = annotate::open_page(&backend, "42", 2).await.unwrap();
    assert!(!page.has_ocr());
    assert_eq!(page.page_number(), 2);
    assert!(page.session.store().is_empty());
    assert_eq!(backend.state().ocr_calls, vec![(2, false)]);
}

#[tokio::test]
async fn test_page_zero_is_rejected() {
    let backend = FakeBackend::new();
    let err = annotate::open_page(&backend, "42", 0).await.unwrap_err();
    assert!(matches!(err, ScoreScanError::Common(_)));
    assert!(backend.state().ocr_calls.is_empty());
}

/// Stimme auf Box 2, Box 0 löschen → Stimme auf Box 1
#[tokio::test]
async fn test_remove_box_remaps_labels_and_saves() {
    let backend = backend_with_page();
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    assert!(annotate::remove_box(&backend, &mut page, 0).await.unwrap());

    let store = page.session.store();
    assert_eq!(store.len(), 2);
    assert_eq!(store.label_index(LabelKey::Voice), Some(1));
    assert_eq!(store.label_index(LabelKey::Title), None);

    let state = backend.state();
    assert_eq!(state.saved.len(), 1);
    let saved = &state.saved[0];
    assert_eq!(saved.task_id, "42");
    assert_eq!(saved.boxes.len(), 2);
    assert_eq!(saved.labels.get("Stimme"), Some(&1));
    assert_eq!(saved.labels.get("Komponist"), Some(&0));
    assert!(!saved.labels.contains_key("Titel"));
}

#[tokio::test]
async fn test_assign_and_clear_label() {
    let backend = backend_with_page();
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    annotate::assign_label(&backend, &mut page, LabelKey::Genre, 0).await.unwrap();
    annotate::clear_label(&backend, &mut page, LabelKey::Composer).await.unwrap();

    let state = backend.state();
    assert_eq!(state.saved.len(), 2);
    assert_eq!(state.saved[1].labels.get("Genre"), Some(&0));
    assert!(!state.saved[1].labels.contains_key("Komponist"));
}

#[tokio::test]
async fn test_out_of_range_box_is_rejected() {
    let backend = backend_with_page();
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    let err = annotate::assign_label(&backend, &mut page, LabelKey::Genre, 9).await.unwrap_err();
    assert!(matches!(err, ScoreScanError::Common(_)));
    assert!(annotate::remove_box(&backend, &mut page, 3).await.is_err());
    assert!(backend.state().saved.is_empty());
}

#[tokio::test]
async fn test_edit_requires_ocr() {
    let backend = FakeBackend::new();
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();
    let err = annotate::remove_box(&backend, &mut page, 0).await.unwrap_err();
    assert!(matches!(err, ScoreScanError::CliExecution(_)));
}

/// 保存失敗はログのみで処理は続行
#[tokio::test]
async fn test_save_failure_is_reported_not_raised() {
    let backend = backend_with_page();
    backend.state().fail_save = true;
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    let saved = annotate::remove_box(&backend, &mut page, 0).await.unwrap();
    assert!(!saved);
    assert_eq!(page.session.store().len(), 2);
}

#[tokio::test]
async fn test_geometry_edit_reocrs_box() {
    let backend = backend_with_page();
    backend.state().extract_response = ExtractTextResponse {
        boxes: vec![OcrBox::new(50.0, 120.0, 220.0, 30.0, "1. Klarinette in B")],
        suggestions: Default::default(),
    };
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    let patch = BoxPatch { width: Some(220.0), ..Default::default() };
    assert!(annotate::edit_box(&backend, &mut page, 2, patch).await.unwrap());

    assert_eq!(page.session.store().get(2).unwrap().text, "1. Klarinette in B");
    let state = backend.state();
    assert_eq!(state.extract_requests.len(), 1);
    assert_eq!(state.extract_requests[0].page, 1);
    assert_eq!(state.extract_requests[0].boxes[0].width, 220);
    // geometry save, then the save with the recognized text
    assert_eq!(state.saved.len(), 2);
    assert_eq!(state.saved[1].boxes[2].text, "1. Klarinette in B");
}

#[tokio::test]
async fn test_text_edit_skips_reocr() {
    let backend = backend_with_page();
    let mut page = annotate::open_page(&backend, "42", 1).await.unwrap();

    annotate::edit_box(&backend, &mut page, 0, BoxPatch::text("Alte Kameraden"))
        .await
        .unwrap();
    let state = backend.state();
    assert!(state.extract_requests.is_empty());
    assert_eq!(state.saved.len(), 1);
}

#[tokio::test]
async fn test_recognize_resolves_suggestions_and_persists() {
    let mut response = OcrResponse {
        boxes: vec![
            OcrBox::new(0.0, 0.0, 100.0, 20.0, "Florentiner Marsch"),
            OcrBox::new(0.0, 40.0, 100.0, 20.0, "Julius Fučík"),
        ],
        ..Default::default()
    };
    response.suggestions.insert("Titel".into(), "Florentiner Marsch".into());
    response.suggestions.insert("Komponist".into(), "Julius Fučík".into());
    let backend = FakeBackend::with(|s| s.triggered = Some(response));

    let page = annotate::recognize(&backend, "42", 1).await.unwrap();
    assert!(page.has_ocr());
    assert_eq!(page.session.store().label_index(LabelKey::Title), Some(0));
    assert_eq!(page.session.store().label_index(LabelKey::Composer), Some(1));

    let state = backend.state();
    assert_eq!(state.ocr_calls, vec![(1, true)]);
    assert_eq!(state.saved.len(), 1);
    assert_eq!(state.saved[0].suggestions.len(), 2);
}

#[tokio::test]
async fn test_recognize_without_result_fails() {
    let backend = FakeBackend::new();
    let err = annotate::recognize(&backend, "42", 1).await.unwrap_err();
    assert!(matches!(err, ScoreScanError::TaskFailed(_)));
}

#[tokio::test]
async fn test_describe_boxes_marks_labels() {
    let backend = backend_with_page();
    let page = annotate::open_page(&backend, "42", 1).await.unwrap();
    let lines = annotate::describe_boxes(&page);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Marsch"));
    assert!(lines[0].ends_with("[Title]"));
    assert!(lines[2].ends_with("[Voice]"));
}
