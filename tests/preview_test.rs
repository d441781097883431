//! プレビュー描画の統合テスト

mod common;

use common::{labelled_page, page_urls, FakeBackend};
use image::{ImageFormat, Rgba, RgbaImage};
use score_scan::error::ScoreScanError;
use score_scan::preview::{self, PreviewOptions};
use score_scan_common::LabelKey;
use std::io::Cursor;
use tempfile::tempdir;

fn white_page(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn backend() -> FakeBackend {
    FakeBackend::with(|s| {
        s.pages = page_urls("42", 2);
        s.files.insert(s.pages[0].clone(), white_page(1000, 800));
        s.files.insert(s.pages[1].clone(), white_page(1000, 800));
        s.ocr.insert(1, labelled_page());
    })
}

fn title_color() -> Rgba<u8> {
    preview::parse_hex_color(LabelKey::Title.color()).unwrap()
}

fn options(page: usize, zoom: Option<f64>) -> PreviewOptions {
    PreviewOptions { page, zoom, container_width: 1250.0, selected: None }
}

#[tokio::test]
async fn test_manual_zoom_scales_page_and_boxes() {
    let backend = backend();
    let image = preview::render(&backend, "42", options(1, Some(0.5))).await.unwrap();
    assert_eq!(image.dimensions(), (500, 400));

    // Titel box (100, 40, 300×60) at half size
    assert_eq!(*image.get_pixel(50, 20), title_color());
}

#[tokio::test]
async fn test_box_outline_leaves_interior() {
    let backend = backend();
    let image = preview::render(&backend, "42", options(1, Some(1.0))).await.unwrap();
    assert_eq!(*image.get_pixel(100, 40), title_color());
    assert_eq!(*image.get_pixel(101, 41), title_color());
    assert_eq!(*image.get_pixel(200, 70), Rgba([255, 255, 255, 255]));
    // Stimme box
    assert_eq!(*image.get_pixel(50, 120), preview::parse_hex_color(LabelKey::Voice.color()).unwrap());
}

#[tokio::test]
async fn test_fit_zoom_uses_container_width() {
    let backend = backend();
    let image = preview::render(&backend, "42", options(1, None)).await.unwrap();
    // 1250 * 0.8 / 1000 = 1.0
    assert_eq!(image.dimensions(), (1000, 800));
}

#[tokio::test]
async fn test_page_without_ocr_renders_plain_page() {
    let backend = backend();
    let image = preview::render(&backend, "42", options(2, Some(1.0))).await.unwrap();
    assert!(image.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
}

#[tokio::test]
async fn test_missing_page_is_an_error() {
    let backend = backend();
    let err = preview::render(&backend, "42", options(5, None)).await.unwrap_err();
    assert!(matches!(err, ScoreScanError::CliExecution(_)));
}

#[tokio::test]
async fn test_save_png() {
    let dir = tempdir().unwrap();
    let backend = backend();
    let image = preview::render(&backend, "42", options(1, Some(0.2))).await.unwrap();
    let path = dir.path().join("out").join("preview.png");
    preview::save(&image, &path).unwrap();
    let reloaded = image::open(&path).unwrap();
    assert_eq!((reloaded.width(), reloaded.height()), (200, 160));
}
