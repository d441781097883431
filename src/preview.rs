//! 注釈プレビュー画像の生成
//!
//! Renders a page the way the browser viewer shows it: the page image at the
//! viewer zoom with every box outlined in its label colour.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

use score_scan_common::geometry::{Rect, Size};
use score_scan_common::session::{AnnotationModel, DocumentSession, LoadOutcome};
use score_scan_common::viewer::DEFAULT_BOX_COLOR;
use score_scan_common::Viewer;

use crate::annotate::page_index;
use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

const BORDER: u32 = 2;
const SELECTED_BORDER: u32 = 4;

/// Options of one preview render.
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    /// 1-based page.
    pub page: usize,
    /// Manual zoom; `None` fits the page to `container_width`.
    pub zoom: Option<f64>,
    pub container_width: f64,
    pub selected: Option<usize>,
}

/// `#rrggbb` to an opaque pixel.
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

/// Outlines `rect` (screen pixels), clipped to the image.
pub fn draw_outline(image: &mut RgbaImage, rect: Rect, color: Rgba<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let x0 = rect.x.max(0.0).round() as u32;
    let y0 = rect.y.max(0.0).round() as u32;
    let x1 = (rect.right().round().max(0.0) as u32).min(width - 1);
    let y1 = (rect.bottom().round().max(0.0) as u32).min(height - 1);
    if x0 > x1 || y0 > y1 {
        return;
    }
    for y in y0..=y1 {
        for x in x0..=x1 {
            let on_edge = x < x0 + thickness
                || x + thickness > x1
                || y < y0 + thickness
                || y + thickness > y1;
            if on_edge {
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Draws the viewer overlays over a page image already scaled to the
/// viewer's rendered size.
pub fn draw_overlays(viewer: &Viewer, image: &mut RgbaImage) -> usize {
    let fallback = parse_hex_color(DEFAULT_BOX_COLOR).unwrap_or(Rgba([75, 85, 99, 255]));
    let overlays = viewer.overlays();
    for overlay in &overlays {
        let color = parse_hex_color(overlay.color).unwrap_or(fallback);
        let thickness = if overlay.selected { SELECTED_BORDER } else { BORDER };
        draw_outline(image, overlay.rect, color, thickness);
    }
    overlays.len()
}

/// Loads page, annotations and image, and renders the preview.
pub async fn render(backend: &dyn Backend, task_id: &str, options: PreviewOptions) -> Result<RgbaImage> {
    let index = page_index(options.page)?;
    let pages = backend.pages(task_id).await?.pages;

    let mut viewer = Viewer::new(Box::new(DocumentSession::new(task_id)));
    viewer.load_pages(pages);
    viewer.go_to(index);
    if viewer.current_page() != index {
        return Err(ScoreScanError::CliExecution(format!(
            "{}ページは存在しません (全{}ページ)",
            options.page,
            viewer.state.nav.count()
        )));
    }

    let load = backend.load_ocr(task_id, options.page, false).await?;
    if viewer.model_mut().apply_load(index, load) == LoadOutcome::NoOcrYet {
        tracing::info!(task_id, page = options.page, "no OCR yet, rendering page only");
    }

    let url = viewer
        .state
        .current_page_url()
        .map(str::to_string)
        .ok_or_else(|| ScoreScanError::CliExecution("ページがありません".to_string()))?;
    let bytes = backend.download(&url).await?;
    let page_image = image::load_from_memory(&bytes)?;

    if let Some(zoom) = options.zoom {
        viewer.state.zoom.set_manual(zoom);
    }
    viewer.image_loaded(
        Size::new(page_image.width() as f64, page_image.height() as f64),
        options.container_width,
    );
    if let Some(selected) = options.selected {
        viewer.state.toggle_selection(selected);
    }

    let rendered = viewer.rendered_size();
    let mut canvas = imageops::resize(
        &page_image.to_rgba8(),
        rendered.width.round().max(1.0) as u32,
        rendered.height.round().max(1.0) as u32,
        FilterType::Triangle,
    );
    let drawn = draw_overlays(&viewer, &mut canvas);
    tracing::debug!(drawn, zoom = viewer.state.zoom.factor(), "preview rendered");
    Ok(canvas)
}

pub fn save(image: &RgbaImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#4b5563"), Some(Rgba([0x4b, 0x55, 0x63, 255])));
        assert_eq!(parse_hex_color("4b5563"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn test_draw_outline_only_edges() {
        let mut image = RgbaImage::new(20, 20);
        let red = Rgba([255, 0, 0, 255]);
        draw_outline(&mut image, Rect::new(5.0, 5.0, 10.0, 10.0), red, 1);
        assert_eq!(*image.get_pixel(5, 5), red);
        assert_eq!(*image.get_pixel(15, 10), red);
        assert_eq!(*image.get_pixel(10, 10), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_outline_clips_to_image() {
        let mut image = RgbaImage::new(10, 10);
        let blue = Rgba([0, 0, 255, 255]);
        draw_outline(&mut image, Rect::new(-5.0, -5.0, 50.0, 50.0), blue, 1);
        assert_eq!(*image.get_pixel(0, 0), blue);
        assert_eq!(*image.get_pixel(9, 9), blue);
        assert_eq!(*image.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
    }
}
