//! ブラウザでのファイル保存
//!
//! Table exports are built in memory and handed to the browser as a Blob
//! URL; server-side files (voice PDFs, ZIP) are opened by URL.

use score_scan_common::export::{self, ExportFormat, Table, TableRow};
use score_scan_common::{Error, Result};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::api::js_error;

fn click_anchor(href: &str, file_name: Option<&str>) -> Result<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| Error::Export("no document".into()))?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_error)?
        .dyn_into()
        .map_err(|el: web_sys::Element| js_error(el.into()))?;
    anchor.set_href(href);
    match file_name {
        Some(name) => anchor.set_download(name),
        None => anchor.set_target("_blank"),
    }
    anchor.click();
    Ok(())
}

/// Saves `content` as a file through an object URL.
pub fn save_text(file_name: &str, mime: &str, content: &str) -> Result<()> {
    let parts = js_sys::Array::of1(&JsValue::from_str(content));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_error)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(js_error)?;
    let result = click_anchor(&url, Some(file_name));
    let _ = Url::revoke_object_url(&url);
    result
}

/// Opens a server file in a new tab (the server sets the download headers).
pub fn open_url(url: &str) -> Result<()> {
    click_anchor(url, None)
}

/// CSV or JSON of `rows`. XLSX needs the native writer and is CLI only.
pub fn export_rows<R: TableRow + Serialize>(
    rows: &[R],
    format: ExportFormat,
    base_name: &str,
    sheet_name: &str,
) -> Result<()> {
    let file_name = format!("{}.{}", base_name, format.extension());
    match format {
        ExportFormat::Csv => {
            let csv = export::to_csv(&Table::from_rows(sheet_name, rows));
            save_text(&file_name, "text/csv;charset=utf-8", &csv)
        }
        ExportFormat::Json => {
            let json = export::to_json(rows)?;
            save_text(&file_name, "application/json", &json)
        }
        ExportFormat::Xlsx => Err(Error::Export(
            "XLSX export is only available in the CLI".into(),
        )),
    }
}
