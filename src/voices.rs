//! 声部検出とPDF分割
//!
//! Voice detection reads the Title and Voice boxes of one page; the split
//! requests carry the metadata of the same page's labels.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use score_scan_common::session::AnnotationModel;
use score_scan_common::voices::{self, ExportMeta, VoiceTable};

use crate::annotate::PageSession;
use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

lazy_static! {
    static ref UNSAFE_FILE_CHARS: Regex = Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("static regex");
}

/// File name safe for the local file system.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(name.trim(), "_").to_string();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

/// Detects the voices of the whole document from the labels on `page`.
pub async fn detect(backend: &dyn Backend, page: &PageSession) -> Result<VoiceTable> {
    let request = voices::detect_request(page.session.store())?;
    let response = backend.detect_voices(&request).await?;
    tracing::info!(voices = response.voices.len(), "voices detected");
    Ok(VoiceTable::new(response.voices))
}

/// Result of a split export.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutput {
    /// PDFs written by the backend, with their download URLs.
    Files { export_dir: Option<String>, urls: Vec<String> },
    /// ZIP archive saved locally.
    Zip(PathBuf),
}

/// Splits every voice, or a single one, into PDFs on the server.
pub async fn split(
    backend: &dyn Backend,
    page: &PageSession,
    table: &VoiceTable,
    voice: Option<usize>,
) -> Result<SplitOutput> {
    let meta = ExportMeta::from_store(page.session.store());
    let request = match voice {
        Some(index) => table.split_one(index, &meta)?,
        None => table.split_all(&meta)?,
    };
    let response = backend.split(&request).await?;
    if !response.is_success() {
        return Err(ScoreScanError::Export(format!("PDF分割に失敗しました: {}", response.status)));
    }
    let urls = response
        .pdf_files
        .iter()
        .map(|f| voices::voice_pdf_url(backend.server_url(), f))
        .collect();
    Ok(SplitOutput::Files { export_dir: response.export_dir, urls })
}

/// Splits every voice and downloads the ZIP into `output_dir`.
pub async fn split_zip(
    backend: &dyn Backend,
    page: &PageSession,
    table: &VoiceTable,
    output_dir: &Path,
) -> Result<SplitOutput> {
    let meta = ExportMeta::from_store(page.session.store());
    let request = table.split_all(&meta)?;
    let response = backend.split_zip(&request).await?;
    let zip_url = response
        .zip_url
        .ok_or_else(|| ScoreScanError::Export("zip_url がレスポンスにありません".to_string()))?;
    let url = voices::zip_download_url(backend.server_url(), &zip_url);
    let bytes = backend.download(&url).await?;

    let title = if meta.title.trim().is_empty() { "voices" } else { meta.title.as_str() };
    let path = output_dir.join(format!("{}.zip", sanitize_file_name(title)));
    std::fs::create_dir_all(output_dir)?;
    std::fs::write(&path, bytes)?;
    Ok(SplitOutput::Zip(path))
}

/// Downloads split PDFs into `output_dir`. Returns the written paths.
pub async fn download_all(backend: &dyn Backend, urls: &[String], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(urls.len());
    for url in urls {
        let encoded = url.rsplit('/').next().unwrap_or(url);
        let name = urlencoding::decode(encoded)
            .map(|n| n.into_owned())
            .unwrap_or_else(|_| encoded.to_string());
        let bytes = backend.download(url).await?;
        let path = output_dir.join(sanitize_file_name(&name));
        std::fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}
