//! 表データのエクスポート（CLI/WASM共通）
//!
//! Voice tables and task lists as CSV, JSON or (with the `excel` feature)
//! XLSX. CSV follows the spreadsheet-friendly convention used by the web
//! front end: `;` separated, every cell quoted, UTF-8 BOM, CRLF.

#[cfg(feature = "excel")]
pub mod excel_core;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::TaskSummary;
use crate::voices::VoiceRow;

pub const CSV_DELIMITER: char = ';';
const BOM: &str = "\u{feff}";

/// Output format selected on the command line or in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::UserInput(format!(
                "unknown export format: {other}. Use csv, xlsx or json"
            ))),
        }
    }
}

/// Header plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Rows that can be exported as a table.
pub trait TableRow {
    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

fn yes_no(value: bool) -> String {
    let text = if value { "Ja" } else { "Nein" };
    text.to_string()
}

impl TableRow for VoiceRow {
    fn headers() -> Vec<&'static str> {
        vec!["Seite", "Seitenanzahl", "Titel gefunden", "Stimme"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.page.to_string(),
            self.num_pages.map(|n| n.to_string()).unwrap_or_default(),
            yes_no(self.title_found),
            self.voice.clone(),
        ]
    }
}

impl TableRow for TaskSummary {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Dateiname", "Status", "Seiten", "Erstellt am"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.filename.clone(),
            self.status.to_string(),
            self.num_pages.map(|n| n.to_string()).unwrap_or_default(),
            self.created_at.clone().unwrap_or_default(),
        ]
    }
}

impl Table {
    pub fn from_rows<R: TableRow>(sheet_name: &str, rows: &[R]) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            headers: R::headers().into_iter().map(String::from).collect(),
            rows: rows.iter().map(R::cells).collect(),
        }
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// CSV text including the BOM.
pub fn to_csv(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    let join = |cells: &[String]| {
        cells
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(&CSV_DELIMITER.to_string())
    };
    lines.push(join(table.headers.as_slice()));
    for row in &table.rows {
        lines.push(join(row.as_slice()));
    }
    format!("{BOM}{}", lines.join("\r\n"))
}

/// Pretty JSON array of the serializable rows.
pub fn to_json<T: Serialize>(rows: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
