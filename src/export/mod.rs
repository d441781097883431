use score_scan_common::export::{self as table_export, ExportFormat, Table, TableRow};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScoreScanError};

/// ディレクトリ指定なら `<title>.<ext>`、ファイル指定ならそのまま
pub fn output_path_for_format(output: &Path, title: &str, format: ExportFormat) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, format.extension()))
    } else {
        output.to_path_buf()
    }
}

/// Default output name, e.g. `stimmen_42_20241019`.
pub fn default_title(prefix: &str, task_id: &str) -> String {
    format!("{}_{}_{}", prefix, task_id, chrono::Local::now().format("%Y%m%d"))
}

/// 表をファイルへ出力
pub fn export_rows<R: TableRow + Serialize>(
    rows: &[R],
    format: ExportFormat,
    output: &Path,
    title: &str,
    sheet_name: &str,
) -> Result<PathBuf> {
    let output_path = output_path_for_format(output, title, format);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match format {
        ExportFormat::Csv => {
            println!("- CSVを生成中...");
            let table = Table::from_rows(sheet_name, rows);
            std::fs::write(&output_path, table_export::to_csv(&table))?;
        }
        ExportFormat::Xlsx => {
            println!("- Excelを生成中...");
            let table = Table::from_rows(sheet_name, rows);
            let buffer = table_export::excel_core::generate_excel_buffer(&table)
                .map_err(ScoreScanError::Export)?;
            std::fs::write(&output_path, buffer)?;
        }
        ExportFormat::Json => {
            println!("- JSONを生成中...");
            let json = table_export::to_json(rows)?;
            std::fs::write(&output_path, json)?;
        }
    }

    println!("✔ 出力: {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_scan_common::VoiceRow;
    use tempfile::tempdir;

    fn rows() -> Vec<VoiceRow> {
        vec![VoiceRow { page: 1, num_pages: Some(2), title_found: true, voice: "Flöte".into() }]
    }

    #[test]
    fn test_output_path_for_directory() {
        let dir = tempdir().unwrap();
        let path = output_path_for_format(dir.path(), "stimmen", ExportFormat::Csv);
        assert_eq!(path, dir.path().join("stimmen.csv"));
    }

    #[test]
    fn test_output_path_for_file() {
        let path = output_path_for_format(Path::new("out/liste.xlsx"), "stimmen", ExportFormat::Xlsx);
        assert_eq!(path, PathBuf::from("out/liste.xlsx"));
    }

    #[test]
    fn test_default_title() {
        let title = default_title("stimmen", "42");
        assert!(title.starts_with("stimmen_42_"));
        assert_eq!(title.len(), "stimmen_42_".len() + 8);
    }

    #[test]
    fn test_export_each_format() {
        let dir = tempdir().unwrap();
        for format in [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Json] {
            let path = export_rows(&rows(), format, dir.path(), "stimmen", "Stimmen").unwrap();
            assert!(path.exists());
        }
        let csv = std::fs::read_to_string(dir.path().join("stimmen.csv")).unwrap();
        assert!(csv.contains("\"Flöte\""));
        let xlsx = std::fs::read(dir.path().join("stimmen.xlsx")).unwrap();
        assert!(xlsx.starts_with(b"PK"));
    }
}
