//! Excel生成（共通ライブラリ）
//!
//! One worksheet with a bold header row and auto-sized columns.

use rust_xlsxwriter::*;

use super::Table;

/// 列幅の上限（文字数）
const MAX_COL_WIDTH: usize = 60;

/// Excelをバッファに生成
pub fn generate_excel_buffer(table: &Table) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x333333))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xCCCCCC));

    let cell_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let worksheet = workbook.add_worksheet();
    let name = if table.sheet_name.is_empty() { "Export" } else { &table.sheet_name };
    worksheet
        .set_name(name)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string_with_format(row_idx as u32 + 1, col as u16, value, &cell_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }
    }

    // 列幅：ヘッダーと値の最長文字数
    for (col, header) in table.headers.iter().enumerate() {
        let longest = table
            .rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(8)
            .min(MAX_COL_WIDTH);
        worksheet
            .set_column_width(col as u16, longest as f64 + 2.0)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("固定枠設定エラー: {}", e))?;

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_excel_buffer_is_zip() {
        let table = Table {
            sheet_name: "Stimmen".into(),
            headers: vec!["Seite".into(), "Stimme".into()],
            rows: vec![vec!["1".into(), "Tenorhorn".into()]],
        };
        let buffer = generate_excel_buffer(&table).expect("Excel生成失敗");
        assert!(buffer.starts_with(b"PK"));
    }
}
