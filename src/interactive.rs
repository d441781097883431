//! 対話式ラベル割り当て
//!
//! Walks the five label keys of one page and asks for a box number each.

use dialoguer::Input;

use score_scan_common::label_panel::{self, LabelChange, LabelRow};
use score_scan_common::session::AnnotationModel;
use score_scan_common::BoxStore;

use crate::annotate::{self, PageSession};
use crate::client::Backend;
use crate::error::{Result, ScoreScanError};

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAction {
    /// 変更なし
    Keep,
    /// 割り当て/解除
    Change(LabelChange),
    /// 不正な入力
    Invalid,
    /// 終了
    Quit,
}

/// Interprets one answer: Enter keeps, `-` clears, `q` quits, a box number assigns.
pub fn parse_action(store: &BoxStore, row: &LabelRow, input: &str) -> LabelAction {
    match input.trim() {
        "" => LabelAction::Keep,
        "q" | "Q" => LabelAction::Quit,
        "-" => label_panel::parse_selection(store, row.key, "")
            .map(LabelAction::Change)
            .unwrap_or(LabelAction::Invalid),
        value => label_panel::parse_selection(store, row.key, value)
            .map(LabelAction::Change)
            .unwrap_or(LabelAction::Invalid),
    }
}

fn current_text(row: &LabelRow) -> String {
    row.options
        .iter()
        .find(|o| o.value == row.value)
        .map(|o| format!("{} = {}", o.value, o.text))
        .unwrap_or_else(|| "未設定".to_string())
}

fn prompt(row: &LabelRow) -> Result<String> {
    Input::new()
        .with_prompt(format!(
            "{} [{}] (番号 / -:解除 / Enter:変更なし / q:終了)",
            row.key,
            current_text(row)
        ))
        .allow_empty(true)
        .interact_text()
        .map_err(|e| ScoreScanError::CliExecution(e.to_string()))
}

/// 対話式でラベルを割り当て
pub async fn run_interactive_labels(backend: &dyn Backend, page: &mut PageSession) -> Result<usize> {
    if page.session.store().is_empty() {
        println!("✓ ボックスがありません");
        return Ok(0);
    }

    for line in annotate::describe_boxes(page) {
        println!("{line}");
    }
    println!("---");

    let mut changes = 0;
    let rows = label_panel::rows(page.session.store());
    for row in rows {
        let action = loop {
            let input = prompt(&row)?;
            match parse_action(page.session.store(), &row, &input) {
                LabelAction::Invalid => println!("  → 無効な番号です"),
                action => break action,
            }
        };

        let saved = match action {
            LabelAction::Keep | LabelAction::Invalid => continue,
            LabelAction::Quit => {
                println!("終了します...");
                break;
            }
            LabelAction::Change(LabelChange::Assign(key, index)) => {
                println!("  → {} = {}", key, index);
                annotate::assign_label(backend, page, key, index).await?
            }
            LabelAction::Change(LabelChange::Clear(key)) => {
                println!("  → {} 解除", key);
                annotate::clear_label(backend, page, key).await?
            }
        };
        changes += 1;
        if !saved {
            println!("  ⚠ 保存に失敗しました");
        }
    }

    Ok(changes)
}
