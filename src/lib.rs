//! score-scan CLI library
//!
//! コマンド処理の本体。`main.rs` は引数解析と出力のみを担当する。

pub mod annotate;
pub mod cli;
pub mod client;
pub mod config;
pub mod deskew;
pub mod error;
pub mod export;
pub mod interactive;
pub mod preview;
pub mod scanner;
pub mod voices;
pub mod workflow;
