use clap::{Parser, Subcommand};
use score_scan_common::export::ExportFormat;
use score_scan_common::LabelKey;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scorescan")]
#[command(about = "楽譜PDFのOCR注釈・パート分割クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// サーバーURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// PDFをアップロードして処理完了まで待機
    Upload {
        /// PDFファイルまたはフォルダ
        #[arg(required = true)]
        path: PathBuf,

        /// 完了を待たずに終了
        #[arg(long)]
        no_wait: bool,
    },

    /// タスク一覧を表示
    Tasks {
        /// 定期的に更新し、完了したタスクを通知
        #[arg(short, long)]
        watch: bool,

        /// 一覧をファイルに出力 (csv/xlsx/json)
        #[arg(short, long)]
        export: Option<ExportFormat>,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// タスクの状態を表示
    Status {
        /// タスクID
        task_id: String,
    },

    /// タスクのページ画像URLを表示
    Pages {
        /// タスクID
        task_id: String,
    },

    /// OCR結果を表示（--triggerでOCRを実行）
    Ocr {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// OCRを実行して保存
        #[arg(long)]
        trigger: bool,
    },

    /// ラベルを割り当て/解除
    Label {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// ラベル (title/composer/arranger/voice/genre)
        key: Option<LabelKey>,

        /// ボックス番号（0始まり）
        index: Option<usize>,

        /// 指定ラベルを解除
        #[arg(long, conflicts_with = "index")]
        clear: bool,

        /// 対話式で割り当て
        #[arg(short, long, conflicts_with_all = ["key", "index", "clear"])]
        interactive: bool,
    },

    /// ボックスの位置・サイズを変更（テキストは再認識）
    EditBox {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// ボックス番号（0始まり）
        index: usize,

        #[arg(long)]
        x: Option<f64>,

        #[arg(long)]
        y: Option<f64>,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// ボックスを削除
    RemoveBox {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// ボックス番号（0始まり）
        index: usize,
    },

    /// ページの傾きを補正
    Deskew {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// 微調整角度（-10〜10度）
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        angle: f64,

        /// 右に90度回転（回数）
        #[arg(long, action = clap::ArgAction::Count)]
        right: u8,

        /// 左に90度回転（回数）
        #[arg(long, action = clap::ArgAction::Count)]
        left: u8,
    },

    /// 声部（パート）を検出
    Voices {
        /// タスクID
        task_id: String,

        /// Titel/Stimmeラベルのあるページ（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// 検出結果をファイルに出力 (csv/xlsx/json)
        #[arg(short, long)]
        export: Option<ExportFormat>,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 声部ごとにPDFを分割
    Split {
        /// タスクID
        task_id: String,

        /// Titel/Stimmeラベルのあるページ（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// ZIPでダウンロード
        #[arg(long, conflicts_with = "voice")]
        zip: bool,

        /// 1つの声部だけ分割（検出結果の番号、0始まり）
        #[arg(long)]
        voice: Option<usize>,

        /// ダウンロード先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// ボックスを描画したページ画像を出力
    Preview {
        /// タスクID
        task_id: String,

        /// ページ番号（1始まり）
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// 倍率 (0.2〜3.0)。省略時は幅に合わせる
        #[arg(short, long)]
        zoom: Option<f64>,

        /// 表示幅（倍率省略時の基準）
        #[arg(long, default_value = "1200")]
        width: f64,

        /// 選択表示するボックス番号
        #[arg(long)]
        select: Option<usize>,

        /// 出力PNG
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// トークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// サーバーURLを設定
        #[arg(long)]
        set_server: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_assign() {
        let cli = Cli::parse_from(["scorescan", "label", "42", "--page", "2", "stimme", "3"]);
        match cli.command {
            Commands::Label { task_id, page, key, index, clear, interactive } => {
                assert_eq!(task_id, "42");
                assert_eq!(page, 2);
                assert_eq!(key, Some(LabelKey::Voice));
                assert_eq!(index, Some(3));
                assert!(!clear);
                assert!(!interactive);
            }
            _ => panic!("expected label"),
        }
    }

    #[test]
    fn test_parse_deskew_negative_angle() {
        let cli = Cli::parse_from(["scorescan", "deskew", "42", "--angle", "-2.5", "--right", "--right"]);
        match cli.command {
            Commands::Deskew { angle, right, left, .. } => {
                assert_eq!(angle, -2.5);
                assert_eq!(right, 2);
                assert_eq!(left, 0);
            }
            _ => panic!("expected deskew"),
        }
    }

    #[test]
    fn test_parse_voices_export() {
        let cli = Cli::parse_from(["scorescan", "-v", "voices", "42", "--export", "xlsx"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Voices { export, .. } => assert_eq!(export, Some(ExportFormat::Xlsx)),
            _ => panic!("expected voices"),
        }
    }

    #[test]
    fn test_split_zip_conflicts_with_voice() {
        let result = Cli::try_parse_from(["scorescan", "split", "42", "--zip", "--voice", "1"]);
        assert!(result.is_err());
    }
}
