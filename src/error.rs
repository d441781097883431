use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("トークンが設定されていません。`scorescan config --set-token YOUR_TOKEN` で設定してください")]
    MissingToken,

    #[error(transparent)]
    Common(#[from] score_scan_common::Error),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("PDFが見つかりません: {0}")]
    NoPdfsFound(String),

    #[error("画像処理エラー: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("エクスポートエラー: {0}")]
    Export(String),

    #[error("処理に失敗しました: {0}")]
    TaskFailed(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

impl ScoreScanError {
    /// 404相当か
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScoreScanError::Common(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, ScoreScanError>;
