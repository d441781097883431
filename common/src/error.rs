//! エラー型定義

use thiserror::Error;

/// Reasons a voice detection or export request cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title and Voice labels must be assigned first")]
    MissingTitleOrVoice,

    #[error("The box labelled {0} no longer exists")]
    LabelledBoxMissing(&'static str),

    #[error("No voices detected yet")]
    NoVoices,

    #[error("Voice index {0} is out of range")]
    VoiceOutOfRange(usize),
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),
}

impl Error {
    /// 404 is used by the backend as a valid "nothing there yet" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
