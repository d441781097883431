//! Score Scan Common Library
//!
//! CLIとWeb(WASM)で共有される注釈モデルとユーティリティ

pub mod api;
pub mod box_store;
pub mod command;
pub mod deskew;
pub mod error;
pub mod export;
pub mod geometry;
pub mod label_panel;
pub mod navigation;
pub mod poller;
pub mod prefs;
pub mod routes;
pub mod session;
pub mod types;
pub mod viewer;
pub mod voices;

pub use api::{Endpoints, OcrLoad, OcrResponse, SaveBoxesRequest};
pub use box_store::{BoxId, BoxStore};
pub use error::{Error, Result, ValidationError};
pub use geometry::{Rect, Scale, Size};
pub use navigation::{PageNavigator, ViewerState, Zoom};
pub use poller::{PollState, PollStep, TaskListWatcher, TaskPoller};
pub use session::{AnnotationModel, DocumentSession, EditOutcome, InternalModel, LoadOutcome};
pub use types::{AsyncTask, BoxPatch, LabelKey, OcrBox, TaskStatus, TaskSummary};
pub use viewer::{ContextMenu, MenuAction, Viewer};
pub use voices::{ExportMeta, VoiceRow, VoiceTable};
