//! ページ

pub mod document_detail;
pub mod documents;
pub mod not_found;
pub mod placeholder;
pub mod voice_scan;
