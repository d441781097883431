//! UIコンポーネント

pub mod context_menu;
pub mod deskew_dialog;
pub mod label_panel;
pub mod pdf_viewer;
pub mod sidebar;
pub mod toast;
pub mod upload_area;
pub mod voices_table;
