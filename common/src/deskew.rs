//! ページ傾き補正
//!
//! Transient rotation dialog. The angle is only previewed via CSS until the
//! user saves; the backend then rotates the stored page image and the
//! viewer reloads it with a fresh cache-busting token.

use lazy_static::lazy_static;
use regex::Regex;

use crate::api::DeskewRequest;
use crate::error::{Error, Result};

/// Range of the fine adjustment slider, in degrees.
pub const FINE_RANGE: f64 = 10.0;
pub const FINE_STEP: f64 = 0.1;
pub const QUICK_STEP: f64 = 90.0;

lazy_static! {
    static ref TASK_ID_IN_URL: Regex =
        Regex::new(r"/static/(.*?)/pages/").expect("static regex");
}

/// Normalizes an angle into `(-180, 180]`.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Task id embedded in a page image URL such as
/// `/static/<task_id>/pages/<task_id>_page_00001.png`.
pub fn task_id_from_page_url(url: &str) -> Option<&str> {
    TASK_ID_IN_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
}

/// Appends `cb=<token>` with `?` or `&` depending on the URL.
pub fn cache_bust(url: &str, token: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}cb={token}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeskewDialog {
    open: bool,
    angle: f64,
    saving: bool,
}

impl DeskewDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn open(&mut self) {
        *self = DeskewDialog { open: true, ..Default::default() };
    }

    pub fn cancel(&mut self) {
        *self = DeskewDialog::default();
    }

    /// Fine slider. The quick buttons may leave the angle outside the slider
    /// range; the slider then snaps it back into `±FINE_RANGE`.
    pub fn set_fine(&mut self, angle: f64) {
        if angle.is_finite() {
            self.angle = angle.clamp(-FINE_RANGE, FINE_RANGE);
        }
    }

    pub fn rotate_left(&mut self) {
        self.angle = normalize_angle(self.angle - QUICK_STEP);
    }

    pub fn rotate_right(&mut self) {
        self.angle = normalize_angle(self.angle + QUICK_STEP);
    }

    /// Visual-only preview while the dialog is open.
    pub fn preview_transform(&self) -> Option<String> {
        self.open.then(|| format!("rotate({}deg)", self.angle))
    }

    /// Builds the save request for the 0-based `page` shown from `page_url`.
    pub fn save_request(&mut self, page_url: &str, page: usize) -> Result<DeskewRequest> {
        let task_id = task_id_from_page_url(page_url).ok_or_else(|| {
            Error::UserInput(format!("no task id in page URL {page_url}"))
        })?;
        self.saving = true;
        Ok(DeskewRequest {
            task_id: task_id.to_string(),
            page: page + 1,
            angle: normalize_angle(self.angle),
        })
    }

    /// Save finished. On success the dialog closes and the angle resets.
    pub fn finish_save(&mut self, ok: bool) {
        if ok {
            *self = DeskewDialog::default();
        } else {
            self.saving = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(270.0), -90.0);
        assert_eq!(normalize_angle(-270.0), 90.0);
        assert_eq!(normalize_angle(720.5), 0.5);
        assert_eq!(normalize_angle(f64::NAN), 0.0);
    }

    #[test]
    fn test_task_id_from_page_url() {
        let url = "http://localhost:8000/static/5f2c-9a/pages/5f2c-9a_page_00003.png";
        assert_eq!(task_id_from_page_url(url), Some("5f2c-9a"));
        assert_eq!(task_id_from_page_url("/uploads/x.png"), None);
    }

    #[test]
    fn test_cache_bust() {
        assert_eq!(cache_bust("/a.png", 3), "/a.png?cb=3");
        assert_eq!(cache_bust("/a.png?t=1", 4), "/a.png?t=1&cb=4");
    }

    #[test]
    fn test_quick_rotation_wraps() {
        let mut dialog = DeskewDialog::default();
        dialog.open();
        dialog.rotate_right();
        dialog.rotate_right();
        assert_eq!(dialog.angle(), 180.0);
        dialog.rotate_right();
        assert_eq!(dialog.angle(), -90.0);
        dialog.rotate_left();
        assert_eq!(dialog.angle(), 180.0);
        dialog.rotate_left();
        assert_eq!(dialog.angle(), 90.0);
    }

    #[test]
    fn test_fine_slider_clamped() {
        let mut dialog = DeskewDialog::default();
        dialog.set_fine(12.0);
        assert_eq!(dialog.angle(), FINE_RANGE);
        dialog.set_fine(-2.5);
        assert_eq!(dialog.angle(), -2.5);
    }

    #[test]
    fn test_preview_only_while_open() {
        let mut dialog = DeskewDialog::default();
        assert_eq!(dialog.preview_transform(), None);
        dialog.open();
        dialog.set_fine(1.5);
        assert_eq!(dialog.preview_transform().as_deref(), Some("rotate(1.5deg)"));
        dialog.cancel();
        assert_eq!(dialog.angle(), 0.0);
    }

    #[test]
    fn test_save_request_uses_one_based_page() {
        let mut dialog = DeskewDialog::default();
        dialog.open();
        dialog.set_fine(-1.2);
        let req = dialog
            .save_request("/static/abc/pages/abc_page_00002.png", 1)
            .unwrap();
        assert_eq!(req.task_id, "abc");
        assert_eq!(req.page, 2);
        assert_eq!(req.angle, -1.2);
        assert!(dialog.is_saving());

        dialog.finish_save(true);
        assert!(!dialog.is_open());
        assert_eq!(dialog.angle(), 0.0);
    }

    #[test]
    fn test_save_request_without_task_id() {
        let mut dialog = DeskewDialog::default();
        dialog.open();
        let err = dialog.save_request("/uploads/page.png", 0).unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
        assert!(!dialog.is_saving());
    }
}
