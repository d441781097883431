//! 座標変換モジュール
//!
//! Native page pixels ↔ rendered (zoomed) screen pixels. Both axes are
//! scaled independently even though the viewer zooms uniformly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Unknown until the image has loaded.
    pub fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    pub fn scaled(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Keeps the rectangle inside `bounds` (origin at 0,0), shrinking it if it is larger.
    pub fn clamped_within(&self, bounds: Size) -> Rect {
        let width = self.width.min(bounds.width).max(0.0);
        let height = self.height.min(bounds.height).max(0.0);
        let x = self.x.clamp(0.0, (bounds.width - width).max(0.0));
        let y = self.y.clamp(0.0, (bounds.height - height).max(0.0));
        Rect::new(x, y, width, height)
    }

    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// Per-axis factor from native to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub fn uniform(factor: f64) -> Self {
        Self { x: factor, y: factor }
    }

    /// `rendered / natural` per axis. `None` while the natural size is unknown,
    /// in which case boxes must not be drawn at all.
    pub fn from_sizes(rendered: Size, natural: Size) -> Option<Scale> {
        if !natural.is_known() || !rendered.is_known() {
            return None;
        }
        Some(Scale {
            x: rendered.width / natural.width,
            y: rendered.height / natural.height,
        })
    }

    pub fn to_screen(&self, native: Rect) -> Rect {
        Rect::new(
            native.x * self.x,
            native.y * self.y,
            native.width * self.x,
            native.height * self.y,
        )
    }

    pub fn to_native(&self, screen: Rect) -> Rect {
        Rect::new(
            screen.x / self.x,
            screen.y / self.y,
            screen.width / self.x,
            screen.height / self.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_from_sizes_per_axis() {
        let scale = Scale::from_sizes(Size::new(500.0, 300.0), Size::new(1000.0, 1000.0)).unwrap();
        assert_eq!(scale.x, 0.5);
        assert_eq!(scale.y, 0.3);
    }

    #[test]
    fn test_unknown_natural_size_gives_no_scale() {
        assert!(Scale::from_sizes(Size::new(500.0, 300.0), Size::new(0.0, 0.0)).is_none());
        assert!(Scale::from_sizes(Size::new(500.0, 300.0), Size::default()).is_none());
    }

    #[test]
    fn test_forward_transform() {
        let scale = Scale::uniform(2.0);
        let screen = scale.to_screen(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(screen, Rect::new(20.0, 40.0, 60.0, 80.0));
    }

    #[test]
    fn test_round_trip_over_zoom_range() {
        let rect = Rect::new(123.4, 56.7, 890.1, 23.45);
        let mut zoom = 0.2;
        while zoom <= 3.0 {
            let scale = Scale::uniform(zoom);
            let back = scale.to_native(scale.to_screen(rect));
            assert!(back.approx_eq(&rect, EPS), "zoom {zoom}: {back:?}");
            zoom += 0.01;
        }
    }

    #[test]
    fn test_round_trip_non_uniform() {
        let natural = Size::new(2480.0, 3508.0);
        let scale = Scale::from_sizes(Size::new(1240.0, 2631.0), natural).unwrap();
        let rect = Rect::new(400.0, 120.0, 800.0, 64.0);
        assert!(scale.to_native(scale.to_screen(rect)).approx_eq(&rect, EPS));
    }

    #[test]
    fn test_clamped_within() {
        let bounds = Size::new(100.0, 50.0);
        let r = Rect::new(90.0, -5.0, 20.0, 10.0).clamped_within(bounds);
        assert_eq!(r, Rect::new(80.0, 0.0, 20.0, 10.0));
        let huge = Rect::new(10.0, 10.0, 500.0, 500.0).clamped_within(bounds);
        assert_eq!(huge, Rect::new(0.0, 0.0, 100.0, 50.0));
    }
}
