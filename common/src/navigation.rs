//! ページ送りとズーム
//!
//! Page index and zoom are independent of the box state.

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 3.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Share of the container width an auto-fitted page occupies.
pub const FIT_RATIO: f64 = 0.8;

pub fn clamp_zoom(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_ZOOM;
    }
    value.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Current page within a page list; always inside `[0, count - 1]`, or 0 when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageNavigator {
    current: usize,
    count: usize,
}

impl PageNavigator {
    pub fn new(count: usize) -> Self {
        Self { current: 0, count }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Page list changed in length but is the same document: clamp.
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
        self.current = self.clamp(self.current);
    }

    /// A different document was loaded.
    pub fn reset(&mut self, count: usize) {
        self.count = count;
        self.current = 0;
    }

    fn clamp(&self, page: usize) -> usize {
        if self.count == 0 {
            0
        } else {
            page.min(self.count - 1)
        }
    }

    /// Jumps to `page`, clamped. Returns true if the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        let target = self.clamp(page);
        let changed = target != self.current;
        self.current = target;
        changed
    }

    pub fn has_prev(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.count > 0 && self.current < self.count - 1
    }

    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Parses a 1-based page number typed by the user. Out-of-range numbers
    /// are clamped; unparsable text keeps the current page.
    pub fn parse_input(&self, input: &str) -> usize {
        if self.count == 0 {
            return 0;
        }
        match input.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => {
                let one_based = n.trunc().clamp(1.0, self.count as f64) as usize;
                one_based - 1
            }
            _ => self.current,
        }
    }

    /// Text shown in the page number input.
    pub fn input_text(&self) -> String {
        if self.count == 0 {
            String::new()
        } else {
            (self.current + 1).to_string()
        }
    }
}

/// Zoom factor with the "user zoomed manually" latch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    factor: f64,
    user_zoomed: bool,
    /// Bumped whenever the page image must be reloaded.
    reload_key: u32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: DEFAULT_ZOOM,
            user_zoomed: false,
            reload_key: 0,
        }
    }
}

impl Zoom {
    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn user_zoomed(&self) -> bool {
        self.user_zoomed
    }

    pub fn reload_key(&self) -> u32 {
        self.reload_key
    }

    pub fn percent(&self) -> u32 {
        (self.factor * 100.0).round() as u32
    }

    /// Slider interaction; sticks until [`Zoom::reset`].
    pub fn set_manual(&mut self, value: f64) {
        self.factor = clamp_zoom(value);
        self.user_zoomed = true;
    }

    /// Called once per image load. Returns true if the zoom was fitted.
    pub fn fit_on_load(&mut self, container_width: f64, natural_width: f64) -> bool {
        if self.user_zoomed || natural_width <= 0.0 || container_width <= 0.0 {
            return false;
        }
        self.factor = clamp_zoom(container_width * FIT_RATIO / natural_width);
        true
    }

    /// Back to automatic fit on the next load.
    pub fn reset(&mut self) {
        self.factor = DEFAULT_ZOOM;
        self.user_zoomed = false;
        self.bump_reload();
    }

    pub fn bump_reload(&mut self) {
        self.reload_key = self.reload_key.wrapping_add(1);
    }
}

/// Per-viewer display state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    pub pages: Vec<String>,
    pub nav: PageNavigator,
    pub zoom: Zoom,
    pub selected_box: Option<usize>,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a page list. A list that differs from the current one is a
    /// new document: back to page 0, selection dropped.
    pub fn load_pages(&mut self, pages: Vec<String>) {
        if pages == self.pages {
            return;
        }
        self.nav.reset(pages.len());
        self.pages = pages;
        self.selected_box = None;
    }

    pub fn current_page(&self) -> usize {
        self.nav.current()
    }

    pub fn current_page_url(&self) -> Option<&str> {
        self.pages.get(self.nav.current()).map(String::as_str)
    }

    pub fn go_to(&mut self, page: usize) -> bool {
        let changed = self.nav.go_to(page);
        if changed {
            self.selected_box = None;
        }
        changed
    }

    /// Click on a box: select it, or deselect if it was already selected.
    pub fn toggle_selection(&mut self, index: usize) {
        self.selected_box = match self.selected_box {
            Some(current) if current == index => None,
            _ => Some(index),
        };
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected_box == Some(index)
    }
}
