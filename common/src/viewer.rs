//! ビューアー操作レイヤー
//!
//! Drag, resize, selection and the box context menu, on top of the
//! coordinate transform and an [`AnnotationModel`]. Pointer positions are in
//! screen pixels relative to the page image; the model only ever sees native
//! rectangles, committed once per gesture on release.

use crate::api::SaveBoxesRequest;
use crate::geometry::{Rect, Scale, Size};
use crate::navigation::ViewerState;
use crate::session::{AnnotationModel, EditOutcome};
use crate::types::{BoxPatch, LabelKey};

/// Delay before an outside pointer-down closes the context menu, so clicks
/// inside the menu register first.
pub const MENU_CLOSE_DELAY_MS: u32 = 50;

/// Pointer travel (screen px) below which a press/release counts as a click.
pub const CLICK_SLOP: f64 = 3.0;

/// Smallest box edge on screen while resizing.
pub const MIN_BOX_SIZE: f64 = 4.0;

/// Border colour of unlabelled boxes.
pub const DEFAULT_BOX_COLOR: &str = "#4b5563";

/// One of the eight resize grips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    fn moves_left(&self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::Left | ResizeHandle::BottomLeft)
    }

    fn moves_right(&self) -> bool {
        matches!(self, ResizeHandle::TopRight | ResizeHandle::Right | ResizeHandle::BottomRight)
    }

    fn moves_top(&self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::Top | ResizeHandle::TopRight)
    }

    fn moves_bottom(&self) -> bool {
        matches!(self, ResizeHandle::BottomLeft | ResizeHandle::Bottom | ResizeHandle::BottomRight)
    }

    /// `origin` resized by a pointer delta, opposite edges fixed.
    pub fn resize(&self, origin: Rect, dx: f64, dy: f64) -> Rect {
        let mut left = origin.x;
        let mut top = origin.y;
        let mut right = origin.right();
        let mut bottom = origin.bottom();
        if self.moves_left() {
            left = (left + dx).min(right - MIN_BOX_SIZE);
        }
        if self.moves_right() {
            right = (right + dx).max(left + MIN_BOX_SIZE);
        }
        if self.moves_top() {
            top = (top + dy).min(bottom - MIN_BOX_SIZE);
        }
        if self.moves_bottom() {
            bottom = (bottom + dy).max(top + MIN_BOX_SIZE);
        }
        Rect::new(left, top, right - left, bottom - top)
    }

    /// CSS cursor for the grip.
    pub fn cursor(&self) -> &'static str {
        match self {
            ResizeHandle::TopLeft | ResizeHandle::BottomRight => "nwse-resize",
            ResizeHandle::TopRight | ResizeHandle::BottomLeft => "nesw-resize",
            ResizeHandle::Top | ResizeHandle::Bottom => "ns-resize",
            ResizeHandle::Left | ResizeHandle::Right => "ew-resize",
        }
    }

    /// Grip position as fractions of the box size.
    pub fn anchor(&self) -> (f64, f64) {
        match self {
            ResizeHandle::TopLeft => (0.0, 0.0),
            ResizeHandle::Top => (0.5, 0.0),
            ResizeHandle::TopRight => (1.0, 0.0),
            ResizeHandle::Right => (1.0, 0.5),
            ResizeHandle::BottomRight => (1.0, 1.0),
            ResizeHandle::Bottom => (0.5, 1.0),
            ResizeHandle::BottomLeft => (0.0, 1.0),
            ResizeHandle::Left => (0.0, 0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    Drag,
    Resize(ResizeHandle),
}

/// A pointer gesture in progress on one box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub index: usize,
    pub kind: GestureKind,
    start: (f64, f64),
    origin: Rect,
    current: Rect,
    moved: bool,
}

impl Gesture {
    pub fn current(&self) -> Rect {
        self.current
    }
}

/// `Idle → Dragging → Idle`, `Idle → Resizing → Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Active(Gesture),
}

/// What a pointer release amounts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// No gesture was active.
    None,
    /// Pressed and released without moving.
    Click(usize),
    /// Native rectangle to commit.
    Commit { index: usize, native: Rect },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Starts a gesture on the box currently drawn at `screen`.
    pub fn begin(&mut self, index: usize, kind: GestureKind, pointer: (f64, f64), screen: Rect) {
        *self = Interaction::Active(Gesture {
            index,
            kind,
            start: pointer,
            origin: screen,
            current: screen,
            moved: false,
        });
    }

    /// Updates the live screen rectangle. `bounds` is the rendered page size;
    /// boxes cannot leave the page.
    pub fn update(&mut self, pointer: (f64, f64), bounds: Size) -> Option<(usize, Rect)> {
        let Interaction::Active(gesture) = self else {
            return None;
        };
        let dx = pointer.0 - gesture.start.0;
        let dy = pointer.1 - gesture.start.1;
        if dx.abs() > CLICK_SLOP || dy.abs() > CLICK_SLOP {
            gesture.moved = true;
        }
        if !gesture.moved {
            return Some((gesture.index, gesture.current));
        }
        let next = match gesture.kind {
            GestureKind::Drag => gesture.origin.translated(dx, dy),
            GestureKind::Resize(handle) => handle.resize(gesture.origin, dx, dy),
        };
        gesture.current = if bounds.is_known() { next.clamped_within(bounds) } else { next };
        Some((gesture.index, gesture.current))
    }

    /// Ends the gesture. A moved box is converted back to native pixels.
    pub fn release(&mut self, scale: Option<Scale>) -> Release {
        let Interaction::Active(gesture) = std::mem::take(self) else {
            return Release::None;
        };
        if !gesture.moved {
            return Release::Click(gesture.index);
        }
        match scale {
            Some(scale) => Release::Commit {
                index: gesture.index,
                native: scale.to_native(gesture.current),
            },
            // image went away mid-gesture
            None => Release::None,
        }
    }

    pub fn cancel(&mut self) {
        *self = Interaction::Idle;
    }

    /// Live rectangle of `index` while it is being dragged or resized.
    pub fn live_rect(&self, index: usize) -> Option<Rect> {
        match self {
            Interaction::Active(g) if g.index == index => Some(g.current),
            _ => None,
        }
    }
}

/// Menu actions on the targeted box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Assign(LabelKey),
    Remove,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextMenu {
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub target: Option<usize>,
}

impl ContextMenu {
    pub fn open(&mut self, x: f64, y: f64, target: usize) {
        *self = ContextMenu { visible: true, x, y, target: Some(target) };
    }

    pub fn close(&mut self) {
        *self = ContextMenu::default();
    }

    /// Closes the menu and hands back the action with its target box.
    pub fn choose(&mut self, action: MenuAction) -> Option<(MenuAction, usize)> {
        let target = self.target;
        self.close();
        target.map(|index| (action, index))
    }
}

/// A box as drawn on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxOverlay {
    pub index: usize,
    pub rect: Rect,
    pub color: &'static str,
    pub label: Option<LabelKey>,
    pub selected: bool,
    pub text: String,
}

/// The annotation viewer: one state owner plus display and gesture state.
#[derive(Debug)]
pub struct Viewer {
    model: Box<dyn AnnotationModel>,
    pub state: ViewerState,
    pub interaction: Interaction,
    pub menu: ContextMenu,
    natural: Size,
}

impl Viewer {
    pub fn new(model: Box<dyn AnnotationModel>) -> Self {
        Self {
            model,
            state: ViewerState::new(),
            interaction: Interaction::Idle,
            menu: ContextMenu::default(),
            natural: Size::default(),
        }
    }

    pub fn model(&self) -> &dyn AnnotationModel {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn AnnotationModel {
        self.model.as_mut()
    }

    /// True while the model belongs to `task_id`.
    pub fn shows_task(&self, task_id: &str) -> bool {
        self.model.task_id() == Some(task_id)
    }

    pub fn load_pages(&mut self, pages: Vec<String>) {
        let before = self.state.pages.clone();
        self.state.load_pages(pages);
        if self.state.pages != before {
            self.natural = Size::default();
            self.interaction.cancel();
            self.menu.close();
            self.model.set_page(self.state.current_page());
        }
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page()
    }

    /// Clamped page change. Returns true if the page changed.
    pub fn go_to(&mut self, page: usize) -> bool {
        let changed = self.state.go_to(page);
        if changed {
            self.natural = Size::default();
            self.interaction.cancel();
            self.menu.close();
            self.model.set_page(self.state.current_page());
        }
        changed
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to(self.current_page() + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.current_page().checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    /// Image `onload`: remember the natural size and auto-fit the zoom.
    pub fn image_loaded(&mut self, natural: Size, container_width: f64) {
        self.natural = natural;
        self.state.zoom.fit_on_load(container_width, natural.width);
    }

    pub fn natural_size(&self) -> Size {
        self.natural
    }

    /// Rendered page size, unknown until the image has loaded.
    pub fn rendered_size(&self) -> Size {
        self.natural.scaled(self.state.zoom.factor())
    }

    pub fn scale(&self) -> Option<Scale> {
        Scale::from_sizes(self.rendered_size(), self.natural)
    }

    /// Everything to draw over the page image. Empty while the natural image
    /// size is unknown.
    pub fn overlays(&self) -> Vec<BoxOverlay> {
        let Some(scale) = self.scale() else {
            return Vec::new();
        };
        let store = self.model.store();
        store
            .boxes()
            .iter()
            .enumerate()
            .map(|(index, b)| {
                let label = store.label_for(index);
                BoxOverlay {
                    index,
                    rect: self
                        .interaction
                        .live_rect(index)
                        .unwrap_or_else(|| scale.to_screen(b.rect())),
                    color: label.map(|l| l.color()).unwrap_or(DEFAULT_BOX_COLOR),
                    label,
                    selected: self.state.is_selected(index),
                    text: b.text.clone(),
                }
            })
            .collect()
    }

    pub fn pointer_down(&mut self, index: usize, kind: GestureKind, pointer: (f64, f64)) {
        let Some(scale) = self.scale() else {
            return;
        };
        let Some(b) = self.model.store().get(index) else {
            return;
        };
        self.interaction.begin(index, kind, pointer, scale.to_screen(b.rect()));
    }

    pub fn pointer_move(&mut self, pointer: (f64, f64)) -> Option<(usize, Rect)> {
        let bounds = self.rendered_size();
        self.interaction.update(pointer, bounds)
    }

    /// Pointer release: a click toggles the selection, a finished gesture is
    /// committed to the model.
    pub fn pointer_up(&mut self) -> EditOutcome {
        match self.interaction.release(self.scale()) {
            Release::None => EditOutcome::default(),
            Release::Click(index) => {
                self.state.toggle_selection(index);
                EditOutcome::default()
            }
            Release::Commit { index, native } => {
                let patch = match self.model.store().get(index) {
                    Some(b) if (b.width - native.width).abs() < f64::EPSILON
                        && (b.height - native.height).abs() < f64::EPSILON =>
                    {
                        BoxPatch::position(native.x, native.y)
                    }
                    _ => BoxPatch::rect(native),
                };
                self.model.update_box(index, patch)
            }
        }
    }

    pub fn open_menu(&mut self, x: f64, y: f64, index: usize) {
        self.menu.open(x, y, index);
    }

    /// Runs a context menu action; the menu is closed either way.
    pub fn choose(&mut self, action: MenuAction) -> Option<SaveBoxesRequest> {
        let (action, index) = self.menu.choose(action)?;
        match action {
            MenuAction::Assign(key) => self.model.assign_label(key, index),
            MenuAction::Remove => {
                let saved = self.model.remove_box(index);
                self.state.selected_box = match self.state.selected_box {
                    Some(s) if s == index => None,
                    Some(s) if s > index => Some(s - 1),
                    other => other,
                };
                saved
            }
        }
    }

    /// Label text by key, as used for voice detection and export metadata.
    pub fn label_texts(&self) -> std::collections::BTreeMap<LabelKey, String> {
        self.model.store().label_texts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{OcrLoad, OcrResponse};
    use crate::session::{DocumentSession, InternalModel};
    use crate::types::OcrBox;

    fn viewer_with(model: Box<dyn AnnotationModel>) -> Viewer {
        let mut viewer = Viewer::new(model);
        viewer.load_pages(vec!["/static/t1/pages/t1_page_00001.png".into()]);
        let response = OcrResponse {
            boxes: vec![
                OcrBox::new(100.0, 100.0, 200.0, 50.0, "Marsch"),
                OcrBox::new(100.0, 300.0, 200.0, 50.0, "Trompete"),
            ],
            ..Default::default()
        };
        viewer.model_mut().apply_load(0, OcrLoad::Loaded(response));
        viewer
    }

    #[test]
    fn test_late_pages_for_previous_task_are_ignored() {
        let mut first = InternalModel::new();
        first.set_task(Some("A".into()));
        let mut viewer = Viewer::new(Box::new(first));
        assert!(viewer.shows_task("A"));

        // 文書Bに切り替えた後にAのページ一覧が届く
        let mut second = InternalModel::new();
        second.set_task(Some("B".into()));
        viewer = Viewer::new(Box::new(second));
        let late = vec!["/static/A/pages/A_page_00001.png".to_string()];
        if viewer.shows_task("A") {
            viewer.load_pages(late);
        }
        assert!(viewer.state.pages.is_empty());
        assert!(viewer.shows_task("B"));
        assert!(!Viewer::new(Box::new(InternalModel::new())).shows_task("B"));
    }

    #[test]
    fn test_no_overlays_before_image_load() {
        let viewer = viewer_with(Box::new(InternalModel::new()));
        assert!(viewer.overlays().is_empty());
    }

    #[test]
    fn test_overlays_scaled_by_zoom() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1000.0);
        assert!((viewer.state.zoom.factor() - 0.8).abs() < 1e-12);
        let overlays = viewer.overlays();
        assert_eq!(overlays.len(), 2);
        assert!(overlays[0].rect.approx_eq(&Rect::new(80.0, 80.0, 160.0, 40.0), 1e-9));
        assert_eq!(overlays[0].color, DEFAULT_BOX_COLOR);
    }

    #[test]
    fn test_drag_commits_native_position_once() {
        let mut viewer = viewer_with(Box::new(DocumentSession::new("t1")));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        assert_eq!(viewer.state.zoom.factor(), 1.0);
        viewer.state.zoom.set_manual(2.0);

        viewer.pointer_down(0, GestureKind::Drag, (250.0, 250.0));
        viewer.pointer_move((260.0, 270.0));
        viewer.pointer_move((270.0, 290.0));
        assert_eq!(viewer.model().store().get(0).unwrap().x, 100.0);

        let outcome = viewer.pointer_up();
        let moved = viewer.model().store().get(0).unwrap();
        assert!((moved.x - 110.0).abs() < 1e-9);
        assert!((moved.y - 120.0).abs() < 1e-9);
        assert_eq!(moved.width, 200.0);
        assert!(outcome.save.is_some());
        assert!(outcome.reocr.is_some());
        assert!(viewer.interaction.is_idle());
        assert_eq!(viewer.pointer_up(), EditOutcome::default());
    }

    #[test]
    fn test_resize_from_top_left_keeps_opposite_corner() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        viewer.pointer_down(1, GestureKind::Resize(ResizeHandle::TopLeft), (100.0, 300.0));
        viewer.pointer_move((80.0, 290.0));
        viewer.pointer_up();
        let b = viewer.model().store().get(1).unwrap();
        assert!(b.rect().approx_eq(&Rect::new(80.0, 290.0, 220.0, 60.0), 1e-9));
    }

    #[test]
    fn test_click_toggles_selection() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        viewer.pointer_down(1, GestureKind::Drag, (150.0, 320.0));
        viewer.pointer_move((151.0, 321.0));
        viewer.pointer_up();
        assert_eq!(viewer.state.selected_box, Some(1));
        assert_eq!(viewer.model().store().get(1).unwrap().x, 100.0);

        viewer.pointer_down(1, GestureKind::Drag, (150.0, 320.0));
        viewer.pointer_up();
        assert_eq!(viewer.state.selected_box, None);
    }

    #[test]
    fn test_drag_clamped_to_page() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        viewer.pointer_down(0, GestureKind::Drag, (150.0, 120.0));
        viewer.pointer_move((-500.0, -500.0));
        viewer.pointer_up();
        let b = viewer.model().store().get(0).unwrap();
        assert_eq!((b.x, b.y), (0.0, 0.0));
    }

    #[test]
    fn test_menu_actions_close_menu() {
        let mut viewer = viewer_with(Box::new(DocumentSession::new("t1")));
        viewer.open_menu(40.0, 50.0, 1);
        let saved = viewer.choose(MenuAction::Assign(LabelKey::Voice)).unwrap();
        assert_eq!(saved.labels.get("Stimme"), Some(&1));
        assert!(!viewer.menu.visible);

        assert_eq!(viewer.choose(MenuAction::Remove), None);

        viewer.open_menu(40.0, 50.0, 0);
        let saved = viewer.choose(MenuAction::Remove).unwrap();
        assert_eq!(saved.labels.get("Stimme"), Some(&0));
        assert!(!viewer.menu.visible);
        assert_eq!(viewer.menu.target, None);
    }

    #[test]
    fn test_label_colours_overlay() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        viewer.model_mut().assign_label(LabelKey::Title, 0);
        let overlays = viewer.overlays();
        assert_eq!(overlays[0].color, LabelKey::Title.color());
        assert_eq!(overlays[0].label, Some(LabelKey::Title));
    }

    #[test]
    fn test_resize_never_inverts() {
        let origin = Rect::new(10.0, 10.0, 20.0, 20.0);
        for handle in ResizeHandle::ALL {
            let r = handle.resize(origin, 500.0, 500.0);
            assert!(r.width >= MIN_BOX_SIZE && r.height >= MIN_BOX_SIZE, "{handle:?}");
            let r = handle.resize(origin, -500.0, -500.0);
            assert!(r.width >= MIN_BOX_SIZE && r.height >= MIN_BOX_SIZE, "{handle:?}");
        }
    }

    #[test]
    fn test_page_change_resets_natural_size() {
        let mut viewer = viewer_with(Box::new(InternalModel::new()));
        viewer.load_pages(vec!["a.png".into(), "b.png".into()]);
        viewer.image_loaded(Size::new(1000.0, 1400.0), 1250.0);
        assert!(viewer.next_page());
        assert!(viewer.scale().is_none());
        assert_eq!(viewer.model().page(), 1);
        assert!(!viewer.next_page());
        assert!(viewer.prev_page());
    }
}
