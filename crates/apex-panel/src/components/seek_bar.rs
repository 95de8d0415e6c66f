//! SeekBar component: progress bar with click and drag seeking.
//!
//! Pressing on the bar emits `SeekStart`, dragging emits `SeekDrag` until the
//! button is released. The knob shows while hovering or dragging.

use ratatui::crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{layout::Rect, Frame};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    widgets::progress_bar,
};

pub struct SeekBar {
    hover: bool,
}

impl SeekBar {
    pub fn new() -> Self {
        Self { hover: false }
    }

    /// The bar leaves a one-cell margin on each side.
    fn bar_rect(area: Rect) -> Rect {
        Rect {
            x: area.x + 1,
            y: area.y,
            width: area.width.saturating_sub(2),
            height: area.height.min(1),
        }
    }
}

impl Component for SeekBar {
    fn id(&self) -> ComponentId {
        ComponentId::SeekBar
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let bar = Self::bar_rect(area);
        let hit = progress_bar::fraction_at(bar, event.column, event.row);
        let mut actions = Vec::new();

        let hover = hit.is_some();
        if hover != self.hover {
            self.hover = hover;
            actions.push(Action::Render);
        }

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let (Some(f), true) = (hit, state.media_loaded()) {
                    actions.push(Action::SeekStart(f));
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if state.dragging => {
                actions.push(Action::SeekDrag(progress_bar::drag_fraction(
                    bar,
                    event.column,
                )));
            }
            MouseEventKind::Up(MouseButton::Left) if state.dragging => {
                actions.push(Action::SeekEnd);
            }
            _ => {}
        }
        actions
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let handle = state.media_loaded() && (self.hover || state.dragging);
        progress_bar::draw(frame, Self::bar_rect(area), state.progress(), handle);
    }
}
