//! PlaylistPicker component: popup listing the saved playlist entries.

use std::path::PathBuf;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::header::fit_width,
    components::help_overlay::centered_rect,
    theme::{style_default, style_selected, style_title, C_PANEL_BORDER, C_POPUP_BG},
    widgets::scrollable_list::ScrollableList,
};

const MAX_ROWS: u16 = 12;

pub struct PlaylistPicker {
    pub visible: bool,
    list: ScrollableList<PathBuf>,
    /// Inner list area from the last draw, for mouse hit tests.
    list_area: Rect,
}

impl PlaylistPicker {
    pub fn new() -> Self {
        Self {
            visible: false,
            list: ScrollableList::new(),
            list_area: Rect::default(),
        }
    }

    pub fn show(&mut self, entries: Vec<PathBuf>) {
        self.list.set_items(entries);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    fn pick(&self) -> Vec<Action> {
        match self.list.selected_item() {
            Some(path) => vec![Action::ClosePicker, Action::OpenFile(path.clone())],
            None => vec![Action::ClosePicker],
        }
    }
}

impl Component for PlaylistPicker {
    fn id(&self) -> ComponentId {
        ComponentId::PlaylistPicker
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.visible {
            return vec![];
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => vec![Action::ClosePicker],
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.select_up(1);
                vec![Action::Render]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.select_down(1);
                vec![Action::Render]
            }
            KeyCode::PageUp => {
                self.list.select_up(MAX_ROWS as usize);
                vec![Action::Render]
            }
            KeyCode::PageDown => {
                self.list.select_down(MAX_ROWS as usize);
                vec![Action::Render]
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.list.select_first();
                vec![Action::Render]
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.list.select_last();
                vec![Action::Render]
            }
            KeyCode::Enter => self.pick(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !self.visible {
            return vec![];
        }
        let a = self.list_area;
        let inside = event.column >= a.x
            && event.column < a.x + a.width
            && event.row >= a.y
            && event.row < a.y + a.height;
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => {
                if self.list.handle_click((event.row - a.y) as usize) {
                    self.pick()
                } else {
                    vec![]
                }
            }
            MouseEventKind::ScrollUp => {
                self.list.select_up(1);
                vec![Action::Render]
            }
            MouseEventKind::ScrollDown => {
                self.list.select_down(1);
                vec![Action::Render]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        if !self.visible {
            return;
        }
        let rows = (self.list.len() as u16).clamp(1, MAX_ROWS);
        let popup = centered_rect(70, rows + 2, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PANEL_BORDER))
            .title(Span::styled(
                format!(" playlist ({}) ", self.list.len()),
                style_title(),
            ))
            .style(Style::default().bg(C_POPUP_BG));
        let inner = block.inner(popup);
        self.list_area = inner;

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let width = inner.width as usize;
        let selected = self.list.selected;
        let lines: Vec<Line> = self
            .list
            .visible_items(height)
            .map(|(i, path)| {
                let text = format!(" {}", fit_width(&path.display().to_string(), width.saturating_sub(1)));
                let style = if i == selected {
                    style_selected()
                } else {
                    style_default()
                };
                Line::from(Span::styled(format!("{:<width$}", text), style))
            })
            .collect();

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn entries() -> Vec<PathBuf> {
        vec![PathBuf::from("/music/a.mp3"), PathBuf::from("/music/b.ogg")]
    }

    #[test]
    fn enter_plays_the_selection() {
        let mut picker = PlaylistPicker::new();
        let state = AppState::new(true);
        picker.show(entries());
        picker.handle_key(key(KeyCode::Down), &state);
        assert_eq!(
            picker.handle_key(key(KeyCode::Enter), &state),
            vec![
                Action::ClosePicker,
                Action::OpenFile(PathBuf::from("/music/b.ogg"))
            ]
        );
    }

    #[test]
    fn hidden_picker_ignores_input() {
        let mut picker = PlaylistPicker::new();
        let state = AppState::new(true);
        assert!(picker.handle_key(key(KeyCode::Enter), &state).is_empty());
    }

    #[test]
    fn escape_closes() {
        let mut picker = PlaylistPicker::new();
        let state = AppState::new(true);
        picker.show(entries());
        assert_eq!(
            picker.handle_key(key(KeyCode::Esc), &state),
            vec![Action::ClosePicker]
        );
    }
}
