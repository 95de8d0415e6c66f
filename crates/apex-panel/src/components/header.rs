//! Header component: one row: title, current file name, time label.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, style_title, C_PRIMARY},
};

pub const TITLE: &str = "ApexMusic";

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Header
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let time = state.time_label();
        let title = format!(" {TITLE} ");
        let fixed = title.width() + 3 + time.width() + 1;
        let room = (area.width as usize).saturating_sub(fixed);
        let name = fit_width(&state.file_label(), room);
        let pad = room.saturating_sub(name.width());

        let name_style = if state.media_loaded() {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            style_muted()
        };

        let line = Line::from(vec![
            Span::styled(title, style_title()),
            Span::styled("│ ", style_muted()),
            Span::styled(name, name_style),
            Span::raw(" ".repeat(pad + 1)),
            Span::styled(time, style_secondary()),
            Span::raw(" "),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Truncate `s` to at most `max` terminal columns, ending in `…` when cut.
pub fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(fit_width("intro.flac", 20), "intro.flac");
    }

    #[test]
    fn long_names_get_an_ellipsis() {
        assert_eq!(fit_width("a_very_long_track_name.mp3", 8), "a_very_…");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn wide_chars_count_double() {
        let cut = fit_width("日本語の曲.mp3", 6);
        assert_eq!(cut, "日本…");
        assert!(cut.width() <= 6);
    }
}
