//! Status bar: bottom line with the input mode and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_MUTED, C_PROMPT_FG, C_SEPARATOR, C_TOAST_SUCCESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Prompt,
    Picker,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "PLAY",
            Self::Prompt => "OPEN",
            Self::Picker => "PLAYLIST",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_ACCENT,
            Self::Prompt => C_PROMPT_FG,
            Self::Picker => C_TOAST_SUCCESS,
        }
    }

    pub fn keys(self) -> &'static str {
        match self {
            Self::Normal => {
                " Space play/pause  ←→ seek  o open  s save  l playlist  v visualizer  ? help  q quit"
            }
            Self::Prompt => " type a path  Tab complete  Enter open  Esc cancel",
            Self::Picker => " ↑↓/jk select  Enter play  Esc close",
        }
    }
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(mode.keys(), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
