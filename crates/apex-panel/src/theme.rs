//! Colour palette for the panel.

use ratatui::style::{Color, Modifier, Style};

use apex_core::render::Rgb;

pub const C_BG: Color = Color::Rgb(34, 34, 34);
pub const C_ACCENT: Color = Color::Rgb(36, 255, 255);
pub const C_PRIMARY: Color = Color::Rgb(225, 225, 232);
pub const C_SECONDARY: Color = Color::Rgb(130, 130, 148);
pub const C_MUTED: Color = Color::Rgb(78, 78, 92);
pub const C_SEPARATOR: Color = Color::Rgb(52, 52, 60);
pub const C_TRACK: Color = Color::Rgb(48, 48, 56);
pub const C_PANEL_BORDER: Color = Color::Rgb(60, 60, 72);
pub const C_POPUP_BG: Color = Color::Rgb(26, 26, 30);
pub const C_SELECTION_BG: Color = Color::Rgb(44, 52, 56);
pub const C_PROMPT_BG: Color = Color::Rgb(24, 28, 30);
pub const C_PROMPT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);

pub fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

pub fn style_title() -> Style {
    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_selected() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}
