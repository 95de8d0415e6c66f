//! Transient notifications stacked in the top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_POPUP_BG, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn lifetime(self) -> Duration {
        match self {
            Severity::Info | Severity::Success => Duration::from_secs(3),
            Severity::Warning => Duration::from_secs(4),
            Severity::Error => Duration::from_secs(6),
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }
}

#[derive(Debug)]
struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            max_visible: 3,
        }
    }

    pub fn push_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        // repeating a toast refreshes it instead of stacking a copy
        self.toasts.retain(|t| t.message != message);
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: now + severity.lifetime(),
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(message, Severity::Info, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(message, Severity::Success, Instant::now());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push_at(message, Severity::Warning, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(message, Severity::Error, Instant::now());
    }

    /// Drop expired toasts. Returns `true` if anything was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires > now);
        self.toasts.len() != before
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    #[cfg(test)]
    pub fn messages(&self) -> impl Iterator<Item = (&str, Severity)> {
        self.toasts.iter().map(|t| (t.message.as_str(), t.severity))
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let max_width = (area.width / 2).clamp(24, 60).min(area.width);
        let mut y = area.y + 1;

        for toast in self.toasts.iter().rev().take(self.max_visible) {
            if y >= area.y + area.height {
                break;
            }
            let text = format!(" {} {} ", toast.severity.icon(), toast.message);
            let w = (text.width() as u16).min(max_width);
            let rect = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            let color = match toast.severity {
                Severity::Info => C_TOAST_INFO,
                Severity::Success => C_TOAST_SUCCESS,
                Severity::Warning => C_TOAST_WARNING,
                Severity::Error => C_TOAST_ERROR,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(color)
                        .bg(C_POPUP_BG)
                        .add_modifier(Modifier::BOLD),
                ))),
                rect,
            );
            y += 1;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_refresh_instead_of_stacking() {
        let mut t = ToastManager::new();
        let now = Instant::now();
        t.push_at("No media loaded to save", Severity::Warning, now);
        t.push_at("No media loaded to save", Severity::Warning, now + Duration::from_secs(2));
        assert_eq!(t.messages().count(), 1);
        assert!(!t.expire(now + Duration::from_secs(5)));
        assert!(t.expire(now + Duration::from_secs(7)));
        assert!(t.is_empty());
    }

    #[test]
    fn errors_outlive_info() {
        let mut t = ToastManager::new();
        let now = Instant::now();
        t.push_at("saved", Severity::Success, now);
        t.push_at("mpv binary not found", Severity::Error, now);
        t.expire(now + Duration::from_secs(4));
        let left: Vec<_> = t.messages().collect();
        assert_eq!(left, vec![("mpv binary not found", Severity::Error)]);
    }

    #[test]
    fn queue_is_capped() {
        let mut t = ToastManager::new();
        let now = Instant::now();
        for i in 0..20 {
            t.push_at(format!("toast {i}"), Severity::Info, now);
        }
        assert_eq!(t.messages().count(), 6);
        assert_eq!(t.messages().last().map(|m| m.0), Some("toast 19"));
    }
}
