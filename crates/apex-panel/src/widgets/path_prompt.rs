//! PathPrompt: one-line tui-input prompt for typing a media file path.

use std::path::{Path, PathBuf};

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_MUTED, C_PROMPT_BG, C_PROMPT_FG};

const LABEL: &str = "Open: ";

pub enum PromptAction {
    Submit(PathBuf),
    Cancelled,
    None,
}

pub struct PathPrompt {
    input: Input,
    active: bool,
}

impl PathPrompt {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            active: false,
        }
    }

    /// Open the prompt pre-filled with `start` (usually the music directory).
    pub fn open(&mut self, start: &Path) {
        let mut seed = start.display().to_string();
        if !seed.is_empty() && !seed.ends_with(std::path::MAIN_SEPARATOR) {
            seed.push(std::path::MAIN_SEPARATOR);
        }
        self.input = Input::new(seed);
        self.active = true;
    }

    pub fn close(&mut self) {
        self.active = false;
        self.input = Input::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => {
                self.close();
                PromptAction::Cancelled
            }
            KeyCode::Enter => {
                let value = self.input.value().trim().to_string();
                self.close();
                if value.is_empty() {
                    PromptAction::Cancelled
                } else {
                    PromptAction::Submit(expand_home(&value))
                }
            }
            KeyCode::Tab => {
                if let Some(done) = complete_path(self.input.value()) {
                    self.input = Input::new(done);
                }
                PromptAction::None
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptAction::None
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(LABEL.len() as u16) as usize;
        let scroll = self.input.visual_scroll(width);
        let shown: String = self.input.value().chars().skip(scroll).collect();
        let line = Line::from(vec![
            Span::styled(
                LABEL,
                Style::default().fg(C_PROMPT_FG).add_modifier(Modifier::BOLD),
            ),
            if shown.is_empty() {
                Span::styled("path to an mp3, mp4, wav, ogg or flac file", Style::default().fg(C_MUTED))
            } else {
                Span::styled(shown, Style::default().fg(C_PROMPT_FG))
            },
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_PROMPT_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let x = area.x + LABEL.len() as u16 + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((x.min(area.x + area.width - 1), area.y));
        }
    }
}

impl Default for PathPrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

/// Shell-style completion of the last path component.
///
/// A single match is completed in full (directories get a trailing
/// separator); several matches complete to their longest common prefix.
pub fn complete_path(value: &str) -> Option<String> {
    let (dir_part, stem) = match value.rfind(std::path::MAIN_SEPARATOR) {
        Some(i) => (&value[..=i], &value[i + 1..]),
        None => ("", value),
    };
    let dir = if dir_part.is_empty() {
        PathBuf::from(".")
    } else {
        expand_home(dir_part)
    };

    let mut matches: Vec<(String, bool)> = std::fs::read_dir(&dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            if !name.starts_with(stem) || (stem.is_empty() && name.starts_with('.')) {
                return None;
            }
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            Some((name, is_dir))
        })
        .collect();
    matches.sort();

    let completed = match matches.as_slice() {
        [] => return None,
        [(name, is_dir)] => {
            let mut s = name.clone();
            if *is_dir {
                s.push(std::path::MAIN_SEPARATOR);
            }
            s
        }
        [(first, _), rest @ ..] => {
            let mut prefix = first.clone();
            for (name, _) in rest {
                let common = prefix
                    .chars()
                    .zip(name.chars())
                    .take_while(|(a, b)| a == b)
                    .map(|(a, _)| a.len_utf8())
                    .sum();
                prefix.truncate(common);
            }
            prefix
        }
    };

    if completed.len() <= stem.len() {
        return None;
    }
    Some(format!("{dir_part}{completed}"))
}
