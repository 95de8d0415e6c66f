//! AppState: read-only data passed to components during render and events.
//!
//! The App event loop is the only thing that writes to it.

use std::path::PathBuf;

use apex_core::playback::PlaybackSnapshot;

use crate::widgets::status_bar::InputMode;

pub const NO_FILE_LABEL: &str = "No file loaded";

#[derive(Debug, Clone)]
pub struct AppState {
    /// Last snapshot taken by the progress tick; drives the labels and bar.
    pub playback: PlaybackSnapshot,
    pub current: Option<PathBuf>,
    pub show_visualizer: bool,
    pub dragging: bool,
    pub mode: InputMode,
}

impl AppState {
    pub fn new(show_visualizer: bool) -> Self {
        Self {
            playback: PlaybackSnapshot::idle(),
            current: None,
            show_visualizer,
            dragging: false,
            mode: InputMode::Normal,
        }
    }

    pub fn media_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// File name of the loaded media, or the idle placeholder.
    pub fn file_label(&self) -> String {
        self.current
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| NO_FILE_LABEL.to_string())
    }

    pub fn time_label(&self) -> String {
        self.playback.time_label()
    }

    pub fn progress(&self) -> f64 {
        if !self.media_loaded() {
            return 0.0;
        }
        self.playback.progress_ratio()
    }
}
