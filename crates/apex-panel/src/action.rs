//! Action enum: user intents produced by components and keys.

use std::path::PathBuf;

/// Components that receive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Header,
    SeekBar,
    HelpOverlay,
    PlaylistPicker,
}

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePause,
    /// Relative seek in milliseconds.
    SeekRelative(i64),
    /// Mouse pressed on the progress bar at this fraction.
    SeekStart(f64),
    /// Mouse dragged while seeking.
    SeekDrag(f64),
    SeekEnd,
    OpenFile(PathBuf),

    // ── Playlist ─────────────────────────────────────────────────────────────
    SaveToPlaylist,
    ShowPlaylist,
    ClosePicker,

    // ── UI ───────────────────────────────────────────────────────────────────
    OpenPrompt,
    ToggleVisualizer,
    ToggleHelp,
    Render,
    Quit,
}
