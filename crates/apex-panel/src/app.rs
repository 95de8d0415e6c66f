//! App: component-based event loop.
//!
//! - `App` owns the components, the visualizer engine, the scheduler and the
//!   mpv-backed player.
//! - Terminal input arrives through a `tokio::mpsc` channel fed by a blocking
//!   reader; mpv events arrive on their own channel.
//! - Scheduler deadlines wake the loop; due tasks run one at a time.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use apex_core::playback::{seek_target, PlaybackSnapshot, PositionSource};
use apex_core::platform::is_media_path;
use apex_core::playlist::Playlist;
use apex_core::scheduler::{Scheduler, TaskId};
use apex_core::{Config, VisualizerEngine};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    components::{
        header::Header, help_overlay::HelpOverlay, playlist_picker::PlaylistPicker,
        seek_bar::SeekBar,
    },
    mpv::MpvEvent,
    player::{Notice, Player},
    theme::{self, style_muted, C_BG},
    widgets::{
        bars::{self, EIGHTHS_PER_ROW},
        path_prompt::{PathPrompt, PromptAction},
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

enum AppMessage {
    Event(Event),
}

/// Last-drawn layout rects, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    seek_bar: Rect,
    screen: Rect,
}

pub struct App {
    config: Config,
    pub state: AppState,

    engine: VisualizerEngine,
    scheduler: Scheduler,
    player: Player,
    mpv_rx: Option<mpsc::Receiver<MpvEvent>>,
    playlist: Playlist,

    header: Header,
    seek_bar: SeekBar,
    help_overlay: HelpOverlay,
    picker: PlaylistPicker,
    prompt: PathPrompt,
    toast: ToastManager,

    areas: PaneAreas,
    startup_file: Option<PathBuf>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        seed: Option<u64>,
        show_visualizer: bool,
        startup_file: Option<PathBuf>,
    ) -> Self {
        let (mpv_tx, mpv_rx) = mpsc::channel::<MpvEvent>(256);
        let mut scheduler = Scheduler::new(&config.timers);
        if !show_visualizer {
            let now = Instant::now();
            scheduler.set_enabled(TaskId::Visualizer, false, now);
            scheduler.set_enabled(TaskId::Beat, false, now);
        }

        let playlist = Playlist::new(config.paths.playlist_file.clone());
        if let Err(e) = playlist.ensure_exists() {
            warn!("playlist unavailable: {}", e);
        }

        Self {
            engine: VisualizerEngine::new(&config, seed),
            scheduler,
            player: Player::new(config.player.default_volume, mpv_tx),
            mpv_rx: Some(mpv_rx),
            playlist,
            header: Header::new(),
            seek_bar: SeekBar::new(),
            help_overlay: HelpOverlay::new(
                config.player.seek_back_ms,
                config.player.seek_forward_ms,
            ),
            picker: PlaylistPicker::new(),
            prompt: PathPrompt::new(),
            toast: ToastManager::new(),
            state: AppState::new(show_visualizer),
            areas: PaneAreas::default(),
            startup_file,
            should_quit: false,
            config,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut mpv_rx = self
            .mpv_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already running"))?;

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // Toast expiry check
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        if let Some(path) = self.startup_file.take() {
            self.dispatch(Action::OpenFile(path)).await;
        }

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            let repaint = self.engine.take_repaint();
            if needs_redraw || repaint {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            let deadline = self
                .scheduler
                .next_deadline()
                .map(tokio::time::Instant::from_std)
                .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                Some(msg) = rx.recv() => {
                    let AppMessage::Event(ev) = msg;
                    needs_redraw = self.handle_event(ev).await;
                }

                Some(ev) = mpv_rx.recv() => {
                    needs_redraw = self.handle_mpv(ev).await;
                }

                _ = tokio::time::sleep_until(deadline) => {
                    needs_redraw = self.run_due_tasks();
                }

                _ = toast_tick.tick() => {
                    needs_redraw = self.toast.expire(Instant::now());
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.player.shutdown().await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("apex exiting");

        Ok(())
    }

    // ── Scheduled tasks ───────────────────────────────────────────────────────

    fn visualizer_active(&self) -> bool {
        PlaybackSnapshot::sample(self.player.status(), self.player.media_loaded()).is_active()
    }

    fn run_due_tasks(&mut self) -> bool {
        let active = self.visualizer_active();
        let engine = &mut self.engine;
        let mut progress_due = false;
        self.scheduler.run_due(Instant::now(), |id| {
            trace!("tick {:?}", id);
            match id {
                TaskId::Progress => progress_due = true,
                TaskId::Visualizer => engine.tick_visualizer(active),
                TaskId::Beat => {
                    engine.tick_beat(active);
                }
            }
        });
        progress_due && self.refresh_progress()
    }

    fn refresh_progress(&mut self) -> bool {
        let loaded = self.player.media_loaded();
        let snap = PlaybackSnapshot::sample(self.player.status(), loaded);
        if !should_refresh(self.state.dragging, loaded, &snap, &self.state.playback) {
            return false;
        }
        self.state.playback = snap;
        true
    }

    /// Re-read the player after a user action.
    fn resync_playback(&mut self) {
        self.state.current = self.player.current().map(|p| p.to_path_buf());
        self.state.playback =
            PlaybackSnapshot::sample(self.player.status(), self.player.media_loaded());
    }

    // ── mpv ───────────────────────────────────────────────────────────────────

    async fn handle_mpv(&mut self, ev: MpvEvent) -> bool {
        let Some(notice) = self.player.apply(&ev) else {
            return false;
        };
        match notice {
            Notice::Loaded => {
                info!("media loaded, starting playback");
                self.engine.reset();
                if let Err(e) = self.player.set_paused(false).await {
                    self.report("Could not start playback", e);
                }
            }
            Notice::Finished => {
                info!("end of media, rewinding");
                if let Err(e) = self.player.rewind().await {
                    warn!("rewind failed: {}", e);
                }
            }
            Notice::Failed(msg) => {
                error!("playback error: {}", msg);
                self.toast.error(format!("Playback error: {}", msg));
                self.player.reset().await;
            }
        }
        self.resync_playback();
        true
    }

    fn report(&mut self, what: &str, e: anyhow::Error) {
        error!("{}: {:#}", what, e);
        self.toast.error(format!("{}: {}", what, e));
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    async fn handle_event(&mut self, ev: Event) -> bool {
        let actions = match ev {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(m) => self.handle_mouse(m),
            Event::Resize(..) => return true,
            _ => return false,
        };
        let redraw = !actions.is_empty();
        for action in actions {
            self.dispatch(action).await;
        }
        redraw
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        if self.prompt.is_active() {
            let action = self.prompt.handle_key(key);
            if !self.prompt.is_active() {
                self.state.mode = InputMode::Normal;
            }
            return match action {
                PromptAction::Submit(path) => vec![Action::OpenFile(path)],
                PromptAction::Cancelled | PromptAction::None => vec![Action::Render],
            };
        }

        if self.help_overlay.visible {
            trace!("key -> {:?}", self.help_overlay.id());
            return self.help_overlay.handle_key(key, &self.state);
        }

        if self.picker.visible {
            trace!("key -> {:?}", self.picker.id());
            return self.picker.handle_key(key, &self.state);
        }

        let player = &self.config.player;
        match key.code {
            KeyCode::Char(' ') => vec![Action::TogglePause],
            KeyCode::Left => vec![Action::SeekRelative(-player.seek_back_ms)],
            KeyCode::Right => vec![Action::SeekRelative(player.seek_forward_ms)],
            KeyCode::Char('o') => vec![Action::OpenPrompt],
            KeyCode::Char('s') => vec![Action::SaveToPlaylist],
            KeyCode::Char('l') => vec![Action::ShowPlaylist],
            KeyCode::Char('v') => vec![Action::ToggleVisualizer],
            KeyCode::Char('?') => vec![Action::ToggleHelp],
            KeyCode::Char('q') => vec![Action::Quit],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.picker.visible {
            trace!("mouse -> {:?}", self.picker.id());
            return self
                .picker
                .handle_mouse(event, self.areas.screen, &self.state);
        }
        if self.help_overlay.visible || self.prompt.is_active() {
            return vec![];
        }
        self.seek_bar
            .handle_mouse(event, self.areas.seek_bar, &self.state)
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        debug!("dispatch {:?}", action);
        match action {
            Action::TogglePause => {
                if !self.player.media_loaded() {
                    self.open_prompt();
                    return;
                }
                if let Err(e) = self.player.toggle_pause().await {
                    self.report("Pause failed", e);
                }
                self.resync_playback();
            }
            Action::SeekRelative(ms) => {
                if let Err(e) = self.player.seek_relative(ms).await {
                    self.report("Seek failed", e);
                }
                self.resync_playback();
            }
            Action::SeekStart(fraction) => {
                // Pressing the bar pauses; releasing does not resume.
                if self.player.status().is_playing().unwrap_or(false) {
                    if let Err(e) = self.player.set_paused(true).await {
                        self.report("Pause failed", e);
                    }
                }
                self.state.dragging = true;
                self.seek_fraction(fraction).await;
            }
            Action::SeekDrag(fraction) => {
                self.seek_fraction(fraction).await;
            }
            Action::SeekEnd => {
                self.state.dragging = false;
            }
            Action::OpenFile(path) => self.open_file(path).await,
            Action::SaveToPlaylist => self.save_to_playlist(),
            Action::ShowPlaylist => self.show_playlist(),
            Action::ClosePicker => {
                self.picker.hide();
                self.state.mode = InputMode::Normal;
            }
            Action::OpenPrompt => self.open_prompt(),
            Action::ToggleVisualizer => {
                let show = !self.state.show_visualizer;
                self.state.show_visualizer = show;
                let now = Instant::now();
                self.scheduler.set_enabled(TaskId::Visualizer, show, now);
                self.scheduler.set_enabled(TaskId::Beat, show, now);
                info!("visualizer {}", if show { "shown" } else { "hidden" });
            }
            Action::ToggleHelp => self.help_overlay.toggle(),
            Action::Render => {}
            Action::Quit => self.should_quit = true,
        }
    }

    fn open_prompt(&mut self) {
        self.prompt.open(&self.config.paths.music_dir);
        self.state.mode = InputMode::Prompt;
    }

    async fn seek_fraction(&mut self, fraction: f64) {
        if !self.player.media_loaded() {
            return;
        }
        let snap = PlaybackSnapshot::sample(self.player.status(), true);
        let target = seek_target(fraction, snap.duration_ms);
        if let Err(e) = self.player.seek_to(target).await {
            self.report("Seek failed", e);
            return;
        }
        self.resync_playback();
    }

    async fn open_file(&mut self, path: PathBuf) {
        if !path.is_file() {
            self.toast
                .warning(format!("File not found: {}", path.display()));
            return;
        }
        if !is_media_path(&path) {
            self.toast
                .warning("Unsupported file type (mp3, mp4, wav, ogg, flac)");
            return;
        }
        match self.player.open(&path).await {
            Ok(()) => {
                self.engine.reset();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.toast.info(format!("Loading {}", name));
            }
            Err(e) => {
                self.report("Could not open file", e);
                self.player.reset().await;
            }
        }
        self.resync_playback();
    }

    fn save_to_playlist(&mut self) {
        let Some(current) = self.player.current().map(|p| p.to_path_buf()) else {
            self.toast.warning("No media loaded to save");
            return;
        };
        match self.playlist.append(&current) {
            Ok(()) => {
                info!("saved {} to playlist", current.display());
                self.toast.success("Saved to playlist");
            }
            Err(e) => {
                error!("playlist save failed: {}", e);
                self.toast.error(format!("Could not save playlist: {}", e));
            }
        }
    }

    fn show_playlist(&mut self) {
        match self.playlist.load_existing() {
            Ok(entries) if entries.is_empty() => {
                self.toast
                    .warning("Playlist is empty or contains invalid paths");
            }
            Ok(entries) => {
                debug!("playlist: {} entries", entries.len());
                self.picker.show(entries);
                self.state.mode = InputMode::Picker;
            }
            Err(e) => {
                error!("playlist load failed: {}", e);
                self.toast.error(format!("Could not read playlist: {}", e));
            }
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // separator
                Constraint::Min(0),    // visualizer
                Constraint::Length(1), // seek bar
                Constraint::Length(1), // keys / prompt
            ])
            .split(area);

        self.areas = PaneAreas {
            seek_bar: outer[3],
            screen: area,
        };

        self.header.draw(frame, outer[0], &self.state);
        status_bar::draw_separator(frame, outer[1]);
        self.draw_visualizer(frame, outer[2]);
        self.seek_bar.draw(frame, outer[3], &self.state);

        if self.prompt.is_active() {
            self.prompt.draw(frame, outer[4]);
        } else {
            status_bar::draw_keys_bar(frame, outer[4], self.state.mode);
        }

        self.picker.draw(frame, area, &self.state);
        self.help_overlay.draw(frame, area, &self.state);
        self.toast.draw(frame, area);
    }

    fn draw_visualizer(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        if !self.state.show_visualizer {
            let y = area.y + area.height / 2;
            frame.render_widget(
                Paragraph::new("visualizer hidden · press v")
                    .style(style_muted())
                    .alignment(Alignment::Center),
                Rect { y, height: 1, ..area },
            );
            return;
        }
        let active = self.visualizer_active();
        let specs = self
            .engine
            .bars(active, (area.height * EIGHTHS_PER_ROW) as f32);
        let peak = theme::rgb(self.engine.render_config().peak_color.into());
        bars::draw(frame, area, &specs, peak);
    }
}

/// Progress tick gate: the labels only move while media is loaded and
/// playing, the user is not dragging the bar, and the reading changed.
fn should_refresh(
    dragging: bool,
    loaded: bool,
    snap: &PlaybackSnapshot,
    prev: &PlaybackSnapshot,
) -> bool {
    !dragging && loaded && snap.playing && snap != prev
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_at(position_ms: i64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            media_loaded: true,
            playing: true,
            position_ms,
            duration_ms: 60_000,
        }
    }

    #[test]
    fn progress_moves_while_playing() {
        let prev = playing_at(1_000);
        assert!(should_refresh(false, true, &playing_at(1_100), &prev));
    }

    #[test]
    fn progress_holds_while_dragging() {
        let prev = playing_at(1_000);
        assert!(!should_refresh(true, true, &playing_at(1_100), &prev));
    }

    #[test]
    fn progress_holds_without_media_or_when_paused() {
        let prev = PlaybackSnapshot::idle();
        assert!(!should_refresh(false, false, &playing_at(1_100), &prev));

        let paused = PlaybackSnapshot {
            playing: false,
            ..playing_at(1_100)
        };
        assert!(!should_refresh(false, true, &paused, &prev));
    }

    #[test]
    fn unchanged_reading_needs_no_redraw() {
        let prev = playing_at(1_000);
        assert!(!should_refresh(false, true, &playing_at(1_000), &prev));
    }
}
