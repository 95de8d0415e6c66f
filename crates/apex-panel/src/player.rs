//! Player: owns the mpv driver and mirrors the properties mpv pushes.
//!
//! mpv is spawned lazily on the first file open. Every command goes through
//! [`Player::handle`], which respawns mpv if the process died in between.
//! A closed IPC socket is noticed sooner, through [`PlayerEvent::Disconnected`].

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use apex_core::playback::PositionSource;
use apex_core::{ApexError, Result as CoreResult};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, PlayerEvent};

/// What mpv last told us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatus {
    pub connected: bool,
    pub paused: bool,
    pub time_pos: Option<f64>,
    pub duration: Option<f64>,
    pub eof_reached: bool,
}

impl PositionSource for PlayerStatus {
    fn position_ms(&self) -> CoreResult<i64> {
        if !self.connected {
            return Err(ApexError::Source("mpv not connected".into()));
        }
        Ok(secs_to_ms(self.time_pos.unwrap_or(0.0)))
    }

    fn duration_ms(&self) -> CoreResult<i64> {
        if !self.connected {
            return Err(ApexError::Source("mpv not connected".into()));
        }
        Ok(secs_to_ms(self.duration.unwrap_or(0.0)))
    }

    fn is_playing(&self) -> CoreResult<bool> {
        if !self.connected {
            return Err(ApexError::Source("mpv not connected".into()));
        }
        Ok(!self.paused && !self.eof_reached)
    }
}

fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Lifecycle changes the app needs to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// New media is ready; start it.
    Loaded,
    /// Playback ran off the end.
    Finished,
    Failed(String),
}

pub struct Player {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    event_tx: mpsc::Sender<MpvEvent>,
    status: PlayerStatus,
    current: Option<PathBuf>,
}

impl Player {
    pub fn new(volume: f32, event_tx: mpsc::Sender<MpvEvent>) -> Self {
        Self {
            driver: MpvDriver::new(volume),
            handle: None,
            event_tx,
            status: PlayerStatus::default(),
            current: None,
        }
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn media_loaded(&self) -> bool {
        self.current.is_some()
    }

    async fn handle(&mut self) -> anyhow::Result<MpvHandle> {
        if self.handle.is_some() && self.driver.process_exited() {
            warn!("player: mpv died, dropping handle");
            self.handle = None;
            self.status = PlayerStatus::default();
        }
        if let Some(h) = &self.handle {
            return Ok(h.clone());
        }

        let handle = self.driver.spawn_and_connect(self.event_tx.clone()).await?;
        handle.observe_properties().await;
        self.status.connected = true;
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Replace whatever is loaded. Playback starts on [`Notice::Loaded`].
    pub async fn open(&mut self, path: &Path) -> anyhow::Result<()> {
        info!("player: opening {}", path.display());
        self.reset().await;
        let handle = self.handle().await?;
        // Load paused so nothing plays before the file-loaded event.
        handle.set_pause(true).await?;
        handle.load_file(path).await?;
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    /// Drop the current media and return to the idle state.
    pub async fn reset(&mut self) {
        self.current = None;
        self.status.time_pos = None;
        self.status.duration = None;
        self.status.eof_reached = false;
        if let Some(h) = &self.handle {
            if let Err(e) = h.stop().await {
                debug!("player: stop failed: {}", e);
            }
        }
    }

    pub async fn set_paused(&mut self, paused: bool) -> anyhow::Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        let handle = self.handle().await?;
        handle.set_pause(paused).await?;
        // mpv confirms through the observed property; mirror it now so the
        // next tick already sees it.
        self.status.paused = paused;
        Ok(())
    }

    pub async fn toggle_pause(&mut self) -> anyhow::Result<()> {
        let paused = !self.status.paused;
        self.set_paused(paused).await
    }

    pub async fn seek_relative(&mut self, ms: i64) -> anyhow::Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.handle().await?.seek_relative_ms(ms).await?;
        if let Some(t) = self.status.time_pos {
            let mut next = (t + ms as f64 / 1000.0).max(0.0);
            if let Some(d) = self.status.duration {
                next = next.min(d);
            }
            self.status.time_pos = Some(next);
        }
        Ok(())
    }

    pub async fn seek_to(&mut self, ms: i64) -> anyhow::Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.handle().await?.seek_to_ms(ms).await?;
        self.status.time_pos = Some(ms as f64 / 1000.0);
        Ok(())
    }

    /// End of media: pause and go back to the start.
    pub async fn rewind(&mut self) -> anyhow::Result<()> {
        self.set_paused(true).await?;
        self.seek_to(0).await
    }

    /// Fold one mpv event into the mirrored status.
    pub fn apply(&mut self, event: &MpvEvent) -> Option<Notice> {
        let event = event.classify()?;
        debug!("player: {:?}", event);
        match event {
            PlayerEvent::Pause(p) => self.status.paused = p,
            PlayerEvent::TimePos(t) => self.status.time_pos = t,
            PlayerEvent::Duration(d) => self.status.duration = d,
            PlayerEvent::EofReached(eof) => {
                let was = self.status.eof_reached;
                self.status.eof_reached = eof;
                if eof && !was && self.current.is_some() {
                    return Some(Notice::Finished);
                }
            }
            PlayerEvent::FileLoaded => {
                if self.current.is_some() {
                    self.status.eof_reached = false;
                    return Some(Notice::Loaded);
                }
            }
            PlayerEvent::Disconnected { conn } => {
                if self.handle.as_ref().map(MpvHandle::conn) != Some(conn) {
                    debug!("player: ignoring close of stale connection {}", conn);
                    return None;
                }
                warn!("player: mpv connection {} closed", conn);
                self.handle = None;
                self.status = PlayerStatus::default();
                if self.current.is_some() {
                    return Some(Notice::Failed("mpv stopped responding".to_string()));
                }
            }
            PlayerEvent::EndFile { reason, error } => {
                if reason == "error" && self.current.is_some() {
                    let msg = error.unwrap_or_else(|| "playback failed".to_string());
                    warn!("player: end-file error: {}", msg);
                    return Some(Notice::Failed(msg));
                }
            }
        }
        None
    }

    pub async fn shutdown(&mut self) {
        info!("player: shutting down mpv");
        if let Some(h) = self.handle.take() {
            let _ = h.stop().await;
        }
        self.driver.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpv::start_io_tasks;
    use apex_core::playback::PlaybackSnapshot;
    use serde_json::json;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn player() -> Player {
        let (tx, _rx) = mpsc::channel(1);
        Player::new(0.5, tx)
    }

    fn ev(raw: serde_json::Value) -> MpvEvent {
        MpvEvent::Message(raw)
    }

    fn prop(id: u64, data: serde_json::Value) -> MpvEvent {
        ev(json!({"event": "property-change", "id": id, "data": data}))
    }

    #[test]
    fn disconnected_status_is_a_source_error() {
        let status = PlayerStatus::default();
        assert!(status.position_ms().is_err());
        let snap = PlaybackSnapshot::sample(&status, true);
        assert!(!snap.is_active());
    }

    #[test]
    fn status_reads_as_position_source() {
        let status = PlayerStatus {
            connected: true,
            paused: false,
            time_pos: Some(61.25),
            duration: Some(180.0),
            eof_reached: false,
        };
        let snap = PlaybackSnapshot::sample(&status, true);
        assert!(snap.is_active());
        assert_eq!(snap.position_ms, 61_250);
        assert_eq!(snap.time_label(), "01:01 / 03:00");
    }

    #[test]
    fn properties_update_status() {
        let mut p = player();
        assert_eq!(p.apply(&prop(crate::mpv::OBS_PAUSE, json!(true))), None);
        assert!(p.status().paused);
        p.apply(&prop(crate::mpv::OBS_TIME_POS, json!(3.5)));
        p.apply(&prop(crate::mpv::OBS_DURATION, json!(10.0)));
        assert_eq!(p.status().time_pos, Some(3.5));
        assert_eq!(p.status().duration, Some(10.0));
    }

    #[test]
    fn lifecycle_notices_need_loaded_media() {
        let mut p = player();
        assert_eq!(p.apply(&ev(json!({"event": "file-loaded"}))), None);

        p.current = Some(PathBuf::from("/music/a.mp3"));
        assert_eq!(p.apply(&ev(json!({"event": "file-loaded"}))), Some(Notice::Loaded));
        assert_eq!(
            p.apply(&prop(crate::mpv::OBS_EOF_REACHED, json!(true))),
            Some(Notice::Finished)
        );
        // Only the transition counts.
        assert_eq!(p.apply(&prop(crate::mpv::OBS_EOF_REACHED, json!(true))), None);
        assert_eq!(
            p.apply(&ev(json!({"event": "end-file", "reason": "error"}))),
            Some(Notice::Failed("playback failed".into()))
        );
        assert_eq!(p.apply(&ev(json!({"event": "end-file", "reason": "stop"}))), None);
    }

    #[test]
    fn eof_counts_as_not_playing() {
        let status = PlayerStatus {
            connected: true,
            eof_reached: true,
            ..PlayerStatus::default()
        };
        assert_eq!(status.is_playing().unwrap(), false);
    }

    /// Wire the player to an in-memory mpv that answers every request with
    /// success and records the commands it saw.
    fn fake_mpv(
        p: &mut Player,
    ) -> (
        mpsc::Receiver<MpvEvent>,
        tokio::io::DuplexStream,
        Arc<StdMutex<Vec<serde_json::Value>>>,
    ) {
        let (client, server) = tokio::io::duplex(4096);
        let (read_half, write_half) = tokio::io::split(client);
        let (event_tx, event_rx) = mpsc::channel(8);
        p.handle = Some(start_io_tasks(read_half, write_half, event_tx));
        p.status.connected = true;
        (event_rx, server, Arc::new(StdMutex::new(Vec::new())))
    }

    async fn serve(server: tokio::io::DuplexStream, seen: Arc<StdMutex<Vec<serde_json::Value>>>) {
        let (read_half, mut write_half) = tokio::io::split(server);
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let req: serde_json::Value = serde_json::from_str(&line).unwrap();
            seen.lock().unwrap().push(req["command"].clone());
            let reply = json!({"request_id": req["request_id"], "error": "success"});
            let mut out = reply.to_string();
            out.push('\n');
            if write_half.write_all(out.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn closed_socket_stops_playback() {
        let mut p = player();
        let (mut events, server, _) = fake_mpv(&mut p);
        p.current = Some(PathBuf::from("/music/a.mp3"));
        p.status.time_pos = Some(12.0);
        p.status.duration = Some(60.0);
        assert!(PlaybackSnapshot::sample(p.status(), p.media_loaded()).is_active());

        drop(server);
        let closed = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(p.apply(&closed), Some(Notice::Failed(_))));
        assert!(!p.status().connected);
        assert!(p.status().is_playing().is_err());
        assert!(!PlaybackSnapshot::sample(p.status(), p.media_loaded()).is_active());
        assert!(p.handle.is_none());
    }

    #[tokio::test]
    async fn stale_close_keeps_the_live_connection() {
        let mut p = player();
        let (_events, _server, _) = fake_mpv(&mut p);
        p.current = Some(PathBuf::from("/music/a.mp3"));
        let live = p.handle.as_ref().map(MpvHandle::conn).unwrap();

        assert_eq!(p.apply(&MpvEvent::Closed { conn: live + 1000 }), None);
        assert!(p.status().connected);
        assert!(p.handle.is_some());
    }

    #[tokio::test]
    async fn end_of_media_pauses_and_rewinds() {
        let mut p = player();
        let (_events, server, seen) = fake_mpv(&mut p);
        tokio::spawn(serve(server, seen.clone()));
        p.current = Some(PathBuf::from("/music/a.mp3"));
        p.status.time_pos = Some(59.9);
        p.status.duration = Some(60.0);

        assert_eq!(
            p.apply(&prop(crate::mpv::OBS_EOF_REACHED, json!(true))),
            Some(Notice::Finished)
        );
        p.rewind().await.unwrap();

        assert!(p.status().paused);
        assert_eq!(p.status().time_pos, Some(0.0));
        let snap = PlaybackSnapshot::sample(p.status(), p.media_loaded());
        assert!(!snap.playing);
        assert_eq!(snap.position_ms, 0);
        assert_eq!(snap.time_label(), "00:00 / 01:00");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], json!(["set_property", "pause", true]));
        assert_eq!(seen[1], json!(["seek", 0.0, "absolute"]));
    }
}
