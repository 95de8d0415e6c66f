//! mpv JSON IPC: one child process, one socket, a writer task that serialises
//! commands and a reader task that routes replies and events.
//!
//! ```text
//!   MpvHandle::send ──► writer_task ──► socket
//!                                        │
//!   reply oneshot  ◄── reader_task ◄─────┘──► event channel (MpvEvent)
//! ```
//!
//! When the socket closes the reader fails every outstanding request and
//! sends one [`MpvEvent::Closed`] tagged with the connection id.
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

use apex_core::platform;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// observe_property ids, matched in property-change events
pub const OBS_PAUSE: u64 = 1;
pub const OBS_TIME_POS: u64 = 2;
pub const OBS_DURATION: u64 = 3;
pub const OBS_EOF_REACHED: u64 = 4;

type Reply = oneshot::Sender<anyhow::Result<Value>>;
type PendingMap = Arc<Mutex<HashMap<u64, Reply>>>;

struct PendingRequest {
    req_id: u64,
    line: String,
}

#[derive(Debug, Clone)]
pub enum MpvEvent {
    /// Anything mpv pushed without being asked.
    Message(Value),
    /// The IPC connection `conn` hit EOF or a read error.
    Closed { conn: u64 },
}

/// The subset of mpv events the panel reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    FileLoaded,
    /// `end-file` with mpv's reason string (`eof`, `stop`, `error`, ...).
    EndFile { reason: String, error: Option<String> },
    Pause(bool),
    TimePos(Option<f64>),
    Duration(Option<f64>),
    EofReached(bool),
    Disconnected { conn: u64 },
}

impl MpvEvent {
    pub fn classify(&self) -> Option<PlayerEvent> {
        let raw = match self {
            MpvEvent::Message(raw) => raw,
            MpvEvent::Closed { conn } => return Some(PlayerEvent::Disconnected { conn: *conn }),
        };
        let name = raw.get("event")?.as_str()?;
        match name {
            "property-change" => {
                let id = raw.get("id")?.as_u64()?;
                let data = raw.get("data").unwrap_or(&Value::Null);
                match id {
                    OBS_PAUSE => Some(PlayerEvent::Pause(data.as_bool().unwrap_or(false))),
                    OBS_TIME_POS => Some(PlayerEvent::TimePos(data.as_f64())),
                    OBS_DURATION => Some(PlayerEvent::Duration(data.as_f64())),
                    OBS_EOF_REACHED => {
                        Some(PlayerEvent::EofReached(data.as_bool().unwrap_or(false)))
                    }
                    _ => None,
                }
            }
            "file-loaded" => Some(PlayerEvent::FileLoaded),
            "end-file" => Some(PlayerEvent::EndFile {
                reason: raw
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                error: raw
                    .get("file_error")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// Cloneable sender side of the IPC connection.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
    pending: PendingMap,
    conn: u64,
    reply_timeout: Duration,
}

impl MpvHandle {
    /// Id of the connection this handle writes to.
    pub fn conn(&self) -> u64 {
        self.conn
    }

    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({ "command": command, "request_id": req_id }))?;
        line.push('\n');

        // registered before the writer sees it
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(req_id, reply_tx);
        if self.tx.send(PendingRequest { req_id, line }).await.is_err() {
            self.pending.lock().await.remove(&req_id);
            anyhow::bail!("mpv writer task gone");
        }

        match tokio::time::timeout(self.reply_timeout, reply_rx).await {
            Ok(reply) => {
                reply.map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
            }
            Err(_) => {
                self.pending.lock().await.remove(&req_id);
                Err(anyhow::anyhow!("mpv IPC timeout for req={}", req_id))
            }
        }
    }

    pub async fn load_file(&self, path: &Path) -> anyhow::Result<()> {
        let path = path.to_string_lossy();
        debug!("mpv: loadfile {}", path);
        self.send(json!(["loadfile", path, "replace"])).await?;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn seek_to_ms(&self, ms: i64) -> anyhow::Result<()> {
        let secs = ms.max(0) as f64 / 1000.0;
        self.send(json!(["seek", secs, "absolute"])).await?;
        Ok(())
    }

    pub async fn seek_relative_ms(&self, ms: i64) -> anyhow::Result<()> {
        self.send(json!(["seek", ms as f64 / 1000.0, "relative"])).await?;
        Ok(())
    }

    /// Register the property observations. Needed after every fresh
    /// connection; mpv pushes the current value straight away.
    pub async fn observe_properties(&self) {
        let props = [
            (OBS_PAUSE, "pause"),
            (OBS_TIME_POS, "time-pos"),
            (OBS_DURATION, "duration"),
            (OBS_EOF_REACHED, "eof-reached"),
        ];
        for (id, name) in props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }
}

/// Owns the mpv child process.
pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
    volume: f32,
}

impl MpvDriver {
    pub fn new(volume: f32) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            process: None,
            volume,
        }
    }

    /// `true` once a spawned mpv has exited. No process at all is not an exit.
    pub fn process_exited(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => false,
            Ok(Some(status)) => {
                warn!("mpv exited: {}", status);
                true
            }
            Err(e) => {
                warn!("mpv liveness check failed: {}", e);
                true
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    fn command(&self) -> anyhow::Result<tokio::process::Command> {
        let binary =
            platform::find_mpv_binary().ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;
        let mut cmd = tokio::process::Command::new(binary);
        cmd.arg("--no-video")
            .arg("--idle=yes")
            .arg("--keep-open=yes")
            .arg("--no-terminal")
            .arg(platform::mpv_socket_arg())
            .arg(format!(
                "--volume={}",
                (self.volume * 100.0).clamp(0.0, 100.0).round() as i64
            ))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .kill_on_drop(true);
        Ok(cmd)
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        let stderr_path = platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = self.command()?.stderr(stderr_file).spawn()?;
        info!("mpv: spawned pid {:?}, stderr -> {}", child.id(), stderr_path.display());
        self.process = Some(child);

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to {}", socket_path.display());
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(read_half, write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let child = self
            .command()?
            .stderr(std::process::Stdio::null())
            .spawn()?;
        self.process = Some(child);

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to {}", pipe_path);
                let (read_half, write_half) = tokio::io::split(client);
                return Ok(start_io_tasks(read_half, write_half, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }
}

pub(crate) fn start_io_tasks<R, W>(
    read_half: R,
    write_half: W,
    event_tx: mpsc::Sender<MpvEvent>,
) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);
    let conn = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(
        BufReader::new(read_half),
        pending.clone(),
        event_tx,
        conn,
    ));

    MpvHandle {
        tx: cmd_tx,
        pending,
        conn,
        reply_timeout: REPLY_TIMEOUT,
    }
}

async fn fail_all(pending: &PendingMap, why: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", why)));
    }
}

/// Route one decoded line: replies resolve their pending request, anything
/// else is forwarded as an event.
async fn route_line(val: Value, pending: &PendingMap, event_tx: &mpsc::Sender<MpvEvent>) {
    let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) else {
        let _ = event_tx.send(MpvEvent::Message(val)).await;
        return;
    };
    let Some(tx) = pending.lock().await.remove(&req_id) else {
        debug!("mpv reader: reply for unknown req={}", req_id);
        return;
    };
    let result = match val.get("error").and_then(|v| v.as_str()) {
        Some("success") => Ok(val),
        other => Err(anyhow::anyhow!(
            "mpv error: {}",
            other.unwrap_or("unknown error")
        )),
    };
    let _ = tx.send(result);
}

async fn reader_task<R>(
    mut reader: BufReader<R>,
    pending: PendingMap,
    event_tx: mpsc::Sender<MpvEvent>,
    conn: u64,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection {} closed", conn);
                fail_all(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(val) => route_line(val, &pending, &event_tx).await,
                    Err(e) => debug!("mpv reader: invalid json '{}': {}", trimmed, e),
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_all(&pending, "mpv IPC read error").await;
                break;
            }
        }
    }
    let _ = event_tx.send(MpvEvent::Closed { conn }).await;
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        debug!("mpv writer: req={} {}", req.req_id, req.line.trim());
        if let Err(e) = writer.write_all(req.line.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(raw: Value) -> Option<PlayerEvent> {
        MpvEvent::Message(raw).classify()
    }

    #[test]
    fn classifies_property_changes() {
        assert_eq!(
            ev(json!({"event": "property-change", "id": OBS_PAUSE, "name": "pause", "data": true})),
            Some(PlayerEvent::Pause(true))
        );
        assert_eq!(
            ev(json!({"event": "property-change", "id": OBS_TIME_POS, "data": 12.5})),
            Some(PlayerEvent::TimePos(Some(12.5)))
        );
        assert_eq!(
            ev(json!({"event": "property-change", "id": OBS_DURATION})),
            Some(PlayerEvent::Duration(None))
        );
        assert_eq!(
            ev(json!({"event": "property-change", "id": 99, "data": 1})),
            None
        );
    }

    #[test]
    fn classifies_lifecycle_events() {
        assert_eq!(ev(json!({"event": "file-loaded"})), Some(PlayerEvent::FileLoaded));
        assert_eq!(
            ev(json!({"event": "end-file", "reason": "error", "file_error": "unrecognized file format"})),
            Some(PlayerEvent::EndFile {
                reason: "error".into(),
                error: Some("unrecognized file format".into())
            })
        );
        assert_eq!(ev(json!({"event": "playback-restart"})), None);
        assert_eq!(ev(json!({"data": 1})), None);
    }

    #[tokio::test]
    async fn replies_resolve_pending_and_events_forward() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = mpsc::channel(4);

        let (ok_tx, ok_rx) = oneshot::channel();
        let (err_tx, err_rx) = oneshot::channel();
        pending.lock().await.insert(7, ok_tx);
        pending.lock().await.insert(8, err_tx);

        route_line(json!({"request_id": 7, "error": "success", "data": 1}), &pending, &event_tx).await;
        route_line(json!({"request_id": 8, "error": "property unavailable"}), &pending, &event_tx).await;
        route_line(json!({"event": "file-loaded"}), &pending, &event_tx).await;

        assert_eq!(ok_rx.await.unwrap().unwrap()["data"], 1);
        assert!(err_rx.await.unwrap().is_err());
        let forwarded = event_rx.recv().await.unwrap();
        assert_eq!(forwarded.classify(), Some(PlayerEvent::FileLoaded));
        assert!(pending.lock().await.is_empty());
    }

    fn connect() -> (MpvHandle, mpsc::Receiver<MpvEvent>, tokio::io::DuplexStream) {
        let (client, server) = tokio::io::duplex(4096);
        let (read_half, write_half) = tokio::io::split(client);
        let (event_tx, event_rx) = mpsc::channel(8);
        (start_io_tasks(read_half, write_half, event_tx), event_rx, server)
    }

    #[tokio::test]
    async fn socket_close_reports_its_connection() {
        let (handle, mut events, server) = connect();
        drop(server);

        let ev = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("no event after close")
            .expect("event channel closed early");
        assert_eq!(
            ev.classify(),
            Some(PlayerEvent::Disconnected { conn: handle.conn() })
        );
        assert!(handle.send(json!(["stop"])).await.is_err());
    }

    #[tokio::test]
    async fn connections_get_distinct_ids() {
        let (a, _ea, _sa) = connect();
        let (b, _eb, _sb) = connect();
        assert_ne!(a.conn(), b.conn());
    }

    #[tokio::test]
    async fn timed_out_request_is_forgotten() {
        let (mut handle, _events, _server) = connect();
        handle.reply_timeout = Duration::from_millis(20);

        let err = handle.send(json!(["get_property", "pause"])).await.unwrap_err();
        assert!(err.to_string().contains("timeout"));
        assert!(handle.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn closed_connection_fails_outstanding_requests() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(1, tx);
        fail_all(&pending, "gone").await;
        assert!(rx.await.unwrap().is_err());
    }
}
