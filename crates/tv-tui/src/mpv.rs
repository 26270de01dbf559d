//! mpv JSON IPC client.
//!
//! mpv is spawned with an IPC endpoint (Unix socket, or a named pipe on
//! Windows) and driven over newline-delimited JSON. Two tasks own the
//! connection: a writer that serialises requests, and a reader that matches
//! `request_id` replies back to their waiting callers and forwards
//! everything unsolicited (events, property changes) to the player core.
//! `MpvHandle` is the cheap clone both tasks hand out; `MpvDriver` owns the
//! child process and can rebuild the connection after a crash.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

/// Property-observation ids, echoed back in every property-change event.
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;
/// `sub-text`: the subtitle cue currently on screen, empty between cues.
pub const OBS_SUB_TEXT: u64 = 3;
pub const OBS_TIME_POS: u64 = 4;
pub const OBS_DURATION: u64 = 5;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type Replies = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct Outbound {
    id: u64,
    line: String,
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// Anything mpv pushed without being asked.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// `(observation id, new value)` when this is a property-change.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? != "property-change" {
            return None;
        }
        let id = self.raw.get("id")?.as_u64()?;
        Some((id, self.raw.get("data").unwrap_or(&Value::Null)))
    }

    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }
}

#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<Outbound>,
    next_id: Arc<AtomicU64>,
}

impl MpvHandle {
    /// Send one command and wait for its reply.
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({
            "command": command,
            "request_id": id,
        }))?;
        line.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Outbound {
                id,
                line,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv connection is gone"))?;

        tokio::time::timeout(REPLY_TIMEOUT, reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv did not reply to request {id}"))?
            .map_err(|_| anyhow::anyhow!("mpv dropped request {id}"))?
    }

    pub async fn load_stream(&self, url: &str, volume: f32) -> anyhow::Result<()> {
        debug!(url, "mpv: loadfile");
        self.send(json!(["loadfile", url])).await?;
        let _ = self
            .send(json!(["set_property", "volume", percent(volume)]))
            .await;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        let _ = self.send(json!(["stop"])).await;
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        self.send(json!(["set_property", "volume", percent(volume)]))
            .await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn seek_relative(&self, secs: f64) -> anyhow::Result<()> {
        self.send(json!(["seek", secs, "relative"])).await?;
        Ok(())
    }

    /// (Re-)register every property observation. Needed after each fresh
    /// connection; observations do not survive a reconnect.
    pub async fn observe_all_properties(&self) {
        for (id, name) in [
            (OBS_CORE_IDLE, "core-idle"),
            (OBS_PAUSE, "pause"),
            (OBS_SUB_TEXT, "sub-text"),
            (OBS_TIME_POS, "time-pos"),
            (OBS_DURATION, "duration"),
        ] {
            if let Err(e) = self.send(json!(["observe_property", id, name])).await {
                warn!("mpv: could not observe {name}: {e}");
            }
        }
    }

    /// Liveness probe over the IPC channel itself.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "mpv-version"])).await?;
        Ok(())
    }
}

fn percent(volume: f32) -> f64 {
    (f64::from(volume) * 100.0).clamp(0.0, 100.0)
}

/// Owns the mpv child process. Connections come and go independently of the
/// process; the player core decides when to respawn versus reconnect.
pub struct MpvDriver {
    pub socket_name: String,
    child: Option<tokio::process::Child>,
    pub last_volume: f32,
    extra_args: Vec<String>,
}

impl MpvDriver {
    pub fn new(extra_args: Vec<String>) -> Self {
        Self {
            socket_name: tv_core::platform::mpv_socket_name(),
            child: None,
            last_volume: 0.5,
            extra_args,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("mpv exited: {status}");
                false
            }
            Err(e) => {
                warn!("mpv liveness check failed: {e}");
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
    }

    fn command_line(&self) -> Vec<String> {
        // Video window stays up next to the terminal; --sid=auto selects a
        // subtitle track so sub-text actually carries cues.
        let mut args = vec![
            "--idle=yes".into(),
            tv_core::platform::mpv_socket_arg(),
            "--quiet".into(),
            "--force-window=yes".into(),
            "--sid=auto".into(),
            format!("--volume={}", percent(self.last_volume).round() as i64),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn spawn_child(&mut self) -> anyhow::Result<()> {
        let binary = tv_core::platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        // mpv's own stderr goes to a side file; it is the only trace left
        // when the process dies before IPC comes up.
        let stderr_path = tv_core::platform::data_dir().join("mpv-stderr.log");
        let stderr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(&binary)
            .args(self.command_line())
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .spawn()?;
        info!("mpv: started pid {:?}, stderr in {}", child.id(), stderr_path.display());
        self.child = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        let socket = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket).await;

        self.spawn_child()?;

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if socket.exists() {
                break;
            }
        }
        if !socket.exists() {
            anyhow::bail!("mpv IPC socket never appeared");
        }
        // The socket file can exist before mpv accepts connections.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let stream = UnixStream::connect(&socket).await?;
        info!("mpv: IPC connected");
        let (read, write) = stream.into_split();
        Ok(wire_up(read, write, event_tx))
    }

    /// Connect to a socket left by a still-running mpv, without spawning.
    #[cfg(unix)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        let socket = std::path::PathBuf::from(&self.socket_name);
        if !socket.exists() {
            return None;
        }
        match UnixStream::connect(&socket).await {
            Ok(stream) => {
                info!("mpv: reusing existing IPC socket");
                let (read, write) = stream.into_split();
                Some(wire_up(read, write, event_tx))
            }
            Err(e) => {
                warn!("mpv: reconnect failed: {e}");
                None
            }
        }
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        self.spawn_child()?;

        let pipe = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe) {
                info!("mpv: IPC connected");
                let (read, write) = tokio::io::split(client);
                return Ok(wire_up(read, write, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe never appeared")
    }

    #[cfg(windows)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        let pipe = format!(r"\\.\pipe\{}", self.socket_name);
        match ClientOptions::new().open(&pipe) {
            Ok(client) => {
                info!("mpv: reusing existing named pipe");
                let (read, write) = tokio::io::split(client);
                Some(wire_up(read, write, event_tx))
            }
            Err(e) => {
                warn!("mpv: reconnect failed: {e}");
                None
            }
        }
    }
}

/// Start the reader and writer tasks for one connection and hand back the
/// handle they serve.
fn wire_up<R, W>(read: R, write: W, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let replies: Replies = Arc::new(Mutex::new(HashMap::new()));
    let (tx, rx) = mpsc::channel::<Outbound>(64);

    tokio::spawn(write_loop(write, rx, replies.clone()));
    tokio::spawn(read_loop(BufReader::new(read), replies, event_tx));

    MpvHandle {
        tx,
        next_id: Arc::new(AtomicU64::new(1)),
    }
}

async fn read_loop<R>(mut reader: BufReader<R>, replies: Replies, event_tx: mpsc::Sender<MpvEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv: IPC closed");
                fail_pending(&replies, "mpv IPC connection closed").await;
                return;
            }
            Ok(_) => {
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                let msg: Value = match serde_json::from_str(text) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv: unparseable line {text:?}: {e}");
                        continue;
                    }
                };
                match msg.get("request_id").and_then(Value::as_u64) {
                    Some(id) => {
                        if let Some(waiter) = replies.lock().await.remove(&id) {
                            let _ = waiter.send(reply_result(msg));
                        } else {
                            debug!("mpv: reply for unknown request {id}");
                        }
                    }
                    None => {
                        let _ = event_tx.send(MpvEvent { raw: msg }).await;
                    }
                }
            }
            Err(e) => {
                warn!("mpv: IPC read failed: {e}");
                fail_pending(&replies, "mpv IPC read failed").await;
                return;
            }
        }
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<Outbound>, replies: Replies)
where
    W: AsyncWrite + Unpin,
{
    while let Some(out) = rx.recv().await {
        // The waiter must be registered before the bytes hit the wire, or a
        // fast reply races the insert.
        replies.lock().await.insert(out.id, out.reply);
        if let Err(e) = writer.write_all(out.line.as_bytes()).await {
            warn!("mpv: IPC write failed: {e}");
            if let Some(waiter) = replies.lock().await.remove(&out.id) {
                let _ = waiter.send(Err(anyhow::anyhow!("mpv IPC write failed: {e}")));
            }
            return;
        }
    }
    debug!("mpv: writer done");
}

/// mpv signals success in-band; anything else in `error` is a failure.
fn reply_result(msg: Value) -> anyhow::Result<Value> {
    match msg["error"].as_str() {
        Some("success") => Ok(msg),
        other => Err(anyhow::anyhow!(
            "mpv error: {}",
            other.unwrap_or("unknown error")
        )),
    }
}

async fn fail_pending(replies: &Replies, reason: &str) {
    for (_, waiter) in replies.lock().await.drain() {
        let _ = waiter.send(Err(anyhow::anyhow!("{reason}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_change_extraction() {
        let ev = MpvEvent {
            raw: json!({"event": "property-change", "id": OBS_SUB_TEXT, "data": "cue"}),
        };
        let (id, data) = ev.as_property_change().unwrap();
        assert_eq!(id, OBS_SUB_TEXT);
        assert_eq!(data.as_str(), Some("cue"));

        let other = MpvEvent { raw: json!({"event": "end-file"}) };
        assert!(other.as_property_change().is_none());
        assert_eq!(other.event_name(), Some("end-file"));
    }

    #[test]
    fn replies_map_error_field() {
        assert!(reply_result(json!({"error": "success", "data": 1})).is_ok());
        let err = reply_result(json!({"error": "property not found"})).unwrap_err();
        assert!(err.to_string().contains("property not found"));
        assert!(reply_result(json!({})).is_err());
    }

    #[test]
    fn volume_is_sent_as_clamped_percent() {
        assert_eq!(percent(0.5), 50.0);
        assert_eq!(percent(1.7), 100.0);
        assert_eq!(percent(-0.1), 0.0);
    }
}
