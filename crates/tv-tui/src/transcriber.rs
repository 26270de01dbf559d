//! Speech-to-text sidecar bridge.
//!
//! The transcriber runs as a separate process (`teletv-stt`) that captures
//! system audio and prints one JSON event per line on stdout:
//!
//! ```text
//!   {"event":"status","message":"downloading model","progress":0.42}
//!   {"event":"listening"}
//!   {"event":"partial","text":"boa noite"}
//!   {"event":"final","text":"boa noite, Brasil"}
//! ```
//!
//! This module owns the child process, folds the event stream into a
//! `CaptionServiceSnapshot`, and broadcasts `ServiceUpdated` whenever the
//! snapshot changes.  The caption priority decision itself lives in
//! `tv_core::caption::resolve` — here we only keep the snapshot current.

use std::path::PathBuf;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tv_core::caption::CaptionServiceSnapshot;
use tv_core::config::Config;

use crate::BroadcastMessage;

/// One line of sidecar stdout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TranscriberEvent {
    Status {
        message: String,
        #[serde(default)]
        progress: Option<f32>,
    },
    Listening,
    Partial {
        text: String,
    },
    Final {
        text: String,
    },
}

/// Fold one sidecar event into the service snapshot.
pub fn apply_event(snapshot: &mut CaptionServiceSnapshot, event: TranscriberEvent) {
    match event {
        TranscriberEvent::Status { message, progress } => {
            snapshot.status_message = message;
            snapshot.download_progress = progress.unwrap_or(0.0);
            snapshot.is_listening = false;
            snapshot.current_text.clear();
        }
        TranscriberEvent::Listening => {
            snapshot.is_listening = true;
            snapshot.status_message.clear();
            snapshot.download_progress = 0.0;
            snapshot.current_text.clear();
        }
        TranscriberEvent::Partial { text } | TranscriberEvent::Final { text } => {
            snapshot.current_text = text;
        }
    }
}

/// Snapshot broadcast when the sidecar goes away.
pub fn stopped_snapshot(message: &str) -> CaptionServiceSnapshot {
    CaptionServiceSnapshot {
        status_message: message.to_string(),
        ..CaptionServiceSnapshot::default()
    }
}

/// Resolve the transcriber executable: config override first, then discovery.
pub fn resolve_command(config: &Config) -> Option<PathBuf> {
    if !config.captions.command.is_empty() {
        return Some(PathBuf::from(&config.captions.command));
    }
    tv_core::platform::find_transcriber_binary()
}

/// Running sidecar process.  Dropping (or aborting) the handle kills the child.
pub struct TranscriberHandle {
    task: tokio::task::JoinHandle<()>,
}

impl TranscriberHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Spawn the sidecar and the task that pumps its stdout into the broadcast
/// channel.  Returns `Err` if the process cannot be started.
pub fn spawn(
    command: PathBuf,
    model: String,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> anyhow::Result<TranscriberHandle> {
    info!("transcriber: spawning {:?} (model={})", command, model);
    let mut child = tokio::process::Command::new(&command)
        .arg("--model")
        .arg(&model)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("transcriber stdout not captured"))?;

    let task = tokio::spawn(async move {
        let mut reader = BufReader::new(stdout).lines();
        let mut snapshot = CaptionServiceSnapshot::default();

        loop {
            match reader.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let event: TranscriberEvent = match serde_json::from_str(trimmed) {
                        Ok(e) => e,
                        Err(e) => {
                            debug!("transcriber: invalid event '{}': {}", trimmed, e);
                            continue;
                        }
                    };
                    let before = snapshot.clone();
                    apply_event(&mut snapshot, event);
                    if snapshot != before {
                        let _ = broadcast_tx
                            .send(BroadcastMessage::ServiceUpdated(snapshot.clone()));
                    }
                }
                Ok(None) => {
                    info!("transcriber: stdout closed");
                    break;
                }
                Err(e) => {
                    warn!("transcriber: read error: {}", e);
                    break;
                }
            }
        }

        // The process is gone (or its pipe is); report the exit so the UI
        // stops showing a live indicator.
        match child.wait().await {
            Ok(status) if status.success() => {
                let _ = broadcast_tx.send(BroadcastMessage::ServiceUpdated(stopped_snapshot(
                    "captions stopped",
                )));
            }
            Ok(status) => {
                warn!("transcriber: exited with {}", status);
                let _ = broadcast_tx.send(BroadcastMessage::ServiceUpdated(stopped_snapshot(
                    "caption service exited",
                )));
            }
            Err(e) => {
                warn!("transcriber: wait failed: {}", e);
                let _ = broadcast_tx.send(BroadcastMessage::ServiceUpdated(stopped_snapshot(
                    "caption service exited",
                )));
            }
        }
    });

    Ok(TranscriberHandle { task })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_event_kinds() {
        let ev: TranscriberEvent =
            serde_json::from_str(r#"{"event":"status","message":"downloading model","progress":0.42}"#)
                .unwrap();
        assert_eq!(
            ev,
            TranscriberEvent::Status {
                message: "downloading model".into(),
                progress: Some(0.42)
            }
        );

        let ev: TranscriberEvent = serde_json::from_str(r#"{"event":"listening"}"#).unwrap();
        assert_eq!(ev, TranscriberEvent::Listening);

        let ev: TranscriberEvent =
            serde_json::from_str(r#"{"event":"partial","text":"boa noite"}"#).unwrap();
        assert_eq!(
            ev,
            TranscriberEvent::Partial {
                text: "boa noite".into()
            }
        );

        let ev: TranscriberEvent =
            serde_json::from_str(r#"{"event":"final","text":"boa noite, Brasil"}"#).unwrap();
        assert_eq!(
            ev,
            TranscriberEvent::Final {
                text: "boa noite, Brasil".into()
            }
        );
    }

    #[test]
    fn status_without_progress_defaults_to_zero() {
        let ev: TranscriberEvent =
            serde_json::from_str(r#"{"event":"status","message":"warming up"}"#).unwrap();
        let mut snap = CaptionServiceSnapshot::default();
        apply_event(&mut snap, ev);
        assert_eq!(snap.status_message, "warming up");
        assert_eq!(snap.download_progress, 0.0);
        assert!(!snap.is_listening);
    }

    #[test]
    fn listening_clears_status_and_text() {
        let mut snap = CaptionServiceSnapshot {
            status_message: "loading model".into(),
            download_progress: 0.9,
            ..CaptionServiceSnapshot::default()
        };
        apply_event(&mut snap, TranscriberEvent::Listening);
        assert!(snap.is_listening);
        assert!(snap.status_message.is_empty());
        assert_eq!(snap.download_progress, 0.0);
        assert!(snap.current_text.is_empty());
    }

    #[test]
    fn partial_then_final_replace_text_in_place() {
        let mut snap = CaptionServiceSnapshot::default();
        apply_event(&mut snap, TranscriberEvent::Listening);
        apply_event(
            &mut snap,
            TranscriberEvent::Partial {
                text: "boa".into(),
            },
        );
        assert_eq!(snap.current_text, "boa");
        assert!(snap.is_listening);
        apply_event(
            &mut snap,
            TranscriberEvent::Final {
                text: "boa noite".into(),
            },
        );
        assert_eq!(snap.current_text, "boa noite");
    }

    #[test]
    fn stopped_snapshot_is_not_listening() {
        let snap = stopped_snapshot("captions stopped");
        assert!(!snap.is_listening);
        assert_eq!(snap.status_message, "captions stopped");
        assert!(snap.current_text.is_empty());
    }
}
