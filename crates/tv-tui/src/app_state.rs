//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for player state, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::collections::HashMap;
use std::path::PathBuf;

use tv_core::caption::{resolve, CaptionServiceSnapshot, CaptionView, PlaybackCaptions};
use tv_core::channel::PlayerState;

use crate::update::UpdateInfo;
use crate::widgets::status_bar::InputMode;

/// The full shared state of the application.
/// Components read this; only the App event-loop writes to it.
pub struct AppState {
    // ── Player ──────────────────────────────────────────────────────────────
    pub player: PlayerState,
    pub connected: bool,

    // ── Captions ────────────────────────────────────────────────────────────
    /// Latest snapshot from the speech-to-text sidecar.
    pub captions: CaptionServiceSnapshot,
    /// Whether the sidecar is supposed to be running (user toggle).
    pub captions_enabled: bool,

    // ── Stars / recent ──────────────────────────────────────────────────────
    pub channel_stars: HashMap<String, u8>,
    pub recent_channel: HashMap<String, i64>,

    // ── Updates ─────────────────────────────────────────────────────────────
    pub update: Option<UpdateInfo>,

    // ── UI mode ─────────────────────────────────────────────────────────────
    pub input_mode: InputMode,

    // ── Session ─────────────────────────────────────────────────────────────
    pub last_nonzero_volume: f32,
    /// Log messages surfaced from the core event loop.
    pub logs: Vec<String>,
    /// Cached lines from tui.log (refreshed periodically by App).
    pub tui_log_lines: Vec<String>,

    // ── Paths ───────────────────────────────────────────────────────────────
    pub tui_log_path: PathBuf,
}

impl AppState {
    /// Convenience: currently playing channel name.
    pub fn current_channel_name(&self) -> Option<&str> {
        self.player
            .current_channel
            .and_then(|i| self.player.channels.get(i))
            .map(|c| c.name.as_str())
    }

    /// Stars for a channel by name.
    pub fn channel_stars_for(&self, name: &str) -> u8 {
        self.channel_stars.get(name).copied().unwrap_or(0)
    }

    /// What the caption area should show right now.  Recomputed from the
    /// current player state and sidecar snapshot on every call; there is no
    /// cached caption state anywhere in the UI.
    pub fn caption_view(&self) -> CaptionView {
        let playback = PlaybackCaptions {
            embedded_text: self.player.embedded_caption.clone().unwrap_or_default(),
        };
        if self.captions_enabled {
            resolve(&playback, &self.captions)
        } else {
            resolve(&playback, &CaptionServiceSnapshot::default())
        }
    }
}
