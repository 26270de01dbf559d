use serde::{Deserialize, Serialize};

/// A playable TV channel or stream entry from a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Channel {
    pub name: String,
    pub url: String,
    /// IPTV category / group-title (e.g. "FILMES", "SERIES", "NOTICIAS").
    #[serde(default, alias = "category")]
    pub group: String,
    /// Channel logo URL from tvg-logo, empty when the playlist has none.
    #[serde(default)]
    pub logo: String,
    /// EPG identifier from tvg-id.
    #[serde(default)]
    pub tvg_id: String,
}

/// Detailed playback status — reflects actual mpv state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / explicitly stopped
    Connecting, // loadfile sent, mpv buffering/connecting
    Playing,    // core-idle=false, video/audio flowing
    Paused,     // explicitly paused
    Error,      // failed to play (timeout or mpv error)
}

/// Health of the mpv process as observed by the player core.
///
/// Transitions:
///   Absent -> Starting -> Running -> Dead -> Restarting -> Starting ...
///   Running -> Degraded(reason) -> Running | Dead
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlayerHealth {
    /// mpv process does not exist yet (before first use).
    #[default]
    Absent,
    /// Process is spawning / socket not yet available.
    Starting,
    /// Socket connected, IPC responding normally.
    Running,
    /// Connected but IPC is slow / returning errors.
    Degraded(String),
    /// Process exited or socket closed.
    Dead,
    /// Restarting after death.
    Restarting,
}

impl PlayerHealth {
    /// Short label for badges / status bar (≤5 chars).
    pub fn badge_label(&self) -> Option<&str> {
        match self {
            PlayerHealth::Absent => None,
            PlayerHealth::Starting => Some("INIT"),
            PlayerHealth::Running => None, // normal — no badge needed
            PlayerHealth::Degraded(_) => Some("DEGD"),
            PlayerHealth::Dead => Some("DEAD"),
            PlayerHealth::Restarting => Some("REST"),
        }
    }

    /// True when mpv is in an error/non-running state users should notice.
    pub fn is_unhealthy(&self) -> bool {
        matches!(
            self,
            PlayerHealth::Degraded(_) | PlayerHealth::Dead | PlayerHealth::Restarting
        )
    }
}

/// Full state of the player.  `rev` is a monotonically increasing counter
/// incremented every time the state changes; clients can use it to detect
/// missed updates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerState {
    /// Monotonic revision counter — incremented on every state change.
    #[serde(default)]
    pub rev: u64,
    pub channels: Vec<Channel>,
    pub current_channel: Option<usize>,
    pub volume: f32,
    pub is_playing: bool,
    pub playback_status: PlaybackStatus,
    /// Latest embedded subtitle cue (mpv `sub-text`), None when no cue is
    /// currently on screen.
    pub embedded_caption: Option<String>,
    pub time_pos_secs: Option<f64>,
    pub duration_secs: Option<f64>,
    /// Health of the mpv process as tracked by the player core.
    #[serde(default)]
    pub player_health: PlayerHealth,
    /// Whether playback is currently paused (kept separate from
    /// playback_status for clarity).
    #[serde(default)]
    pub is_paused: bool,
}

impl PlayerState {
    /// Convenience: currently playing channel, if any.
    pub fn current(&self) -> Option<&Channel> {
        self.current_channel.and_then(|i| self.channels.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_badges() {
        assert_eq!(PlayerHealth::Absent.badge_label(), None);
        assert_eq!(PlayerHealth::Running.badge_label(), None);
        assert_eq!(PlayerHealth::Dead.badge_label(), Some("DEAD"));
        assert!(PlayerHealth::Degraded("slow ipc".into()).is_unhealthy());
        assert!(!PlayerHealth::Starting.is_unhealthy());
    }

    #[test]
    fn channel_json_accepts_category_alias() {
        // The original per-category playlist files call the group "category".
        let ch: Channel = serde_json::from_str(
            r#"{"name":"Cine A","url":"http://example.com/a.m3u8","category":"FILMES"}"#,
        )
        .unwrap();
        assert_eq!(ch.group, "FILMES");
        assert!(ch.logo.is_empty());
    }
}
