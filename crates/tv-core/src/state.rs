use crate::channel::{Channel, PlaybackStatus, PlayerHealth, PlayerState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    pub last_channel_idx: Option<usize>,
    pub volume: f32,
}

pub struct StateManager {
    state: Arc<RwLock<PlayerState>>,
    state_file: PathBuf,
}

impl StateManager {
    /// `default_volume` applies on first run, before any state was persisted.
    pub fn new(state_file: PathBuf, channels: Vec<Channel>, default_volume: f32) -> Self {
        let persistent = Self::load_persistent(&state_file).unwrap_or(PersistentState {
            last_channel_idx: None,
            volume: default_volume.clamp(0.0, 1.0),
        });

        // A persisted index can outlive a shrinking playlist.
        let last_idx = persistent
            .last_channel_idx
            .filter(|&i| i < channels.len());

        let state = PlayerState {
            rev: 1,
            channels,
            current_channel: last_idx,
            volume: persistent.volume,
            is_playing: false,
            is_paused: false,
            playback_status: PlaybackStatus::Idle,
            embedded_caption: None,
            time_pos_secs: None,
            duration_secs: None,
            player_health: PlayerHealth::Absent,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            state_file,
        }
    }

    pub async fn get_state(&self) -> PlayerState {
        self.state.read().await.clone()
    }

    pub async fn set_playing(&self, idx: usize) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.current_channel = Some(idx);
            state.is_playing = true;
            state.playback_status = PlaybackStatus::Connecting;
            state.embedded_caption = None; // clear stale cue from previous channel
            state.time_pos_secs = None;
            state.duration_secs = None;
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn set_stopped(&self) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.is_playing = false;
            state.playback_status = PlaybackStatus::Idle;
            state.embedded_caption = None;
            state.time_pos_secs = None;
            state.duration_secs = None;
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn set_playback_status(&self, status: PlaybackStatus) {
        let mut state = self.state.write().await;
        state.is_playing = matches!(status, PlaybackStatus::Playing | PlaybackStatus::Paused);
        state.is_paused = status == PlaybackStatus::Paused;
        state.playback_status = status;
        state.rev += 1;
    }

    pub async fn set_player_health(&self, health: PlayerHealth) {
        let mut state = self.state.write().await;
        state.player_health = health;
        state.rev += 1;
    }

    pub async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        {
            let mut state = self.state.write().await;
            state.volume = volume.clamp(0.0, 1.0);
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn set_embedded_caption(&self, text: Option<String>) {
        let mut state = self.state.write().await;
        state.embedded_caption = text;
        state.rev += 1;
    }

    pub async fn set_timeline(&self, time_pos_secs: Option<f64>, duration_secs: Option<f64>) {
        let mut state = self.state.write().await;
        state.time_pos_secs = time_pos_secs;
        state.duration_secs = duration_secs;
        state.rev += 1;
    }

    pub async fn next_channel(&self) -> anyhow::Result<()> {
        let channels_len = {
            let state = self.state.read().await;
            state.channels.len()
        };

        if channels_len == 0 {
            return Ok(());
        }

        {
            let mut state = self.state.write().await;
            let current = state.current_channel.unwrap_or(0);
            let next = (current + 1) % channels_len;
            state.current_channel = Some(next);
            state.is_playing = true;
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn prev_channel(&self) -> anyhow::Result<()> {
        let channels_len = {
            let state = self.state.read().await;
            state.channels.len()
        };

        if channels_len == 0 {
            return Ok(());
        }

        {
            let mut state = self.state.write().await;
            let current = state.current_channel.unwrap_or(0);
            let prev = if current == 0 {
                channels_len - 1
            } else {
                current - 1
            };
            state.current_channel = Some(prev);
            state.is_playing = true;
            state.rev += 1;
        }
        self.save().await
    }

    pub async fn random_channel(&self) -> anyhow::Result<()> {
        use rand::Rng;

        let channels_len = {
            let state = self.state.read().await;
            state.channels.len()
        };

        if channels_len == 0 {
            return Ok(());
        }

        let random_idx = rand::thread_rng().gen_range(0..channels_len);

        {
            let mut state = self.state.write().await;
            state.current_channel = Some(random_idx);
            state.is_playing = true;
            state.rev += 1;
        }
        self.save().await
    }

    async fn save(&self) -> anyhow::Result<()> {
        let state = self.state.read().await;
        let persistent = PersistentState {
            last_channel_idx: state.current_channel,
            volume: state.volume,
        };

        if let Some(parent) = self.state_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&persistent)?;
        tokio::fs::write(&self.state_file, json).await?;
        Ok(())
    }

    fn load_persistent(state_file: &PathBuf) -> Option<PersistentState> {
        let content = std::fs::read_to_string(state_file).ok()?;
        serde_json::from_str::<PersistentState>(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(n: usize) -> Vec<Channel> {
        (0..n)
            .map(|i| Channel {
                name: format!("ch{i}"),
                url: format!("http://example.com/{i}.m3u8"),
                ..Channel::default()
            })
            .collect()
    }

    fn tmp_state_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        (dir, path)
    }

    #[tokio::test]
    async fn every_mutation_bumps_rev() {
        let (_dir, path) = tmp_state_file();
        let mgr = StateManager::new(path, channels(3), 0.5);

        let before = mgr.get_state().await.rev;
        mgr.set_playing(1).await.unwrap();
        mgr.set_embedded_caption(Some("cue".into())).await;
        mgr.set_playback_status(PlaybackStatus::Playing).await;
        let after = mgr.get_state().await;
        assert_eq!(after.rev, before + 3);
        assert_eq!(after.embedded_caption.as_deref(), Some("cue"));
        assert_eq!(after.playback_status, PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn switching_channels_clears_stale_caption() {
        let (_dir, path) = tmp_state_file();
        let mgr = StateManager::new(path, channels(2), 0.5);

        mgr.set_playing(0).await.unwrap();
        mgr.set_embedded_caption(Some("old cue".into())).await;
        mgr.set_playing(1).await.unwrap();
        assert_eq!(mgr.get_state().await.embedded_caption, None);
    }

    #[tokio::test]
    async fn next_prev_wrap_around() {
        let (_dir, path) = tmp_state_file();
        let mgr = StateManager::new(path, channels(3), 0.5);

        mgr.set_playing(2).await.unwrap();
        mgr.next_channel().await.unwrap();
        assert_eq!(mgr.get_state().await.current_channel, Some(0));
        mgr.prev_channel().await.unwrap();
        assert_eq!(mgr.get_state().await.current_channel, Some(2));
    }

    #[tokio::test]
    async fn persistence_round_trip_and_index_bound() {
        let (_dir, path) = tmp_state_file();
        {
            let mgr = StateManager::new(path.clone(), channels(5), 0.5);
            mgr.set_playing(4).await.unwrap();
            mgr.set_volume(0.8).await.unwrap();
        }
        // Reload against a shorter playlist: saved index 4 is out of range.
        let mgr = StateManager::new(path.clone(), channels(3), 0.5);
        let state = mgr.get_state().await;
        assert_eq!(state.current_channel, None);
        assert!((state.volume - 0.8).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let (_dir, path) = tmp_state_file();
        let mgr = StateManager::new(path, channels(1), 0.5);
        mgr.set_volume(1.7).await.unwrap();
        assert_eq!(mgr.get_state().await.volume, 1.0);
        mgr.set_volume(-0.2).await.unwrap();
        assert_eq!(mgr.get_state().await.volume, 0.0);
    }
}
