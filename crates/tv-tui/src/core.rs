/// PlayerCore — single-owner event loop for all mutable playback state.
///
/// Runs embedded in the TUI process.  All tasks that need to mutate playback
/// state send `CoreEvent` messages to this loop.  PlayerCore owns
/// `StateManager` and `MpvDriver` exclusively; no other task touches them.
///
/// After each event that mutates state, PlayerCore broadcasts a
/// `BroadcastMessage::StateUpdated` (or `CaptionUpdated`) to all listeners via
/// a `tokio::sync::broadcast` channel.
///
/// mpv integration is **property-observation-driven**: on every fresh
/// connection we send `observe_property` for core-idle, pause, sub-text,
/// time-pos, and duration.  mpv pushes a `property-change` event whenever any
/// of those values change.  We never poll; the 10-second heartbeat tick only
/// checks process liveness.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tv_core::channel::{Channel, PlaybackStatus, PlayerHealth};
use tv_core::config::Config;
use tv_core::playlist::{load_playlist, parse_playlist_str};
use tv_core::state::StateManager;

use crate::mpv::{
    MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_DURATION, OBS_PAUSE, OBS_SUB_TEXT,
    OBS_TIME_POS,
};
use crate::BroadcastMessage;

// ── Command ───────────────────────────────────────────────────────────────────

/// Playback commands accepted by the PlayerCore loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play { channel_idx: usize },
    Stop,
    Next,
    Prev,
    Random,
    TogglePause,
    Volume { value: f32 },
    SeekRelative { seconds: f64 },
}

// ── CoreEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the PlayerCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A command from the TUI.
    ClientCommand(Command),
    /// Heartbeat — check process liveness.
    HeartbeatTick,
    /// Raw mpv unsolicited event (forwarded from reader task).
    MpvEvent(MpvEvent),
    /// Shutdown requested.
    #[allow(dead_code)]
    Shutdown,
}

// ── PlayerCore ────────────────────────────────────────────────────────────────

pub struct PlayerCore {
    state_manager: Arc<StateManager>,
    mpv_driver: MpvDriver,
    /// Live handle to the mpv IO tasks.  `None` when mpv is not yet connected.
    mpv_handle: Option<MpvHandle>,
    /// Channel to forward mpv events back into our own event loop.
    mpv_event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    /// true when the user has requested playback (used to derive status).
    intend_playing: bool,
    /// Current tracked health of the mpv process.
    player_health: PlayerHealth,
    /// Observed property values from mpv push events.
    obs_core_idle: Option<bool>,
    obs_pause: bool,
    obs_sub_text: Option<String>,
    obs_time_pos: Option<f64>,
    obs_duration: Option<f64>,
    /// When we started connecting/buffering (to detect timeout).
    connecting_since: Option<tokio::time::Instant>,
    /// Last derived playback status (to avoid redundant broadcasts).
    last_status: PlaybackStatus,
    /// Last subtitle cue broadcast (to avoid duplicate CaptionUpdated).
    last_caption: Option<String>,
}

impl PlayerCore {
    pub async fn new(
        config: &Config,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> anyhow::Result<Self> {
        let channels = load_channels(config).await?;
        let state_manager = Arc::new(StateManager::new(
            config.paths.state_file.clone(),
            channels,
            config.player.default_volume,
        ));

        let initial_volume = state_manager.get_state().await.volume;
        let mut mpv_driver = MpvDriver::new(config.player.mpv_args.clone());
        mpv_driver.last_volume = initial_volume;

        Ok(Self {
            state_manager,
            mpv_driver,
            mpv_handle: None,
            mpv_event_tx: event_tx,
            broadcast_tx,
            intend_playing: false,
            player_health: PlayerHealth::Absent,
            obs_core_idle: None,
            obs_pause: false,
            obs_sub_text: None,
            obs_time_pos: None,
            obs_duration: None,
            connecting_since: None,
            last_status: PlaybackStatus::Idle,
            last_caption: None,
        })
    }

    /// Borrow the state manager (for snapshots from the UI task).
    pub fn state_manager(&self) -> Arc<StateManager> {
        Arc::clone(&self.state_manager)
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or the event channel is closed (TUI exited).
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("PlayerCore: starting event loop");

        // Kick off the heartbeat ticker — used for process liveness checks.
        let heartbeat_tx = self.mpv_event_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(10)).await;
                if heartbeat_tx.send(CoreEvent::HeartbeatTick).await.is_err() {
                    break;
                }
            }
        });

        loop {
            let evt = event_rx.recv().await;
            match evt {
                None => {
                    info!("PlayerCore: event channel closed, shutting down");
                    break;
                }

                Some(CoreEvent::Shutdown) => {
                    info!("PlayerCore: shutdown requested");
                    break;
                }

                Some(CoreEvent::ClientCommand(cmd)) => {
                    info!("PlayerCore: command {:?}", cmd);
                    if let Err(e) = self.handle_command(cmd).await {
                        error!("PlayerCore: command error: {}", e);
                    }
                }

                Some(CoreEvent::MpvEvent(evt)) => {
                    self.handle_mpv_event(evt).await;
                }

                Some(CoreEvent::HeartbeatTick) => {
                    // Check process liveness — if mpv died, degrade health
                    if self.mpv_handle.is_some() && !self.mpv_driver.process_alive() {
                        warn!("PlayerCore: heartbeat: mpv process died");
                        self.mpv_handle = None;
                        self.set_player_health(PlayerHealth::Dead).await;
                        // Reset observed state
                        self.reset_observed_state();
                    } else if let Some(handle) = self.mpv_handle.clone() {
                        // Process is alive; make sure IPC still answers.
                        match handle.ping().await {
                            Ok(()) => self.set_player_health(PlayerHealth::Running).await,
                            Err(e) => {
                                warn!("PlayerCore: heartbeat: mpv IPC unresponsive: {}", e);
                                self.set_player_health(PlayerHealth::Degraded(e.to_string()))
                                    .await;
                            }
                        }
                    }

                    // Also check connecting timeout (in case property events never arrive)
                    if self.intend_playing && !self.obs_pause {
                        self.maybe_update_status().await;
                    }
                }
            }
        }

        self.cleanup().await?;
        Ok(())
    }

    // ── mpv event handler ─────────────────────────────────────────────────────

    async fn handle_mpv_event(&mut self, evt: MpvEvent) {
        debug!("mpv event: {:?}", evt.raw);

        if let Some((obs_id, data)) = evt.as_property_change() {
            match obs_id {
                OBS_CORE_IDLE => {
                    let val = data.as_bool();
                    if val != self.obs_core_idle {
                        debug!("mpv: core-idle → {:?}", val);
                        self.obs_core_idle = val;
                        self.maybe_update_status().await;
                        // push timeline immediately too
                        self.state_manager
                            .set_timeline(self.obs_time_pos, self.obs_duration)
                            .await;
                        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                    }
                }
                OBS_PAUSE => {
                    let val = data.as_bool().unwrap_or(false);
                    if val != self.obs_pause {
                        debug!("mpv: pause → {}", val);
                        self.obs_pause = val;
                        self.maybe_update_status().await;
                    }
                }
                OBS_SUB_TEXT => {
                    // mpv reports "" between cues and null with no subtitle track.
                    // The cue itself is passed through untouched so the UI can
                    // show it exactly as authored.
                    let raw_val = match data {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Null => None,
                        _ => data.as_str().map(|s| s.to_string()),
                    };
                    let val = raw_val.filter(|t| !t.is_empty());
                    if val != self.obs_sub_text {
                        debug!("mpv: sub-text {:?} → {:?}", self.obs_sub_text, val);
                        self.obs_sub_text = val.clone();
                        self.state_manager.set_embedded_caption(val.clone()).await;
                        if val != self.last_caption {
                            self.last_caption = val.clone();
                            let _ = self.broadcast_tx.send(BroadcastMessage::CaptionUpdated(val));
                        }
                    }
                }
                OBS_TIME_POS => {
                    let val = if data.is_null() { None } else { data.as_f64() };
                    self.obs_time_pos = val;
                    self.state_manager
                        .set_timeline(self.obs_time_pos, self.obs_duration)
                        .await;
                    let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                }
                OBS_DURATION => {
                    let val = if data.is_null() { None } else { data.as_f64() };
                    if val != self.obs_duration {
                        self.obs_duration = val;
                        self.state_manager
                            .set_timeline(self.obs_time_pos, self.obs_duration)
                            .await;
                        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                    }
                }
                _ => {}
            }
            return;
        }

        // Handle named events (non-property-change)
        match evt.event_name() {
            Some("end-file") => {
                let reason = evt
                    .raw
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                info!("mpv: end-file reason={}", reason);
                if reason == "error" || reason == "network" || reason == "quit" {
                    // If we intended to play, mark error
                    if self.intend_playing && !self.obs_pause {
                        warn!("mpv: stream ended with error/network reason, marking Error");
                        self.state_manager
                            .set_playback_status(PlaybackStatus::Error)
                            .await;
                        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                        self.last_status = PlaybackStatus::Error;
                        self.connecting_since = None;
                    }
                }
                // Clear subtitle cue on stream end
                self.clear_caption().await;
                // Reset timeline
                self.obs_time_pos = None;
                self.obs_duration = None;
                self.state_manager.set_timeline(None, None).await;
                self.obs_core_idle = Some(true);
                self.maybe_update_status().await;
            }
            Some("start-file") => {
                info!("mpv: start-file");
                self.connecting_since = None;
                self.obs_core_idle = Some(true); // will flip to false when frames flow
                self.maybe_update_status().await;
            }
            Some("file-loaded") => {
                info!("mpv: file-loaded — re-issuing observe_property");
                // Wait 50ms before re-observing so mpv has settled on the new file,
                // then re-register observations so mpv pushes current values immediately.
                if let Some(h) = self.mpv_handle.clone() {
                    tokio::spawn(async move {
                        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                        h.observe_all_properties().await;
                    });
                }
            }
            _ => {}
        }
    }

    /// Derive PlaybackStatus from observed state and update if changed.
    async fn maybe_update_status(&mut self) {
        let status = if !self.intend_playing {
            self.connecting_since = None;
            PlaybackStatus::Idle
        } else if self.obs_pause {
            self.connecting_since = None;
            PlaybackStatus::Paused
        } else {
            match self.obs_core_idle {
                Some(false) => {
                    self.connecting_since = None;
                    PlaybackStatus::Playing
                }
                other => {
                    let since = self
                        .connecting_since
                        .get_or_insert_with(tokio::time::Instant::now);
                    let elapsed = since.elapsed().as_secs();
                    debug!(
                        "mpv: waiting for playback core_idle={:?} elapsed={}s",
                        other, elapsed
                    );
                    if elapsed >= 15 {
                        warn!("mpv: no playback after {}s, marking Error", elapsed);
                        PlaybackStatus::Error
                    } else {
                        PlaybackStatus::Connecting
                    }
                }
            }
        };

        if status != self.last_status {
            info!("PlayerCore: status {:?} → {:?}", self.last_status, status);
            self.last_status = status;
            self.state_manager.set_playback_status(status).await;
            let _ = self
                .broadcast_tx
                .send(BroadcastMessage::Log(format!("playback: {:?}", status)));
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }

    async fn clear_caption(&mut self) {
        if self.obs_sub_text.is_some() {
            self.obs_sub_text = None;
            self.state_manager.set_embedded_caption(None).await;
        }
        if self.last_caption.is_some() {
            self.last_caption = None;
            let _ = self.broadcast_tx.send(BroadcastMessage::CaptionUpdated(None));
        }
    }

    fn reset_observed_state(&mut self) {
        self.obs_core_idle = None;
        self.obs_pause = false;
        self.obs_sub_text = None;
        self.obs_time_pos = None;
        self.obs_duration = None;
        self.connecting_since = None;
    }

    // ── mpv handle management ─────────────────────────────────────────────────

    /// Update tracked mpv health and broadcast state if it changed.
    async fn set_player_health(&mut self, health: PlayerHealth) {
        if self.player_health != health {
            info!(
                "PlayerCore: mpv health {:?} → {:?}",
                self.player_health, health
            );
            self.player_health = health.clone();
            self.state_manager.set_player_health(health).await;
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }

    async fn ensure_mpv_handle(&mut self) -> Option<MpvHandle> {
        // If we have a handle, check that the process is still alive
        if self.mpv_handle.is_some() && !self.mpv_driver.process_alive() {
            warn!("PlayerCore: mpv process died, dropping handle");
            self.mpv_handle = None;
            self.set_player_health(PlayerHealth::Dead).await;
            self.reset_observed_state();
        }

        if self.mpv_handle.is_none() {
            // Single channel + single forwarder task for this connection.
            // Both try_reconnect and spawn_and_connect receive a clone of the
            // same sender so only one forwarder is ever running.
            let (event_tx, event_rx) = mpsc::channel::<MpvEvent>(64);
            let core_tx = self.mpv_event_tx.clone();
            tokio::spawn(async move {
                let mut rx = event_rx;
                while let Some(evt) = rx.recv().await {
                    if core_tx.send(CoreEvent::MpvEvent(evt)).await.is_err() {
                        break;
                    }
                }
            });

            // Try to reconnect to an existing socket first, then spawn fresh.
            let handle = match self.mpv_driver.try_reconnect(event_tx.clone()).await {
                Some(h) => {
                    info!("PlayerCore: reconnected to existing mpv socket");
                    h
                }
                None => {
                    self.set_player_health(PlayerHealth::Starting).await;
                    match self.mpv_driver.spawn_and_connect(event_tx).await {
                        Ok(h) => h,
                        Err(e) => {
                            warn!("PlayerCore: failed to start mpv: {}", e);
                            self.set_player_health(PlayerHealth::Dead).await;
                            return None;
                        }
                    }
                }
            };

            self.set_player_health(PlayerHealth::Running).await;

            // Register property observations on the fresh handle.
            let h_clone = handle.clone();
            tokio::spawn(async move {
                h_clone.observe_all_properties().await;
            });

            self.mpv_handle = Some(handle);
        }

        self.mpv_handle.clone()
    }

    // ── command handlers ──────────────────────────────────────────────────────

    async fn handle_command(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Play { channel_idx } => self.play_channel(channel_idx).await?,
            Command::Stop => self.stop().await?,
            Command::Next => self.next().await?,
            Command::Prev => self.prev().await?,
            Command::Random => self.random().await?,
            Command::TogglePause => self.toggle_pause().await?,
            Command::Volume { value } => self.set_volume(value).await?,
            Command::SeekRelative { seconds } => self.seek_relative(seconds).await?,
        }
        Ok(())
    }

    async fn play_channel(&mut self, idx: usize) -> anyhow::Result<()> {
        let (channel, volume) = {
            let state = self.state_manager.get_state().await;
            (state.channels.get(idx).cloned(), state.volume)
        };

        if let Some(channel) = channel {
            info!("Playing channel: {}", channel.name);

            // Always reset the connecting timer when a new play command arrives,
            // even if the same channel is being replayed (user pressed Enter twice).
            self.connecting_since = None;
            self.obs_core_idle = None;

            self.intend_playing = true;
            self.state_manager.set_playing(idx).await?;
            self.clear_caption().await;
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);

            match self.ensure_mpv_handle().await {
                Some(handle) => {
                    if let Err(e) = handle.load_stream(&channel.url, volume).await {
                        warn!("Failed to load stream '{}': {}", channel.name, e);
                        self.intend_playing = false;
                        self.state_manager
                            .set_playback_status(PlaybackStatus::Error)
                            .await;
                        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                        return Ok(());
                    }
                    info!("Playing '{}' from {}", channel.name, channel.url);
                }
                None => {
                    warn!("No mpv handle available for channel '{}'", channel.name);
                    self.intend_playing = false;
                    self.state_manager
                        .set_playback_status(PlaybackStatus::Error)
                        .await;
                    let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
                }
            }
        }
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        info!("Stopping playback");
        self.intend_playing = false;
        self.connecting_since = None;
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.stop().await?;
        }
        self.state_manager.set_stopped().await?;
        self.clear_caption().await;
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        Ok(())
    }

    async fn next(&mut self) -> anyhow::Result<()> {
        self.state_manager.next_channel().await?;
        if let Some(idx) = self.state_manager.get_state().await.current_channel {
            self.play_channel(idx).await?;
        }
        Ok(())
    }

    async fn prev(&mut self) -> anyhow::Result<()> {
        self.state_manager.prev_channel().await?;
        if let Some(idx) = self.state_manager.get_state().await.current_channel {
            self.play_channel(idx).await?;
        }
        Ok(())
    }

    async fn random(&mut self) -> anyhow::Result<()> {
        self.state_manager.random_channel().await?;
        if let Some(idx) = self.state_manager.get_state().await.current_channel {
            self.play_channel(idx).await?;
        }
        Ok(())
    }

    async fn set_volume(&mut self, value: f32) -> anyhow::Result<()> {
        self.state_manager.set_volume(value).await?;
        self.mpv_driver.last_volume = value;
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.set_volume(value).await?;
        }
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        Ok(())
    }

    async fn toggle_pause(&mut self) -> anyhow::Result<()> {
        let state = self.state_manager.get_state().await;
        if state.current_channel.is_none() {
            return Ok(());
        }
        if let Some(handle) = self.mpv_handle.as_ref() {
            // Use the locally-observed pause state rather than an IPC round-trip
            // (avoids a 5-second timeout if mpv is buffering).
            handle.set_pause(!self.obs_pause).await?;
        }
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        Ok(())
    }

    async fn seek_relative(&mut self, seconds: f64) -> anyhow::Result<()> {
        let state = self.state_manager.get_state().await;
        // Seeking only makes sense for VOD entries with a known duration.
        if state.duration_secs.is_none() {
            return Ok(());
        }
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.seek_relative(seconds).await?;
        }
        Ok(())
    }

    // ── helpers ───────────────────────────────────────────────────────────────

    async fn cleanup(&mut self) -> anyhow::Result<()> {
        info!("PlayerCore: cleanup — killing mpv");
        if let Some(handle) = self.mpv_handle.take() {
            let _ = handle.stop().await;
        }
        self.mpv_driver.kill().await;
        Ok(())
    }
}

// ── channel loader ────────────────────────────────────────────────────────────

pub async fn load_channels(config: &Config) -> anyhow::Result<Vec<Channel>> {
    use std::path::PathBuf;

    // 1. User config dir (highest priority — user's custom playlist)
    let playlist_path = &config.channels.playlist_path;
    if playlist_path.exists() {
        match load_playlist(playlist_path) {
            Ok(c) => {
                info!(
                    "Loaded {} channels from playlist: {}",
                    c.len(),
                    playlist_path.display()
                );
                return Ok(c);
            }
            Err(e) => warn!("Failed to parse playlist: {}", e),
        }
    }

    // 1.5. channels.m3u beside executable (bundled distribution)
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let beside = dir.join("channels.m3u");
            if beside.exists() {
                match load_playlist(&beside) {
                    Ok(c) => {
                        info!(
                            "Loaded {} channels from beside-exe: {}",
                            c.len(),
                            beside.display()
                        );
                        return Ok(c);
                    }
                    Err(e) => warn!("Failed to parse beside-exe channels.m3u: {}", e),
                }
            }
        }
    }

    // 2. channels.m3u in working directory
    let local_playlist = PathBuf::from("channels.m3u");
    if local_playlist.exists() {
        match load_playlist(&local_playlist) {
            Ok(c) => {
                info!("Loaded {} channels from local channels.m3u", c.len());
                return Ok(c);
            }
            Err(e) => warn!("Failed to parse local channels.m3u: {}", e),
        }
    }

    // 3. Remote playlist URL
    let source = &config.channels.playlist_url;
    if source.starts_with("http://") || source.starts_with("https://") {
        info!("Loading channels from URL: {}", source);
        match fetch_playlist_url(source).await {
            Ok(c) => {
                info!("Loaded {} channels from URL", c.len());
                return Ok(c);
            }
            Err(e) => warn!("Failed to fetch channels from URL: {}", e),
        }
    }

    info!("No channel source available, starting with empty list");
    Ok(Vec::new())
}

async fn fetch_playlist_url(url: &str) -> anyhow::Result<Vec<Channel>> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }
    let text = response.text().await?;
    // Use the URL's suffix (before any query string) as the format hint.
    let ext = url
        .split('?')
        .next()
        .and_then(|p| p.rsplit('.').next())
        .filter(|e| matches!(*e, "m3u" | "m3u8" | "json"));
    Ok(parse_playlist_str(&text, ext)?)
}
