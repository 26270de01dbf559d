//! App — terminal lifecycle, event loop, and action dispatch.
//!
//! Architecture:
//! - A blocking task reads crossterm events and forwards them as AppMessages.
//! - A forwarder task maps PlayerCore broadcasts into the same channel.
//! - The single select loop drains messages, dispatches Actions to the
//!   components, and redraws when anything changed.
//!
//! Components never touch shared state directly: they emit `Action`s, and
//! `apply_action` is the one place those become state changes or core
//! commands.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::Frame;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tv_core::caption::CaptionServiceSnapshot;
use tv_core::channel::{PlayerHealth, PlayerState};
use tv_core::config::Config;
use tv_core::state::StateManager;

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::{
    channel_list::ChannelList, help_overlay::HelpOverlay, log_panel::LogPanel,
    player_panel::PlayerPanel, update_prompt::UpdatePrompt,
};
use crate::core::{Command, CoreEvent};
use crate::focus::FocusRing;
use crate::theme::C_BG;
use crate::transcriber::{self, TranscriberHandle};
use crate::update::UpdateInfo;
use crate::widgets::status_bar::{self, InputMode};
use crate::widgets::toast::ToastManager;
use crate::BroadcastMessage;

/// Everything the main loop can receive.
#[derive(Debug)]
enum AppMessage {
    Event(Event),
    StateUpdated,
    CaptionUpdated(Option<String>),
    ServiceUpdated(CaptionServiceSnapshot),
    UpdateAvailable(UpdateInfo),
    Log(String),
}

/// Max messages drained per wakeup before redrawing.
const MAX_DRAIN: usize = 256;

/// Lines of tui.log kept in memory for the log panel.
const LOG_TAIL: usize = 500;

// ── Session persistence ───────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct StarredState {
    #[serde(default)]
    stars: HashMap<String, u8>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecentState {
    /// channel name → unix timestamp of last play
    #[serde(default)]
    last_played: HashMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UiSessionState {
    #[serde(default)]
    selected_channel: Option<String>,
    #[serde(default)]
    sort: String,
    #[serde(default)]
    log_open: bool,
    #[serde(default = "default_true")]
    keys_bar: bool,
    /// None = follow config; Some overrides it.
    #[serde(default)]
    captions_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

impl Default for UiSessionState {
    fn default() -> Self {
        Self {
            selected_channel: None,
            sort: String::new(),
            log_open: false,
            keys_bar: true,
            captions_enabled: None,
        }
    }
}

fn load_toml<T: DeserializeOwned + Default>(path: &PathBuf) -> T {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| toml::from_str(&s).ok())
        .unwrap_or_default()
}

fn save_toml<T: Serialize>(path: &PathBuf, value: &T) {
    match toml::to_string_pretty(value) {
        Ok(s) => {
            if let Err(e) = std::fs::write(path, s) {
                warn!("failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("failed to serialize {}: {}", path.display(), e),
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &PathBuf) -> T {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn save_json<T: Serialize>(path: &PathBuf, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            if let Err(e) = std::fs::write(path, s) {
                warn!("failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("failed to serialize {}: {}", path.display(), e),
    }
}

// ── Layout hit-testing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    channels: Rect,
    player: Rect,
    log: Rect,
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    area.contains(Position { x: column, y: row })
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    config: Config,
    event_tx: mpsc::Sender<CoreEvent>,
    state_manager: Arc<StateManager>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,

    state: AppState,

    channel_list: ChannelList,
    player_panel: PlayerPanel,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,
    update_prompt: UpdatePrompt,

    focus: FocusRing,
    toasts: ToastManager,
    areas: PaneAreas,
    keys_bar_visible: bool,

    transcriber: Option<TranscriberHandle>,

    stars_path: PathBuf,
    recent_path: PathBuf,
    ui_state_path: PathBuf,
    /// Channel name to re-select once the first playlist arrives.
    pending_selection: Option<String>,

    needs_redraw: bool,
    should_quit: bool,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        log_path: PathBuf,
        stars_path: PathBuf,
        recent_path: PathBuf,
        ui_state_path: PathBuf,
        event_tx: mpsc::Sender<CoreEvent>,
        state_manager: Arc<StateManager>,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        config: Config,
    ) -> Self {
        let starred: StarredState = load_toml(&stars_path);
        let recent: RecentState = load_toml(&recent_path);
        let session: UiSessionState = load_json(&ui_state_path);

        let mut channel_list = ChannelList::new();
        channel_list.set_sort_from_label(&session.sort);
        let mut log_panel = LogPanel::new();
        log_panel.expanded = session.log_open;

        let captions_wanted = session.captions_enabled.unwrap_or(config.captions.enabled);

        let state = AppState {
            player: PlayerState::default(),
            connected: false,
            captions: CaptionServiceSnapshot::default(),
            captions_enabled: captions_wanted,
            channel_stars: starred.stars,
            recent_channel: recent.last_played,
            update: None,
            input_mode: InputMode::Normal,
            last_nonzero_volume: 0.5,
            logs: Vec::new(),
            tui_log_lines: Vec::new(),
            tui_log_path: log_path,
        };

        let mut app = Self {
            config,
            event_tx,
            state_manager,
            broadcast_tx,
            state,
            channel_list,
            player_panel: PlayerPanel::new(),
            log_panel,
            help_overlay: HelpOverlay::new(),
            update_prompt: UpdatePrompt::new(),
            focus: FocusRing::default(),
            toasts: ToastManager::new(),
            areas: PaneAreas::default(),
            keys_bar_visible: session.keys_bar,
            transcriber: None,
            stars_path,
            recent_path,
            ui_state_path,
            pending_selection: session.selected_channel,
            needs_redraw: true,
            should_quit: false,
        };
        app.rebuild_focus_ring();
        app
    }

    pub async fn run(mut self, broadcast_rx: broadcast::Receiver<BroadcastMessage>) -> Result<()> {
        let mut terminal = ratatui::init();
        execute!(std::io::stdout(), EnableMouseCapture)?;

        let (msg_tx, mut msg_rx) = mpsc::channel::<AppMessage>(256);
        spawn_input_reader(msg_tx.clone());
        spawn_forwarder(broadcast_rx, msg_tx);

        // Seed initial state and restore the session.
        self.on_state_updated().await;
        self.restore_selection();
        self.refresh_log_lines();
        if self.state.captions_enabled {
            // start_captions flips the flag back on only when the spawn works
            self.state.captions_enabled = false;
            self.start_captions();
        }

        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        let mut log_tick = tokio::time::interval(Duration::from_secs(2));

        loop {
            tokio::select! {
                msg = msg_rx.recv() => {
                    let Some(msg) = msg else { break };
                    self.handle_message(msg).await;
                    let mut drained = 0;
                    while drained < MAX_DRAIN {
                        match msg_rx.try_recv() {
                            Ok(m) => {
                                self.handle_message(m).await;
                                drained += 1;
                            }
                            Err(_) => break,
                        }
                    }
                }
                _ = ui_tick.tick() => {
                    self.on_tick();
                }
                _ = log_tick.tick() => {
                    self.refresh_log_lines();
                }
            }

            if self.should_quit {
                break;
            }
            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }
        }

        self.save_session();
        if let Some(handle) = self.transcriber.take() {
            handle.stop();
        }

        execute!(std::io::stdout(), DisableMouseCapture)?;
        ratatui::restore();
        info!("teletv exiting");
        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => self.handle_key(key).await,
                Event::Mouse(mouse) => self.handle_mouse(mouse).await,
                Event::Resize(_, _) => self.needs_redraw = true,
                _ => {}
            },
            AppMessage::StateUpdated => self.on_state_updated().await,
            AppMessage::CaptionUpdated(text) => {
                // Cheap delta path: the cue changes far more often than the
                // rest of the state, so it arrives on its own message.
                self.state.player.embedded_caption = text;
                self.needs_redraw = true;
            }
            AppMessage::ServiceUpdated(snapshot) => {
                self.state.captions = snapshot;
                self.needs_redraw = true;
            }
            AppMessage::UpdateAvailable(info) => {
                self.toasts
                    .info(format!("update {} available", info.version));
                self.state.update = Some(info);
                self.needs_redraw = true;
            }
            AppMessage::Log(line) => {
                self.state.logs.push(line);
                if self.state.logs.len() > 200 {
                    let excess = self.state.logs.len() - 200;
                    self.state.logs.drain(..excess);
                }
                self.needs_redraw = true;
            }
        }
    }

    async fn on_state_updated(&mut self) {
        let new = self.state_manager.get_state().await;

        if new.player_health != self.state.player.player_health {
            match &new.player_health {
                PlayerHealth::Starting => self.toasts.spinner("starting mpv"),
                PlayerHealth::Restarting => self.toasts.spinner("restarting mpv"),
                PlayerHealth::Dead => {
                    self.toasts.dismiss_spinner();
                    self.toasts.error("mpv exited");
                }
                PlayerHealth::Degraded(reason) => {
                    self.toasts.warning(format!("mpv degraded: {}", reason))
                }
                PlayerHealth::Running => {
                    if self.state.player.player_health != PlayerHealth::Absent {
                        self.toasts.resolve_spinner(
                            crate::widgets::toast::Severity::Success,
                            "mpv ready",
                            std::time::Duration::from_secs(3),
                        );
                    }
                }
                _ => {}
            }
        }
        self.state.connected = new.player_health == PlayerHealth::Running;

        // Track recents when a channel actually starts playing.
        let channel_changed = new.current_channel != self.state.player.current_channel;
        if new.is_playing && (channel_changed || !self.state.player.is_playing) {
            if let Some(name) = new.current().map(|c| c.name.clone()) {
                self.state
                    .recent_channel
                    .insert(name, chrono::Utc::now().timestamp());
                self.save_recent();
            }
        }

        let playlist_changed = new.channels.len() != self.state.player.channels.len();
        self.state.player = new;
        self.channel_list.sync_channels(&self.state);
        if playlist_changed {
            self.restore_selection();
        }
        self.needs_redraw = true;
    }

    fn on_tick(&mut self) {
        let _ = self.channel_list.tick(&self.state);
        let _ = self.player_panel.tick(&self.state);
        let _ = self.log_panel.tick(&self.state);
        self.toasts.tick();
        // Redraw every tick: the listening spinner and toasts animate.
        self.needs_redraw = true;
    }

    fn refresh_log_lines(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.state.tui_log_path) {
            let mut tail: Vec<String> = content
                .lines()
                .rev()
                .take(LOG_TAIL)
                .map(|s| s.to_string())
                .collect();
            tail.reverse();
            if tail != self.state.tui_log_lines {
                self.state.tui_log_lines = tail;
                if self.log_panel.expanded {
                    self.needs_redraw = true;
                }
            }
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        // Modals capture everything while open.
        if self.help_overlay.visible {
            let actions = self.help_overlay.handle_key(key, &self.state);
            self.dispatch(actions).await;
            return;
        }
        if self.state.update.is_some() {
            let actions = self.update_prompt.handle_key(key, &self.state);
            self.dispatch(actions).await;
            return;
        }

        // Filter mode: every key goes to the channel list.
        if self.state.input_mode == InputMode::Filter {
            let actions = self.channel_list.handle_key(key, &self.state);
            self.dispatch(actions).await;
            if !self.channel_list.is_filter_active() {
                self.state.input_mode = InputMode::Normal;
            }
            self.needs_redraw = true;
            return;
        }

        let global: Vec<Action> = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => vec![Action::Quit],
            (KeyCode::Char('q'), _) => vec![Action::Quit],
            (KeyCode::Char('?'), _) => vec![Action::ToggleHelp],
            (KeyCode::Char('L'), _) => vec![Action::ToggleLogs],
            (KeyCode::Char('K'), _) => vec![Action::ToggleKeys],
            (KeyCode::Char('c'), _) => vec![Action::ToggleCaptions],
            (KeyCode::Char('J'), _) => vec![Action::JumpToCurrent],
            (KeyCode::Char('m'), _) => vec![Action::Mute],
            (KeyCode::Left, _) => vec![Action::Volume(-0.05)],
            (KeyCode::Right, _) => vec![Action::Volume(0.05)],
            (KeyCode::Tab, _) => vec![Action::FocusNext],
            (KeyCode::BackTab, _) => vec![Action::FocusPrev],
            (KeyCode::Char('1'), _) => vec![Action::FocusPane(ComponentId::ChannelList)],
            (KeyCode::Char('2'), _) => vec![Action::FocusPane(ComponentId::PlayerPanel)],
            (KeyCode::Char('3'), _) => vec![Action::FocusPane(ComponentId::LogPanel)],
            _ => vec![],
        };
        if !global.is_empty() {
            self.dispatch(global).await;
            return;
        }

        let actions = match self.focus.current() {
            Some(ComponentId::ChannelList) => self.channel_list.handle_key(key, &self.state),
            Some(ComponentId::PlayerPanel) => self.player_panel.handle_key(key, &self.state),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, &self.state),
            _ => vec![],
        };
        self.dispatch(actions).await;
        self.needs_redraw = true;
    }

    async fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (col, row) = (mouse.column, mouse.row);
        let areas = self.areas;

        let actions = if contains(areas.channels, col, row) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.focus.set(ComponentId::ChannelList);
            }
            self.channel_list.handle_mouse(mouse, areas.channels, &self.state)
        } else if contains(areas.player, col, row) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.focus.set(ComponentId::PlayerPanel);
            }
            self.player_panel.handle_mouse(mouse, areas.player, &self.state)
        } else if self.log_panel.expanded && contains(areas.log, col, row) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.focus.set(ComponentId::LogPanel);
            }
            self.log_panel.handle_mouse(mouse, areas.log, &self.state)
        } else {
            Vec::new()
        };

        self.dispatch(actions).await;
        self.needs_redraw = true;
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    async fn dispatch(&mut self, actions: Vec<Action>) {
        let mut queue = actions;
        let mut depth = 0;
        while !queue.is_empty() && depth < 4 {
            let mut next = Vec::new();
            for action in queue {
                next.extend(self.channel_list.on_action(&action, &self.state));
                next.extend(self.player_panel.on_action(&action, &self.state));
                next.extend(self.log_panel.on_action(&action, &self.state));
                next.extend(self.help_overlay.on_action(&action, &self.state));
                next.extend(self.update_prompt.on_action(&action, &self.state));
                self.apply_action(action).await;
            }
            queue = next;
            depth += 1;
        }
        self.needs_redraw = true;
    }

    async fn apply_action(&mut self, action: Action) {
        match action {
            Action::Play(idx) => {
                if let Some(ch) = self.state.player.channels.get(idx) {
                    self.toasts.info(format!("tuning {}", ch.name));
                }
                self.send_command(Command::Play { channel_idx: idx }).await;
            }
            Action::Stop => self.send_command(Command::Stop).await,
            Action::TogglePause => self.send_command(Command::TogglePause).await,
            Action::Next => self.send_command(Command::Next).await,
            Action::Prev => self.send_command(Command::Prev).await,
            Action::Random => self.send_command(Command::Random).await,
            Action::SeekRelative(seconds) => {
                self.send_command(Command::SeekRelative { seconds }).await;
            }
            Action::Volume(delta) => {
                let value = (self.state.player.volume + delta).clamp(0.0, 1.0);
                if value > 0.0 {
                    self.state.last_nonzero_volume = value;
                }
                // optimistic; the next StateUpdated confirms
                self.state.player.volume = value;
                self.send_command(Command::Volume { value }).await;
            }
            Action::Mute => {
                let value = if self.state.player.volume > 0.0 {
                    self.state.last_nonzero_volume = self.state.player.volume;
                    0.0
                } else {
                    self.state.last_nonzero_volume.max(0.05)
                };
                self.state.player.volume = value;
                self.send_command(Command::Volume { value }).await;
            }

            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => {
                if id == ComponentId::LogPanel && !self.log_panel.expanded {
                    self.log_panel.toggle();
                    self.rebuild_focus_ring();
                }
                self.focus.set(id);
            }
            Action::JumpToCurrent => {
                if let Some(idx) = self.state.player.current_channel {
                    self.channel_list.select_by_channel_idx(idx);
                }
            }

            Action::OpenFilter => {
                self.state.input_mode = InputMode::Filter;
                self.focus.set(ComponentId::ChannelList);
            }
            Action::CloseFilter => {
                self.state.input_mode = InputMode::Normal;
            }

            Action::SetStar(stars, name) => {
                if stars == 0 {
                    self.state.channel_stars.remove(&name);
                    self.toasts.info(format!("unstarred {}", name));
                } else {
                    self.state.channel_stars.insert(name.clone(), stars);
                    self.toasts
                        .info(format!("{} {}", "✹".repeat(stars as usize), name));
                }
                self.save_stars();
                self.channel_list.sync_channels(&self.state);
            }

            Action::ToggleCaptions => {
                if self.state.captions_enabled {
                    self.stop_captions();
                } else {
                    self.start_captions();
                }
            }

            Action::DismissUpdate => {
                self.state.update = None;
            }

            Action::ToggleLogs => {
                // the panel itself toggled in on_action; keep the ring in sync
                self.rebuild_focus_ring();
            }
            Action::ToggleHelp => {}
            Action::ToggleKeys => {
                self.keys_bar_visible = !self.keys_bar_visible;
            }
            Action::CopyToClipboard(text) => self.copy_to_clipboard(text),

            Action::Quit => {
                self.should_quit = true;
            }
            Action::Noop => {}
        }
    }

    async fn send_command(&mut self, cmd: Command) {
        if self
            .event_tx
            .send(CoreEvent::ClientCommand(cmd))
            .await
            .is_err()
        {
            self.toasts.error("player core is gone");
        }
    }

    // ── Captions sidecar lifecycle ───────────────────────────────────────────

    fn start_captions(&mut self) {
        let Some(command) = transcriber::resolve_command(&self.config) else {
            self.toasts.warning("teletv-stt not found");
            return;
        };
        let model = self.config.captions.model.clone();
        match transcriber::spawn(command, model, self.broadcast_tx.clone()) {
            Ok(handle) => {
                self.transcriber = Some(handle);
                self.state.captions_enabled = true;
                self.state.captions = CaptionServiceSnapshot {
                    status_message: "starting captions…".to_string(),
                    ..CaptionServiceSnapshot::default()
                };
                self.toasts.info("captions on");
            }
            Err(e) => self.toasts.error(format!("captions failed: {}", e)),
        }
    }

    fn stop_captions(&mut self) {
        if let Some(handle) = self.transcriber.take() {
            handle.stop();
        }
        self.state.captions_enabled = false;
        self.state.captions = transcriber::stopped_snapshot("captions off");
        self.toasts.info("captions off");
    }

    // ── Clipboard ─────────────────────────────────────────────────────────────

    fn copy_to_clipboard(&mut self, text: String) {
        match arboard::Clipboard::new().and_then(|mut clip| clip.set_text(text.clone())) {
            Ok(()) => {
                let shown: String = if text.chars().count() > 40 {
                    format!("{}…", text.chars().take(40).collect::<String>())
                } else {
                    text
                };
                self.toasts.success(format!("copied {}", shown));
            }
            Err(e) => self.toasts.error(format!("clipboard: {}", e)),
        }
    }

    // ── Session helpers ───────────────────────────────────────────────────────

    fn restore_selection(&mut self) {
        if let Some(name) = self.pending_selection.clone() {
            if let Some(idx) = self
                .state
                .player
                .channels
                .iter()
                .position(|c| c.name == name)
            {
                self.channel_list.select_by_channel_idx(idx);
                self.pending_selection = None;
            }
        }
    }

    fn rebuild_focus_ring(&mut self) {
        let mut items = vec![ComponentId::ChannelList, ComponentId::PlayerPanel];
        if self.log_panel.expanded {
            items.push(ComponentId::LogPanel);
        }
        self.focus.set_items(items);
    }

    fn save_stars(&self) {
        save_toml(
            &self.stars_path,
            &StarredState {
                stars: self.state.channel_stars.clone(),
            },
        );
    }

    fn save_recent(&self) {
        save_toml(
            &self.recent_path,
            &RecentState {
                last_played: self.state.recent_channel.clone(),
            },
        );
    }

    fn save_session(&self) {
        let session = UiSessionState {
            selected_channel: self.channel_list.selected_name(&self.state.player.channels),
            sort: self.channel_list.sort_label().to_string(),
            log_open: self.log_panel.expanded,
            keys_bar: self.keys_bar_visible,
            captions_enabled: Some(self.state.captions_enabled),
        };
        save_json(&self.ui_state_path, &session);
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), size);

        let log_height = if self.log_panel.expanded { 10 } else { 1 };
        let mut constraints = vec![Constraint::Min(8), Constraint::Length(log_height)];
        if self.keys_bar_visible {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // status / log bar

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(size);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);

        self.areas = PaneAreas {
            channels: body[0],
            player: body[1],
            log: rows[1],
        };

        self.channel_list.draw(
            frame,
            body[0],
            self.focus.is_focused(ComponentId::ChannelList),
            &self.state,
        );
        self.player_panel.draw(
            frame,
            body[1],
            self.focus.is_focused(ComponentId::PlayerPanel),
            &self.state,
        );
        self.log_panel.draw(
            frame,
            rows[1],
            self.focus.is_focused(ComponentId::LogPanel),
            &self.state,
        );

        let mut next_row = 2;
        if self.keys_bar_visible {
            status_bar::draw_keys_bar(
                frame,
                rows[next_row],
                self.state.input_mode,
                self.state.captions_enabled,
            );
            next_row += 1;
        }
        status_bar::draw_log_bar(
            frame,
            rows[next_row],
            self.state.logs.last().map(String::as_str),
            self.state.connected,
        );

        // Overlays above everything
        self.help_overlay.draw(frame, size, false, &self.state);
        self.update_prompt.draw(frame, size, false, &self.state);

        self.toasts.draw(frame, size);
    }
}

// ── Background tasks ──────────────────────────────────────────────────────────

fn spawn_input_reader(tx: mpsc::Sender<AppMessage>) {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn spawn_forwarder(mut rx: broadcast::Receiver<BroadcastMessage>, tx: mpsc::Sender<AppMessage>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    let mapped = match msg {
                        BroadcastMessage::StateUpdated => AppMessage::StateUpdated,
                        BroadcastMessage::CaptionUpdated(t) => AppMessage::CaptionUpdated(t),
                        BroadcastMessage::ServiceUpdated(s) => AppMessage::ServiceUpdated(s),
                        BroadcastMessage::UpdateAvailable(i) => AppMessage::UpdateAvailable(i),
                        BroadcastMessage::Log(l) => AppMessage::Log(l),
                    };
                    if tx.send(mapped).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("UI lagged {} broadcast messages behind, resyncing", n);
                    if tx.send(AppMessage::StateUpdated).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
