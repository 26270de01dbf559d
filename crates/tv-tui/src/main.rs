mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod focus;
mod mpv;
mod theme;
mod transcriber;
mod update;
mod widgets;

use tokio::sync::{broadcast, mpsc};

/// What the PlayerCore (and sidecar tasks) broadcast to the TUI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The full PlayerState has changed; receivers should fetch from StateManager.
    StateUpdated,
    /// The embedded subtitle cue changed (None = cleared).
    CaptionUpdated(Option<String>),
    /// The speech-to-text sidecar snapshot changed.
    ServiceUpdated(tv_core::caption::CaptionServiceSnapshot),
    /// A newer release was found by the startup update check.
    UpdateAvailable(update::UpdateInfo),
    /// A log message from the core event loop.
    Log(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = tv_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tui.log");
    let stars_path = data_dir.join("starred.toml");
    let recent_path = data_dir.join("recent.toml");
    let ui_state_path = data_dir.join("ui_state.json");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("teletv log: {}", log_path.display());

    tracing::info!("teletv starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = tv_core::config::Config::load().unwrap_or_default();

    // ── Broadcast channel (PlayerCore → TUI) ────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(1024);

    // ── CoreEvent channel (TUI → PlayerCore) ────────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::CoreEvent>(1024);

    // ── Build PlayerCore ─────────────────────────────────────────────────────
    let player_core = core::PlayerCore::new(&config, broadcast_tx.clone(), event_tx.clone()).await?;
    let state_manager = player_core.state_manager();

    // ── Startup update check ─────────────────────────────────────────────────
    if config.update.check_on_startup {
        let manifest_url = config.update.manifest_url.clone();
        let tx = broadcast_tx.clone();
        tokio::spawn(async move {
            if let Some(info) = update::check_for_update(&manifest_url).await {
                let _ = tx.send(BroadcastMessage::UpdateAvailable(info));
            }
        });
    }

    // ── Send initial state to TUI so channels appear immediately ────────────
    // The broadcast channel only carries deltas, so we push one StateUpdated
    // now to seed the first render.
    let _ = broadcast_tx.send(BroadcastMessage::StateUpdated);

    // ── Spawn PlayerCore event loop ──────────────────────────────────────────
    tokio::spawn(async move {
        if let Err(e) = player_core.run(event_rx).await {
            tracing::error!("PlayerCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(
        log_path,
        stars_path,
        recent_path,
        ui_state_path,
        event_tx,
        state_manager,
        broadcast_tx,
        config,
    );
    app.run(broadcast_rx).await?;

    Ok(())
}
