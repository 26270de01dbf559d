//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    ChannelList,
    PlayerPanel,
    LogPanel,
    HelpOverlay,
    UpdatePrompt,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play(usize), // play channel by original index
    Stop,
    TogglePause,
    Next,
    Prev,
    Random,
    Volume(f32), // delta, applied to current volume
    SeekRelative(f64),
    Mute, // toggle mute (save/restore volume)

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    JumpToCurrent,

    // ── Filter ───────────────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,

    // ── Stars ────────────────────────────────────────────────────────────────
    SetStar(u8, String), // rating, channel name

    // ── Captions ─────────────────────────────────────────────────────────────
    ToggleCaptions,

    // ── Updates ──────────────────────────────────────────────────────────────
    DismissUpdate,

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleLogs,
    ToggleHelp,
    ToggleKeys,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
