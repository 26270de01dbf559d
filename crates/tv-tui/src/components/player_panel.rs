//! PlayerPanel — now-playing pane: channel, status, timeline and captions.
//!
//! The caption area is re-derived from AppState on every draw; this panel
//! keeps no caption state of its own, only a spinner phase for the
//! listening indicator.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Borders, Paragraph, Wrap},
    Frame,
};
use tv_core::caption::CaptionView;
use tv_core::channel::PlaybackStatus;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_caption_auto, style_caption_embedded, C_ACCENT, C_BADGE_ERR, C_BADGE_LIVE,
        C_BADGE_PENDING, C_CONNECTING, C_ERROR, C_GROUP, C_LISTENING, C_MUTED, C_PLAYING,
        C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome_borders, Badge},
        progress_bar,
    },
};

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub struct PlayerPanel {
    pub borders: Borders,
    /// Spinner phase for the listening indicator, advanced each tick.
    spinner_frame: usize,
}

impl PlayerPanel {
    pub fn new() -> Self {
        Self {
            borders: Borders::ALL,
            spinner_frame: 0,
        }
    }

    fn status_span(status: PlaybackStatus) -> Span<'static> {
        match status {
            PlaybackStatus::Idle => Span::styled("idle", Style::default().fg(C_MUTED)),
            PlaybackStatus::Connecting => {
                Span::styled("connecting…", Style::default().fg(C_CONNECTING))
            }
            PlaybackStatus::Playing => Span::styled("playing", Style::default().fg(C_PLAYING)),
            PlaybackStatus::Paused => Span::styled("paused", Style::default().fg(C_SECONDARY)),
            PlaybackStatus::Error => Span::styled("error", Style::default().fg(C_ERROR)),
        }
    }

    fn badge<'a>(&self, state: &'a AppState) -> Option<Badge<'a>> {
        // Health problems outrank the LIVE badge
        if let Some(label) = state.player.player_health.badge_label() {
            let color = if state.player.player_health.is_unhealthy() {
                C_BADGE_ERR
            } else {
                C_BADGE_PENDING
            };
            return Some(Badge { text: label, color });
        }
        if state.player.playback_status == PlaybackStatus::Playing {
            return Some(Badge {
                text: "LIVE",
                color: C_BADGE_LIVE,
            });
        }
        None
    }

    fn draw_captions(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        match state.caption_view() {
            CaptionView::Embedded(text) => {
                frame.render_widget(
                    Paragraph::new(text)
                        .style(style_caption_embedded())
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: false }),
                    area,
                );
            }
            CaptionView::Auto(text) => {
                frame.render_widget(
                    Paragraph::new(text)
                        .style(style_caption_auto())
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: false }),
                    area,
                );
            }
            CaptionView::Status { message, progress } => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Length(1)])
                    .split(area);
                frame.render_widget(
                    Paragraph::new(Span::styled(message, Style::default().fg(C_SECONDARY)))
                        .alignment(Alignment::Center),
                    rows[0],
                );
                if let Some(p) = progress {
                    if rows.len() > 1 && rows[1].height > 0 {
                        let bar = centered_sub(rows[1], 24);
                        progress_bar::draw_meter(frame, bar, p as f64);
                    }
                }
            }
            CaptionView::Listening => {
                let spinner = SPINNER[self.spinner_frame % SPINNER.len()];
                frame.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled(
                            format!("{} ", spinner),
                            Style::default().fg(C_LISTENING),
                        ),
                        Span::styled("listening…", Style::default().fg(C_LISTENING)),
                    ]))
                    .alignment(Alignment::Center),
                    area,
                );
            }
            CaptionView::Hidden => {}
        }
    }
}

impl Component for PlayerPanel {
    fn id(&self) -> ComponentId {
        ComponentId::PlayerPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Char(' ') if state.player.current_channel.is_some() => {
                vec![Action::TogglePause]
            }
            KeyCode::Char(',') => vec![Action::SeekRelative(-10.0)],
            KeyCode::Char('.') => vec![Action::SeekRelative(10.0)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => vec![Action::Volume(0.05)],
            MouseEventKind::ScrollDown => vec![Action::Volume(-0.05)],
            _ => vec![],
        }
    }

    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block =
            pane_chrome_borders("player", Some('2'), focused, self.badge(state), self.borders);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // channel name
                Constraint::Length(1), // status line
                Constraint::Length(1), // timeline (VOD only)
                Constraint::Length(1), // spacer
                Constraint::Min(0),    // captions
            ])
            .split(inner);

        // Channel name + group
        match state.player.current() {
            Some(ch) => {
                let mut spans = vec![
                    Span::raw(" "),
                    Span::styled(
                        ch.name.clone(),
                        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                    ),
                ];
                if !ch.group.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", ch.group),
                        Style::default().fg(C_GROUP),
                    ));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), rows[0]);
            }
            None => {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        " no channel — Enter plays the selected one",
                        Style::default().fg(C_MUTED),
                    )),
                    rows[0],
                );
            }
        }

        // Status line: playback state, pause flag, volume
        let mut status_spans = vec![Span::raw(" "), Self::status_span(state.player.playback_status)];
        if state.player.is_paused {
            status_spans.push(Span::styled("  ⏸", Style::default().fg(C_SECONDARY)));
        }
        status_spans.push(Span::styled(
            format!("  vol {:.0}%", state.player.volume * 100.0),
            Style::default().fg(if state.player.volume == 0.0 {
                C_MUTED
            } else {
                C_SECONDARY
            }),
        ));
        if state.captions_enabled {
            status_spans.push(Span::styled("  cc", Style::default().fg(C_LISTENING)));
        }
        frame.render_widget(Paragraph::new(Line::from(status_spans)), rows[1]);

        // Timeline only makes sense for VOD streams that report a duration
        if let (Some(pos), Some(dur)) = (state.player.time_pos_secs, state.player.duration_secs) {
            if dur > 0.0 {
                let bar = Rect {
                    x: rows[2].x + 1,
                    y: rows[2].y,
                    width: rows[2].width.saturating_sub(2),
                    height: rows[2].height,
                };
                progress_bar::draw_timeline(frame, bar, pos, dur);
            }
        }

        self.draw_captions(frame, rows[4], state);
    }

    fn min_height(&self) -> u16 {
        7
    }
}

/// A `width`-wide rect centered horizontally inside `r` (clamped to fit).
fn centered_sub(r: Rect, width: u16) -> Rect {
    let w = width.min(r.width);
    Rect {
        x: r.x + (r.width - w) / 2,
        y: r.y,
        width: w,
        height: r.height,
    }
}
