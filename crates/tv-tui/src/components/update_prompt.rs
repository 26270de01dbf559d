//! UpdatePrompt — modal shown when the startup check finds a newer release.
//!
//! Enter copies the release URL to the clipboard and dismisses; Esc/q just
//! dismisses. While visible it consumes every key.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::help_overlay::centered_rect,
    theme::{C_ACCENT, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY},
};

pub struct UpdatePrompt;

impl UpdatePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl Component for UpdatePrompt {
    fn id(&self) -> ComponentId {
        ComponentId::UpdatePrompt
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let Some(info) = &state.update else {
            return vec![];
        };
        match key.code {
            KeyCode::Enter => vec![
                Action::CopyToClipboard(info.url.clone()),
                Action::DismissUpdate,
            ],
            KeyCode::Esc | KeyCode::Char('q') => vec![Action::DismissUpdate],
            _ => vec![Action::Noop],
        }
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(info) = &state.update else {
            return;
        };

        let mut lines: Vec<Line> = vec![
            Line::default(),
            Line::from(vec![
                Span::styled("  version ", Style::default().fg(C_SECONDARY)),
                Span::styled(
                    info.version.clone(),
                    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  (running {})", env!("CARGO_PKG_VERSION")),
                    Style::default().fg(C_MUTED),
                ),
            ]),
        ];
        if !info.notes.is_empty() {
            lines.push(Line::default());
            for note_line in info.notes.lines().take(6) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", note_line),
                    Style::default().fg(C_PRIMARY),
                )));
            }
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("  {}", info.url),
            Style::default().fg(C_ACCENT),
        )));
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("  Enter", Style::default().fg(C_PRIMARY)),
            Span::styled(" copy link   ", Style::default().fg(C_SECONDARY)),
            Span::styled("Esc", Style::default().fg(C_PRIMARY)),
            Span::styled(" dismiss", Style::default().fg(C_SECONDARY)),
        ]));

        let height = (lines.len() + 2).min(area.height as usize) as u16;
        let popup = centered_rect(55, height, area);

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_PLAYING))
            .style(Style::default().bg(Color::Rgb(18, 18, 26)))
            .title(Span::styled(
                " update available ",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
