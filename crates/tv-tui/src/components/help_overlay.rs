//! HelpOverlay — modal keybinding reference.
//!
//! While visible it consumes every key; '?', 'q' or Esc close it.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_PRIMARY, C_SECONDARY},
};

pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if !self.visible {
            return vec![];
        }
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => {
                vec![Action::ToggleHelp]
            }
            // Swallow everything else while the overlay is open
            _ => vec![Action::Noop],
        }
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleHelp = action {
            self.toggle();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        if !self.visible {
            return;
        }

        let rows: Vec<Line> = vec![
            section("Playback"),
            help_row("Enter", "play selected / stop if playing"),
            help_row("Space", "pause / resume"),
            help_row("n / p", "next / previous channel"),
            help_row("r", "random channel"),
            help_row("← / →", "volume down / up"),
            help_row("m", "mute / unmute"),
            help_row(", / .", "seek -10s / +10s (VOD only)"),
            Line::default(),
            section("Captions"),
            help_row("c", "toggle live captions"),
            Line::default(),
            section("Channels"),
            help_row("↑↓ / jk", "move selection"),
            help_row("g / G", "first / last"),
            help_row("/", "filter (Esc clears, then closes)"),
            help_row("s / S", "cycle sort order"),
            help_row("*", "star channel (0-3 stars)"),
            help_row("J", "jump to playing channel"),
            help_row("y", "copy stream URL"),
            Line::default(),
            section("Interface"),
            help_row("Tab / 1-3", "switch pane"),
            help_row("L", "toggle log panel"),
            help_row("K", "toggle keys bar"),
            help_row("?", "this help"),
            help_row("q", "quit"),
        ];

        let height = (rows.len() + 4).min(area.height as usize) as u16;
        let popup = centered_rect(60, height, area);

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_ACCENT))
            .style(Style::default().bg(Color::Rgb(18, 18, 26)))
            .title(Span::styled(
                " help ",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        frame.render_widget(Paragraph::new(rows), inner);
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        format!(" {}", title),
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn help_row<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("   {:<12}", key), Style::default().fg(C_PRIMARY)),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}

/// A centered rect `height` rows tall and `percent_x` percent wide.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
