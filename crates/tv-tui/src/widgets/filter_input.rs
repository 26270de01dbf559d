//! Inline filter bar backed by tui-input.
//!
//! Key protocol, tuned for muscle memory: typing narrows live, Enter keeps
//! the narrowed view and returns to normal keys, Esc first wipes the query
//! and only closes once the query is already empty.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

pub enum FilterAction {
    /// Query text changed; re-filter with the payload.
    Changed(String),
    /// Enter: keep the query, leave filter mode.
    Confirmed,
    /// Esc on an empty query: leave filter mode, query gone.
    Cancelled,
    None,
}

pub struct FilterInput {
    buffer: Input,
    pub active: bool,
    placeholder: String,
}

impl FilterInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            buffer: Input::default(),
            active: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn text(&self) -> &str {
        self.buffer.value()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.value().is_empty()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc if self.is_empty() => {
                self.deactivate();
                FilterAction::Cancelled
            }
            KeyCode::Esc => {
                self.buffer.reset();
                FilterAction::Changed(String::new())
            }
            KeyCode::Enter => {
                self.deactivate();
                FilterAction::Confirmed
            }
            _ => {
                self.buffer.handle_event(&Event::Key(key));
                FilterAction::Changed(self.buffer.value().to_string())
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let visible = area.width.saturating_sub(4) as usize;
        let scroll = self.buffer.visual_scroll(visible);

        let content = if self.is_empty() {
            Span::styled(
                format!("/ {}", self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            Span::styled(
                format!("/ {}", &self.buffer.value()[scroll..]),
                Style::default().fg(C_FILTER_FG),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(content)).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        if self.active && !self.is_empty() {
            let x = area.x + 2 + (self.buffer.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((x.min(area.x + area.width - 1), area.y));
        }
    }
}

impl Default for FilterInput {
    fn default() -> Self {
        Self::new("filter...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn typing_reports_the_query() {
        let mut f = FilterInput::default();
        f.activate();
        assert!(matches!(f.handle_key(key(KeyCode::Char('t'))), FilterAction::Changed(ref q) if q == "t"));
        assert!(matches!(f.handle_key(key(KeyCode::Char('v'))), FilterAction::Changed(ref q) if q == "tv"));
    }

    #[test]
    fn esc_clears_first_then_cancels() {
        let mut f = FilterInput::default();
        f.activate();
        f.handle_key(key(KeyCode::Char('x')));
        assert!(matches!(
            f.handle_key(key(KeyCode::Esc)),
            FilterAction::Changed(ref q) if q.is_empty()
        ));
        assert!(f.is_active());
        assert!(matches!(f.handle_key(key(KeyCode::Esc)), FilterAction::Cancelled));
        assert!(!f.is_active());
    }

    #[test]
    fn enter_confirms_and_keeps_the_query() {
        let mut f = FilterInput::default();
        f.activate();
        f.handle_key(key(KeyCode::Char('a')));
        assert!(matches!(f.handle_key(key(KeyCode::Enter)), FilterAction::Confirmed));
        assert!(!f.is_active());
        assert_eq!(f.text(), "a");
    }
}
