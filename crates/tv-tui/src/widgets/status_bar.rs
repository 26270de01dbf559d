//! Status bar — bottom line with connection state, mode, and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{
    C_ACCENT, C_LISTENING, C_MODE_FILTER, C_MODE_NORMAL, C_MUTED, C_PLAYING, C_SECONDARY,
    C_SEPARATOR,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Filter => "FILTER",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
        }
    }
}

/// Draw the log bar: connection dot plus last log line.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, connected: bool) {
    let conn_span = if connected {
        Span::styled("●", Style::default().fg(C_PLAYING))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    };

    let log_span = Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY));

    let line = Line::from(vec![conn_span, Span::raw(" "), log_span]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, captions_on: bool) {
    let (label, label_color) = match mode {
        InputMode::Filter => ("FILTER", C_MODE_FILTER),
        InputMode::Normal => ("TV", C_MODE_NORMAL),
    };

    let mut left_spans = vec![Span::styled(
        format!(" {} ", label),
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    )];
    if mode == InputMode::Normal && captions_on {
        left_spans.push(Span::styled(
            "cc",
            Style::default().fg(C_LISTENING).add_modifier(Modifier::BOLD),
        ));
        left_spans.push(Span::raw(" "));
    }

    let keys = match mode {
        InputMode::Normal => {
            " ↑↓/jk select  Enter play/stop  Space pause  ←→ vol  n/p/r channel  c captions  Tab/1-3 panes  / filter  K keys  L logs  ? help  q quit"
        }
        InputMode::Filter => " type to filter  Up/Down move  Enter keep  Esc clear+close  Tab next pane",
    };

    let keys_span = Span::styled(keys, Style::default().fg(C_MUTED));

    left_spans.push(Span::raw(" "));
    left_spans.push(keys_span);
    let line = Line::from(left_spans);
    frame.render_widget(Paragraph::new(line), area);
}
