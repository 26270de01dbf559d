//! Log pane: one compact line of the latest entry when collapsed, a
//! scrollable tail of the tracing log file when expanded.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome_borders,
};

/// Scroll positions are counted from the oldest line; this sentinel pins the
/// view to the newest one.
const PIN_TO_END: usize = usize::MAX;

pub struct LogPanel {
    pub expanded: bool,
    pub scroll: usize,
    pub borders: Borders,
    seen_lines: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            scroll: 0,
            borders: Borders::ALL,
            seen_lines: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        if self.expanded {
            self.scroll = PIN_TO_END;
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.expanded {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = PIN_TO_END,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if self.expanded {
            match event.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-1),
                MouseEventKind::ScrollDown => self.scroll_by(1),
                _ => {}
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if matches!(action, Action::ToggleLogs) {
            self.toggle();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        if !self.expanded || area.height <= 1 {
            let latest = state
                .tui_log_lines
                .last()
                .map(|l| tidy_line(l))
                .unwrap_or_else(|| "(no log)".into());
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(" log ", Style::default().fg(C_MUTED)),
                    Span::styled(latest, Style::default().fg(C_SECONDARY)),
                ])),
                area,
            );
            return;
        }

        let block = pane_chrome_borders("log", Some('3'), focused, None, self.borders);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = &state.tui_log_lines;
        let window = inner.height as usize;
        let top_of_tail = lines.len().saturating_sub(window);

        // New lines arrived: keep following the tail unless the user
        // scrolled away from it.
        if lines.len() > self.seen_lines {
            if self.scroll.saturating_add(1) >= top_of_tail {
                self.scroll = PIN_TO_END;
            }
            self.seen_lines = lines.len();
        }
        self.scroll = self.scroll.min(top_of_tail);

        if lines.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  no log entries yet",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let rows: Vec<Line> = lines
            .iter()
            .skip(self.scroll)
            .take(window)
            .map(|raw| {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(tidy_line(raw), Style::default().fg(C_MUTED)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(rows).wrap(Wrap { trim: false }), inner);
    }
}

/// Rewrite a raw tracing line for on-screen display: ANSI stripped, the
/// RFC3339 timestamp shortened, the target path dropped from the message.
fn tidy_line(raw: &str) -> String {
    let clean = strip_ansi(raw);
    let mut words = clean.split_whitespace().peekable();
    let mut prefix = String::new();

    if let Some(ts) = words.peek().and_then(|w| short_timestamp(w)) {
        prefix = ts;
        words.next();
    }
    if let Some(level) = words.peek().map(|w| w.to_ascii_uppercase()) {
        if matches!(level.as_str(), "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR") {
            if !prefix.is_empty() {
                prefix.push(' ');
            }
            prefix.push_str(&level);
            words.next();
        }
    }

    let mut body = words.collect::<Vec<_>>().join(" ");
    if let Some((target, message)) = body.split_once(": ") {
        if looks_like_target(target) {
            body = message.trim_start().to_string();
        }
    }

    match (prefix.is_empty(), body.is_empty()) {
        (true, _) => body,
        (false, true) => prefix,
        (false, false) => format!("{prefix} {body}"),
    }
}

fn short_timestamp(word: &str) -> Option<String> {
    let stamp = chrono::DateTime::parse_from_rfc3339(word)
        .ok()?
        .with_timezone(&chrono::Local);
    let pattern = if stamp.date_naive() == chrono::Local::now().date_naive() {
        "%H:%M:%S"
    } else {
        "%m-%d %H:%M"
    };
    Some(stamp.format(pattern).to_string())
}

/// A short module path like `tv_tui::core`, as opposed to message text that
/// happens to contain a colon.
fn looks_like_target(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 48
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // Skip to the escape sequence's final byte.
            for t in chars.by_ref() {
                if ('@'..='~').contains(&t) {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_strips_target_and_shortens_level() {
        let line = "2026-08-24T10:11:12.000000Z INFO tv_tui::core: playback: Playing";
        let out = tidy_line(line);
        assert!(out.ends_with("INFO playback: Playing"), "{out}");
        assert!(!out.contains("tv_tui::core"));
    }

    #[test]
    fn message_colons_survive() {
        assert_eq!(
            tidy_line("warn url is http://example.com: not reachable"),
            "WARN url is http://example.com: not reachable"
        );
    }

    #[test]
    fn ansi_sequences_are_removed() {
        assert_eq!(strip_ansi("\u{1b}[32mINFO\u{1b}[0m ready"), "INFO ready");
    }

    #[test]
    fn target_heuristic() {
        assert!(looks_like_target("tv_tui::mpv"));
        assert!(!looks_like_target("a sentence with spaces"));
        assert!(!looks_like_target(""));
    }
}
