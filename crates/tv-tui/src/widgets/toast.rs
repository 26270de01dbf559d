//! Transient corner notices plus one persistent spinner line.
//!
//! Notices expire on their own; the spinner lives until resolved into a
//! notice (or dismissed), covering long operations like an mpv respawn.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

const MAX_VISIBLE: usize = 4;
const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Self::Info => C_TOAST_INFO,
            Self::Success => C_TOAST_SUCCESS,
            Self::Warning => C_TOAST_WARNING,
            Self::Error => C_TOAST_ERROR,
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Self::Info => "·",
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }
}

struct Notice {
    text: String,
    severity: Severity,
    deadline: Instant,
}

pub struct ToastManager {
    queue: VecDeque<Notice>,
    spinner: Option<(String, usize)>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            spinner: None,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, ttl: Duration) {
        let text = message.into();
        // Re-pushing the same text restarts it instead of stacking copies.
        self.queue.retain(|n| n.text != text);
        self.queue.push_back(Notice {
            text,
            severity,
            deadline: Instant::now() + ttl,
        });
        while self.queue.len() > MAX_VISIBLE * 2 {
            self.queue.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(5));
    }

    /// Start (or retitle) the persistent spinner line.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some((message.into(), 0));
    }

    /// Replace the spinner with an ordinary expiring notice.
    pub fn resolve_spinner(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        ttl: Duration,
    ) {
        self.spinner = None;
        self.push(message, severity, ttl);
    }

    /// Drop the spinner with nothing to show for it.
    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Expire notices and advance the spinner. Call once per UI tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.queue.retain(|n| n.deadline > now);
        if let Some((_, phase)) = &mut self.spinner {
            *phase = (*phase + 1) % SPINNER.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.spinner.is_none()
    }

    /// Stack into the top-right corner of `area`, spinner first.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60);
        let mut y = area.y + 1;
        let bottom = area.y + area.height;

        if let Some((text, phase)) = &self.spinner {
            draw_corner_line(frame, area, y, max_width, SPINNER[*phase], text, C_TOAST_INFO);
            y += 1;
        }

        for notice in self.queue.iter().rev().take(MAX_VISIBLE) {
            if y >= bottom {
                break;
            }
            draw_corner_line(
                frame,
                area,
                y,
                max_width,
                notice.severity.glyph(),
                &notice.text,
                notice.severity.color(),
            );
            y += 1;
        }
    }
}

fn draw_corner_line(
    frame: &mut Frame,
    area: Rect,
    y: u16,
    max_width: u16,
    glyph: &str,
    text: &str,
    color: Color,
) {
    if y >= area.y + area.height {
        return;
    }
    let width = (text.width() as u16 + 4).min(max_width);
    let line_area = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y,
        width,
        height: 1,
    };
    frame.render_widget(Clear, line_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {glyph} {text} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))),
        line_area,
    );
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_message_does_not_stack() {
        let mut t = ToastManager::new();
        t.info("saved");
        t.info("saved");
        assert_eq!(t.queue.len(), 1);
    }

    #[test]
    fn expired_notices_drop_on_tick() {
        let mut t = ToastManager::new();
        t.push("gone", Severity::Info, Duration::ZERO);
        t.push("stays", Severity::Info, Duration::from_secs(60));
        t.tick();
        assert_eq!(t.queue.len(), 1);
        assert_eq!(t.queue[0].text, "stays");
    }

    #[test]
    fn spinner_resolves_into_a_notice() {
        let mut t = ToastManager::new();
        t.spinner("working");
        assert!(!t.is_empty());
        t.resolve_spinner(Severity::Success, "done", Duration::from_secs(1));
        assert!(t.spinner.is_none());
        assert_eq!(t.queue[0].text, "done");
    }
}
