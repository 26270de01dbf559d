//! Shared pane framing: border, "[N] title" header, optional right badge.
//! Every pane routes through here so focus styling stays uniform.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::theme::{style_focused_border, style_unfocused_border, C_MUTED, C_NUMBER_HINT, C_PRIMARY};

/// Short uppercase marker in the pane's top-right ("LIVE", "DEAD", …).
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
}

/// Framed block for a pane. `number_key` is the digit that focuses the pane
/// and is shown as a hint before the title. `borders` lets adjacent panes
/// share an edge instead of doubling it.
pub fn pane_chrome_borders<'a>(
    title: &'a str,
    number_key: Option<char>,
    focused: bool,
    badge: Option<Badge<'a>>,
    borders: Borders,
) -> Block<'a> {
    let (edge, header) = if focused {
        (
            style_focused_border(),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        )
    } else {
        (style_unfocused_border(), Style::default().fg(C_MUTED))
    };

    let mut title_line = Line::default();
    if let Some(key) = number_key {
        title_line.push_span(Span::styled(
            format!("[{key}] "),
            Style::default().fg(C_NUMBER_HINT),
        ));
    }
    title_line.push_span(Span::styled(title, header));

    let mut block = Block::default()
        .borders(borders)
        .border_style(edge)
        .title(title_line);

    if let Some(Badge { text, color }) = badge {
        block = block.title_top(
            Line::from(Span::styled(
                format!(" {text} "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        );
    }
    block
}
