//! Sub-cell progress rendering for the player timeline and the caption
//! service's download meter. Fractional fill uses the U+258x eighth blocks,
//! so a 24-cell bar resolves 192 steps.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PLAYING, C_SECONDARY};

const EIGHTHS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Playback timeline: elapsed label, bar, total label.
pub fn draw_timeline(frame: &mut Frame, area: Rect, position_secs: f64, duration_secs: f64) {
    if area.width < 4 || area.height == 0 || duration_secs <= 0.0 {
        return;
    }
    let elapsed = fmt_clock(position_secs);
    let total = fmt_clock(duration_secs);
    let bar_width = area
        .width
        .saturating_sub((elapsed.len() + total.len() + 2) as u16)
        .max(4) as usize;
    let bar = fill_string((position_secs / duration_secs).clamp(0.0, 1.0), bar_width);

    let line = Line::from(vec![
        Span::styled(elapsed, Style::default().fg(C_SECONDARY)),
        Span::raw(" "),
        Span::styled(bar, Style::default().fg(C_PLAYING)),
        Span::raw(" "),
        Span::styled(total, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Bare meter without labels, for ratios like a model-download fraction.
pub fn draw_meter(frame: &mut Frame, area: Rect, ratio: f64) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let bar = fill_string(ratio.clamp(0.0, 1.0), area.width as usize);
    frame.render_widget(
        Paragraph::new(Span::styled(bar, Style::default().fg(C_PLAYING))),
        area,
    );
}

/// Build a `width`-char string filled to `ratio`, with the boundary cell
/// rounded down to the nearest eighth.
fn fill_string(ratio: f64, width: usize) -> String {
    let steps = (ratio * (width * 8) as f64) as usize;
    let whole = steps / 8;
    let mut out = String::with_capacity(width * 3);
    for _ in 0..whole.min(width) {
        out.push('█');
    }
    if whole < width {
        out.push(EIGHTHS[steps % 8]);
        for _ in whole + 1..width {
            out.push(' ');
        }
    }
    out
}

fn fmt_clock(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_always_width_chars() {
        for ratio in [0.0, 0.13, 0.5, 0.99, 1.0] {
            assert_eq!(fill_string(ratio, 10).chars().count(), 10);
        }
    }

    #[test]
    fn fill_endpoints() {
        assert_eq!(fill_string(0.0, 4), "    ");
        assert_eq!(fill_string(1.0, 4), "████");
        // Half of one cell lands on the four-eighths block.
        assert_eq!(fill_string(0.5, 1), "▌");
    }

    #[test]
    fn clock_formats() {
        assert_eq!(fmt_clock(0.0), "0:00");
        assert_eq!(fmt_clock(75.0), "1:15");
        assert_eq!(fmt_clock(3661.0), "1:01:01");
        assert_eq!(fmt_clock(-5.0), "0:00");
    }
}
