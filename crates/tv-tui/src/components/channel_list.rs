//! ChannelList component — left pane with the channel line-up.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState},
    Frame,
};

use ratatui::widgets::Borders;
use std::time::Instant;
use tv_core::channel::{Channel, PlaybackStatus};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        C_CONNECTING, C_GROUP, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG, C_STARS,
    },
    widgets::{
        filter_input::{FilterAction, FilterInput},
        pane_chrome::pane_chrome_borders,
        scrollable_list::ScrollableList,
    },
};

/// Sort order for the channel list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SortOrder {
    #[default]
    Default,
    Group,
    Name,
    Stars,
    Recent,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            Self::Default => Self::Group,
            Self::Group => Self::Name,
            Self::Name => Self::Stars,
            Self::Stars => Self::Recent,
            Self::Recent => Self::Default,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Default => Self::Recent,
            Self::Group => Self::Default,
            Self::Name => Self::Group,
            Self::Stars => Self::Name,
            Self::Recent => Self::Stars,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Group => "group",
            Self::Name => "name",
            Self::Stars => "stars",
            Self::Recent => "recent",
        }
    }
}

pub struct ChannelList {
    pub list: ScrollableList<Channel>,
    pub filter_input: FilterInput,
    pub sort_order: SortOrder,
    list_state: ListState,
    /// When set, jump-to this channel on next state update.
    pub jump_from_channel: Option<Option<usize>>,
    /// Which borders to draw (for shared-border layouts).
    pub borders: Borders,
    /// Track last click (row index, time) for double-click detection.
    last_click: Option<(usize, Instant)>,
}

impl ChannelList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(|channel: &Channel, q: &str| channel_matches(channel, q)),
            filter_input: FilterInput::new("channel name or group…"),
            sort_order: SortOrder::Default,
            list_state: ListState::default(),
            jump_from_channel: None,
            borders: Borders::ALL,
            last_click: None,
        }
    }

    /// Update items from player state and re-apply sort+filter.
    pub fn sync_channels(&mut self, state: &AppState) {
        let channels = state.player.channels.clone();
        self.list.set_items(channels);
        self.apply_sort(state);
    }

    fn apply_sort(&mut self, state: &AppState) {
        match self.sort_order {
            SortOrder::Default => {
                // restore original playlist order — rebuild_filter handles this
                self.list.rebuild_filter();
            }
            SortOrder::Group => {
                self.list.sort_by(|a, b| {
                    a.group
                        .to_lowercase()
                        .cmp(&b.group.to_lowercase())
                        .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                });
            }
            SortOrder::Name => {
                self.list
                    .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            }
            SortOrder::Stars => {
                let stars = state.channel_stars.clone();
                self.list.sort_by(move |a, b| {
                    let sa = stars.get(&a.name).copied().unwrap_or(0);
                    let sb = stars.get(&b.name).copied().unwrap_or(0);
                    sb.cmp(&sa)
                        .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                });
            }
            SortOrder::Recent => {
                let recent = state.recent_channel.clone();
                self.list.sort_by(move |a, b| {
                    let ra = recent.get(&a.name).copied().unwrap_or(0);
                    let rb = recent.get(&b.name).copied().unwrap_or(0);
                    rb.cmp(&ra)
                        .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                });
            }
        }
    }

    /// Select the channel by original index in the channels vec.
    pub fn select_by_channel_idx(&mut self, idx: usize) {
        self.list.set_selected_by_original(idx);
    }

    /// Returns the original channel index of the currently selected item.
    pub fn selected_channel_idx(&self) -> Option<usize> {
        self.list.selected_original_index()
    }

    pub fn is_filter_active(&self) -> bool {
        self.filter_input.is_active()
    }

    /// Returns the name of the currently selected channel.
    pub fn selected_name(&self, channels: &[Channel]) -> Option<String> {
        self.selected_channel_idx()
            .and_then(|i| channels.get(i))
            .map(|c| c.name.clone())
    }

    /// Current sort label string (for session persistence).
    pub fn sort_label(&self) -> &'static str {
        self.sort_order.label()
    }

    /// Restore sort order from a label string (session persistence).
    pub fn set_sort_from_label(&mut self, label: &str) {
        self.sort_order = match label {
            "group" => SortOrder::Group,
            "name" => SortOrder::Name,
            "stars" => SortOrder::Stars,
            "recent" => SortOrder::Recent,
            _ => SortOrder::Default,
        };
    }

    fn render_item<'a>(
        &self,
        channel: &'a Channel,
        orig_idx: usize,
        is_selected: bool,
        state: &AppState,
    ) -> ListItem<'a> {
        let ps = &state.player;
        let is_current = ps.current_channel == Some(orig_idx);

        let (icon, icon_color): (&'static str, Color) = if is_current {
            match ps.playback_status {
                PlaybackStatus::Playing => ("▶", C_PLAYING),
                PlaybackStatus::Paused => ("⏸", C_CONNECTING),
                PlaybackStatus::Connecting => ("⋯", C_CONNECTING),
                PlaybackStatus::Error => ("✗", crate::theme::C_ERROR),
                PlaybackStatus::Idle => ("■", C_MUTED),
            }
        } else {
            (" ", C_MUTED)
        };

        let name_color = if is_current {
            match ps.playback_status {
                PlaybackStatus::Playing => C_PLAYING,
                PlaybackStatus::Paused => C_CONNECTING,
                PlaybackStatus::Connecting => C_CONNECTING,
                PlaybackStatus::Error => crate::theme::C_ERROR,
                PlaybackStatus::Idle => C_PRIMARY,
            }
        } else if is_selected {
            C_PRIMARY
        } else {
            C_SECONDARY
        };

        let name_style = if is_current || is_selected {
            Style::default().fg(name_color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(name_color)
        };

        let item_bg = if is_selected {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };

        let stars = state.channel_stars_for(&channel.name).min(3);
        let star_prefix = if stars > 0 {
            format!("{} ", "✹".repeat(stars as usize))
        } else {
            "  ".to_string()
        };

        let mut spans: Vec<Span> = vec![
            Span::styled(star_prefix, Style::default().fg(C_STARS)),
            Span::styled(icon, Style::default().fg(icon_color)),
            Span::raw("  "),
            Span::styled(channel.name.clone(), name_style),
        ];

        if !channel.group.is_empty() {
            spans.push(Span::styled("  ", Style::default()));
            spans.push(Span::styled(
                channel.group.clone(),
                Style::default().fg(C_GROUP),
            ));
        }

        ListItem::new(Line::from(spans)).style(item_bg)
    }
}

fn channel_matches(channel: &Channel, q: &str) -> bool {
    if q.trim().is_empty() {
        return true;
    }
    let q = q.to_lowercase();
    let text = format!(
        "{} {}",
        channel.name.to_lowercase(),
        channel.group.to_lowercase()
    );
    q.split_whitespace().all(|term| text.contains(term))
}

impl Component for ChannelList {
    fn id(&self) -> ComponentId {
        ComponentId::ChannelList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        // Filter mode input
        if self.filter_input.is_active() {
            match key.code {
                KeyCode::Up => {
                    self.list.select_up(1);
                    return vec![];
                }
                KeyCode::Down => {
                    self.list.select_down(1);
                    return vec![];
                }
                _ => {}
            }
            match self.filter_input.handle_key(key) {
                FilterAction::Changed(q) => {
                    self.list.set_filter(&q);
                    return vec![];
                }
                FilterAction::Confirmed => {
                    // Keep the filter applied, leave filter mode.
                    return vec![Action::CloseFilter];
                }
                FilterAction::Cancelled => {
                    self.list.set_filter("");
                    return vec![Action::CloseFilter];
                }
                FilterAction::None => return vec![],
            }
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),

            KeyCode::Enter => {
                if let Some(idx) = self.list.selected_original_index() {
                    let is_current = state.player.current_channel == Some(idx);
                    let is_active = is_current
                        && matches!(
                            state.player.playback_status,
                            PlaybackStatus::Playing | PlaybackStatus::Connecting
                        );
                    if is_active {
                        // Enter on the currently-playing channel stops it.
                        return vec![Action::Stop];
                    } else {
                        // Enter on any other channel (or same channel when stopped/idle) plays it.
                        return vec![Action::Play(idx)];
                    }
                }
            }
            KeyCode::Char(' ') => {
                let is_active = matches!(
                    state.player.playback_status,
                    PlaybackStatus::Playing | PlaybackStatus::Connecting
                ) && state.player.current_channel.is_some();

                if is_active {
                    // Space pauses/resumes whatever is currently playing.
                    return vec![Action::TogglePause];
                } else if let Some(idx) = self.list.selected_original_index() {
                    // Space when idle plays the selected channel.
                    return vec![Action::Play(idx)];
                }
            }

            KeyCode::Char('/') => {
                self.filter_input.activate();
                return vec![Action::OpenFilter];
            }

            KeyCode::Char('s') => {
                self.sort_order = self.sort_order.next();
                self.apply_sort(state);
            }
            KeyCode::Char('S') => {
                self.sort_order = self.sort_order.prev();
                self.apply_sort(state);
            }

            KeyCode::Char('*') => {
                if let Some(ch) = self.list.selected_item() {
                    let cur = state.channel_stars_for(&ch.name);
                    let next = (cur + 1) % 4;
                    return vec![Action::SetStar(next, ch.name.clone())];
                }
            }

            KeyCode::Char('n') => {
                self.jump_from_channel = Some(state.player.current_channel);
                return vec![Action::Next];
            }
            KeyCode::Char('p') => {
                self.jump_from_channel = Some(state.player.current_channel);
                return vec![Action::Prev];
            }
            KeyCode::Char('r') => {
                self.jump_from_channel = Some(state.player.current_channel);
                return vec![Action::Random];
            }

            KeyCode::Char('y') => {
                if let Some(ch) = self.list.selected_item() {
                    return vec![Action::CopyToClipboard(ch.url.clone())];
                }
            }

            _ => {}
        }

        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize; // +1 for header
        match event.kind {
            MouseEventKind::ScrollUp => {
                self.list.select_up(1);
            }
            MouseEventKind::ScrollDown => {
                self.list.select_down(1);
            }
            MouseEventKind::Down(ratatui::crossterm::event::MouseButton::Left) => {
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);

                if self.list.handle_click(rel_row) {
                    if is_double {
                        // Double-click: play the channel
                        self.last_click = None;
                        if let Some(idx) = self.list.selected_original_index() {
                            return vec![Action::Play(idx)];
                        }
                    } else {
                        self.last_click = Some((rel_row, now));
                    }
                } else {
                    self.last_click = Some((rel_row, now));
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::CloseFilter = action {
            self.filter_input.deactivate();
        }
        // Check for jump-to after shuffle/next/prev
        if let Some(from) = self.jump_from_channel {
            if state.player.current_channel != from {
                if let Some(idx) = state.player.current_channel {
                    self.list.set_selected_by_original(idx);
                }
                self.jump_from_channel = None;
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome_borders("channels", Some('1'), focused, None, self.borders);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.player.channels.is_empty() {
            frame.render_widget(
                ratatui::widgets::Paragraph::new(Span::styled(
                    "  no channels loaded",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        if self.list.is_empty() && !self.list.filter.is_empty() {
            frame.render_widget(
                ratatui::widgets::Paragraph::new(Span::styled(
                    "  no channels match filter",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let content_h = inner.height as usize;
        self.list.ensure_visible(content_h);
        let items_with_idx: Vec<(usize, Channel)> = self
            .list
            .visible_items(content_h)
            .into_iter()
            .map(|(i, c)| (i, c.clone()))
            .collect();
        let sel_in_view = self.list.selected_in_view(content_h);

        let items: Vec<ListItem> = items_with_idx
            .iter()
            .enumerate()
            .map(|(view_row, (orig_idx, channel))| {
                let is_selected = view_row == sel_in_view;
                self.render_item(channel, *orig_idx, is_selected, state)
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default())
            .highlight_symbol("");

        self.list_state.select(Some(sel_in_view));
        frame.render_stateful_widget(list, inner, &mut self.list_state);

        // Filter input bar drawn at bottom of inner area if active
        if self.filter_input.is_active() {
            let filter_area = Rect {
                y: inner.y + inner.height.saturating_sub(1),
                height: 1,
                ..inner
            };
            self.filter_input.draw(frame, filter_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(name: &str, group: &str) -> Channel {
        Channel {
            name: name.to_string(),
            group: group.to_string(),
            ..Channel::default()
        }
    }

    #[test]
    fn filter_matches_name_and_group_terms() {
        let c = ch("Globo SP", "ABERTO");
        assert!(channel_matches(&c, "globo"));
        assert!(channel_matches(&c, "aberto"));
        assert!(channel_matches(&c, "globo aberto"));
        assert!(!channel_matches(&c, "globo filmes"));
        assert!(channel_matches(&c, "  "));
    }

    #[test]
    fn sort_order_cycle_round_trips() {
        let mut order = SortOrder::Default;
        for _ in 0..5 {
            order = order.next();
        }
        assert_eq!(order, SortOrder::Default);
        assert_eq!(SortOrder::Default.prev(), SortOrder::Recent);
    }

    #[test]
    fn sort_label_round_trips() {
        for order in [
            SortOrder::Default,
            SortOrder::Group,
            SortOrder::Name,
            SortOrder::Stars,
            SortOrder::Recent,
        ] {
            let mut list = ChannelList::new();
            list.set_sort_from_label(order.label());
            assert_eq!(list.sort_order, order);
        }
    }
}
