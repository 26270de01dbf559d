//! Keyboard focus: an ordered ring of pane ids with one cursor.

use crate::action::ComponentId;

#[derive(Default)]
pub struct FocusRing {
    order: Vec<ComponentId>,
    cursor: usize,
}

impl FocusRing {
    pub fn new(order: Vec<ComponentId>) -> Self {
        Self { order, cursor: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.order.get(self.cursor).copied()
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        self.step(1)
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<ComponentId> {
        let len = self.order.len() as isize;
        if len == 0 {
            return None;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
        self.current()
    }

    /// Focus `id` directly; ignored when it is not in the ring.
    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.order.iter().position(|&c| c == id) {
            self.cursor = pos;
        }
    }

    /// Swap in a new ring (panes opened or closed), keeping the currently
    /// focused pane focused when it survives the change.
    pub fn set_items(&mut self, order: Vec<ComponentId>) {
        let focused = self.current();
        self.order = order;
        self.cursor = focused
            .and_then(|id| self.order.iter().position(|&c| c == id))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_both_directions() {
        let mut ring = FocusRing::new(vec![ComponentId::ChannelList, ComponentId::PlayerPanel]);
        assert_eq!(ring.current(), Some(ComponentId::ChannelList));
        assert_eq!(ring.next(), Some(ComponentId::PlayerPanel));
        assert_eq!(ring.next(), Some(ComponentId::ChannelList));
        assert_eq!(ring.prev(), Some(ComponentId::PlayerPanel));
    }

    #[test]
    fn shrinking_ring_keeps_or_resets_focus() {
        let mut ring = FocusRing::new(vec![
            ComponentId::ChannelList,
            ComponentId::PlayerPanel,
            ComponentId::LogPanel,
        ]);
        ring.set(ComponentId::PlayerPanel);
        ring.set_items(vec![ComponentId::ChannelList, ComponentId::PlayerPanel]);
        assert!(ring.is_focused(ComponentId::PlayerPanel));

        ring.set(ComponentId::PlayerPanel);
        ring.set_items(vec![ComponentId::ChannelList]);
        assert!(ring.is_focused(ComponentId::ChannelList));
    }

    #[test]
    fn empty_ring_has_no_focus() {
        let mut ring = FocusRing::default();
        assert_eq!(ring.next(), None);
        assert!(!ring.is_focused(ComponentId::LogPanel));
    }
}
