//! List state shared by filterable panes: a stable item store plus a `view`
//! of indices into it. Filtering and sorting only ever touch the view, so
//! "original index" stays meaningful for callers that key off playlist order.

use std::cmp::Ordering;

pub struct ScrollableList<T> {
    items: Vec<T>,
    /// Indices into `items`, in display order, post-filter.
    view: Vec<usize>,
    /// Cursor position within `view`.
    cursor: usize,
    /// First view row currently on screen.
    offset: usize,
    pub filter: String,
    matcher: Box<dyn Fn(&T, &str) -> bool + Send + Sync>,
}

impl<T> ScrollableList<T> {
    pub fn new(matcher: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            items: Vec::new(),
            view: Vec::new(),
            cursor: 0,
            offset: 0,
            filter: String::new(),
            matcher: Box::new(matcher),
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.rebuild_filter();
    }

    /// Recompute the view from the current filter, clamping the cursor.
    pub fn rebuild_filter(&mut self) {
        self.view = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.is_empty() || (self.matcher)(item, &self.filter))
            .map(|(i, _)| i)
            .collect();
        self.cursor = self.cursor.min(self.view.len().saturating_sub(1));
    }

    /// Apply a new query, following the previously selected item into the
    /// narrowed view when it survives.
    pub fn set_filter(&mut self, query: &str) {
        let followed = self.selected_original_index();
        self.filter = query.to_string();
        self.rebuild_filter();
        self.cursor = followed
            .and_then(|orig| self.view.iter().position(|&i| i == orig))
            .unwrap_or(0);
        self.offset = 0;
    }

    pub fn select_up(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if !self.view.is_empty() {
            self.cursor = (self.cursor + n).min(self.view.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.view.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(*self.view.get(self.cursor)?)
    }

    pub fn selected_original_index(&self) -> Option<usize> {
        self.view.get(self.cursor).copied()
    }

    /// Move the cursor to the item with this original index, if visible.
    pub fn set_selected_by_original(&mut self, orig_idx: usize) {
        if let Some(pos) = self.view.iter().position(|&i| i == orig_idx) {
            self.cursor = pos;
        }
    }

    /// Scroll just enough to bring the cursor on screen. Call before
    /// `visible_items`.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }

    /// The `(original_index, item)` rows that fit in `height`.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        let end = (self.offset + height).min(self.view.len());
        self.view
            .get(self.offset..end)
            .unwrap_or(&[])
            .iter()
            .map(|&i| (i, &self.items[i]))
            .collect()
    }

    /// Cursor position relative to the rendered window.
    pub fn selected_in_view(&self, height: usize) -> usize {
        self.cursor
            .saturating_sub(self.offset)
            .min(height.saturating_sub(1))
    }

    /// Select the view row under a click. True when something was hit.
    pub fn handle_click(&mut self, row: usize) -> bool {
        match self.offset + row {
            target if target < self.view.len() => {
                self.cursor = target;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Reorder the view only; `items` never moves.
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.view
            .sort_by(|&a, &b| cmp(&self.items[a], &self.items[b]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(names: &[&str]) -> ScrollableList<String> {
        let mut l = ScrollableList::new(|item: &String, q: &str| item.contains(q));
        l.set_items(names.iter().map(|s| s.to_string()).collect());
        l
    }

    #[test]
    fn filter_follows_the_selection() {
        let mut l = list_of(&["alpha", "beta", "album"]);
        l.select_down(2); // "album"
        l.set_filter("al");
        assert_eq!(l.selected_item().map(String::as_str), Some("album"));
        assert_eq!(l.selected_original_index(), Some(2));
    }

    #[test]
    fn sort_reorders_view_not_items() {
        let mut l = list_of(&["c", "a", "b"]);
        l.sort_by(|x, y| x.cmp(y));
        let visible: Vec<&str> = l.visible_items(10).iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(visible, ["a", "b", "c"]);
        // Original index 1 is still "a" after sorting.
        l.set_selected_by_original(1);
        assert_eq!(l.selected_item().map(String::as_str), Some("a"));
    }

    #[test]
    fn scrolling_keeps_cursor_in_window() {
        let mut l = list_of(&["0", "1", "2", "3", "4", "5"]);
        l.select_down(5);
        l.ensure_visible(3);
        assert_eq!(l.selected_in_view(3), 2);
        let visible: Vec<&str> = l.visible_items(3).iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(visible, ["3", "4", "5"]);
    }

    #[test]
    fn click_outside_the_view_is_ignored() {
        let mut l = list_of(&["x", "y"]);
        assert!(l.handle_click(1));
        assert_eq!(l.selected_original_index(), Some(1));
        assert!(!l.handle_click(5));
    }
}
