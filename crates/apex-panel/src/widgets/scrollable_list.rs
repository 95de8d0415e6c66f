//! Scrollable selection list used by the playlist picker.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Keep the selection inside a window of `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// (index, item) pairs visible in `height` rows. Call
    /// [`ensure_visible`](Self::ensure_visible) first.
    pub fn visible_items(&self, height: usize) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(height)
    }

    /// Select the item at `row` of the rendered window. Returns true if it exists.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.items.len() {
            self.selected = target;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> ScrollableList<usize> {
        let mut l = ScrollableList::new();
        l.set_items((0..n).collect());
        l
    }

    #[test]
    fn selection_is_clamped() {
        let mut l = list(3);
        l.select_up(5);
        assert_eq!(l.selected, 0);
        l.select_down(10);
        assert_eq!(l.selected_item(), Some(&2));

        let mut empty = list(0);
        empty.select_down(1);
        assert_eq!(empty.selected_item(), None);
    }

    #[test]
    fn window_follows_selection() {
        let mut l = list(10);
        l.select_down(6);
        l.ensure_visible(4);
        assert_eq!(l.scroll_offset, 3);
        let shown: Vec<usize> = l.visible_items(4).map(|(i, _)| i).collect();
        assert_eq!(shown, vec![3, 4, 5, 6]);

        l.select_first();
        l.ensure_visible(4);
        assert_eq!(l.scroll_offset, 0);
    }

    #[test]
    fn clicks_map_through_the_scroll_offset() {
        let mut l = list(10);
        l.scroll_offset = 5;
        assert!(l.handle_click(2));
        assert_eq!(l.selected, 7);
        assert!(!l.handle_click(6));
    }
}
