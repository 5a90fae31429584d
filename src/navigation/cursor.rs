/// Rows moved by page up / page down.
pub const PAGE_ROWS: usize = 5;

/// Selection index into a list.
///
/// Every mutation keeps `index < max(1, len)`; an empty list always has index 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
}

impl Cursor {
    pub fn index(self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Re-establishes the bounds after the list changed length.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.index = 0;
        } else if self.index >= len {
            self.index = len - 1;
        }
    }

    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if self.index + 1 < len {
            self.index += 1;
        }
    }

    pub fn page_up(&mut self) {
        self.index = self.index.saturating_sub(PAGE_ROWS);
    }

    pub fn page_down(&mut self, len: usize) {
        self.index = (self.index + PAGE_ROWS).min(len.saturating_sub(1));
    }

    pub fn first(&mut self) {
        self.index = 0;
    }

    pub fn last(&mut self, len: usize) {
        self.index = len.saturating_sub(1);
    }

    pub fn selected<T>(self, items: &[T]) -> Option<&T> {
        items.get(self.index)
    }
}
