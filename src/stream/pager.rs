use std::ops::Range;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}
/// Position of a fixed-size page over a historical sequence.
///
/// The cursor never stores the sequence length; every operation takes it so the
/// same cursor can be re-clamped when the caller swaps in a longer or shorter
/// sequence. `start_index` stays within `0..=len.saturating_sub(page_size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowCursor {
    start_index: usize,
    page_size: usize,
}
impl WindowCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            start_index: 0,
            page_size: page_size.max(1),
        }
    }
    pub fn start_index(&self) -> usize {
        self.start_index
    }
    pub fn page_size(&self) -> usize {
        self.page_size
    }
    fn max_start(&self, len: usize) -> usize {
        len.saturating_sub(self.page_size)
    }
    pub fn step(self, len: usize, direction: Direction) -> Self {
        let start_index = match direction {
            Direction::Backward => self.start_index.saturating_sub(self.page_size),
            Direction::Forward => self
                .max_start(len)
                .min(self.start_index.saturating_add(self.page_size)),
        };
        Self {
            start_index,
            ..self
        }
    }
    pub fn with_page_size(self, page_size: usize, len: usize) -> Self {
        let resized = Self {
            page_size: page_size.max(1),
            ..self
        };
        Self {
            start_index: resized.max_start(len).min(resized.start_index),
            ..resized
        }
    }
    /// Back to the first page, keeping the page size.
    pub fn reset(self) -> Self {
        Self {
            start_index: 0,
            ..self
        }
    }
    pub fn last_page(self, len: usize) -> Self {
        Self {
            start_index: self.max_start(len),
            ..self
        }
    }
    /// `[start, start + page_size)` clamped to `[0, len)`.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.start_index.min(len);
        let end = start.saturating_add(self.page_size).min(len);
        start..end
    }
    pub fn view<'a, T>(&self, sequence: &'a [T]) -> &'a [T] {
        &sequence[self.range(sequence.len())]
    }
}
/// Moves the cursor one page and returns the new cursor with its slice.
pub fn page<T>(cursor: WindowCursor, sequence: &[T], direction: Direction) -> (WindowCursor, &[T]) {
    let next = cursor.step(sequence.len(), direction);
    (next, next.view(sequence))
}
