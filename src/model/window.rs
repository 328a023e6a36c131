//! Bounded window of materialized items
//!
//! The window holds a contiguous slice of a server-ordered listing together with the
//! cursors needed to extend it in either direction. Merges go through the pure
//! [`append_trimmed`] / [`prepend_trimmed`] helpers so that the size cap and id
//! uniqueness hold after every step.

use std::collections::HashSet;

use crate::domain::{
    cursor::{Cursor, CursorMode},
    page::{Page, WindowItem},
};

/// Outcome of merging one page into the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Merge {
    /// Items actually inserted (after de-duplication)
    pub added: usize,
    /// Items trimmed from the opposite edge to respect the size cap
    pub dropped: usize,
}

/// Append `incoming` after `items`, skipping known ids and dropping the oldest prefix
/// beyond `max_size`.
pub fn append_trimmed<T: WindowItem>(
    mut items: Vec<T>,
    incoming: Vec<T>,
    max_size: usize,
) -> (Vec<T>, Merge) {
    let fresh = unseen(&items, incoming);
    let added = fresh.len();
    items.extend(fresh);

    let dropped = items.len().saturating_sub(max_size);
    if dropped > 0 {
        items.drain(..dropped);
    }
    (items, Merge { added, dropped })
}

/// Prepend `incoming` before `items`, skipping known ids and dropping the newest suffix
/// beyond `max_size`.
pub fn prepend_trimmed<T: WindowItem>(
    items: Vec<T>,
    incoming: Vec<T>,
    max_size: usize,
) -> (Vec<T>, Merge) {
    let mut merged = unseen(&items, incoming);
    let added = merged.len();
    merged.extend(items);

    let dropped = merged.len().saturating_sub(max_size);
    merged.truncate(max_size);
    (merged, Merge { added, dropped })
}

fn unseen<T: WindowItem>(items: &[T], incoming: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<String> = items.iter().map(|item| item.id().to_owned()).collect();
    incoming
        .into_iter()
        .filter(|item| seen.insert(item.id().to_owned()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window<T> {
    items: Vec<T>,
    forward_cursor: Option<Cursor>,
    backward_cursor: Option<Cursor>,
    start_offset: usize,
    reached_end: bool,
    reached_start: bool,
    max_size: usize,
}

impl<T: WindowItem> Window<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::new(),
            forward_cursor: None,
            backward_cursor: None,
            start_offset: 0,
            reached_end: false,
            reached_start: false,
            max_size: max_size.max(1),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn forward_cursor(&self) -> Option<&Cursor> {
        self.forward_cursor.as_ref()
    }

    /// Absolute index of the first held item within the full listing
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn reached_start(&self) -> bool {
        self.reached_start
    }

    /// Cursor for the next backward fetch
    ///
    /// A server-issued marker wins; otherwise it is derived from the first item
    /// (keyset) or the start offset (offset). `None` means there is nothing before.
    pub fn backward_key(&self, mode: CursorMode) -> Option<Cursor> {
        if self.reached_start {
            return None;
        }
        let first = self.items.first()?;
        if let Some(cursor) = &self.backward_cursor {
            return Some(cursor.clone());
        }
        match mode {
            CursorMode::Keyset => Some(first.cursor()),
            CursorMode::Offset if self.start_offset == 0 => None,
            CursorMode::Offset => Some(Cursor::from_offset(self.start_offset)),
        }
    }

    /// Replace the whole window with a first page
    pub fn replace(&mut self, page: Page<T>) {
        let (items, _) = append_trimmed(Vec::new(), page.items, self.max_size);
        self.items = items;
        self.reached_end = page.next_cursor.is_none();
        self.forward_cursor = page.next_cursor;
        self.backward_cursor = None;
        self.start_offset = 0;
        self.reached_start = true;
    }

    /// Merge a forward page at the tail
    pub fn apply_next(&mut self, page: Page<T>) -> Merge {
        let (items, merge) =
            append_trimmed(std::mem::take(&mut self.items), page.items, self.max_size);
        self.items = items;
        self.reached_end = page.next_cursor.is_none();
        self.forward_cursor = page.next_cursor;
        if merge.dropped > 0 {
            self.start_offset += merge.dropped;
            self.reached_start = false;
            self.backward_cursor = None;
        }
        merge
    }

    /// Merge a backward page at the head
    pub fn apply_prev(&mut self, page: Page<T>, mode: CursorMode) -> Merge {
        if page.is_empty() {
            self.reached_start = true;
            self.backward_cursor = None;
            return Merge::default();
        }

        let (items, merge) =
            prepend_trimmed(std::mem::take(&mut self.items), page.items, self.max_size);
        self.items = items;
        self.start_offset = self.start_offset.saturating_sub(merge.added);
        self.backward_cursor = page.prev_cursor;

        if merge.dropped > 0 {
            self.reached_end = false;
            self.forward_cursor = match mode {
                CursorMode::Keyset => self.items.last().map(WindowItem::cursor),
                CursorMode::Offset => Some(Cursor::from_offset(
                    self.start_offset + self.items.len(),
                )),
            };
        }
        if mode == CursorMode::Offset && self.start_offset == 0 {
            self.reached_start = true;
        }
        merge
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_size);
    }
}
