use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::cursor::{Cursor, Direction};

/// An item that can live in a pagination window
///
/// Identity is the stable `id`; `sort_key` is the server-side ordering key used to
/// synthesize keyset cursors.
pub trait WindowItem: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn sort_key(&self) -> Cow<'_, str>;

    /// Keyset cursor pointing at this item
    fn cursor(&self) -> Cursor {
        Cursor::synthesized(&self.sort_key(), self.id())
    }
}

/// One batch of items returned by a single paginated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub prev_cursor: Option<Cursor>,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self {
            items,
            next_cursor,
            prev_cursor: None,
            total_count: None,
        }
    }

    /// An empty page with no cursors (used to signal the start/end of a listing)
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn with_prev_cursor(mut self, prev_cursor: Option<Cursor>) -> Self {
        self.prev_cursor = prev_cursor;
        self
    }

    pub fn with_total_count(mut self, total_count: Option<u64>) -> Self {
        self.total_count = total_count;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parameters for one page fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub dir: Direction,
    pub limit: usize,
}

impl PageRequest {
    /// First page of a listing
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            dir: Direction::Next,
            limit,
        }
    }

    pub fn next(cursor: Cursor, limit: usize) -> Self {
        Self {
            cursor: Some(cursor),
            dir: Direction::Next,
            limit,
        }
    }

    pub fn prev(cursor: Cursor, limit: usize) -> Self {
        Self {
            cursor: Some(cursor),
            dir: Direction::Prev,
            limit,
        }
    }

    /// Query pairs in wire order (`cursor`, `limit`, `dir`)
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("dir", self.dir.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_first_request_has_no_cursor() {
        let request = PageRequest::first(50);
        assert_eq!(
            request.query_pairs(),
            vec![("limit", "50".to_string()), ("dir", "next".to_string())]
        );
    }

    #[test]
    fn test_prev_request_query() {
        let request = PageRequest::prev(Cursor::new("2024-01-01T00:00:00Z,a"), 25);
        assert_eq!(
            request.query_pairs(),
            vec![
                ("cursor", "2024-01-01T00:00:00Z,a".to_string()),
                ("limit", "25".to_string()),
                ("dir", "prev".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_builders() {
        let page: Page<u8> = Page::new(vec![1, 2], Some(Cursor::new("n")))
            .with_prev_cursor(Some(Cursor::new("p")))
            .with_total_count(Some(10));
        assert_eq!(page.len(), 2);
        assert_eq!(page.prev_cursor, Some(Cursor::new("p")));
        assert_eq!(page.total_count, Some(10));
        assert!(Page::<u8>::empty().is_empty());
    }
}
