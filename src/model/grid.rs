//! Column-aware row mapping and scroll-driven load triggers

use serde::{Deserialize, Serialize};

use crate::domain::cursor::Direction;

/// How a flat item window is laid out as rows of `columns` cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    columns: usize,
    row_height_px: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(3, 280)
    }
}

impl GridLayout {
    pub fn new(columns: usize, row_height_px: u32) -> Self {
        Self {
            columns: columns.max(1),
            row_height_px,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_height_px(&self) -> u32 {
        self.row_height_px
    }

    /// Change the column count; the item window is untouched.
    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn row_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.columns)
    }

    pub fn cell<'a, T>(&self, items: &'a [T], row: usize, column: usize) -> Option<&'a T> {
        if column >= self.columns {
            return None;
        }
        items.get(row * self.columns + column)
    }

    /// One row, padded with `None` placeholders up to the column count
    pub fn row<'a, T>(&self, items: &'a [T], row: usize) -> Vec<Option<&'a T>> {
        (0..self.columns)
            .map(|column| self.cell(items, row, column))
            .collect()
    }

    pub fn rows<'a, T>(
        &self,
        items: &'a [T],
        range: std::ops::Range<usize>,
    ) -> Vec<Vec<Option<&'a T>>> {
        range.map(|row| self.row(items, row)).collect()
    }

    /// Scroll offset to add after `prepended` items were inserted at the top
    pub fn compensation_px(&self, prepended: usize) -> u64 {
        self.row_count(prepended) as u64 * u64::from(self.row_height_px)
    }

    pub fn total_extent_px(&self, item_count: usize) -> u64 {
        self.row_count(item_count) as u64 * u64::from(self.row_height_px)
    }
}

/// Scroll container geometry at the time of a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: u64,
    pub client_height: u64,
    pub scroll_height: u64,
}

/// Decide which edge, if any, needs more items
///
/// The trailing edge wins when both are within `threshold_px` (short content).
pub fn load_trigger(
    metrics: ScrollMetrics,
    threshold_px: u64,
    has_items: bool,
) -> Option<Direction> {
    if !has_items {
        return None;
    }
    let ScrollMetrics {
        scroll_top,
        client_height,
        scroll_height,
    } = metrics;
    if scroll_top + client_height >= scroll_height.saturating_sub(threshold_px) {
        Some(Direction::Next)
    } else if scroll_top < threshold_px {
        Some(Direction::Prev)
    } else {
        None
    }
}
