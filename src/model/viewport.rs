//! Virtualization contract and the scroll viewport it is evaluated against

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::grid::ScrollMetrics;

/// Rows to materialize plus the full scrollable height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRows {
    pub rows: Range<usize>,
    pub total_extent_px: u64,
}

/// Maps a row count and a row height estimate to the rows worth rendering
pub trait VirtualizationAdapter: Send + Sync {
    fn visible_rows(
        &self,
        row_count: usize,
        row_height_px: u32,
        viewport: &Viewport,
    ) -> VisibleRows;
}

/// Fixed-height estimate with `overscan` extra rows on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedRowVirtualizer {
    pub overscan: usize,
}

impl Default for EstimatedRowVirtualizer {
    fn default() -> Self {
        Self { overscan: 2 }
    }
}

impl VirtualizationAdapter for EstimatedRowVirtualizer {
    fn visible_rows(
        &self,
        row_count: usize,
        row_height_px: u32,
        viewport: &Viewport,
    ) -> VisibleRows {
        let row_height = u64::from(row_height_px.max(1));
        let total_extent_px = row_count as u64 * row_height;
        if row_count == 0 {
            return VisibleRows {
                rows: 0..0,
                total_extent_px,
            };
        }

        let first = (viewport.scroll_top / row_height) as usize;
        let last = (viewport.scroll_top + viewport.height).div_ceil(row_height) as usize;
        let start = first.saturating_sub(self.overscan).min(row_count);
        let end = (last + self.overscan).min(row_count);
        VisibleRows {
            rows: start..end,
            total_extent_px,
        }
    }
}

/// Scroll position of a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_top: u64,
    pub height: u64,
}

impl Viewport {
    pub fn new(height: u64) -> Self {
        Self {
            scroll_top: 0,
            height,
        }
    }

    pub fn scroll_to(&mut self, scroll_top: u64, total_extent_px: u64) {
        self.scroll_top = scroll_top.min(total_extent_px.saturating_sub(self.height));
    }

    /// Shift by `pixels` to keep the same rows in view after a prepend
    pub fn scroll_by(&mut self, pixels: u64) {
        self.scroll_top += pixels;
    }

    pub fn metrics(&self, total_extent_px: u64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            client_height: self.height,
            scroll_height: total_extent_px,
        }
    }
}
