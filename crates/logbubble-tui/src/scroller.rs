//! Virtual scroller
//!
//! Renders only the slice of the working log list that intersects the
//! viewport, plus an overscan margin on both edges. Heights are in abstract
//! scroll units: the panel widget instantiates with one unit per terminal
//! row, embedders with pixel-like units keep the defaults. Re-render cost is
//! O(visible window), and a recompute that lands on the same window as last
//! time is free.

use logbubble_core::LogEntry;

pub const DEFAULT_ITEM_HEIGHT: u32 = 48;
pub const DEFAULT_OVERSCAN: usize = 5;

/// One row to materialize: which log, and its absolute offset from the top
/// of the scroll content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlacement {
    pub index: usize,
    pub offset: u32,
}

/// The computed visible window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWindow {
    /// Half-open index range into the working log list.
    pub start: usize,
    pub end: usize,
    /// Full content height; sizes the scrollbar without materializing rows.
    pub total_height: u32,
    pub rows: Vec<RowPlacement>,
}

#[derive(Debug)]
pub struct VirtualScroller {
    item_height: u32,
    overscan: usize,
    scroll_offset: u32,
    viewport_height: u32,
    last_range: Option<(usize, usize)>,
    logs: Vec<LogEntry>,
}

impl Default for VirtualScroller {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_HEIGHT, DEFAULT_OVERSCAN)
    }
}

impl VirtualScroller {
    pub fn new(item_height: u32, overscan: usize) -> Self {
        Self {
            item_height: item_height.max(1),
            overscan,
            scroll_offset: 0,
            viewport_height: 0,
            last_range: None,
            logs: Vec::new(),
        }
    }

    /// Replace the working log list and invalidate the last rendered range,
    /// forcing the next [`compute_window`](Self::compute_window) to produce
    /// a window even if the indices happen to match.
    pub fn render_visible_logs(&mut self, logs: Vec<LogEntry>) {
        self.logs = logs;
        self.last_range = None;
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn log_at(&self, index: usize) -> Option<&LogEntry> {
        self.logs.get(index)
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Resize path: the containing viewport was re-measured.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height;
    }

    pub fn set_scroll_offset(&mut self, offset: u32) {
        self.scroll_offset = offset;
    }

    /// Scroll by a signed number of units, saturating at the top. The bottom
    /// clamp happens during window computation.
    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self
            .total_height()
            .saturating_sub(self.viewport_height);
    }

    pub fn total_height(&self) -> u32 {
        self.logs.len() as u32 * self.item_height
    }

    /// Compute the window for the current scroll state.
    ///
    /// `None` means the window is identical to the last one rendered and
    /// nothing needs to be redrawn. A degenerate range (zero-height
    /// viewport) resets the scroll position and retries once.
    pub fn compute_window(&mut self) -> Option<RenderWindow> {
        let total = self.logs.len();
        if total == 0 {
            if self.last_range == Some((0, 0)) {
                return None;
            }
            self.last_range = Some((0, 0));
            return Some(RenderWindow {
                start: 0,
                end: 0,
                total_height: 0,
                rows: Vec::new(),
            });
        }

        let total_height = self.total_height();
        for attempt in 0..2 {
            let max_scroll = total_height.saturating_sub(self.viewport_height);
            if self.scroll_offset > max_scroll {
                self.scroll_offset = max_scroll;
            }

            let start_index = (self.scroll_offset / self.item_height) as usize;
            let end_index =
                (self.scroll_offset + self.viewport_height).div_ceil(self.item_height) as usize;

            let render_start = start_index.saturating_sub(self.overscan);
            let render_end = (end_index + self.overscan).min(total);

            if render_start >= render_end {
                if attempt == 1 {
                    return None;
                }
                self.scroll_offset = 0;
                self.last_range = None;
                continue;
            }

            if self.last_range == Some((render_start, render_end)) {
                return None;
            }
            self.last_range = Some((render_start, render_end));

            let rows = (render_start..render_end)
                .map(|index| RowPlacement {
                    index,
                    offset: index as u32 * self.item_height,
                })
                .collect();

            return Some(RenderWindow {
                start: render_start,
                end: render_end,
                total_height,
                rows,
            });
        }
        None
    }
}
