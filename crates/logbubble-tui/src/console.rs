//! UI orchestrator
//!
//! `LogConsole` wires store subscriptions, filter changes, and scroll state
//! into the panel. It is the sole consumer of the store's observe surface
//! and keeps its own mirror of the buffer so each published entry updates
//! incrementally: a mutated entry replaces in place by key, a fresh entry
//! appends, and only a filter change recomputes the visible list from
//! scratch.

use crate::filter::{FilterManager, LogFilter};
use crate::panel::{self, PanelContext};
use crate::scroller::{RenderWindow, VirtualScroller};
use crate::theme::Theme;
use crate::view_model::export_line;
use logbubble_core::{EntryKey, LogEntry, StoreHandle, SubscriptionId, MAX_LOGS};
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Unread badge caps here, displayed as "99+".
const UNREAD_BADGE_CAP: u32 = 99;

type Inbox = Rc<RefCell<VecDeque<LogEntry>>>;

/// The log panel orchestrator. One per store.
pub struct LogConsole {
    store: StoreHandle,
    subscription: Option<SubscriptionId>,
    /// Entries published by the store, drained once per tick. The listener
    /// only queues; it never touches the store.
    inbox: Inbox,

    all_logs: Vec<LogEntry>,
    index_by_key: HashMap<EntryKey, usize>,
    filtered: Vec<LogEntry>,

    filter: FilterManager,
    scroller: VirtualScroller,
    window: Option<RenderWindow>,

    visible: bool,
    unread: u32,
    /// Stick to the newest entry until the user scrolls away.
    follow: bool,
    cursor: usize,
    detail_key: Option<EntryKey>,

    theme: Theme,
}

impl LogConsole {
    /// Attach to a store: seeds the mirror from the current buffer and
    /// subscribes for everything after.
    pub fn attach(store: StoreHandle) -> Self {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let subscription = {
            let inbox = inbox.clone();
            store
                .borrow_mut()
                .subscribe(move |entry| inbox.borrow_mut().push_back(entry.clone()))
        };

        let all_logs = store.borrow().get_logs(None);
        let index_by_key = all_logs
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key, i))
            .collect();

        let mut console = Self {
            store,
            subscription: Some(subscription),
            inbox,
            all_logs,
            index_by_key,
            filtered: Vec::new(),
            filter: FilterManager::new(),
            scroller: VirtualScroller::new(1, crate::scroller::DEFAULT_OVERSCAN),
            window: None,
            visible: false,
            unread: 0,
            follow: true,
            cursor: 0,
            detail_key: None,
            theme: Theme::default(),
        };
        console.recompute_filtered();
        console
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn unread_badge(&self) -> Option<String> {
        match self.unread {
            0 => None,
            n if n > UNREAD_BADGE_CAP => Some("99+".to_string()),
            n => Some(n.to_string()),
        }
    }

    /// Drain entries published since the last tick into the mirror.
    pub fn poll(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            match next {
                Some(entry) => self.apply_entry(entry),
                None => break,
            }
        }
    }

    fn apply_entry(&mut self, entry: LogEntry) {
        if !self.visible {
            self.unread = self.unread.saturating_add(1);
        }

        if let Some(&index) = self.index_by_key.get(&entry.key) {
            // Mutated in place by the dedup engine.
            self.all_logs[index] = entry.clone();
            if let Some(slot) = self.filtered.iter_mut().find(|e| e.key == entry.key) {
                *slot = entry;
            } else if self.filter.should_show(&entry) {
                self.filtered.push(entry);
            }
            self.refresh_scroller();
            return;
        }

        // Fresh entry; mirror the store's FIFO cap.
        self.all_logs.push(entry.clone());
        self.index_by_key.insert(entry.key, self.all_logs.len() - 1);
        while self.all_logs.len() > MAX_LOGS {
            let evicted = self.all_logs.remove(0);
            self.index_by_key.remove(&evicted.key);
            for index in self.index_by_key.values_mut() {
                *index -= 1;
            }
            self.filtered.retain(|e| e.key != evicted.key);
        }

        if self.filter.should_show(&entry) {
            self.filtered.push(entry);
        }
        self.refresh_scroller();
    }

    fn recompute_filtered(&mut self) {
        self.filtered = self
            .filter
            .apply_filter(&self.all_logs)
            .into_iter()
            .cloned()
            .collect();
        self.refresh_scroller();
    }

    fn refresh_scroller(&mut self) {
        self.scroller.render_visible_logs(self.filtered.clone());
        if self.follow {
            self.cursor = self.filtered.len().saturating_sub(1);
            self.scroller.scroll_to_bottom();
        } else {
            self.cursor = self.cursor.min(self.filtered.len().saturating_sub(1));
        }
        if let Some(window) = self.scroller.compute_window() {
            self.window = Some(window);
        }
    }

    /// Open or close the panel. Opening resets the unread badge and jumps to
    /// the newest entry.
    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.unread = 0;
            self.follow = true;
            self.refresh_scroller();
        } else {
            self.detail_key = None;
        }
    }

    pub fn toggle_filter(&mut self, filter: LogFilter) {
        let active = self.filter.toggle(filter);
        log::debug!("log filter -> {active}");
        self.follow = true;
        self.detail_key = None;
        self.recompute_filtered();
    }

    pub fn active_filter(&self) -> LogFilter {
        self.filter.active()
    }

    /// Clear the store and the mirror. Subscription stays.
    pub fn clear(&mut self) {
        self.store.borrow_mut().clear_logs();
        self.all_logs.clear();
        self.index_by_key.clear();
        self.filtered.clear();
        self.unread = 0;
        self.cursor = 0;
        self.follow = true;
        self.detail_key = None;
        self.refresh_scroller();
    }

    /// Plain-text export of the visible (filtered) logs.
    pub fn export_text(&self) -> String {
        self.filtered
            .iter()
            .map(export_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn visible_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_count(&self) -> usize {
        self.all_logs.len()
    }

    fn move_cursor(&mut self, delta: i64) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() - 1;
        let next = (self.cursor as i64 + delta).clamp(0, last as i64) as usize;
        self.cursor = next;
        self.follow = next == last;

        // Keep the cursor row inside the viewport.
        let viewport = self.scroller.viewport_height();
        let offset = self.scroller.scroll_offset();
        let row = next as u32;
        if row < offset {
            self.scroller.set_scroll_offset(row);
        } else if viewport > 0 && row >= offset + viewport {
            self.scroller.set_scroll_offset(row + 1 - viewport);
        }
        if let Some(window) = self.scroller.compute_window() {
            self.window = Some(window);
        }
    }

    fn toggle_detail(&mut self) {
        if self.detail_key.take().is_some() {
            return;
        }
        self.detail_key = self.filtered.get(self.cursor).map(|e| e.key);
    }

    /// Handle one key event. Returns true when consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !self.visible {
            return match key.code {
                KeyCode::Char(' ') => {
                    self.toggle_visible();
                    true
                }
                _ => false,
            };
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Esc if self.detail_key.is_none() => {
                self.toggle_visible()
            }
            KeyCode::Esc => self.detail_key = None,
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::PageDown => self.move_cursor(i64::from(self.scroller.viewport_height())),
            KeyCode::PageUp => self.move_cursor(-i64::from(self.scroller.viewport_height())),
            KeyCode::Char('g') | KeyCode::Home => self.move_cursor(i64::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => self.move_cursor(i64::MAX / 2),
            KeyCode::Char('c') => self.toggle_filter(LogFilter::Console),
            KeyCode::Char('n') => self.toggle_filter(LogFilter::Network),
            KeyCode::Char('x') => self.clear(),
            KeyCode::Enter => self.toggle_detail(),
            _ => return false,
        }
        true
    }

    /// Draw the panel (or the collapsed bubble) into the given area.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        if !self.visible {
            panel::render_bubble(frame, area, self.unread_badge().as_deref(), &self.theme);
            return;
        }

        // Re-measure the viewport; a resize invalidates the window geometry.
        let inner_height = u32::from(area.height.saturating_sub(2));
        if inner_height != self.scroller.viewport_height() {
            self.scroller.set_viewport_height(inner_height);
            if self.follow {
                self.scroller.scroll_to_bottom();
            }
        }
        if let Some(window) = self.scroller.compute_window() {
            self.window = Some(window);
        }

        let detail = self
            .detail_key
            .and_then(|key| self.filtered.iter().find(|e| e.key == key));
        let ctx = PanelContext {
            window: self.window.as_ref(),
            logs: self.scroller.logs(),
            filter: self.filter.active(),
            total_count: self.all_logs.len(),
            cursor: self.cursor,
            scroll_offset: self.scroller.scroll_offset(),
            detail,
        };
        panel::render_panel(frame, area, &ctx, &self.theme);
    }
}

impl Drop for LogConsole {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.borrow_mut().unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbubble_core::{LogKind, LogStore, NetEvent, NetStatus};

    fn setup() -> (StoreHandle, LogConsole) {
        let store: StoreHandle = Rc::new(RefCell::new(LogStore::new()));
        let console = LogConsole::attach(store.clone());
        (store, console)
    }

    #[test]
    fn test_new_entries_flow_into_the_mirror() {
        let (store, mut console) = setup();
        store.borrow_mut().add_log("hello", LogKind::Console);
        store.borrow_mut().add_log("[NET] GET /a 200 1ms", LogKind::Fetch);

        console.poll();
        assert_eq!(console.total_count(), 2);
        assert_eq!(console.visible_count(), 2);
    }

    #[test]
    fn test_mutated_entry_replaces_in_place() {
        let (store, mut console) = setup();
        let event = NetEvent::new("GET", "/api", NetStatus::Code(200), 2);
        store.borrow_mut().add_log(event.clone(), LogKind::Fetch);
        console.poll();
        assert_eq!(console.visible_count(), 1);

        store.borrow_mut().add_log(event, LogKind::Fetch);
        console.poll();

        // Still one row, now carrying the collapsed count.
        assert_eq!(console.visible_count(), 1);
        assert_eq!(console.filtered[0].count, 2);
    }

    #[test]
    fn test_filter_toggle_narrows_and_restores() {
        let (store, mut console) = setup();
        store.borrow_mut().add_log("hello", LogKind::Console);
        store.borrow_mut().add_log("[NET] GET /a 200 1ms", LogKind::Fetch);
        console.poll();

        console.toggle_filter(LogFilter::Network);
        assert_eq!(console.visible_count(), 1);
        assert_eq!(console.active_filter(), LogFilter::Network);

        console.toggle_filter(LogFilter::Network);
        assert_eq!(console.visible_count(), 2);
        assert_eq!(console.active_filter(), LogFilter::All);
    }

    #[test]
    fn test_incremental_update_respects_active_filter() {
        let (store, mut console) = setup();
        console.toggle_filter(LogFilter::Console);

        store.borrow_mut().add_log("[NET] GET /a 200 1ms", LogKind::Fetch);
        store.borrow_mut().add_log("visible", LogKind::Console);
        console.poll();

        assert_eq!(console.total_count(), 2);
        assert_eq!(console.visible_count(), 1);
        assert_eq!(console.filtered[0].message, "visible");
    }

    #[test]
    fn test_unread_counts_only_while_hidden() {
        let (store, mut console) = setup();
        store.borrow_mut().add_log("one", LogKind::Console);
        console.poll();
        assert_eq!(console.unread_badge().as_deref(), Some("1"));

        console.toggle_visible();
        assert_eq!(console.unread_badge(), None);

        store.borrow_mut().add_log("two", LogKind::Console);
        console.poll();
        // Panel open: no unread accumulation.
        assert_eq!(console.unread_badge(), None);
    }

    #[test]
    fn test_unread_badge_caps_at_99() {
        let (store, mut console) = setup();
        for i in 0..150 {
            store.borrow_mut().add_log(format!("m{i}"), LogKind::Console);
        }
        console.poll();
        assert_eq!(console.unread_badge().as_deref(), Some("99+"));
    }

    #[test]
    fn test_clear_empties_store_and_mirror() {
        let (store, mut console) = setup();
        store.borrow_mut().add_log("one", LogKind::Console);
        console.poll();

        console.clear();
        assert_eq!(console.total_count(), 0);
        assert!(store.borrow().is_empty());

        // Subscription survives the clear.
        store.borrow_mut().add_log("after", LogKind::Console);
        console.poll();
        assert_eq!(console.total_count(), 1);
    }

    #[test]
    fn test_export_respects_filter() {
        let (store, mut console) = setup();
        store.borrow_mut().add_log("chatter", LogKind::Console);
        store.borrow_mut().add_log("[NET] GET /a 200 1ms", LogKind::Fetch);
        console.poll();

        console.toggle_filter(LogFilter::Network);
        let text = console.export_text();
        assert!(text.contains("[fetch]"));
        assert!(!text.contains("chatter"));
    }

    #[test]
    fn test_mirror_honors_store_capacity() {
        let (store, mut console) = setup();
        for i in 0..(MAX_LOGS + 100) {
            store.borrow_mut().add_log(format!("m{i}"), LogKind::Console);
        }
        console.poll();

        assert_eq!(console.total_count(), MAX_LOGS);
        assert_eq!(console.filtered.len(), MAX_LOGS);
        assert_eq!(console.filtered[0].message, "m100");
    }

    #[test]
    fn test_detach_on_drop_unsubscribes() {
        let (store, console) = setup();
        drop(console);
        // Nothing panics and the listener is gone: adding logs touches no
        // dangling subscriber state.
        store.borrow_mut().add_log("orphan", LogKind::Console);
        assert_eq!(store.borrow().len(), 1);
    }
}
