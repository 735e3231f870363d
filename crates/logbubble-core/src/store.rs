//! Log store
//!
//! Append-only, capacity-bounded buffer of log entries with two collapsing
//! strategies for repeated events, payload size screening, and synchronous
//! publish/subscribe. Single logical writer; every mutation happens inside
//! one `add_log` call and listeners are notified in registration order
//! before it returns.

use crate::entry::{EntryKey, LogCategory, LogEntry, LogKind};
use crate::event::{parse_net_line, DedupKey, NetEvent};
use crate::sizer::{estimate_size, CRITICAL_PAYLOAD_BYTES};
use crate::value::LogValue;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Maximum number of entries retained; oldest-first eviction beyond this.
pub const MAX_LOGS: usize = 500;

/// Two network events with the same dedup key arriving within this window
/// collapse into one entry.
pub const DEDUP_WINDOW_MS: i64 = 750;

/// What a sink hands to [`LogStore::add_log`].
#[derive(Debug, Clone)]
pub enum LogPayload {
    /// A preformatted display line.
    Text(String),
    /// An arbitrary captured value, size-estimated and serialized here.
    Value(LogValue),
    /// A structured network event.
    Net(NetEvent),
}

impl From<&str> for LogPayload {
    fn from(s: &str) -> Self {
        LogPayload::Text(s.to_string())
    }
}

impl From<String> for LogPayload {
    fn from(s: String) -> Self {
        LogPayload::Text(s)
    }
}

impl From<LogValue> for LogPayload {
    fn from(value: LogValue) -> Self {
        LogPayload::Value(value)
    }
}

impl From<NetEvent> for LogPayload {
    fn from(event: NetEvent) -> Self {
        LogPayload::Net(event)
    }
}

impl From<serde_json::Value> for LogPayload {
    fn from(value: serde_json::Value) -> Self {
        LogPayload::Value(LogValue::from(value))
    }
}

/// Handle returned by [`LogStore::subscribe`]; pass back to
/// [`LogStore::unsubscribe`] to deregister exactly that listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&LogEntry)>;

/// Most recent entry seen for a dedup key, and when.
struct WindowSlot {
    entry_key: EntryKey,
    at_ms: i64,
}

/// The append-only, capacity-bounded log buffer.
pub struct LogStore {
    entries: VecDeque<LogEntry>,
    recent_net: HashMap<DedupKey, WindowSlot>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    seq: u64,
    clock: Box<dyn Fn() -> i64>,
}

impl fmt::Debug for LogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStore")
            .field("entries", &self.entries.len())
            .field("recent_net", &self.recent_net.len())
            .field("listeners", &self.listeners.len())
            .field("seq", &self.seq)
            .finish()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore {
    /// Store using the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(|| chrono::Utc::now().timestamp_millis()))
    }

    /// Store with an injected millisecond clock. Lets tests drive the dedup
    /// window deterministically.
    pub fn with_clock(clock: Box<dyn Fn() -> i64>) -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_LOGS),
            recent_net: HashMap::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            seq: 0,
            clock,
        }
    }

    /// Ingest one event.
    ///
    /// Runs the payload sizer, applies both collapsing strategies, enforces
    /// the capacity cap, and synchronously notifies subscribers with the
    /// entry that changed (new or mutated). Never panics, whatever the
    /// payload.
    pub fn add_log(&mut self, payload: impl Into<LogPayload>, kind: LogKind) {
        let now_ms = (self.clock)();
        let category = kind.category();
        let (message, is_critical, dedup_key) = self.finalize(payload.into(), category);

        // Strategy 1: network short-window dedup against the key table.
        if category == LogCategory::Network {
            if let Some(key) = &dedup_key {
                if let Some(slot) = self.recent_net.get_mut(key) {
                    if now_ms - slot.at_ms <= DEDUP_WINDOW_MS {
                        slot.at_ms = now_ms;
                        let entry_key = slot.entry_key;
                        if let Some(entry) =
                            self.entries.iter_mut().rev().find(|e| e.key == entry_key)
                        {
                            entry.absorb(now_ms);
                            let changed = entry.clone();
                            self.notify(&changed);
                            return;
                        }
                        // Stale slot with no live entry; fall through to append.
                        self.recent_net.remove(key);
                    }
                }
            }
        }

        // Strategy 2: collapse into the immediate predecessor.
        if let Some(last) = self.entries.back_mut() {
            if last.category == category {
                let repeats = match category {
                    LogCategory::Console => last.kind == kind && last.message == message,
                    LogCategory::Network => {
                        dedup_key.is_some()
                            && last.dedup_key == dedup_key
                            && now_ms - last.timestamp <= DEDUP_WINDOW_MS
                    }
                };
                if repeats {
                    last.absorb(now_ms);
                    if let Some(key) = &dedup_key {
                        if let Some(slot) = self.recent_net.get_mut(key) {
                            slot.at_ms = now_ms;
                        }
                    }
                    let changed = last.clone();
                    self.notify(&changed);
                    return;
                }
            }
        }

        // Fresh entry.
        self.seq += 1;
        let entry = LogEntry {
            key: EntryKey {
                created_ms: now_ms,
                seq: self.seq,
            },
            timestamp: now_ms,
            message,
            kind,
            category,
            is_critical,
            count: 1,
            dedup_key: dedup_key.clone(),
        };

        if category == LogCategory::Network {
            if let Some(key) = dedup_key {
                self.recent_net.insert(
                    key,
                    WindowSlot {
                        entry_key: entry.key,
                        at_ms: now_ms,
                    },
                );
            }
        }

        let published = entry.clone();
        self.entries.push_back(entry);

        while self.entries.len() > MAX_LOGS {
            if let Some(evicted) = self.entries.pop_front() {
                self.recent_net
                    .retain(|_, slot| slot.entry_key != evicted.key);
                log::debug!("evicted log entry {} (buffer at capacity)", evicted.key);
            }
        }

        self.notify(&published);
    }

    /// Snapshot of the current entries, optionally restricted to a category.
    /// Callers get copies; mutating the result cannot corrupt the store.
    pub fn get_logs(&self, filter: Option<LogCategory>) -> Vec<LogEntry> {
        match filter {
            None => self.entries.iter().cloned().collect(),
            Some(category) => self
                .entries
                .iter()
                .filter(|e| e.category == category)
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the buffer and the dedup table. Subscriber registration is not
    /// affected.
    pub fn clear_logs(&mut self) {
        self.entries.clear();
        self.recent_net.clear();
    }

    /// Register a listener invoked once per new-or-mutated entry, in
    /// registration order, synchronously within `add_log`.
    ///
    /// Listeners must not call back into the store; re-entrant mutation from
    /// a callback is unsupported.
    pub fn subscribe(&mut self, listener: impl FnMut(&LogEntry) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Deregister a listener. Returns false when the id is unknown (already
    /// unsubscribed).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Turn a payload into the finalized message plus dedup metadata.
    fn finalize(
        &self,
        payload: LogPayload,
        category: LogCategory,
    ) -> (String, bool, Option<DedupKey>) {
        match payload {
            LogPayload::Net(event) => {
                let key = (category == LogCategory::Network).then(|| event.dedup_key());
                (event.display_line(), false, key)
            }
            LogPayload::Text(text) => {
                let key = (category == LogCategory::Network)
                    .then(|| parse_net_line(&text).ok().map(|e| e.dedup_key()))
                    .flatten();
                let size = 2 * text.chars().count();
                if size > CRITICAL_PAYLOAD_BYTES {
                    (redacted_message(size), true, key)
                } else {
                    (text, false, key)
                }
            }
            LogPayload::Value(value) => {
                let size = estimate_size(&value);
                if size > CRITICAL_PAYLOAD_BYTES {
                    (redacted_message(size), true, None)
                } else {
                    let message = value
                        .to_json()
                        .unwrap_or_else(|_| value.render_compact());
                    (message, false, None)
                }
            }
        }
    }

    fn notify(&mut self, entry: &LogEntry) {
        // Listeners are invoked with the store borrow released on their
        // side; registrations made during a callback survive the swap.
        let mut active = std::mem::take(&mut self.listeners);
        for (_, listener) in active.iter_mut() {
            listener(entry);
        }
        active.append(&mut self.listeners);
        self.listeners = active;
    }
}

fn redacted_message(estimated_bytes: usize) -> String {
    format!(
        "[payload omitted: ~{} KiB exceeds the {} KiB limit]",
        estimated_bytes / 1024,
        CRITICAL_PAYLOAD_BYTES / 1024
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NetStatus;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Store driven by a hand-cranked clock.
    fn test_store() -> (LogStore, Rc<Cell<i64>>) {
        let now = Rc::new(Cell::new(1_000));
        let clock = {
            let now = now.clone();
            Box::new(move || now.get())
        };
        (LogStore::with_clock(clock), now)
    }

    fn get_request() -> NetEvent {
        NetEvent::new("GET", "/api/users", NetStatus::Code(200), 5)
    }

    #[test]
    fn test_repeat_within_window_collapses() {
        let (mut store, now) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        now.set(now.get() + 200);
        store.add_log(get_request(), LogKind::Fetch);

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].count, 2);
        // Timestamp reflects the most recent contributing event.
        assert_eq!(logs[0].timestamp, 1_200);
    }

    #[test]
    fn test_repeat_after_window_is_a_new_entry() {
        let (mut store, now) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        now.set(now.get() + 1_000);
        store.add_log(get_request(), LogKind::Fetch);

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|e| e.count == 1));
    }

    #[test]
    fn test_window_slides_with_each_absorbed_repeat() {
        let (mut store, now) = test_store();
        for _ in 0..5 {
            store.add_log(get_request(), LogKind::Fetch);
            now.set(now.get() + 500);
        }
        // 500 ms gaps each within the 750 ms window of the previous hit.
        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].count, 5);
    }

    #[test]
    fn test_different_status_never_collapses() {
        let (mut store, _) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        store.add_log(
            NetEvent::new("GET", "/api/users", NetStatus::Code(500), 5),
            LogKind::Fetch,
        );

        assert_eq!(store.get_logs(None).len(), 2);
    }

    #[test]
    fn test_preformatted_line_collapses_by_parsed_key() {
        let (mut store, now) = test_store();
        store.add_log("[NET] GET /api 200 5ms", LogKind::Fetch);
        now.set(now.get() + 100);
        store.add_log("[NET] GET /api 200 9ms", LogKind::Fetch);

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].count, 2);
        // The first display line wins; only count/timestamp mutate.
        assert_eq!(logs[0].message, "[NET] GET /api 200 5ms");
    }

    #[test]
    fn test_unparseable_network_lines_skip_windowed_dedup() {
        let (mut store, _) = test_store();
        store.add_log("something odd happened", LogKind::Fetch);
        store.add_log("something odd happened", LogKind::Fetch);

        // No key derivable, and network entries only collapse by key.
        assert_eq!(store.get_logs(None).len(), 2);
    }

    #[test]
    fn test_console_predecessor_collapse_is_exact_match() {
        let (mut store, _) = test_store();
        store.add_log("ready", LogKind::Console);
        store.add_log("ready", LogKind::Console);
        store.add_log("ready!", LogKind::Console);

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].count, 2);
        assert_eq!(logs[1].count, 1);
    }

    #[test]
    fn test_console_collapse_ignores_time_window() {
        let (mut store, now) = test_store();
        store.add_log("tick", LogKind::Console);
        now.set(now.get() + 60_000);
        store.add_log("tick", LogKind::Console);

        assert_eq!(store.get_logs(None).len(), 1);
        assert_eq!(store.get_logs(None)[0].count, 2);
    }

    #[test]
    fn test_interleaved_category_breaks_predecessor_collapse() {
        let (mut store, _) = test_store();
        store.add_log("ready", LogKind::Console);
        store.add_log("unparseable", LogKind::Fetch);
        store.add_log("ready", LogKind::Console);

        assert_eq!(store.get_logs(None).len(), 3);
    }

    #[test]
    fn test_capacity_cap_and_fifo_eviction() {
        let (mut store, _) = test_store();
        for i in 0..600 {
            store.add_log(format!("message {i}"), LogKind::Console);
        }

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), MAX_LOGS);
        // The 500 most recent survive, oldest first.
        assert_eq!(logs[0].message, "message 100");
        assert_eq!(logs[MAX_LOGS - 1].message, "message 599");
    }

    #[test]
    fn test_eviction_purges_window_slot() {
        let (mut store, _) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        // Push the network entry out of the buffer without advancing time.
        for i in 0..MAX_LOGS {
            store.add_log(format!("filler {i}"), LogKind::Console);
        }
        assert!(store.get_logs(Some(LogCategory::Network)).is_empty());

        // The window is nominally still open, but the slot must be gone: a
        // fresh entry appears instead of an absorb into the evicted one.
        store.add_log(get_request(), LogKind::Fetch);
        let network = store.get_logs(Some(LogCategory::Network));
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].count, 1);
    }

    #[test]
    fn test_oversized_value_payload_is_redacted() {
        let (mut store, _) = test_store();
        let big = "x".repeat(30_000);
        store.add_log(
            LogValue::Map(vec![("big".to_string(), LogValue::Text(big.clone()))]),
            LogKind::Console,
        );

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_critical);
        assert!(!logs[0].message.contains(&big));
        assert!(logs[0].message.contains("KiB"));
    }

    #[test]
    fn test_oversized_text_payload_is_redacted() {
        let (mut store, _) = test_store();
        let big = "y".repeat(30_000);
        store.add_log(big.clone(), LogKind::Console);

        let logs = store.get_logs(None);
        assert!(logs[0].is_critical);
        assert!(!logs[0].message.contains(&big));
    }

    #[test]
    fn test_value_payload_serializes_to_json() {
        let (mut store, _) = test_store();
        store.add_log(
            LogValue::Map(vec![("n".to_string(), LogValue::Int(3))]),
            LogKind::Console,
        );
        assert_eq!(store.get_logs(None)[0].message, r#"{"n":3}"#);
    }

    #[test]
    fn test_entry_key_is_stable_across_mutation() {
        let (mut store, now) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        let key = store.get_logs(None)[0].key;

        now.set(now.get() + 100);
        store.add_log(get_request(), LogKind::Fetch);

        let logs = store.get_logs(None);
        assert_eq!(logs[0].key, key);
        assert_eq!(logs[0].count, 2);
    }

    #[test]
    fn test_get_logs_returns_isolated_snapshot() {
        let (mut store, _) = test_store();
        store.add_log("a", LogKind::Console);

        let mut snapshot = store.get_logs(None);
        snapshot[0].message = "tampered".to_string();
        snapshot.clear();

        assert_eq!(store.get_logs(None)[0].message, "a");
    }

    #[test]
    fn test_get_logs_category_filter() {
        let (mut store, _) = test_store();
        store.add_log("hello", LogKind::Console);
        store.add_log(get_request(), LogKind::Fetch);

        assert_eq!(store.get_logs(Some(LogCategory::Console)).len(), 1);
        assert_eq!(store.get_logs(Some(LogCategory::Network)).len(), 1);
        assert_eq!(store.get_logs(None).len(), 2);
    }

    #[test]
    fn test_subscribers_see_new_and_mutated_entries() {
        let (mut store, now) = test_store();
        let seen: Rc<RefCell<Vec<(EntryKey, u32)>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            store.subscribe(move |entry| seen.borrow_mut().push((entry.key, entry.count)));
        }

        store.add_log(get_request(), LogKind::Fetch);
        now.set(now.get() + 100);
        store.add_log(get_request(), LogKind::Fetch);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, seen[1].0);
        assert_eq!(seen[0].1, 1);
        assert_eq!(seen[1].1, 2);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_that_listener() {
        let (mut store, _) = test_store();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let id = {
            let first = first.clone();
            store.subscribe(move |_| first.set(first.get() + 1))
        };
        {
            let second = second.clone();
            store.subscribe(move |_| second.set(second.get() + 1));
        }

        store.add_log("one", LogKind::Console);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add_log("two", LogKind::Console);

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
    }

    #[test]
    fn test_clear_logs_keeps_subscribers() {
        let (mut store, _) = test_store();
        let seen = Rc::new(Cell::new(0));
        {
            let seen = seen.clone();
            store.subscribe(move |_| seen.set(seen.get() + 1));
        }

        store.add_log("before", LogKind::Console);
        store.clear_logs();
        assert!(store.is_empty());

        store.add_log("after", LogKind::Console);
        assert_eq!(seen.get(), 2);
        assert_eq!(store.get_logs(None).len(), 1);
    }

    #[test]
    fn test_clear_logs_resets_dedup_window() {
        let (mut store, _) = test_store();
        store.add_log(get_request(), LogKind::Fetch);
        store.clear_logs();
        store.add_log(get_request(), LogKind::Fetch);

        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].count, 1);
    }

    #[test]
    fn test_count_tracks_collapsed_physical_events() {
        let (mut store, _) = test_store();
        for _ in 0..7 {
            store.add_log("same line", LogKind::Console);
        }
        let logs = store.get_logs(None);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].count, 7);
        assert!(logs.iter().all(|e| e.count >= 1));
    }
}
