//! Instrumentation boundary
//!
//! Hosts report events through narrow sink traits instead of the collector
//! rewriting any global machinery. A [`LogCollector`] implements both traits
//! over a shared store handle and carries the re-entrancy guard: an emission
//! triggered from inside an emission (a subscriber side effect looping back
//! into the channel it observes) is suppressed, not ingested.

use crate::entry::LogKind;
use crate::event::NetEvent;
use crate::store::{LogPayload, LogStore};
use crate::value::LogValue;
use std::cell::Cell;
use std::rc::Rc;

/// Receives console-style events: arbitrary values or preformatted text.
pub trait ConsoleEventSink {
    fn console_value(&self, value: LogValue);
    fn console_text(&self, text: &str);
}

/// Receives structured network events.
pub trait NetworkEventSink {
    fn network_event(&self, event: NetEvent, kind: LogKind);
}

/// Shared handle to a single-threaded store.
pub type StoreHandle = Rc<std::cell::RefCell<LogStore>>;

/// Host-owned entry point wiring sinks to a store.
///
/// Create one per store, hand clones to instrumentation call sites, drop it
/// to tear the boundary down. No global registration, no init flags.
pub struct LogCollector {
    store: StoreHandle,
    dispatching: Rc<Cell<bool>>,
    suppressed: Rc<Cell<u64>>,
}

impl LogCollector {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            dispatching: Rc::new(Cell::new(false)),
            suppressed: Rc::new(Cell::new(0)),
        }
    }

    /// Events dropped by the re-entrancy guard since creation.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.get()
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    fn emit(&self, payload: LogPayload, kind: LogKind) {
        if self.dispatching.get() {
            self.suppressed.set(self.suppressed.get() + 1);
            log::debug!("suppressed re-entrant log emission ({kind})");
            return;
        }
        let _guard = DispatchGuard::enter(&self.dispatching);
        self.store.borrow_mut().add_log(payload, kind);
    }
}

impl Clone for LogCollector {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            dispatching: self.dispatching.clone(),
            suppressed: self.suppressed.clone(),
        }
    }
}

impl ConsoleEventSink for LogCollector {
    fn console_value(&self, value: LogValue) {
        self.emit(LogPayload::Value(value), LogKind::Console);
    }

    fn console_text(&self, text: &str) {
        self.emit(LogPayload::Text(text.to_string()), LogKind::Console);
    }
}

impl NetworkEventSink for LogCollector {
    fn network_event(&self, event: NetEvent, kind: LogKind) {
        self.emit(LogPayload::Net(event), kind);
    }
}

/// Sets the dispatch flag for the duration of one emission. The flag is
/// cleared on drop, so a panicking subscriber cannot leave the guard stuck.
struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
