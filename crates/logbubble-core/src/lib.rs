//! # logbubble-core
//!
//! In-process log collector for embedding into an application: an
//! append-only, capacity-bounded buffer of log entries with collapsing of
//! repeated and near-duplicate network events, payload size screening, and a
//! synchronous publish/subscribe surface for a viewer to consume.
//!
//! The pieces, leaves first:
//! - [`value`] — the payload tree console sinks capture.
//! - [`sizer`] — byte-size estimation with depth and threshold guards.
//! - [`event`] — structured network events and the preformatted-line parser.
//! - [`entry`] — the unit of record.
//! - [`store`] — the buffer itself, dedup engine included.
//! - [`sink`] — the host-facing instrumentation boundary.
//!
//! Everything is single-threaded and synchronous: one `add_log` call runs
//! sizing, dedup, eviction, and subscriber notification to completion before
//! returning. No public operation panics or fails, whatever the input — call
//! sites live inside instrumentation that must never break its host.

pub mod entry;
pub mod event;
pub mod sink;
pub mod sizer;
pub mod store;
pub mod value;

pub use entry::{EntryKey, LogCategory, LogEntry, LogKind};
pub use event::{parse_net_line, DedupKey, NetEvent, NetLineError, NetStatus};
pub use sink::{ConsoleEventSink, LogCollector, NetworkEventSink, StoreHandle};
pub use sizer::{estimate_size, CRITICAL_PAYLOAD_BYTES};
pub use store::{LogPayload, LogStore, SubscriptionId, DEDUP_WINDOW_MS, MAX_LOGS};
pub use value::LogValue;
