//! Log entry model

use crate::event::DedupKey;
use serde::Serialize;
use std::fmt;

/// Origin of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogKind {
    Fetch,
    Xhr,
    Dom,
    Plugin,
    Console,
}

/// Coarse grouping used for filtering. A pure function of [`LogKind`], fixed
/// at entry creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogCategory {
    Console,
    Network,
}

impl LogKind {
    pub fn category(self) -> LogCategory {
        match self {
            LogKind::Console => LogCategory::Console,
            LogKind::Fetch | LogKind::Xhr | LogKind::Dom | LogKind::Plugin => LogCategory::Network,
        }
    }
}

/// Stable identity of an entry: ingestion timestamp plus a per-store
/// sequence number. Unique for the store lifetime, never reused, and
/// unchanged while the entry absorbs repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntryKey {
    pub created_ms: i64,
    pub seq: u64,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.created_ms, self.seq)
    }
}

/// One logical row in the log buffer, possibly representing multiple
/// collapsed physical events.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub key: EntryKey,
    /// Milliseconds since epoch of the most recent contributing event.
    pub timestamp: i64,
    /// Finalized display string: the original text, serialized payload, or a
    /// redaction placeholder for oversized payloads.
    pub message: String,
    pub kind: LogKind,
    pub category: LogCategory,
    /// True when the estimated payload size exceeded the critical threshold;
    /// the raw payload is never stored for such entries.
    pub is_critical: bool,
    /// Number of physical events collapsed into this row. Always >= 1.
    pub count: u32,
    /// Network identity when one could be derived; drives windowed dedup.
    #[serde(skip)]
    pub(crate) dedup_key: Option<DedupKey>,
}

impl LogEntry {
    /// Absorb one more physical occurrence of the same event.
    pub(crate) fn absorb(&mut self, now_ms: i64) {
        self.count += 1;
        self.timestamp = now_ms;
    }
}
