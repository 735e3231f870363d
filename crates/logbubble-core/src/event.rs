//! Structured network events
//!
//! Network sinks report requests as explicit fields (method, URL, outcome,
//! elapsed time) carried alongside the display line, so deduplication keys on
//! fields instead of reparsed text. A parser for the preformatted
//! `"[NET] METHOD URL STATUS 5ms"` shape is kept for hosts that only have
//! the string; when it fails, the event simply skips windowed dedup.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Outcome of a network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NetStatus {
    /// HTTP status code.
    Code(u16),
    /// The request failed before producing a status.
    Error,
    /// A dynamically loaded resource finished loading (script/link path).
    Loaded,
}

impl fmt::Display for NetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetStatus::Code(code) => write!(f, "{code}"),
            NetStatus::Error => write!(f, "ERROR"),
            NetStatus::Loaded => write!(f, "LOADED"),
        }
    }
}

/// One observed network request, as reported by an instrumentation sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetEvent {
    pub method: String,
    pub url: String,
    pub status: NetStatus,
    pub elapsed_ms: u64,
}

impl NetEvent {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        status: NetStatus,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status,
            elapsed_ms,
        }
    }

    /// The display line stored in the entry message.
    pub fn display_line(&self) -> String {
        format!(
            "[NET] {} {} {} {}ms",
            self.method, self.url, self.status, self.elapsed_ms
        )
    }

    /// Identity used for short-window collapsing: elapsed time excluded, so
    /// retries of the same call collapse while a changed status or URL
    /// always starts a new entry.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            method: self.method.clone(),
            url: self.url.clone(),
            status: self.status,
        }
    }
}

/// `(method, url, status)` identity of a network call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub method: String,
    pub url: String,
    pub status: NetStatus,
}

/// Errors parsing a preformatted network log line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NetLineError {
    #[error("line does not match the `[NET] METHOD URL STATUS <n>ms` shape")]
    Shape,
    #[error("invalid status token: {0}")]
    Status(String),
}

fn net_line_regex() -> &'static Regex {
    static NET_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
    NET_LINE_REGEX.get_or_init(|| {
        // Optional "[NET]" tag, then at least four whitespace-separated
        // tokens with a trailing "<n>ms" elapsed token.
        Regex::new(r"^(?:\[NET\]\s+)?(\S+)\s+(\S+)\s+(\S+)\s+(\d+)ms$").expect("valid regex")
    })
}

/// Recover a [`NetEvent`] from a preformatted display line.
pub fn parse_net_line(line: &str) -> Result<NetEvent, NetLineError> {
    let caps = net_line_regex()
        .captures(line.trim())
        .ok_or(NetLineError::Shape)?;

    let status_token = &caps[3];
    let status = match status_token {
        "ERROR" => NetStatus::Error,
        "LOADED" => NetStatus::Loaded,
        other => other
            .parse::<u16>()
            .map(NetStatus::Code)
            .map_err(|_| NetLineError::Status(other.to_string()))?,
    };

    // The regex guarantees the elapsed token is all digits; saturate rather
    // than fail on absurd values.
    let elapsed_ms = caps[4].parse::<u64>().unwrap_or(u64::MAX);

    Ok(NetEvent {
        method: caps[1].to_string(),
        url: caps[2].to_string(),
        status,
        elapsed_ms,
    })
}
