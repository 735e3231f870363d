//! Row view models
//!
//! Pre-computes presentation data for log rows so the widget only lays out
//! text and styles.

use crate::theme::Theme;
use chrono::{Local, TimeZone};
use logbubble_core::LogEntry;
use ratatui::style::Color;

/// Display-ready form of one log row.
#[derive(Debug, Clone)]
pub struct LogRowViewModel {
    /// "HH:MM:SS" of the most recent contributing event, local time.
    pub time_text: String,
    pub message: String,
    /// Origin tag, e.g. "fetch".
    pub kind_text: String,
    /// "xN" badge when the row collapsed repeats, empty otherwise.
    pub count_badge: String,
    pub is_critical: bool,
    pub color: Color,
}

impl LogRowViewModel {
    pub fn from_entry(entry: &LogEntry, theme: &Theme) -> Self {
        Self {
            time_text: format_time(entry.timestamp),
            message: entry.message.clone(),
            kind_text: entry.kind.to_string(),
            count_badge: if entry.count > 1 {
                format!("x{}", entry.count)
            } else {
                String::new()
            },
            is_critical: entry.is_critical,
            color: if entry.is_critical {
                theme.critical
            } else {
                theme.kind_color(entry.kind)
            },
        }
    }
}

/// Title line of the entry detail view: `HH:MM:SS • kind (xN)`.
pub fn detail_title(entry: &LogEntry) -> String {
    let count = if entry.count > 1 {
        format!(" (x{})", entry.count)
    } else {
        String::new()
    };
    format!("{} • {}{}", format_time(entry.timestamp), entry.kind, count)
}

/// Body of the entry detail view.
pub fn detail_body(entry: &LogEntry) -> String {
    if entry.is_critical {
        format!("{}\n\nCRITICAL log", entry.message)
    } else {
        entry.message.clone()
    }
}

/// One line of the plain-text export: `[HH:MM:SS] [kind] message`.
pub fn export_line(entry: &LogEntry) -> String {
    format!(
        "[{}] [{}] {}",
        format_time(entry.timestamp),
        entry.kind,
        entry.message
    )
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
