//! Category filter
//!
//! Two-state toggle over the default: selecting the active specific filter
//! returns to `All`, selecting the other replaces it.

use logbubble_core::{LogCategory, LogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogFilter {
    #[default]
    All,
    Console,
    Network,
}

impl LogFilter {
    fn matches(self, category: LogCategory) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Console => category == LogCategory::Console,
            LogFilter::Network => category == LogCategory::Network,
        }
    }
}

/// Holds the active filter and derives the visible subset.
#[derive(Debug, Clone, Default)]
pub struct FilterManager {
    active: LogFilter,
}

impl FilterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> LogFilter {
        self.active
    }

    /// As a store-side filter argument: `All` means no restriction.
    pub fn category(&self) -> Option<LogCategory> {
        match self.active {
            LogFilter::All => None,
            LogFilter::Console => Some(LogCategory::Console),
            LogFilter::Network => Some(LogCategory::Network),
        }
    }

    /// Toggle a specific filter on or off. Returns the new active filter.
    pub fn toggle(&mut self, filter: LogFilter) -> LogFilter {
        if filter == LogFilter::All || self.active == filter {
            self.active = LogFilter::All;
        } else {
            self.active = filter;
        }
        self.active
    }

    /// Pure, order-preserving selection of the visible subset.
    pub fn apply_filter<'a>(&self, logs: &'a [LogEntry]) -> Vec<&'a LogEntry> {
        logs.iter()
            .filter(|entry| self.active.matches(entry.category))
            .collect()
    }

    /// Same predicate for a single candidate, for incremental updates.
    pub fn should_show(&self, entry: &LogEntry) -> bool {
        self.active.matches(entry.category)
    }
}
