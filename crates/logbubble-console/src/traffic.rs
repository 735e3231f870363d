//! Simulated instrumentation
//!
//! Stands in for the host application's real instrumentation (fetch/XHR
//! wrappers, console capture): a deterministic generator that pushes a mix
//! of network calls, console chatter, retry bursts, and the occasional
//! oversized payload through the sink traits.

use logbubble_core::{
    ConsoleEventSink, LogCollector, LogKind, LogValue, NetEvent, NetStatus, NetworkEventSink,
};

/// Deterministic traffic generator, advanced once per host tick.
pub struct TrafficSource {
    collector: LogCollector,
    tick: u64,
    // xorshift state; seeded so every run replays the same traffic
    rng: u64,
}

impl TrafficSource {
    pub fn new(collector: LogCollector) -> Self {
        Self {
            collector,
            tick: 0,
            rng: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Emit this tick's events, if any.
    pub fn tick(&mut self) {
        self.tick += 1;

        // Polling endpoint fires every tick; identical calls within the
        // dedup window collapse into one climbing counter.
        if self.tick % 2 == 0 {
            let elapsed = self.next_range(2, 9);
            self.collector.network_event(
                NetEvent::new("GET", "/api/poll", NetStatus::Code(200), elapsed),
                LogKind::Fetch,
            );
        }

        match self.tick % 23 {
            3 => {
                let elapsed = self.next_range(20, 120);
                self.collector.network_event(
                    NetEvent::new("POST", "/api/orders", NetStatus::Code(201), elapsed),
                    LogKind::Fetch,
                );
            }
            7 => self.collector.network_event(
                NetEvent::new("GET", "/api/search?q=logs", NetStatus::Code(200), 230),
                LogKind::Xhr,
            ),
            11 => {
                // A flaky endpoint: bursts of identical failures.
                for _ in 0..3 {
                    self.collector.network_event(
                        NetEvent::new("GET", "/api/flaky", NetStatus::Error, 40),
                        LogKind::Fetch,
                    );
                }
            }
            13 => self.collector.network_event(
                NetEvent::new("SCRIPT", "/assets/widget.js", NetStatus::Loaded, 0),
                LogKind::Dom,
            ),
            17 => {
                let user = self.next_range(1, 50) as i64;
                self.collector.console_value(LogValue::Map(vec![
                    ("user".to_string(), LogValue::Int(user)),
                    ("action".to_string(), LogValue::from("checkout")),
                ]));
            }
            19 => self.collector.console_text("cache warmed"),
            21 => {
                // Oversized payload: lands as a redacted critical entry.
                let blob = "x".repeat(24 * 1024);
                self.collector
                    .console_value(LogValue::Map(vec![("blob".to_string(), LogValue::Text(blob))]));
            }
            _ => {}
        }
    }

    fn next_range(&mut self, low: u64, high: u64) -> u64 {
        // xorshift64
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        low + self.rng % (high - low)
    }
}
