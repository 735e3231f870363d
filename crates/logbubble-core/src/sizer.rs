//! Payload size estimation
//!
//! Estimates the in-memory footprint of a [`LogValue`] without serializing
//! it. The estimate only has to answer one question downstream: is this
//! payload over the critical threshold? So traversal stops as soon as the
//! running total crosses it, skips subtrees already visited by identity, and
//! bails out with a flat fallback on pathological nesting.

use crate::value::LogValue;
use std::collections::HashSet;
use std::sync::Arc;

/// Payloads estimated above this many bytes are redacted and marked critical.
pub const CRITICAL_PAYLOAD_BYTES: usize = 20 * 1024;

/// Traversal deeper than this returns [`DEPTH_FALLBACK_BYTES`] for the
/// remaining subtree instead of recursing further.
pub const MAX_SIZER_DEPTH: usize = 50;

/// Flat estimate charged for a subtree cut off by the depth guard.
pub const DEPTH_FALLBACK_BYTES: usize = 1000;

/// Base overhead charged per list or map container.
const CONTAINER_OVERHEAD: usize = 16;

/// Estimate the payload size in bytes.
///
/// Never panics and always terminates: shared subtrees count once (a revisit
/// contributes 0), the depth guard caps recursion, and traversal returns
/// early once the total is already over [`CRITICAL_PAYLOAD_BYTES`].
pub fn estimate_size(value: &LogValue) -> usize {
    let mut visited: HashSet<*const LogValue> = HashSet::new();
    walk(value, 0, &mut visited)
}

/// Convenience predicate for the only consumer that matters.
pub fn is_critical(value: &LogValue) -> bool {
    estimate_size(value) > CRITICAL_PAYLOAD_BYTES
}

fn walk(value: &LogValue, depth: usize, visited: &mut HashSet<*const LogValue>) -> usize {
    if depth > MAX_SIZER_DEPTH {
        return DEPTH_FALLBACK_BYTES;
    }

    match value {
        LogValue::Null => 4,
        LogValue::Bool(_) => 4,
        LogValue::Int(_) | LogValue::Float(_) => 8,
        // Wide-encoding assumption: two bytes per character.
        LogValue::Text(s) => 2 * s.chars().count(),
        LogValue::List(items) => {
            let mut total = CONTAINER_OVERHEAD;
            for item in items {
                total += walk(item, depth + 1, visited);
                if total > CRITICAL_PAYLOAD_BYTES {
                    return total;
                }
            }
            total
        }
        LogValue::Map(pairs) => {
            let mut total = CONTAINER_OVERHEAD;
            for (key, val) in pairs {
                total += 2 * key.chars().count();
                total += walk(val, depth + 1, visited);
                if total > CRITICAL_PAYLOAD_BYTES {
                    return total;
                }
            }
            total
        }
        LogValue::Error {
            name,
            message,
            stack,
        } => 2 * (name.chars().count() + message.chars().count() + stack.chars().count()),
        LogValue::Timestamp(_) => 8,
        LogValue::Pattern(src) => 2 * src.chars().count(),
        LogValue::Shared(inner) => {
            // Identity check: a subtree already counted in this traversal
            // contributes nothing again.
            if !visited.insert(Arc::as_ptr(inner)) {
                return 0;
            }
            walk(inner, depth + 1, visited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_sizes() {
        assert_eq!(estimate_size(&LogValue::Null), 4);
        assert_eq!(estimate_size(&LogValue::Bool(true)), 4);
        assert_eq!(estimate_size(&LogValue::Int(42)), 8);
        assert_eq!(estimate_size(&LogValue::Float(1.5)), 8);
        assert_eq!(estimate_size(&LogValue::Text("abcd".into())), 8);
        assert_eq!(estimate_size(&LogValue::Timestamp(0)), 8);
    }

    #[test]
    fn test_empty_containers_charge_base_overhead() {
        assert_eq!(estimate_size(&LogValue::List(vec![])), 16);
        assert_eq!(estimate_size(&LogValue::Map(vec![])), 16);
    }

    #[test]
    fn test_map_counts_keys_and_values() {
        let value = LogValue::Map(vec![("ab".to_string(), LogValue::Int(1))]);
        // 16 base + 2*2 key chars + 8 value
        assert_eq!(estimate_size(&value), 28);
    }

    #[test]
    fn test_error_size_covers_name_message_stack() {
        let value = LogValue::Error {
            name: "E".into(),
            message: "msg".into(),
            stack: "trace".into(),
        };
        assert_eq!(estimate_size(&value), 2 * (1 + 3 + 5));
    }

    #[test]
    fn test_shared_subtree_counted_once() {
        let shared = Arc::new(LogValue::Text("x".repeat(100)));
        let once = LogValue::List(vec![LogValue::Shared(shared.clone())]);
        let twice = LogValue::List(vec![
            LogValue::Shared(shared.clone()),
            LogValue::Shared(shared),
        ]);
        assert_eq!(estimate_size(&once), estimate_size(&twice));
    }

    #[test]
    fn test_deep_nesting_terminates_with_fallback() {
        let mut value = LogValue::Int(0);
        for _ in 0..1000 {
            value = LogValue::List(vec![value]);
        }
        let size = estimate_size(&value);
        // 50 levels of container overhead plus the flat fallback for the rest.
        assert_eq!(size, (MAX_SIZER_DEPTH + 1) * 16 + DEPTH_FALLBACK_BYTES);
    }

    #[test]
    fn test_megabyte_string_terminates_and_is_critical() {
        let value = LogValue::Text("x".repeat(1024 * 1024));
        assert_eq!(estimate_size(&value), 2 * 1024 * 1024);
        assert!(is_critical(&value));
    }

    #[test]
    fn test_early_exit_once_over_threshold() {
        // A list of many 1 KiB strings: traversal must stop shortly after
        // crossing the threshold rather than summing all elements.
        let chunk = LogValue::Text("x".repeat(512)); // 1024 bytes each
        let value = LogValue::List(vec![chunk; 1000]);
        let size = estimate_size(&value);
        assert!(size > CRITICAL_PAYLOAD_BYTES);
        // Exact magnitude is irrelevant, but the early exit keeps it near the
        // threshold instead of near the true ~1 MiB total.
        assert!(size < CRITICAL_PAYLOAD_BYTES + 2048);
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        // Exactly at the threshold is not critical; one byte over is.
        let at = LogValue::Text("x".repeat(CRITICAL_PAYLOAD_BYTES / 2));
        assert!(!is_critical(&at));
        let over = LogValue::Text("x".repeat(CRITICAL_PAYLOAD_BYTES / 2 + 1));
        assert!(is_critical(&over));
    }
}
