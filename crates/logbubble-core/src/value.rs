//! Payload value model for console-style log events
//!
//! Hosts hand the collector arbitrary values (argument lists, error objects,
//! nested data). `LogValue` is the owned tree the store sizes and serializes.
//! `Shared` expresses object identity: the same subtree logged in several
//! places is carried once behind an `Arc`, which is what the sizer's visited
//! set keys on.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

/// Maximum depth `to_json`/`render_compact` will descend before cutting off.
///
/// Matches the sizer's depth guard so a value that sizes fine also renders.
pub const MAX_RENDER_DEPTH: usize = 50;

/// An arbitrary host value captured by a console-style sink.
#[derive(Debug, Clone)]
pub enum LogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<LogValue>),
    /// Key/value pairs in insertion order.
    Map(Vec<(String, LogValue)>),
    /// A captured error: name, message and (possibly empty) backtrace text.
    Error {
        name: String,
        message: String,
        stack: String,
    },
    /// A point in time, milliseconds since the epoch.
    Timestamp(i64),
    /// A pattern/regex source string.
    Pattern(String),
    /// A subtree shared by identity. Revisits are detected by `Arc` pointer.
    Shared(Arc<LogValue>),
}

/// Raised by [`LogValue::to_json`] when the value cannot be represented as
/// JSON (a `Shared` node revisited within one traversal, or nesting past
/// [`MAX_RENDER_DEPTH`]).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shared subtree revisited during serialization")]
    SharedCycle,
    #[error("value nested deeper than {MAX_RENDER_DEPTH} levels")]
    TooDeep,
}

impl LogValue {
    /// Serialize to a JSON string.
    ///
    /// Fails on revisited shared subtrees and on pathological nesting; callers
    /// fall back to [`LogValue::render_compact`], which never fails.
    pub fn to_json(&self) -> Result<String, RenderError> {
        let mut visited = HashSet::new();
        let json = self.to_json_value(0, &mut visited)?;
        // Value -> String cannot fail for the tree built here.
        Ok(json.to_string())
    }

    fn to_json_value(
        &self,
        depth: usize,
        visited: &mut HashSet<*const LogValue>,
    ) -> Result<serde_json::Value, RenderError> {
        if depth > MAX_RENDER_DEPTH {
            return Err(RenderError::TooDeep);
        }

        use serde_json::{json, Value};
        let value = match self {
            LogValue::Null => Value::Null,
            LogValue::Bool(b) => Value::Bool(*b),
            LogValue::Int(n) => json!(n),
            LogValue::Float(f) => json!(f),
            LogValue::Text(s) => Value::String(s.clone()),
            LogValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json_value(depth + 1, visited)?);
                }
                Value::Array(out)
            }
            LogValue::Map(pairs) => {
                let mut out = serde_json::Map::with_capacity(pairs.len());
                for (key, val) in pairs {
                    out.insert(key.clone(), val.to_json_value(depth + 1, visited)?);
                }
                Value::Object(out)
            }
            LogValue::Error {
                name,
                message,
                stack,
            } => {
                if stack.is_empty() {
                    Value::String(format!("{name}: {message}"))
                } else {
                    json!({ "name": name, "message": message, "stack": stack })
                }
            }
            LogValue::Timestamp(ms) => json!(ms),
            LogValue::Pattern(src) => Value::String(format!("/{src}/")),
            LogValue::Shared(inner) => {
                let ptr = Arc::as_ptr(inner);
                if !visited.insert(ptr) {
                    return Err(RenderError::SharedCycle);
                }
                let rendered = inner.to_json_value(depth + 1, visited)?;
                visited.remove(&ptr);
                rendered
            }
        };
        Ok(value)
    }

    /// Infallible display rendering used when JSON serialization fails.
    ///
    /// Revisited shared subtrees print as `[shared]`, over-deep subtrees as
    /// `…` — the value is a diagnostic aid, not a wire format.
    pub fn render_compact(&self) -> String {
        let mut out = String::new();
        let mut visited = HashSet::new();
        self.render_into(&mut out, 0, &mut visited);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize, visited: &mut HashSet<*const LogValue>) {
        if depth > MAX_RENDER_DEPTH {
            out.push('…');
            return;
        }
        match self {
            LogValue::Null => out.push_str("null"),
            LogValue::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            LogValue::Int(n) => {
                let _ = write!(out, "{n}");
            }
            LogValue::Float(f) => {
                let _ = write!(out, "{f}");
            }
            LogValue::Text(s) => out.push_str(s),
            LogValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render_into(out, depth + 1, visited);
                }
                out.push(']');
            }
            LogValue::Map(pairs) => {
                out.push('{');
                for (i, (key, val)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{key}: ");
                    val.render_into(out, depth + 1, visited);
                }
                out.push('}');
            }
            LogValue::Error { name, message, .. } => {
                let _ = write!(out, "{name}: {message}");
            }
            LogValue::Timestamp(ms) => {
                let _ = write!(out, "@{ms}");
            }
            LogValue::Pattern(src) => {
                let _ = write!(out, "/{src}/");
            }
            LogValue::Shared(inner) => {
                let ptr = Arc::as_ptr(inner);
                if !visited.insert(ptr) {
                    out.push_str("[shared]");
                    return;
                }
                inner.render_into(out, depth + 1, visited);
                visited.remove(&ptr);
            }
        }
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => LogValue::Null,
            Value::Bool(b) => LogValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    LogValue::Int(i)
                } else {
                    LogValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => LogValue::Text(s),
            Value::Array(items) => LogValue::List(items.into_iter().map(LogValue::from).collect()),
            Value::Object(map) => {
                LogValue::Map(map.into_iter().map(|(k, v)| (k, LogValue::from(v))).collect())
            }
        }
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::Text(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::Text(s)
    }
}

impl From<i64> for LogValue {
    fn from(n: i64) -> Self {
        LogValue::Int(n)
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}
