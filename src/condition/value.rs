use ahash::AHashMap;
use itertools::Itertools;
use serde_json::Value;

/// The caller-owned map of field name to current value.
///
/// A missing key and an explicit `null` are treated identically everywhere.
pub type DataSnapshot = AHashMap<String, Value>;

static NULL: Value = Value::Null;

/// Looks up a field's value, resolving absent keys to `null`.
pub fn lookup<'a>(data: &'a DataSnapshot, field: &str) -> &'a Value {
    data.get(field).unwrap_or(&NULL)
}

/// Emptiness as used by both `is_empty` conditions and required checks:
/// `null`, an empty array, or a string that is blank after trimming.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Strict identity on raw values. Numbers compare numerically so `1` and
/// `1.0` are the same value.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => l == r,
        },
        _ => left == right,
    }
}

/// Coerces a value to a number. Only numbers and numeric strings succeed.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// The string representation used by text operators and messages.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_display_string).join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Formats a number the way messages print limits: integral values have no fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
