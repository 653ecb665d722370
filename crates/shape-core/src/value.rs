//! # Value Semantics
//!
//! Comparison rules the validator applies to `serde_json::Value` trees.
//!
//! JSON keeps integers and floats apart (`20` and `20.0` are different
//! `Number`s and compare unequal under `PartialEq`). Schemas written by hand
//! expect `eq: 20` to accept `20.0`, so every equality and ordering check in
//! the engine goes through the numeric-aware helpers below.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Returns true if the number has a zero fractional part.
pub fn is_whole(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn integer_of(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Order two numbers.
///
/// Integers compare exactly; anything involving a float compares as `f64`.
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (integer_of(a), integer_of(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Structural equality with numeric comparison of numbers at every depth.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Membership test using [`values_equal`].
pub fn contains_value(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|v| values_equal(v, needle))
}

/// Length of a string (Unicode scalar values), list or dict.
pub fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(o) => Some(o.len()),
        _ => None,
    }
}

/// Render a value for a message: strings bare, everything else as JSON.
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The kind-like name of a value's runtime shape.
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "none",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_whole(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
