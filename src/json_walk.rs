//! Generic, depth-bounded walker over `serde_json::Value` trees.
//!
//! Talana answers the same logical resource with different shapes depending on the
//! endpoint and API version: bare arrays or `results`/`data` wrappers, camelCase or
//! snake_case keys, ids as numbers, strings or `{id}` objects, and relations nested
//! under unpredictable intermediate keys. Everything here is total: unexpected shapes
//! resolve to `None`, never to an error.

use chrono::NaiveDate;
use serde_json::Value;

/// Keys holding a human readable label inside an embedded object.
pub const DISPLAY_NAME_KEYS: &[&str] = &["nombre", "name", "title", "descripcion", "description"];

/// Parses a response body; a blank body is `Value::Null`.
pub fn parse_body(body: &str) -> Result<Value, serde_json::Error> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed)
}

/// Item list of a response: bare array, `results` array, `data` array, otherwise the
/// object itself as a single item. Null and scalars give an empty list.
pub fn unwrap_items(root: &Value) -> Vec<&Value> {
    match root {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            for key in ["results", "data"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().collect();
                }
            }
            vec![root]
        }
        _ => Vec::new(),
    }
}

/// First object of the unwrapped item list.
pub fn first_item(root: &Value) -> Option<&Value> {
    unwrap_items(root).into_iter().next().filter(|v| v.is_object())
}

/// True while the paginated wrapper advertises another page: a non-blank `next` URL,
/// or a literal `true`.
pub fn has_next_page(root: &Value) -> bool {
    match root.get("next") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(more)) => *more,
        _ => false,
    }
}

pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// First non-blank string among `keys`. An object value is searched for a display name.
pub fn read_string(node: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match node.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        child @ Value::Object(_) => read_string(child, DISPLAY_NAME_KEYS),
        _ => None,
    })
}

/// Like [`read_string`] but numbers and booleans are rendered as text, for codes.
pub fn read_text(node: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_text(node.get(*key)?))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) => read_string(value, DISPLAY_NAME_KEYS),
        _ => None,
    }
}

/// Numeric id from a number, a numeric string or an `{ "id": ... }` object.
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => map.get("id").and_then(coerce_scalar_id),
        other => coerce_scalar_id(other),
    }
}

fn coerce_scalar_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First coercible id among `keys`.
pub fn read_id(node: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| coerce_id(node.get(*key)?))
}

pub fn read_number(node: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match node.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

pub fn read_bool(node: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match node.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().and_then(|i| match i {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "si" | "sí" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// ISO `yyyy-MM-dd`; a datetime whose first ten characters form such a date is accepted.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// First candidate whose value parses as a date.
pub fn read_date(node: &Value, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter().find_map(|key| node.get(*key)?.as_str().and_then(parse_date))
}

/// First candidate holding an object.
pub fn first_object<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| node.get(*key).filter(|child| child.is_object()))
}

/// Depth-bounded search for the first non-null value under any of `keys`.
///
/// The tree is walked level by level, so a match at a shallower level always wins over
/// a deeper one; within a level nodes are visited in document order. Each level of
/// objects or arrays consumes one unit of `max_depth`.
pub fn deep_find<'a>(node: &'a Value, max_depth: usize, keys: &[&str]) -> Option<&'a Value> {
    search(node, max_depth, |key, value| keys.contains(&key) && !value.is_null())
}

/// Like [`deep_find`] but only matches object values.
pub fn deep_find_object<'a>(
    node: &'a Value,
    max_depth: usize,
    keys: &[&str],
) -> Option<&'a Value> {
    search(node, max_depth, |key, value| keys.contains(&key) && value.is_object())
}

fn search<'a, F>(root: &'a Value, max_depth: usize, matches: F) -> Option<&'a Value>
where
    F: Fn(&str, &Value) -> bool,
{
    let mut level: Vec<&'a Value> = vec![root];
    for depth in 0..=max_depth {
        for node in &level {
            if let Value::Object(map) = node {
                if let Some((_, value)) = map.iter().find(|(k, v)| matches(k.as_str(), v)) {
                    return Some(value);
                }
            }
        }
        if depth == max_depth {
            break;
        }
        let mut next = Vec::new();
        for node in level {
            match node {
                Value::Object(map) => next.extend(map.values()),
                Value::Array(items) => next.extend(items.iter()),
                _ => {}
            }
        }
        level = next;
        if level.is_empty() {
            break;
        }
    }
    None
}

/// Deep search for a label: a non-blank string, or the display name of an object.
/// Bare numbers are ids, not labels, and are skipped.
pub fn deep_read_string(node: &Value, max_depth: usize, keys: &[&str]) -> Option<String> {
    match deep_find(node, max_depth, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        found @ Value::Object(_) => read_string(found, DISPLAY_NAME_KEYS),
        _ => None,
    }
}

pub fn deep_read_id(node: &Value, max_depth: usize, keys: &[&str]) -> Option<i64> {
    deep_find(node, max_depth, keys).and_then(coerce_id)
}
