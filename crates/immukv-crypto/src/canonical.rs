//! Deterministic JSON encoding.
//!
//! Rules:
//! - object keys sorted by code point at every depth, including objects
//!   nested inside arrays
//! - array element order preserved
//! - no insignificant whitespace
//! - every code point above U+007F escaped as `\uXXXX` (lowercase hex),
//!   with surrogate pairs for code points outside the basic plane
//! - integers written digit for digit at any magnitude; other numbers in
//!   shortest round-trip form
//!
//! Two independent implementations that follow these rules produce the same
//! bytes for the same document, which is what lets a hash written by one
//! client validate under another.

use std::fmt::Write;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Errors from canonical encoding of arbitrary serializable values.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("value is not representable as JSON: {0}")]
    NotJson(#[from] serde_json::Error),
}

/// Canonical encoding of a JSON value.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Canonical encoding as UTF-8 bytes (always ASCII in practice).
pub fn to_canonical_bytes(value: &Value) -> Vec<u8> {
    to_canonical_string(value).into_bytes()
}

/// Canonical encoding of any serializable value.
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
    let json = serde_json::to_value(value)?;
    Ok(to_canonical_string(&json))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_number(out: &mut String, n: &Number) {
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.bytes().all(|b| b == b'0') {
            out.push('0');
        } else {
            out.push_str(&text);
        }
        return;
    }
    // Non-finite after parsing stays as written.
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(normalized) => {
            let _ = write!(out, "{normalized}");
        }
        None => out.push_str(&text),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_unstable();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, &map[key]);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => push_escape(out, c as u16),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_escape(out, *unit);
                }
            }
        }
    }
    out.push('"');
}

fn push_escape(out: &mut String, unit: u16) {
    let _ = write!(out, "\\u{unit:04x}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn sorts_top_level_keys() {
        assert_eq!(to_canonical_string(&json!({"b": 2, "a": 1})), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn sorts_nested_keys_at_every_depth() {
        let value = json!({"z": {"y": 1, "x": [{"d": 1, "c": 2}]}, "a": null});
        assert_eq!(
            to_canonical_string(&value),
            r#"{"a":null,"z":{"x":[{"c":2,"d":1}],"y":1}}"#
        );
    }

    #[test]
    fn preserves_array_order() {
        assert_eq!(to_canonical_string(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn escapes_non_ascii_in_basic_plane() {
        assert_eq!(to_canonical_string(&json!("café")), r#""caf\u00e9""#);
        assert_eq!(to_canonical_string(&json!("日本")), r#""\u65e5\u672c""#);
    }

    #[test]
    fn escapes_astral_plane_as_surrogate_pair() {
        assert_eq!(to_canonical_string(&json!("😀")), r#""\ud83d\ude00""#);
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(
            to_canonical_string(&json!("a\"b\\c\n\t\u{01}")),
            r#""a\"b\\c\n\t\u0001""#
        );
    }

    #[test]
    fn escapes_keys_too() {
        assert_eq!(to_canonical_string(&json!({"ключ": true})), r#"{"\u043a\u043b\u044e\u0447":true}"#);
    }

    #[test]
    fn scalars() {
        assert_eq!(to_canonical_string(&json!(null)), "null");
        assert_eq!(to_canonical_string(&json!(false)), "false");
        assert_eq!(to_canonical_string(&json!(-12)), "-12");
        assert_eq!(to_canonical_string(&json!(22.5)), "22.5");
    }

    #[test]
    fn integers_keep_every_digit() {
        let big: Value = serde_json::from_str("[123456789012345678901234567890,-98765432109876543210]").unwrap();
        assert_eq!(
            to_canonical_string(&big),
            "[123456789012345678901234567890,-98765432109876543210]"
        );
        let zero: Value = serde_json::from_str("-0").unwrap();
        assert_eq!(to_canonical_string(&zero), "0");
    }

    #[test]
    fn fractional_spellings_normalize() {
        let a: Value = serde_json::from_str("1.50").unwrap();
        let b: Value = serde_json::from_str("15e-1").unwrap();
        assert_eq!(to_canonical_string(&a), "1.5");
        assert_eq!(to_canonical_string(&a), to_canonical_string(&b));
    }

    #[test]
    fn serializable_values() {
        #[derive(Serialize)]
        struct Reading {
            temp: f64,
            label: &'static str,
        }
        let s = to_canonical_value(&Reading { temp: 1.5, label: "x" }).unwrap();
        assert_eq!(s, r#"{"label":"x","temp":1.5}"#);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<String>().prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec((any::<String>(), inner), 0..6)
                    .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn output_is_ascii_and_round_trips(value in arb_json()) {
            let encoded = to_canonical_string(&value);
            prop_assert!(encoded.is_ascii());
            let parsed: Value = serde_json::from_str(&encoded).unwrap();
            prop_assert_eq!(&parsed, &value);
            prop_assert_eq!(to_canonical_string(&parsed), encoded);
        }

        #[test]
        fn key_insertion_order_is_irrelevant(pairs in prop::collection::vec((any::<String>(), any::<i64>()), 0..8)) {
            let forward: Map<String, Value> = pairs.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let mut reversed_pairs = pairs.clone();
            reversed_pairs.reverse();
            // Later duplicates win on insert, so dedupe the same way in both directions.
            let mut reversed = Map::new();
            for (k, _) in reversed_pairs {
                if let Some(v) = forward.get(&k) {
                    reversed.insert(k, v.clone());
                }
            }
            prop_assert_eq!(
                to_canonical_string(&Value::Object(forward)),
                to_canonical_string(&Value::Object(reversed))
            );
        }
    }
}
