//! Deterministic, cycle-safe serialization of argument values.

use super::value::{ArgArray, ArgObject, ArgValue, NodeId};
use log::debug;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;

/// Emitted (as a JSON string) where a composite refers back to one of its
/// own ancestors.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Emitted (as a JSON string) where nesting exceeds [`MAX_DEPTH`].
pub const MAX_DEPTH_MARKER: &str = "[MaxDepth]";

/// Maximum number of nested composites serialized before truncating.
pub const MAX_DEPTH: usize = 256;

/// Integral floats below this magnitude print as plain integers, without a
/// fraction or exponent.
const PLAIN_INTEGER_LIMIT: f64 = 1e21;

/// Serialize a value into its canonical single-line form.
///
/// - Object keys are sorted, so insertion order never changes the output.
/// - `Undefined` and `Function` members are omitted from objects and become
///   `null` inside arrays.
/// - A composite that is already an ancestor on the current path becomes
///   `"[Circular]"`. Shared references that are not ancestors are written
///   out in full.
/// - An object with a to-JSON hook is replaced by the hook's result, or
///   serialized as a plain object if the hook fails.
///
/// Never fails.
///
/// # Example
///
/// ```rust
/// use callgate_core::canonical::{stable_stringify, ArgValue};
///
/// let a = ArgValue::from(serde_json::json!({"b": 2, "a": 1}));
/// assert_eq!(stable_stringify(&a), r#"{"a":1,"b":2}"#);
/// ```
pub fn stable_stringify(value: &ArgValue) -> String {
    let mut out = String::new();
    Serializer::default().write_value(value, &mut out);
    out
}

/// Lowercase hex SHA-256 of the canonical serialization.
///
/// Two argument values with the same data in any key order have the same
/// fingerprint.
pub fn fingerprint(value: &ArgValue) -> String {
    fingerprint_canonical(&stable_stringify(value))
}

pub(crate) fn fingerprint_canonical(canonical: &str) -> String {
    let hash = Sha256::digest(canonical.as_bytes());
    format!("{:x}", hash)
}

#[derive(Default)]
struct Serializer {
    /// Composites on the current path, root first.
    ancestors: Vec<NodeId>,
}

impl Serializer {
    fn write_value(&mut self, value: &ArgValue, out: &mut String) {
        match value {
            ArgValue::Undefined | ArgValue::Null | ArgValue::Function => out.push_str("null"),
            ArgValue::Bool(true) => out.push_str("true"),
            ArgValue::Bool(false) => out.push_str("false"),
            ArgValue::Number(n) => write_number(n, out),
            ArgValue::String(s) => write_string(s, out),
            ArgValue::Array(array) => self.write_array(array, out),
            ArgValue::Object(object) => self.write_object(object, out),
        }
    }

    /// Push `id` onto the ancestor path, or write a marker and return false.
    fn enter(&mut self, id: NodeId, out: &mut String) -> bool {
        if self.ancestors.contains(&id) {
            write_string(CIRCULAR_MARKER, out);
            return false;
        }
        if self.ancestors.len() >= MAX_DEPTH {
            write_string(MAX_DEPTH_MARKER, out);
            return false;
        }
        self.ancestors.push(id);
        true
    }

    fn leave(&mut self) {
        self.ancestors.pop();
    }

    fn write_array(&mut self, array: &ArgArray, out: &mut String) {
        if !self.enter(array.id(), out) {
            return;
        }

        out.push('[');
        for (i, item) in array.items().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_value(item, out);
        }
        out.push(']');

        self.leave();
    }

    fn write_object(&mut self, object: &ArgObject, out: &mut String) {
        if !self.enter(object.id(), out) {
            return;
        }

        // The hooked object stays on the path while its replacement is
        // written, so a hook returning its own object is caught as circular.
        if let Some(hook) = object.to_json_hook() {
            match hook.to_json() {
                Ok(replacement) => {
                    self.write_value(&replacement, out);
                    self.leave();
                    return;
                }
                Err(err) => {
                    debug!("to-JSON hook failed, serializing plain object: {}", err);
                }
            }
        }

        let mut entries = object.entries();
        entries.retain(|(_, value)| !value.is_omitted());
        entries.sort_by(|(a, _), (b, _)| utf16_cmp(a, b));

        out.push('{');
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_string(key, out);
            out.push(':');
            self.write_value(value, out);
        }
        out.push('}');

        self.leave();
    }
}

/// Order strings by UTF-16 code units, the key order JSON producers in
/// agent runtimes emit.
fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

// Integral floats print as integers so `1`, `1.0` and `1e18`/`10^18` each
// have a single surface. The exact decimal value of the double is written.
fn write_number(n: &serde_json::Number, out: &mut String) {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < PLAIN_INTEGER_LIMIT {
                if f == 0.0 {
                    out.push('0');
                } else {
                    out.push_str(&format!("{:.0}", f));
                }
                return;
            }
        }
    }
    out.push_str(&n.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{ArgArray, ArgObject, HookError};
    use serde_json::json;

    fn canon(value: serde_json::Value) -> String {
        stable_stringify(&ArgValue::from(value))
    }

    // ===== Primitives =====

    #[test]
    fn test_primitives() {
        assert_eq!(canon(json!("hi")), r#""hi""#);
        assert_eq!(canon(json!(42)), "42");
        assert_eq!(canon(json!(-1.5)), "-1.5");
        assert_eq!(canon(json!(true)), "true");
        assert_eq!(canon(json!(null)), "null");
    }

    #[test]
    fn test_undefined_and_function_are_null() {
        assert_eq!(stable_stringify(&ArgValue::Undefined), "null");
        assert_eq!(stable_stringify(&ArgValue::Function), "null");
    }

    #[test]
    fn test_integral_float_matches_integer() {
        assert_eq!(stable_stringify(&ArgValue::from(1.0)), "1");
        assert_eq!(stable_stringify(&ArgValue::from(-0.0)), "0");
        assert_eq!(stable_stringify(&ArgValue::from(1)), "1");
    }

    #[test]
    fn test_large_integral_float_has_no_exponent() {
        assert_eq!(canon(json!(1e18)), "1000000000000000000");
        assert_eq!(canon(json!(1e18)), canon(json!(1_000_000_000_000_000_000u64)));
        assert_eq!(canon(json!(-2e20)), "-200000000000000000000");
        assert!(canon(json!(1e21)).contains('e'));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            canon(json!("line\n\"quoted\"\\\u{1}")),
            r#""line\n\"quoted\"\\\u0001""#
        );
    }

    // ===== Objects and arrays =====

    #[test]
    fn test_keys_sorted_regardless_of_insertion_order() {
        let first: ArgObject = [("b", 2), ("a", 1)].into_iter().collect();
        let second: ArgObject = [("a", 1), ("b", 2)].into_iter().collect();

        assert_eq!(stable_stringify(&first.into()), r#"{"a":1,"b":2}"#);
        assert_eq!(stable_stringify(&second.into()), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_nested_keys_sorted() {
        assert_eq!(
            canon(json!({"z": {"y": 1, "x": [{"b": 1, "a": 2}]}, "a": null})),
            r#"{"a":null,"z":{"x":[{"a":2,"b":1}],"y":1}}"#
        );
    }

    #[test]
    fn test_keys_sorted_by_utf16_units() {
        // U+FF21 sorts before U+1F600 by code point but after it in UTF-16,
        // where the emoji starts with a surrogate (0xD83D).
        let object: ArgObject = [("\u{1F600}", 1), ("\u{FF21}", 2)].into_iter().collect();
        assert_eq!(
            stable_stringify(&object.into()),
            "{\"\u{1F600}\":1,\"\u{FF21}\":2}"
        );
    }

    #[test]
    fn test_undefined_and_function_omitted_from_objects() {
        let object = ArgObject::new();
        object.insert("keep", "x");
        object.insert("gone", ArgValue::Undefined);
        object.insert("call", ArgValue::Function);
        object.insert("nothing", ArgValue::Null);

        assert_eq!(
            stable_stringify(&object.into()),
            r#"{"keep":"x","nothing":null}"#
        );
    }

    #[test]
    fn test_undefined_and_function_null_in_arrays() {
        let array: ArgArray = vec![
            ArgValue::from(1),
            ArgValue::Undefined,
            ArgValue::Function,
            ArgValue::from("s"),
        ]
        .into_iter()
        .collect();

        assert_eq!(stable_stringify(&array.into()), r#"[1,null,null,"s"]"#);
    }

    #[test]
    fn test_empty_composites() {
        assert_eq!(canon(json!({})), "{}");
        assert_eq!(canon(json!([])), "[]");
    }

    // ===== Cycles and shared references =====

    #[test]
    fn test_self_reference_is_circular() {
        let object = ArgObject::new();
        object.insert("a", 1);
        object.insert("self", object.clone());

        assert_eq!(
            stable_stringify(&object.into()),
            r#"{"a":1,"self":"[Circular]"}"#
        );
    }

    #[test]
    fn test_indirect_cycle_through_array() {
        let object = ArgObject::new();
        let array = ArgArray::new();
        array.push(object.clone());
        object.insert("items", array.clone());

        assert_eq!(
            stable_stringify(&object.into()),
            r#"{"items":["[Circular]"]}"#
        );
    }

    #[test]
    fn test_diamond_serialized_in_full() {
        let shared: ArgObject = [("v", 1)].into_iter().collect();
        let root = ArgObject::new();
        root.insert("left", shared.clone());
        root.insert("right", shared.clone());

        assert_eq!(
            stable_stringify(&root.into()),
            r#"{"left":{"v":1},"right":{"v":1}}"#
        );
    }

    #[test]
    fn test_repeated_array_elements_serialized_in_full() {
        let shared: ArgArray = vec![1, 2].into_iter().collect();
        let outer: ArgArray = vec![shared.clone(), shared].into_iter().collect();

        assert_eq!(stable_stringify(&outer.into()), "[[1,2],[1,2]]");
    }

    #[test]
    fn test_cycle_below_diamond() {
        let shared = ArgObject::new();
        shared.insert("back", shared.clone());
        let root = ArgObject::new();
        root.insert("a", shared.clone());
        root.insert("b", shared);

        assert_eq!(
            stable_stringify(&root.into()),
            r#"{"a":{"back":"[Circular]"},"b":{"back":"[Circular]"}}"#
        );
    }

    // ===== To-JSON hooks =====

    #[test]
    fn test_hook_result_replaces_object() {
        let object = ArgObject::new().with_to_json(|| -> Result<ArgValue, HookError> {
            Ok(ArgValue::from(json!({"y": 2, "x": 1})))
        });
        object.insert("ignored", true);

        assert_eq!(stable_stringify(&object.into()), r#"{"x":1,"y":2}"#);
    }

    #[test]
    fn test_hook_returning_primitive() {
        let object = ArgObject::new()
            .with_to_json(|| -> Result<ArgValue, HookError> { Ok(ArgValue::from("2024-01-01")) });

        assert_eq!(stable_stringify(&object.into()), r#""2024-01-01""#);
    }

    #[test]
    fn test_failing_hook_falls_back_to_entries() {
        let object = ArgObject::new()
            .with_to_json(|| -> Result<ArgValue, HookError> { Err("boom".into()) });
        object.insert("b", 2);
        object.insert("a", 1);

        assert_eq!(stable_stringify(&object.into()), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_hook_returning_own_object_is_circular() {
        let object = ArgObject::new();
        let handle = object.clone();
        object.set_to_json(move || -> Result<ArgValue, HookError> {
            Ok(ArgValue::Object(handle.clone()))
        });

        assert_eq!(stable_stringify(&object.into()), r#""[Circular]""#);
    }

    // ===== Depth guard =====

    #[test]
    fn test_depth_guard_truncates() {
        let root = ArgArray::new();
        let mut current = root.clone();
        for _ in 0..MAX_DEPTH + 10 {
            let next = ArgArray::new();
            current.push(next.clone());
            current = next;
        }

        let out = stable_stringify(&root.into());
        assert!(out.contains(r#""[MaxDepth]""#));
        assert_eq!(out.matches('[').count(), MAX_DEPTH + 1);
    }

    // ===== Fingerprints =====

    #[test]
    fn test_fingerprint_is_stable_across_key_order() {
        let a = ArgValue::from(json!({"a": 1, "b": 2}));
        let b: ArgObject = [("b", 2), ("a", 1)].into_iter().collect();

        let hash = fingerprint(&a);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, fingerprint(&b.into()));
        assert_ne!(hash, fingerprint(&ArgValue::from(json!({"a": 1}))));
    }
}
