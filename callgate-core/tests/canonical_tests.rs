use callgate_core::canonical::{
    fingerprint, stable_stringify, ArgArray, ArgObject, ArgValue, HookError, CIRCULAR_MARKER,
};
use proptest::prelude::*;
use serde_json::json;

// ===== Determinism =====

#[test]
fn test_key_order_does_not_matter() {
    let ba: ArgObject = [("b", 2), ("a", 1)].into_iter().collect();
    let ab: ArgObject = [("a", 1), ("b", 2)].into_iter().collect();

    assert_eq!(stable_stringify(&ba.into()), r#"{"a":1,"b":2}"#);
    assert_eq!(stable_stringify(&ab.into()), r#"{"a":1,"b":2}"#);
}

#[test]
fn test_output_is_single_line_without_whitespace() {
    let value = ArgValue::from(json!({
        "text": "multi\nline\ttext",
        "nested": {"list": [1, 2, {"k": "v"}]}
    }));
    let out = stable_stringify(&value);

    assert!(!out.contains('\n'));
    assert!(!out.contains(' '));
    assert_eq!(
        out,
        r#"{"nested":{"list":[1,2,{"k":"v"}]},"text":"multi\nline\ttext"}"#
    );
}

proptest! {
    #[test]
    fn prop_permuted_keys_serialize_identically(
        (ordered, permuted) in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..12)
            .prop_flat_map(|entries| {
                let entries: Vec<(String, i64)> = entries.into_iter().collect();
                (Just(entries.clone()), Just(entries).prop_shuffle())
            }),
    ) {
        let a = ArgValue::from(ordered.into_iter().collect::<ArgObject>());
        let b = ArgValue::from(permuted.into_iter().collect::<ArgObject>());
        prop_assert_eq!(stable_stringify(&a), stable_stringify(&b));
        prop_assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn prop_json_values_match_serde_for_sorted_input(
        entries in prop::collection::btree_map("[a-z]{1,6}", "[ -~]{0,12}", 0..8),
    ) {
        // For plain string maps the canonical form is ordinary compact JSON
        // with sorted keys.
        let value = serde_json::to_value(&entries).unwrap();
        let expected = serde_json::to_string(&entries).unwrap();
        prop_assert_eq!(stable_stringify(&ArgValue::from(value)), expected);
    }
}

// ===== Cycle safety =====

#[test]
fn test_self_reference() {
    let object = ArgObject::new();
    object.insert("a", 1);
    object.insert("self", object.clone());

    assert_eq!(
        stable_stringify(&object.into()),
        r#"{"a":1,"self":"[Circular]"}"#
    );
}

#[test]
fn test_mutual_reference() {
    let parent = ArgObject::new();
    let child = ArgObject::new();
    parent.insert("child", child.clone());
    child.insert("parent", parent.clone());

    assert_eq!(
        stable_stringify(&parent.into()),
        r#"{"child":{"parent":"[Circular]"}}"#
    );
}

#[test]
fn test_diamond_is_not_circular() {
    let shared: ArgObject = [("id", 7)].into_iter().collect();
    let list: ArgArray = vec![shared.clone(), shared.clone()].into_iter().collect();
    let root = ArgObject::new();
    root.insert("first", shared.clone());
    root.insert("list", list);

    let out = stable_stringify(&root.into());
    assert!(!out.contains(CIRCULAR_MARKER));
    assert_eq!(out, r#"{"first":{"id":7},"list":[{"id":7},{"id":7}]}"#);
}

// ===== Non-data members =====

#[test]
fn test_object_with_function_and_undefined_members() {
    let object = ArgObject::new();
    object.insert("run", ArgValue::Function);
    object.insert("maybe", ArgValue::Undefined);
    let list: ArgArray = vec![ArgValue::Function, ArgValue::Undefined].into_iter().collect();
    object.insert("list", list);

    assert_eq!(stable_stringify(&object.into()), r#"{"list":[null,null]}"#);
}

#[test]
fn test_hook_failure_is_not_propagated() {
    let object = ArgObject::new()
        .with_to_json(|| -> Result<ArgValue, HookError> { Err("hook exploded".into()) });
    object.insert("path", "/etc/passwd");

    assert_eq!(stable_stringify(&object.into()), r#"{"path":"/etc/passwd"}"#);
}

#[test]
fn test_hook_result_is_canonicalized() {
    let object = ArgObject::new().with_to_json(|| -> Result<ArgValue, HookError> {
        let replacement: ArgObject = [("z", 1), ("a", 2)].into_iter().collect();
        Ok(replacement.into())
    });

    assert_eq!(stable_stringify(&object.into()), r#"{"a":2,"z":1}"#);
}
