//! Property tests for the guard/fulfill protocol.

use proptest::prelude::*;
use serde_json::{json, Value};
use shape_schema::{define, fulfill, guard, Datatype};
use std::sync::Arc;

fn schemas() -> Vec<Arc<Datatype>> {
    [
        json!({"type": "string", "length_min": 2, "length_max": 6}),
        json!({"type": "integer", "gte": -50, "lt": 50}),
        json!({"type": "number", "ne": 0}),
        json!({"type": "list", "items": {"type": "integer"}, "length_max": 4}),
        json!({"type": "dict", "required": ["k"], "fields": {"k": {"type": "string"}}}),
        json!({"type": "union", "types": [{"type": "string", "regex": "[a-c]+"}, {"type": "integer", "gt": 0}]}),
        json!({"type": "maybe", "base": {"type": "boolean"}}),
    ]
    .iter()
    .map(|d| define(d).unwrap())
    .collect()
}

fn values() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-100i64..100).prop_map(Value::from),
        (-100.0f64..100.0).prop_map(Value::from),
        "[a-d]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[jk]", inner, 0..3)
                .prop_map(|m| json!(m)),
        ]
    })
}

proptest! {
    #[test]
    fn guard_agrees_with_fulfill(value in values()) {
        for dt in schemas() {
            let accepted = fulfill(&value, &dt).unwrap();
            match guard(&value, &dt) {
                Ok(returned) => {
                    prop_assert!(accepted);
                    prop_assert_eq!(returned, &value);
                }
                Err(err) => {
                    prop_assert!(!accepted);
                    let e = err.as_validation().expect("only validation failures");
                    prop_assert!(!e.constraint.is_empty());
                    prop_assert!(!e.message.is_empty());
                }
            }
        }
    }

    #[test]
    fn validation_is_idempotent(value in values()) {
        for dt in schemas() {
            let first = guard(&value, &dt).map(Value::clone);
            let second = guard(&value, &dt).map(Value::clone);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn integers_accept_whole_floats(i in -1_000_000i64..1_000_000) {
        let dt = define(&json!({"type": "integer"})).unwrap();
        prop_assert!(fulfill(&json!(i as f64), &dt).unwrap());
        prop_assert!(!fulfill(&json!(i as f64 + 0.5), &dt).unwrap());
    }
}
