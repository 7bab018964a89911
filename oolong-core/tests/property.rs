//! Property tests for the representation invariants: lazy/binary round-trip
//! agreement, tape determinism, numeric promotion, skip positions, and a
//! differential check against serde_json.

use oolong::{binary, lazy, lazy_with, materialize, Binary, Options, Value};
use proptest::prelude::*;

/// Arbitrary JSON documents, built as serde_json values and rendered to
/// text. Strings stay in the escape-free range and floats finite so the
/// differential comparison is exact.
fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(serde_json::Value::from),
        "[a-z ]{0,8}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(4, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(|m| {
                serde_json::Value::Object(m.into_iter().collect())
            }),
        ]
    })
}

fn agrees_with_serde(ours: &Value, theirs: &serde_json::Value) -> bool {
    match (ours, theirs) {
        (Value::Null, serde_json::Value::Null) => true,
        (Value::Bool(a), serde_json::Value::Bool(b)) => a == b,
        (Value::Int(a), serde_json::Value::Number(n)) => n.as_i64() == Some(*a),
        (Value::Float(a), serde_json::Value::Number(n)) => n.as_f64() == Some(*a),
        (Value::String(a), serde_json::Value::String(b)) => a == b,
        (Value::Array(a), serde_json::Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| agrees_with_serde(x, y))
        }
        (Value::Object(a), serde_json::Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| agrees_with_serde(v, w)))
        }
        _ => false,
    }
}

proptest! {
    /// Invariant 3: both representations materialize to the same value.
    #[test]
    fn lazy_and_binary_agree(doc in arb_json()) {
        let text = doc.to_string();
        let via_lazy = materialize(lazy(text.as_bytes()).unwrap()).unwrap();
        let via_binary = materialize(&binary(text.as_bytes()).unwrap()).unwrap();
        prop_assert_eq!(via_lazy, via_binary);
    }

    /// Invariant 4: re-encoding is deterministic and a re-admitted tape
    /// reads back to the same value.
    #[test]
    fn tape_is_deterministic(doc in arb_json()) {
        let text = doc.to_string();
        let first = binary(text.as_bytes()).unwrap();
        let second = binary(text.as_bytes()).unwrap();
        prop_assert_eq!(first.tape(), second.tape());

        let readmitted =
            Binary::from_tape(first.tape().to_vec(), Options::new()).unwrap();
        prop_assert_eq!(
            materialize(&first).unwrap(),
            materialize(&readmitted).unwrap()
        );
    }

    /// Invariant 2: skipping a top-level value lands one past its final
    /// byte, which for an exact rendering is the end of the text.
    #[test]
    fn skip_covers_the_value(doc in arb_json()) {
        let text = doc.to_string();
        let v = lazy(text.as_bytes()).unwrap();
        prop_assert_eq!(v.skip().unwrap(), text.len());
    }

    /// Invariant 5: documents holding only i64-range integers materialize
    /// to 64-bit integers, never anything wider.
    #[test]
    fn small_integers_stay_narrow(ints in prop::collection::vec(any::<i64>(), 0..12)) {
        let text = serde_json::Value::from(ints.clone()).to_string();
        let value = materialize(lazy(text.as_bytes()).unwrap()).unwrap();
        let arr = value.as_array().unwrap();
        prop_assert_eq!(arr.len(), ints.len());
        for (v, expected) in arr.iter().zip(&ints) {
            prop_assert!(matches!(v, Value::Int(i) if i == expected));
        }
    }

    /// Invariant 6: jsonlines yields exactly one element per non-blank line
    /// for every delimiter flavor.
    #[test]
    fn jsonlines_counts_lines(
        rows in prop::collection::vec(prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..3), 0..8),
        sep in prop_oneof![Just("\n"), Just("\r"), Just("\r\n"), Just("\n\n")],
    ) {
        let lines: Vec<String> = rows
            .iter()
            .map(|m| serde_json::Value::Object(
                m.clone().into_iter().map(|(k, v)| (k, serde_json::Value::from(v))).collect()
            ).to_string())
            .collect();
        let text = lines.join(sep);
        let v = lazy_with(text.as_bytes(), Options::new().jsonlines()).unwrap();
        let materialized = materialize(v).unwrap();
        prop_assert_eq!(materialized.as_array().unwrap().len(), rows.len());
    }

    /// Differential: the generic materializer agrees with serde_json.
    #[test]
    fn generic_materialization_matches_serde(doc in arb_json()) {
        let text = doc.to_string();
        let ours = materialize(lazy(text.as_bytes()).unwrap()).unwrap();
        let theirs: serde_json::Value = serde_json::from_str(&text).unwrap();
        prop_assert!(agrees_with_serde(&ours, &theirs));
    }
}

// =============================================================================
// Fixed edge cases the generators do not reach
// =============================================================================

#[test]
fn test_integer_ladder_in_documents() {
    let text = r#"[1, 9223372036854775807, 9223372036854775808, 340282366920938463463374607431768211456]"#;
    let value = materialize(lazy(text.as_bytes()).unwrap()).unwrap();
    let arr = value.as_array().unwrap();
    assert!(matches!(arr[0], Value::Int(1)));
    assert!(matches!(arr[1], Value::Int(i64::MAX)));
    assert!(matches!(arr[2], Value::Int128(_)));
    assert!(matches!(arr[3], Value::BigInt(_)));

    // The ladder survives the binary representation too.
    let via_binary = materialize(&binary(text.as_bytes()).unwrap()).unwrap();
    assert_eq!(value, via_binary);
}

#[test]
fn test_bignum_survives_binary() {
    let value = materialize(&binary(b"[1e999]").unwrap()).unwrap();
    assert_eq!(
        value.as_array().unwrap()[0],
        Value::BigNum("1e999".to_string())
    );
}

#[test]
fn test_float64_mode_materializes_floats() {
    let opts = Options::new().float64();
    let v = lazy_with(b"[1, NaN, -Inf, +2.5]", opts).unwrap();
    let value = materialize(v).unwrap();
    let arr = value.as_array().unwrap();
    assert_eq!(arr[0], Value::Float(1.0));
    assert!(matches!(arr[1], Value::Float(f) if f.is_nan()));
    assert_eq!(arr[2], Value::Float(f64::NEG_INFINITY));
    assert_eq!(arr[3], Value::Float(2.5));
}

#[test]
fn test_escaped_strings_roundtrip() {
    let text = r#"{"msg": "line\nbreak \"quoted\" é 😀"}"#;
    let via_lazy = materialize(lazy(text.as_bytes()).unwrap()).unwrap();
    let via_binary = materialize(&binary(text.as_bytes()).unwrap()).unwrap();
    assert_eq!(via_lazy, via_binary);
    assert_eq!(
        via_lazy.get("msg").unwrap().as_str().unwrap(),
        "line\nbreak \"quoted\" \u{e9} \u{1F600}"
    );
}
