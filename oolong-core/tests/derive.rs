//! Integration tests for the Materialize/MaterializeInto derive macros.

use oolong::{
    from_slice, from_slice_with, lazy, materialize_into, ErrorKind, Materialize, Options, View,
};
use oolong_derive::{Materialize, MaterializeInto};

// =============================================================================
// Positional records: key→field matching is by name, not position
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Quad {
    a: i64,
    b: i64,
    c: i64,
    d: i64,
}

#[test]
fn test_positional_record() {
    let q: Quad = from_slice(br#"{"a":1,"b":2,"c":3,"d":4}"#).unwrap();
    assert_eq!(q, Quad { a: 1, b: 2, c: 3, d: 4 });
}

#[test]
fn test_key_order_does_not_matter() {
    let q: Quad = from_slice(br#"{"d":1,"b":2,"c":3,"a":4}"#).unwrap();
    assert_eq!(q, Quad { a: 4, b: 2, c: 3, d: 1 });
}

#[test]
fn test_materialize_from_binary_view() {
    let bin = oolong::binary(br#"{"a":1,"b":2,"c":3,"d":4}"#).unwrap();
    let q = Quad::materialize(&View::from(&bin)).unwrap().value;
    assert_eq!(q, Quad { a: 1, b: 2, c: 3, d: 4 });
}

// =============================================================================
// Nested records
// =============================================================================

#[derive(Debug, Default, PartialEq, Materialize)]
struct Inner {
    a: i64,
    b: String,
}

#[derive(Debug, PartialEq, Materialize)]
struct Wrapper {
    x: Inner,
}

#[test]
fn test_nested_record() {
    let w: Wrapper = from_slice(br#"{"x":{"a":1,"b":"2"}}"#).unwrap();
    assert_eq!(
        w,
        Wrapper {
            x: Inner { a: 1, b: "2".to_string() }
        }
    );
}

// =============================================================================
// Unknown keys and defaults
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Sparse {
    id: i64,
    #[oolong(default = "String::from(\"anon\")")]
    name: String,
    tags: Vec<String>,
}

#[test]
fn test_unknown_keys_are_skipped() {
    let s: Sparse = from_slice(
        br#"{"id":1,"extra":{"deep":[1,{"q":2}]},"name":"x","alsoextra":null}"#,
    )
    .unwrap();
    assert_eq!(s.id, 1);
    assert_eq!(s.name, "x");
    assert!(s.tags.is_empty());
}

#[test]
fn test_missing_fields_use_declared_defaults() {
    let s: Sparse = from_slice(br#"{"id":9}"#).unwrap();
    assert_eq!(s.name, "anon");
    assert!(s.tags.is_empty());
}

#[derive(Debug, PartialEq, Materialize)]
struct System {
    #[oolong(default = "0.0")]
    duration: f64,
    #[oolong(default)]
    cpus: i64,
    #[oolong(default)]
    label: String,
}

#[test]
fn test_all_optional_record() {
    let sys: System = from_slice(br#"{"duration":3600.0}"#).unwrap();
    assert_eq!(
        sys,
        System {
            duration: 3600.0,
            cpus: 0,
            label: String::new()
        }
    );
}

// =============================================================================
// Rename and skip
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Renamed {
    #[oolong(rename = "userName")]
    user_name: String,
    #[oolong(skip)]
    cache: Vec<String>,
}

#[test]
fn test_rename_and_skip() {
    // The "cache" member in the input is ignored; the field stays default.
    let r: Renamed =
        from_slice(br#"{"userName":"kay","cache":["never","read"]}"#).unwrap();
    assert_eq!(r.user_name, "kay");
    assert!(r.cache.is_empty());
}

#[test]
fn test_rename_is_case_sensitive() {
    let r: Renamed = from_slice(br#"{"username":"kay"}"#).unwrap();
    // Wrong case does not match; field falls back to its default.
    assert_eq!(r.user_name, "");
}

// =============================================================================
// Type mismatches carry the field path
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Typed {
    count: i64,
}

#[test]
fn test_mismatch_names_the_field() {
    let err = from_slice::<Typed>(br#"{"count":"three"}"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err.context.contains("Typed.count"), "{}", err.context);
}

// =============================================================================
// Polymorphic dispatch by discriminant sniffing
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Car {
    #[oolong(rename = "type")]
    kind: String,
    make: String,
    model: String,
    #[oolong(rename = "seatingCapacity")]
    seating_capacity: i64,
    #[oolong(rename = "topSpeed")]
    top_speed: f64,
}

#[derive(Debug, PartialEq, Materialize)]
struct Truck {
    #[oolong(rename = "type")]
    kind: String,
    #[oolong(rename = "payloadCapacity")]
    payload_capacity: f64,
}

#[derive(Debug, PartialEq)]
enum Vehicle {
    Car(Car),
    Truck(Truck),
}

fn materialize_vehicle(doc: &[u8]) -> oolong::Result<Vehicle> {
    // Sniff the discriminant with the lazy view, then pick the concrete type.
    let view = View::from(lazy(doc)?);
    let tag = view
        .get("type")?
        .ok_or_else(|| oolong::Error::mismatch(0, "Vehicle.type"))?;
    let tag = tag.apply_string()?.0.decode()?.into_owned();
    match tag.as_str() {
        "car" => Ok(Vehicle::Car(from_slice(doc)?)),
        "truck" => Ok(Vehicle::Truck(from_slice(doc)?)),
        _ => Err(oolong::Error::mismatch(0, "Vehicle.type")),
    }
}

#[test]
fn test_discriminant_dispatch() {
    let doc = br#"{"type":"car","make":"Mercedes-Benz","model":"S500","seatingCapacity":5,"topSpeed":250.1}"#;
    assert_eq!(
        materialize_vehicle(doc).unwrap(),
        Vehicle::Car(Car {
            kind: "car".to_string(),
            make: "Mercedes-Benz".to_string(),
            model: "S500".to_string(),
            seating_capacity: 5,
            top_speed: 250.1,
        })
    );

    let doc = br#"{"type":"truck","payloadCapacity":12.5}"#;
    assert!(matches!(materialize_vehicle(doc).unwrap(), Vehicle::Truck(_)));

    let doc = br#"{"type":"boat"}"#;
    assert!(materialize_vehicle(doc).is_err());
}

// =============================================================================
// JSON-Lines
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Row {
    a: i64,
}

#[test]
fn test_jsonlines_every_delimiter() {
    for input in [
        b"{\"a\":1}\n{\"a\":2}".as_slice(),
        b"{\"a\":1}\r{\"a\":2}".as_slice(),
        b"{\"a\":1}\r\n{\"a\":2}".as_slice(),
        b"{\"a\":1}\r\n{\"a\":2}\n".as_slice(),
    ] {
        let rows: Vec<Row> =
            from_slice_with(input, Options::new().jsonlines()).unwrap();
        assert_eq!(rows, vec![Row { a: 1 }, Row { a: 2 }]);
    }
}

// =============================================================================
// Untagged unions of scalar variants
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
#[oolong(untagged)]
enum IntOrFloat {
    Int(i64),
    Float(f64),
}

impl Default for IntOrFloat {
    fn default() -> Self {
        IntOrFloat::Int(0)
    }
}

#[derive(Debug, PartialEq, Materialize)]
struct Mixed {
    id: Option<i64>,
    name: Option<String>,
    rate: IntOrFloat,
}

#[test]
fn test_union_with_null_bias() {
    let m: Mixed = from_slice(br#"{"id":null,"name":null,"rate":3.14}"#).unwrap();
    assert_eq!(
        m,
        Mixed {
            id: None,
            name: None,
            rate: IntOrFloat::Float(3.14)
        }
    );
}

#[test]
fn test_union_first_accepting_kind_wins() {
    let m: Mixed = from_slice(br#"{"rate":5}"#).unwrap();
    assert_eq!(m.rate, IntOrFloat::Int(5));
    // A float does not fit the Int variant, so Float gets it.
    let m: Mixed = from_slice(br#"{"rate":5.5}"#).unwrap();
    assert_eq!(m.rate, IntOrFloat::Float(5.5));
}

#[derive(Debug, PartialEq, Materialize)]
#[oolong(untagged)]
enum NumOrNothing {
    Number(f64),
    Nothing,
}

#[test]
fn test_union_null_admitting_variant() {
    assert_eq!(
        from_slice::<NumOrNothing>(b"null").unwrap(),
        NumOrNothing::Nothing
    );
    assert_eq!(
        from_slice::<NumOrNothing>(b"2.5").unwrap(),
        NumOrNothing::Number(2.5)
    );
    assert!(from_slice::<NumOrNothing>(br#""text""#).is_err());
}

// =============================================================================
// String enums
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
enum Grade {
    Premium,
    Standard,
    #[oolong(rename = "econ")]
    Economy,
}

#[test]
fn test_enum_variant_match_is_case_insensitive() {
    assert_eq!(from_slice::<Grade>(br#""premium""#).unwrap(), Grade::Premium);
    assert_eq!(from_slice::<Grade>(br#""STANDARD""#).unwrap(), Grade::Standard);
    assert_eq!(from_slice::<Grade>(br#""Econ""#).unwrap(), Grade::Economy);
    assert!(from_slice::<Grade>(br#""luxury""#).is_err());
    assert!(from_slice::<Grade>(b"3").is_err());
}

// =============================================================================
// Construction strategies
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
#[oolong(strategy = "keyword")]
struct KeywordConfig {
    host: String,
    port: i64,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

#[test]
fn test_keyword_strategy_builds_over_defaults() {
    let c: KeywordConfig = from_slice(br#"{"host":"example.org"}"#).unwrap();
    assert_eq!(c.host, "example.org");
    // Missing members keep the constructor's defaults.
    assert_eq!(c.port, 8080);
}

#[derive(Debug, Default, PartialEq, Materialize)]
#[oolong(strategy = "mutable")]
struct MutableConfig {
    retries: i64,
    verbose: bool,
}

#[test]
fn test_mutable_strategy() {
    let c: MutableConfig = from_slice(br#"{"verbose":true}"#).unwrap();
    assert_eq!(
        c,
        MutableConfig {
            retries: 0,
            verbose: true
        }
    );
}

// =============================================================================
// MaterializeInto: populate a pre-constructed instance
// =============================================================================

#[derive(Debug, PartialEq, MaterializeInto)]
struct Session {
    user: String,
    attempts: i64,
}

#[test]
fn test_materialize_into_updates_in_place() {
    let mut session = Session {
        user: "nobody".to_string(),
        attempts: 3,
    };
    materialize_into(lazy(br#"{"user":"kay"}"#).unwrap(), &mut session).unwrap();
    assert_eq!(session.user, "kay");
    // Members absent from the input leave fields untouched.
    assert_eq!(session.attempts, 3);
}

#[test]
fn test_materialize_into_from_binary() {
    let bin = oolong::binary(br#"{"attempts":9}"#).unwrap();
    let mut session = Session {
        user: "kay".to_string(),
        attempts: 0,
    };
    materialize_into(&bin, &mut session).unwrap();
    assert_eq!(session.user, "kay");
    assert_eq!(session.attempts, 9);
}

// =============================================================================
// Tuple structs
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct Pair(i64, String);

#[test]
fn test_tuple_struct_from_array() {
    let p: Pair = from_slice(br#"[7, "x"]"#).unwrap();
    assert_eq!(p, Pair(7, "x".to_string()));
    assert!(from_slice::<Pair>(b"[7]").is_err());
    assert!(from_slice::<Pair>(br#"[7, "x", 9]"#).is_err());
}

// =============================================================================
// Wide records stay on the match ladder
// =============================================================================

#[derive(Debug, Default, PartialEq, Materialize)]
struct LotsOfFields {
    #[oolong(default)] f01: i64,
    #[oolong(default)] f02: i64,
    #[oolong(default)] f03: i64,
    #[oolong(default)] f04: i64,
    #[oolong(default)] f05: i64,
    #[oolong(default)] f06: i64,
    #[oolong(default)] f07: i64,
    #[oolong(default)] f08: i64,
    #[oolong(default)] f09: i64,
    #[oolong(default)] f10: i64,
    #[oolong(default)] f11: i64,
    #[oolong(default)] f12: i64,
    #[oolong(default)] f13: i64,
    #[oolong(default)] f14: i64,
    #[oolong(default)] f15: i64,
    #[oolong(default)] f16: i64,
    #[oolong(default)] f17: i64,
    #[oolong(default)] f18: i64,
    #[oolong(default)] f19: i64,
    #[oolong(default)] f20: i64,
    #[oolong(default)] f21: i64,
    #[oolong(default)] f22: i64,
    #[oolong(default)] f23: i64,
    #[oolong(default)] f24: i64,
    #[oolong(default)] f25: i64,
    #[oolong(default)] f26: i64,
    #[oolong(default)] f27: i64,
    #[oolong(default)] f28: i64,
    #[oolong(default)] f29: i64,
    #[oolong(default)] f30: i64,
    #[oolong(default)] f31: i64,
    #[oolong(default)] f32: i64,
    #[oolong(default)] f33: i64,
    #[oolong(default)] f34: i64,
    #[oolong(default)] f35: i64,
}

#[test]
fn test_wide_record() {
    let v: LotsOfFields = from_slice(br#"{"f01":1,"f18":18,"f35":35}"#).unwrap();
    assert_eq!(v.f01, 1);
    assert_eq!(v.f18, 18);
    assert_eq!(v.f35, 35);
    assert_eq!(v.f02, 0);
    assert_eq!(v.f34, 0);
}

// =============================================================================
// Escaped keys still match
// =============================================================================

#[derive(Debug, PartialEq, Materialize)]
struct EscapedKey {
    #[oolong(rename = "line\nbreak")]
    value: i64,
}

#[test]
fn test_escaped_key_matching() {
    let e: EscapedKey = from_slice(br#"{"line\nbreak": 4}"#).unwrap();
    assert_eq!(e.value, 4);
}
