//! Core types for Oolong

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexMap;
use num_bigint::BigInt;
use thiserror::Error;

/// Ordered map type for object values — preserves insertion order.
///
/// Insertion order is an implementation detail, not part of the contract.
pub type ObjectMap<K, V> = IndexMap<K, V>;

// =============================================================================
// Constants
// =============================================================================

/// Library version string (beta/RFC stage)
pub const VERSION: &str = "0.3.0-beta.2";
/// Maximum nesting depth for recursive parse/decode calls.
pub const MAX_DEPTH: usize = 256;
/// Maximum length of a string payload on the binary tape (u32 encoding limit)
pub const MAX_STRING_LENGTH: usize = u32::MAX as usize;
/// Maximum total byte length of a container on the binary tape (u32 encoding limit)
pub const MAX_CONTAINER_BYTES: usize = u32::MAX as usize;

// =============================================================================
// Kind
// =============================================================================

/// The kind of a JSON value as seen by a view.
///
/// `Number` only occurs on lazy views (the text does not distinguish integer
/// from float until parsed); `Int` and `Float` only occur on binary views,
/// where the writer has already classified the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Number,
    Int,
    Float,
    True,
    False,
    Null,
}

impl Kind {
    /// Short label used in error contexts and mismatch messages.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::True => "true",
            Kind::False => "false",
            Kind::Null => "null",
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Parsing options, carried immutably through every sub-parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Parse every JSON number as a 64-bit float; legalizes `NaN`, `Inf`,
    /// `-Inf`, and a leading `+`.
    pub float64: bool,
    /// Treat the top-level input as an implicit array delimited by newlines.
    pub jsonlines: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn float64(mut self) -> Self {
        self.float64 = true;
        self
    }

    pub fn jsonlines(mut self) -> Self {
        self.jsonlines = true;
        self
    }

    /// Options for a nested value: the jsonlines mode applies only to the
    /// top level.
    pub(crate) fn nested(mut self) -> Self {
        self.jsonlines = false;
        self
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// What went wrong, without position information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid JSON value")]
    InvalidJson,
    #[error("expected '{{'")]
    ExpectedObjectChar,
    #[error("expected '['")]
    ExpectedArrayChar,
    #[error("expected '\"'")]
    ExpectedQuoteChar,
    #[error("expected ':'")]
    ExpectedColon,
    #[error("expected ','")]
    ExpectedComma,
    #[error("expected newline")]
    ExpectedNewline,
    #[error("invalid number")]
    InvalidNumber,
    #[error("invalid character")]
    InvalidChar,
    #[error("unrecognized binary tag")]
    InvalidBinaryTag,
    #[error("type mismatch")]
    TypeMismatch,
    /// Reserved for a future strict-duplicates option; not raised by default.
    #[error("duplicate object key")]
    DuplicateKey,
    /// File input adapter failures; the message lands in the error context.
    #[error("i/o error")]
    Io,
}

/// A parse or materialization failure.
///
/// `pos` is an absolute byte offset into the original input (or tape);
/// `context` names what the parser was attempting when it failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at byte {pos} (while reading {context})")]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: usize,
    pub context: Cow<'static, str>,
}

impl Error {
    pub fn new(kind: ErrorKind, pos: usize, context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            pos,
            context: context.into(),
        }
    }

    pub fn eof(pos: usize, context: &'static str) -> Self {
        Self::new(ErrorKind::UnexpectedEof, pos, context)
    }

    /// A kind/type mismatch naming the declared target.
    pub fn mismatch(pos: usize, expected: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TypeMismatch, pos, expected)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Value
// =============================================================================

/// A fully materialized JSON value.
///
/// Numbers are promoted narrower-first: a value fitting `Int` never appears
/// as `Int128`, and so on down the ladder. `BigNum` retains the raw decimal
/// text of a number whose magnitude exceeds `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Int128(i128),
    BigInt(BigInt),
    Float(f64),
    BigNum(String),
    String(String),
    Array(Vec<Value>),
    Object(ObjectMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Int128(i) => i64::try_from(*i).ok(),
            Value::BigInt(b) => i64::try_from(b).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Int128(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::BigNum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    pub fn index(&self, idx: usize) -> Option<&Value> {
        self.as_array()?.get(idx)
    }

    /// The kind this value would carry on a binary view.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(true) => Kind::True,
            Value::Bool(false) => Kind::False,
            Value::Int(_) | Value::Int128(_) | Value::BigInt(_) => Kind::Int,
            Value::Float(_) | Value::BigNum(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Navigate a dot-path expression to reach a deeply nested value.
    ///
    /// Path syntax: `field.field[N].field`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        let bytes = path.as_bytes();

        if bytes[0] == b'[' {
            let close = path.find(']')?;
            let idx: usize = path[1..close].parse().ok()?;
            let child = self.index(idx)?;
            let mut rest = close + 1;
            if rest < bytes.len() && bytes[rest] == b'.' {
                rest += 1;
            }
            return child.get_path(&path[rest..]);
        }

        let seg_end = bytes
            .iter()
            .position(|&b| b == b'.' || b == b'[')
            .unwrap_or(bytes.len());
        let child = self.get(&path[..seg_end])?;

        if seg_end >= bytes.len() {
            return Some(child);
        }
        let mut rest = seg_end;
        if bytes[rest] == b'.' {
            rest += 1;
        }
        child.get_path(&path[rest..])
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// Conversions
impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i as i64) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<i128> for Value {
    fn from(i: i128) -> Self {
        match i64::try_from(i) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Int128(i),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self { Value::Float(f) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<ObjectMap<String, Value>> for Value {
    fn from(m: ObjectMap<String, Value>) -> Self {
        Value::Object(m)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(m: HashMap<String, Value>) -> Self {
        Value::Object(m.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
