//! Materialization traits: build Rust values from lazy or binary views.
//!
//! `Materialize` is the pull side of the library: a type knows how to build
//! itself from the value under a view's cursor and reports the position one
//! past what it consumed, so enclosing drivers never re-skip. The impls on
//! containers double as the configuration hooks for generic
//! materialization — pick `ObjectMap`, `HashMap`, or `BTreeMap` for
//! objects, `Vec` or a set type for sequences.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use crate::types::{Error, ErrorKind, Kind, ObjectMap, Result, Value, MAX_DEPTH};
use crate::view::{Flow, View};

/// A materialized value plus the position one past its final byte in the
/// source representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumed<T> {
    pub value: T,
    pub end: usize,
}

impl<T> Consumed<T> {
    pub fn new(value: T, end: usize) -> Self {
        Self { value, end }
    }
}

/// Build `Self` from the value under the cursor.
pub trait Materialize: Sized {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>>;
}

/// Populate an existing instance in place from the value under the cursor,
/// returning the position one past it. Members absent from the input leave
/// the corresponding fields untouched.
pub trait MaterializeInto {
    fn materialize_into(&mut self, view: &View<'_>) -> Result<usize>;
}

/// Re-label a mismatch with the field path that raised it. Parse errors pass
/// through untouched.
#[doc(hidden)]
pub fn field_error(err: Error, path: &'static str) -> Error {
    if err.kind == ErrorKind::TypeMismatch {
        Error::new(err.kind, err.pos, format!("{} ({})", path, err.context))
    } else {
        err
    }
}

// =============================================================================
// Scalars
// =============================================================================

impl Materialize for bool {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        match view.kind() {
            Kind::True => Ok(Consumed::new(true, view.skip()?)),
            Kind::False => Ok(Consumed::new(false, view.skip()?)),
            _ => Err(Error::mismatch(view.pos(), "bool")),
        }
    }
}

macro_rules! impl_materialize_int {
    ($($ty:ty => $name:literal),+ $(,)?) => {$(
        impl Materialize for $ty {
            fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
                match view.kind() {
                    Kind::Number | Kind::Int | Kind::Float => {
                        let (n, end) = view.apply_number()?;
                        let value = n
                            .as_i128()
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| Error::mismatch(view.pos(), $name))?;
                        Ok(Consumed::new(value, end))
                    }
                    _ => Err(Error::mismatch(view.pos(), $name)),
                }
            }
        }
    )+};
}

impl_materialize_int!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
);

macro_rules! impl_materialize_float {
    ($($ty:ty => $name:literal),+ $(,)?) => {$(
        impl Materialize for $ty {
            fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
                match view.kind() {
                    Kind::Number | Kind::Int | Kind::Float => {
                        let (n, end) = view.apply_number()?;
                        let value = n
                            .as_f64()
                            .ok_or_else(|| Error::mismatch(view.pos(), $name))?;
                        Ok(Consumed::new(value as $ty, end))
                    }
                    _ => Err(Error::mismatch(view.pos(), $name)),
                }
            }
        }
    )+};
}

impl_materialize_float!(f32 => "f32", f64 => "f64");

impl Materialize for String {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::String {
            return Err(Error::mismatch(view.pos(), "string"));
        }
        let (s, end) = view.apply_string()?;
        Ok(Consumed::new(s.decode()?.into_owned(), end))
    }
}

impl Materialize for Box<str> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        let c = String::materialize(view)?;
        Ok(Consumed::new(c.value.into_boxed_str(), c.end))
    }
}

// =============================================================================
// Option and wrappers
// =============================================================================

impl<T: Materialize> Materialize for Option<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() == Kind::Null {
            return Ok(Consumed::new(None, view.skip()?));
        }
        let c = T::materialize(view)?;
        Ok(Consumed::new(Some(c.value), c.end))
    }
}

impl<T: Materialize> Materialize for Box<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        let c = T::materialize(view)?;
        Ok(Consumed::new(Box::new(c.value), c.end))
    }
}

impl<T: Materialize> Materialize for Arc<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        let c = T::materialize(view)?;
        Ok(Consumed::new(Arc::new(c.value), c.end))
    }
}

impl<T: Materialize> Materialize for Rc<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        let c = T::materialize(view)?;
        Ok(Consumed::new(Rc::new(c.value), c.end))
    }
}

// =============================================================================
// Sequences
// =============================================================================

impl<T: Materialize> Materialize for Vec<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Array {
            return Err(Error::mismatch(view.pos(), "array"));
        }
        let mut out = Vec::new();
        let applied = view.apply_array(|_, child| {
            let c = T::materialize(child)?;
            out.push(c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

impl<T: Materialize + Eq + Hash> Materialize for HashSet<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Array {
            return Err(Error::mismatch(view.pos(), "array"));
        }
        let mut out = HashSet::new();
        let applied = view.apply_array(|_, child| {
            let c = T::materialize(child)?;
            out.insert(c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

impl<T: Materialize + Ord> Materialize for BTreeSet<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Array {
            return Err(Error::mismatch(view.pos(), "array"));
        }
        let mut out = BTreeSet::new();
        let applied = view.apply_array(|_, child| {
            let c = T::materialize(child)?;
            out.insert(c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

// =============================================================================
// Maps
// =============================================================================

impl<V: Materialize> Materialize for ObjectMap<String, V> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Object {
            return Err(Error::mismatch(view.pos(), "object"));
        }
        let mut out = ObjectMap::new();
        let applied = view.apply_object(|key, child| {
            let k = key.decode()?.into_owned();
            let c = V::materialize(child)?;
            out.insert(k, c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

impl<V: Materialize> Materialize for HashMap<String, V> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Object {
            return Err(Error::mismatch(view.pos(), "object"));
        }
        let mut out = HashMap::new();
        let applied = view.apply_object(|key, child| {
            let k = key.decode()?.into_owned();
            let c = V::materialize(child)?;
            out.insert(k, c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

impl<V: Materialize> Materialize for BTreeMap<String, V> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Object {
            return Err(Error::mismatch(view.pos(), "object"));
        }
        let mut out = BTreeMap::new();
        let applied = view.apply_object(|key, child| {
            let k = key.decode()?.into_owned();
            let c = V::materialize(child)?;
            out.insert(k, c.value);
            Ok(Flow::<()>::Advance(c.end))
        })?;
        Ok(Consumed::new(out, applied.end))
    }
}

// =============================================================================
// Tuples
// =============================================================================

macro_rules! impl_materialize_tuple {
    ($len:tt => $($idx:tt : $T:ident : $slot:ident),+) => {
        impl<$($T: Materialize),+> Materialize for ($($T,)+) {
            fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
                if view.kind() != Kind::Array {
                    return Err(Error::mismatch(view.pos(), concat!("tuple of ", $len)));
                }
                $(let mut $slot: Option<$T> = None;)+
                let applied = view.apply_array(|i, child| match i {
                    $($idx => {
                        let c = $T::materialize(child)?;
                        $slot = Some(c.value);
                        Ok(Flow::<()>::Advance(c.end))
                    })+
                    _ => Err(Error::mismatch(child.pos(), concat!("tuple of ", $len))),
                })?;
                Ok(Consumed::new(
                    ($($slot.ok_or_else(|| {
                        Error::mismatch(view.pos(), concat!("tuple of ", $len))
                    })?,)+),
                    applied.end,
                ))
            }
        }
    };
}

impl_materialize_tuple!(1 => 0: A: a);
impl_materialize_tuple!(2 => 0: A: a, 1: B: b);
impl_materialize_tuple!(3 => 0: A: a, 1: B: b, 2: C: c);
impl_materialize_tuple!(4 => 0: A: a, 1: B: b, 2: C: c, 3: D: d);
impl_materialize_tuple!(5 => 0: A: a, 1: B: b, 2: C: c, 3: D: d, 4: E: e);
impl_materialize_tuple!(6 => 0: A: a, 1: B: b, 2: C: c, 3: D: d, 4: E: e, 5: F: f);

// =============================================================================
// Generic value
// =============================================================================

impl Materialize for Value {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        materialize_value(view, 0)
    }
}

fn materialize_value(view: &View<'_>, depth: usize) -> Result<Consumed<Value>> {
    if depth > MAX_DEPTH {
        return Err(Error::new(ErrorKind::InvalidJson, view.pos(), "value"));
    }
    match view.kind() {
        Kind::Object => {
            let mut map = ObjectMap::new();
            let applied = view.apply_object(|key, child| {
                let k = key.decode()?.into_owned();
                let c = materialize_value(child, depth + 1)?;
                // Duplicate keys: last write wins.
                map.insert(k, c.value);
                Ok(Flow::<()>::Advance(c.end))
            })?;
            Ok(Consumed::new(Value::Object(map), applied.end))
        }
        Kind::Array => {
            let mut arr = Vec::new();
            let applied = view.apply_array(|_, child| {
                let c = materialize_value(child, depth + 1)?;
                arr.push(c.value);
                Ok(Flow::<()>::Advance(c.end))
            })?;
            Ok(Consumed::new(Value::Array(arr), applied.end))
        }
        Kind::String => {
            let (s, end) = view.apply_string()?;
            Ok(Consumed::new(Value::String(s.decode()?.into_owned()), end))
        }
        Kind::Number | Kind::Int | Kind::Float => {
            let (n, end) = view.apply_number()?;
            Ok(Consumed::new(n.into_value(), end))
        }
        Kind::True => Ok(Consumed::new(Value::Bool(true), view.skip()?)),
        Kind::False => Ok(Consumed::new(Value::Bool(false), view.skip()?)),
        Kind::Null => Ok(Consumed::new(Value::Null, view.skip()?)),
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// An order-n square numeric matrix in column-major storage, filled by the
/// two-pass protocol: pass one measures the first row (short-circuiting the
/// outer traversal), pass two re-traverses and fills column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    order: usize,
    data: Vec<T>,
}

impl<T> Matrix<T> {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.order || col >= self.order {
            return None;
        }
        self.data.get(col * self.order + row)
    }
}

impl<T: Materialize> Materialize for Matrix<T> {
    fn materialize(view: &View<'_>) -> Result<Consumed<Self>> {
        if view.kind() != Kind::Array {
            return Err(Error::mismatch(view.pos(), "matrix"));
        }
        // Pass one: the first row's length decides the order.
        let first = view.apply_array(|_, row| {
            let mut n = 0usize;
            row.apply_array(|_, _| {
                n += 1;
                Ok(Flow::<()>::Pass)
            })?;
            Ok(Flow::Break(n))
        })?;
        let order = first.result.unwrap_or(0);

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
            .take(order * order)
            .collect();

        // Pass two: JSON row r becomes matrix column r.
        let applied = view.apply_array(|r, row| {
            if r >= order {
                return Err(Error::mismatch(row.pos(), "matrix row count"));
            }
            let inner = row.apply_array(|c, cell| {
                if c >= order {
                    return Err(Error::mismatch(cell.pos(), "matrix row length"));
                }
                let v = T::materialize(cell)?;
                slots[r * order + c] = Some(v.value);
                Ok(Flow::<()>::Advance(v.end))
            })?;
            Ok(Flow::<()>::Advance(inner.end))
        })?;

        let mut data = Vec::with_capacity(order * order);
        for slot in slots {
            data.push(slot.ok_or_else(|| Error::mismatch(view.pos(), "matrix shape"))?);
        }
        Ok(Consumed::new(Matrix { order, data }, applied.end))
    }
}

// =============================================================================
// Tests
// =============================================================================
