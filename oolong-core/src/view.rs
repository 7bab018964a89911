//! Selection protocol: one traversal surface over both representations.
//!
//! Every consumer — the generic materializer, record materializers, counters,
//! selectors, the tape writer — drives values through the same callback
//! contract, so traversal code is written once and works on either view.

use crate::lazy::LazyValue;
use crate::num::Num;
use crate::reader::{Binary, BinaryValue};
use crate::scan::RawStr;
use crate::types::{Error, Kind, Options, Result};

/// Callback verdict for the `apply_*` drivers.
///
/// `Pass` hands the unconsumed child back to the driver, which skips it.
/// `Advance(n)` reports that the callback consumed the child through byte
/// `n`, sparing the driver a redundant skip. `Break(x)` stops the traversal;
/// `x` is propagated upward unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T> {
    Pass,
    Advance(usize),
    Break(T),
}

/// Outcome of an `apply_*` traversal: the position one past the traversed
/// value, and the payload of a `Break`, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied<T> {
    pub end: usize,
    pub result: Option<T>,
}

impl<T> Applied<T> {
    pub(crate) fn done(end: usize) -> Self {
        Self { end, result: None }
    }

    pub(crate) fn stopped(end: usize, result: T) -> Self {
        Self {
            end,
            result: Some(result),
        }
    }
}

/// What `apply_each` hands the callback alongside each child: the member key
/// for objects, the position for arrays.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Key(RawStr<'a>),
    Index(usize),
}

impl<'a> Entry<'a> {
    pub fn key(&self) -> Option<&RawStr<'a>> {
        match self {
            Entry::Key(k) => Some(k),
            Entry::Index(_) => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Entry::Index(i) => Some(*i),
            Entry::Key(_) => None,
        }
    }
}

/// A value under either representation.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Lazy(LazyValue<'a>),
    Binary(BinaryValue<'a>),
}

impl<'a> From<LazyValue<'a>> for View<'a> {
    fn from(v: LazyValue<'a>) -> Self {
        View::Lazy(v)
    }
}

impl<'a> From<BinaryValue<'a>> for View<'a> {
    fn from(v: BinaryValue<'a>) -> Self {
        View::Binary(v)
    }
}

impl<'a> From<&'a Binary> for View<'a> {
    fn from(b: &'a Binary) -> Self {
        View::Binary(b.root())
    }
}

impl<'a> View<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            View::Lazy(v) => v.kind(),
            View::Binary(v) => v.kind(),
        }
    }

    pub fn pos(&self) -> usize {
        match self {
            View::Lazy(v) => v.pos(),
            View::Binary(v) => v.pos(),
        }
    }

    pub fn options(&self) -> &Options {
        match self {
            View::Lazy(v) => v.options(),
            View::Binary(v) => v.options(),
        }
    }

    pub fn apply_object<T>(
        &self,
        mut f: impl FnMut(&RawStr<'a>, &View<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        match self {
            View::Lazy(v) => v.apply_object(|k, c| f(k, &View::Lazy(*c))),
            View::Binary(v) => v.apply_object(|k, c| f(k, &View::Binary(*c))),
        }
    }

    pub fn apply_array<T>(
        &self,
        mut f: impl FnMut(usize, &View<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        match self {
            View::Lazy(v) => v.apply_array(|i, c| f(i, &View::Lazy(*c))),
            View::Binary(v) => v.apply_array(|i, c| f(i, &View::Binary(*c))),
        }
    }

    pub fn apply_string(&self) -> Result<(RawStr<'a>, usize)> {
        match self {
            View::Lazy(v) => v.apply_string(),
            View::Binary(v) => v.apply_string(),
        }
    }

    pub fn apply_number(&self) -> Result<(Num, usize)> {
        match self {
            View::Lazy(v) => v.apply_number(),
            View::Binary(v) => v.apply_number(),
        }
    }

    pub fn skip(&self) -> Result<usize> {
        match self {
            View::Lazy(v) => v.skip(),
            View::Binary(v) => v.skip(),
        }
    }

    /// The single traversal primitive: `(key, child)` for objects,
    /// `(index, child)` for arrays. Scalars are not selectable.
    pub fn apply_each<T>(
        &self,
        mut f: impl FnMut(&Entry<'a>, &View<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        match self.kind() {
            Kind::Object => self.apply_object(|k, c| f(&Entry::Key(*k), c)),
            Kind::Array => self.apply_array(|i, c| f(&Entry::Index(i), c)),
            _ => Err(Error::mismatch(self.pos(), "selectable value")),
        }
    }

    // =========================================================================
    // Path access
    // =========================================================================

    /// First object member with this key, if any.
    pub fn get(&self, key: &str) -> Result<Option<View<'a>>> {
        let applied = self.apply_object(|k, child| {
            if k.matches(key) {
                Ok(Flow::Break(*child))
            } else {
                Ok(Flow::Pass)
            }
        })?;
        Ok(applied.result)
    }

    /// Array element at `index`, if present.
    pub fn at(&self, index: usize) -> Result<Option<View<'a>>> {
        let applied = self.apply_array(|i, child| {
            if i == index {
                Ok(Flow::Break(*child))
            } else {
                Ok(Flow::Pass)
            }
        })?;
        Ok(applied.result)
    }

    /// Navigate a dot-path expression without materializing.
    ///
    /// Path syntax: `field.field[N].field`
    pub fn get_path(&self, path: &str) -> Result<Option<View<'a>>> {
        let mut cur = *self;
        let mut rest = path;
        while !rest.is_empty() {
            let bytes = rest.as_bytes();
            if bytes[0] == b'[' {
                let Some(close) = rest.find(']') else {
                    return Ok(None);
                };
                let Ok(idx) = rest[1..close].parse::<usize>() else {
                    return Ok(None);
                };
                match cur.at(idx)? {
                    Some(child) => cur = child,
                    None => return Ok(None),
                }
                rest = &rest[close + 1..];
            } else {
                let seg_end = bytes
                    .iter()
                    .position(|&b| b == b'.' || b == b'[')
                    .unwrap_or(bytes.len());
                match cur.get(&rest[..seg_end])? {
                    Some(child) => cur = child,
                    None => return Ok(None),
                }
                rest = &rest[seg_end..];
            }
            if rest.as_bytes().first() == Some(&b'.') {
                rest = &rest[1..];
            }
        }
        Ok(Some(cur))
    }

    /// All children whose entry satisfies the predicate, in input order.
    pub fn select(
        &self,
        mut pred: impl FnMut(&Entry<'a>, &View<'a>) -> bool,
    ) -> Result<Vec<View<'a>>> {
        let mut out = Vec::new();
        self.apply_each(|entry, child| {
            if pred(entry, child) {
                out.push(*child);
            }
            Ok(Flow::<()>::Pass)
        })?;
        Ok(out)
    }
}

// =============================================================================
// Tests
// =============================================================================
