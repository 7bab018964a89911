//! Oolong - lazy, binary, and materialized views over JSON documents
//!
//! A document can be consumed three ways, and the traversal protocol is the
//! same for all of them: a lazy cursor over the raw bytes, a compact binary
//! tape with O(1) skipping, and materialization into generic values or
//! user records.
//!
//! # Example
//!
//! ```rust
//! use oolong::{lazy, materialize, Value};
//!
//! let doc = br#"{"name": "tie guan yin", "steeps": 7, "oxidized": 0.3}"#;
//!
//! // Selection without materializing:
//! let view = oolong::View::from(lazy(doc).unwrap());
//! let steeps = view.get_path("steeps").unwrap().unwrap();
//! assert_eq!(steeps.apply_number().unwrap().0.as_i64(), Some(7));
//!
//! // Full materialization:
//! let value = materialize(lazy(doc).unwrap()).unwrap();
//! assert_eq!(value.get("steeps"), Some(&Value::Int(7)));
//! ```

mod convert;
mod lazy;
mod num;
mod reader;
mod scan;
mod types;
mod view;
mod writer;

pub use convert::{field_error, Consumed, Materialize, MaterializeInto, Matrix};
pub use indexmap::IndexMap;
pub use lazy::{LazyArray, LazyObject, LazyValue};
pub use num::Num;
pub use reader::{Binary, BinaryValue};
pub use scan::RawStr;
pub use types::{
    Error, ErrorKind, Kind, ObjectMap, Options, Result, Value, MAX_DEPTH, VERSION,
};
pub use view::{Applied, Entry, Flow, View};

// Re-export derive macros when the "derive" feature is enabled
#[cfg(feature = "derive")]
pub use oolong_derive::{Materialize, MaterializeInto};

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

/// Construct a lazy view over raw JSON bytes with default options.
pub fn lazy(buf: &[u8]) -> Result<LazyValue<'_>> {
    LazyValue::new(buf, Options::new())
}

/// Construct a lazy view with explicit options.
pub fn lazy_with(buf: &[u8], opts: Options) -> Result<LazyValue<'_>> {
    LazyValue::new(buf, opts)
}

/// Re-encode raw JSON bytes into a binary tape with default options.
pub fn binary(buf: &[u8]) -> Result<Binary> {
    Binary::from_lazy(&lazy(buf)?)
}

/// Re-encode raw JSON bytes into a binary tape with explicit options.
pub fn binary_with(buf: &[u8], opts: Options) -> Result<Binary> {
    Binary::from_lazy(&lazy_with(buf, opts)?)
}

/// Materialize a view into a generic [`Value`].
///
/// When the view is the top of a lazy document, trailing bytes after the
/// value must be whitespace; anything else is `InvalidChar`.
pub fn materialize<'a>(view: impl Into<View<'a>>) -> Result<Value> {
    let view = view.into();
    let c = Value::materialize(&view)?;
    check_trailing(&view, c.end)?;
    Ok(c.value)
}

/// Materialize raw JSON bytes into `T` with default options.
pub fn from_slice<T: Materialize>(buf: &[u8]) -> Result<T> {
    from_slice_with(buf, Options::new())
}

/// Materialize raw JSON bytes into `T` with explicit options.
pub fn from_slice_with<T: Materialize>(buf: &[u8], opts: Options) -> Result<T> {
    let root = LazyValue::new(buf, opts)?;
    let view = View::Lazy(root);
    let c = T::materialize(&view)?;
    check_trailing(&view, c.end)?;
    Ok(c.value)
}

/// Materialize a memory-mapped file into `T` with default options.
pub fn from_path<T: Materialize>(path: impl AsRef<Path>) -> Result<T> {
    from_path_with(path, Options::new())
}

/// Materialize a memory-mapped file into `T` with explicit options.
///
/// The mapping is read-only and dropped before returning; the file must not
/// be truncated while it is mapped.
pub fn from_path_with<T: Materialize>(path: impl AsRef<Path>, opts: Options) -> Result<T> {
    let file = File::open(path).map_err(io_error)?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    from_slice_with(&mmap, opts)
}

/// Populate a pre-constructed mutable instance from a view.
pub fn materialize_into<'a, T: MaterializeInto>(
    view: impl Into<View<'a>>,
    target: &mut T,
) -> Result<()> {
    let view = view.into();
    let end = target.materialize_into(&view)?;
    check_trailing(&view, end)?;
    Ok(())
}

fn io_error(e: std::io::Error) -> Error {
    Error::new(ErrorKind::Io, 0, e.to_string())
}

/// Top-level validation: a lazy root admits only trailing whitespace.
///
/// Only the document root (the first value after leading whitespace) is
/// checked; sub-views and binary views pass through. Jsonlines traversal
/// already consumes the entire input.
fn check_trailing(view: &View<'_>, end: usize) -> Result<()> {
    let View::Lazy(root) = view else {
        return Ok(());
    };
    if root.options().jsonlines {
        return Ok(());
    }
    let buf = root.buf();
    if root.pos() != scan::skip_ws(buf, 0) {
        return Ok(());
    }
    let rest = scan::skip_ws(buf, end);
    if rest < buf.len() {
        return Err(Error::new(ErrorKind::InvalidChar, rest, "end of input"));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
