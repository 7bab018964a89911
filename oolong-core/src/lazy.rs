//! Lazy view: a cursor over raw JSON bytes.
//!
//! Construction infers the kind from the first significant byte and fully
//! verifies only the keywords; objects, arrays, strings and numbers are
//! validated on demand by the `apply_*` drivers.

use crate::num::{self, Num};
use crate::scan::{self, RawStr};
use crate::types::{Error, ErrorKind, Kind, Options, Result, MAX_DEPTH};
use crate::view::{Applied, Flow};

/// A cursor over raw JSON input: buffer, position, inferred kind, options.
///
/// Borrows the buffer and never outlives it. Cheap to copy; every `apply_*`
/// call re-reads from the position, so a `LazyValue` can be traversed any
/// number of times.
#[derive(Debug, Clone, Copy)]
pub struct LazyValue<'a> {
    buf: &'a [u8],
    pos: usize,
    kind: Kind,
    opts: Options,
}

impl<'a> LazyValue<'a> {
    /// Construct the top-level view: skip leading whitespace, infer the kind.
    pub fn new(buf: &'a [u8], opts: Options) -> Result<Self> {
        let pos = scan::skip_ws(buf, 0);
        if opts.jsonlines {
            // The whole input is an implicit array regardless of content.
            return Ok(Self {
                buf,
                pos,
                kind: Kind::Array,
                opts,
            });
        }
        Self::at(buf, pos, opts)
    }

    /// Construct a view at `pos`, which must address the first byte of a
    /// value. Keywords are verified in full here.
    pub(crate) fn at(buf: &'a [u8], pos: usize, opts: Options) -> Result<Self> {
        let Some(&b) = buf.get(pos) else {
            return Err(Error::eof(buf.len(), "value"));
        };
        let kind = match b {
            b'{' => Kind::Object,
            b'[' => Kind::Array,
            b'"' => Kind::String,
            b'n' => {
                scan::expect_keyword(buf, pos, b"null")?;
                Kind::Null
            }
            b't' => {
                scan::expect_keyword(buf, pos, b"true")?;
                Kind::True
            }
            b'f' => {
                scan::expect_keyword(buf, pos, b"false")?;
                Kind::False
            }
            b'-' | b'0'..=b'9' => Kind::Number,
            b'N' | b'I' | b'+' if opts.float64 => Kind::Number,
            _ => return Err(Error::new(ErrorKind::InvalidJson, pos, "value")),
        };
        Ok(Self {
            buf,
            pos,
            kind,
            opts,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub(crate) fn buf(&self) -> &'a [u8] {
        self.buf
    }

    fn child(&self, pos: usize) -> Result<LazyValue<'a>> {
        LazyValue::at(self.buf, pos, self.opts.nested())
    }

    /// Whether this view is the bracket-less jsonlines top level.
    fn is_jsonlines_root(&self) -> bool {
        self.opts.jsonlines && self.kind == Kind::Array
    }

    // =========================================================================
    // Traversal drivers
    // =========================================================================

    /// Iterate object members, handing `(key, child)` to the callback.
    ///
    /// `Flow::Pass` asks the driver to skip the child, `Flow::Advance(n)`
    /// reports the callback consumed it through byte `n`, and
    /// `Flow::Break(x)` stops traversal, surfacing `x` in the result.
    pub fn apply_object<T>(
        &self,
        mut f: impl FnMut(&RawStr<'a>, &LazyValue<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        let buf = self.buf;
        if self.kind != Kind::Object || buf.get(self.pos) != Some(&b'{') {
            return Err(Error::new(ErrorKind::ExpectedObjectChar, self.pos, "object"));
        }
        let mut pos = scan::skip_ws(buf, self.pos + 1);
        if buf.get(pos) == Some(&b'}') {
            return Ok(Applied::done(pos + 1));
        }
        loop {
            let (key, after_key) = scan::scan_string(buf, pos)?;
            pos = scan::skip_ws(buf, after_key);
            if buf.get(pos) != Some(&b':') {
                return Err(Error::new(ErrorKind::ExpectedColon, pos, "object"));
            }
            pos = scan::skip_ws(buf, pos + 1);
            let child = self.child(pos)?;
            match f(&key, &child)? {
                Flow::Pass => pos = child.skip()?,
                Flow::Advance(n) => pos = n,
                Flow::Break(x) => return Ok(Applied::stopped(pos, x)),
            }
            pos = scan::skip_ws(buf, pos);
            match buf.get(pos) {
                Some(&b'}') => return Ok(Applied::done(pos + 1)),
                Some(&b',') => {
                    pos = scan::skip_ws(buf, pos + 1);
                    // '}' directly after ',' is a trailing comma.
                    if buf.get(pos) == Some(&b'}') {
                        return Err(Error::new(ErrorKind::ExpectedQuoteChar, pos, "object"));
                    }
                }
                Some(_) => return Err(Error::new(ErrorKind::ExpectedComma, pos, "object")),
                None => return Err(Error::eof(buf.len(), "object")),
            }
        }
    }

    /// Iterate array elements, handing `(index, child)` to the callback.
    ///
    /// In jsonlines mode the brackets are absent and elements are delimited
    /// by `\n`, `\r`, or `\r\n`; blank lines yield no element and EOF
    /// terminates cleanly. Children always drop the jsonlines flag.
    pub fn apply_array<T>(
        &self,
        mut f: impl FnMut(usize, &LazyValue<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        if self.is_jsonlines_root() {
            return self.apply_jsonlines(f);
        }
        let buf = self.buf;
        if self.kind != Kind::Array || buf.get(self.pos) != Some(&b'[') {
            return Err(Error::new(ErrorKind::ExpectedArrayChar, self.pos, "array"));
        }
        let mut pos = scan::skip_ws(buf, self.pos + 1);
        if buf.get(pos) == Some(&b']') {
            return Ok(Applied::done(pos + 1));
        }
        let mut index = 0usize;
        loop {
            let child = self.child(pos)?;
            match f(index, &child)? {
                Flow::Pass => pos = child.skip()?,
                Flow::Advance(n) => pos = n,
                Flow::Break(x) => return Ok(Applied::stopped(pos, x)),
            }
            index += 1;
            pos = scan::skip_ws(buf, pos);
            match buf.get(pos) {
                Some(&b']') => return Ok(Applied::done(pos + 1)),
                Some(&b',') => {
                    pos = scan::skip_ws(buf, pos + 1);
                    if buf.get(pos) == Some(&b']') {
                        return Err(Error::new(ErrorKind::InvalidChar, pos, "array"));
                    }
                }
                Some(_) => return Err(Error::new(ErrorKind::ExpectedComma, pos, "array")),
                None => return Err(Error::eof(buf.len(), "array")),
            }
        }
    }

    fn apply_jsonlines<T>(
        &self,
        mut f: impl FnMut(usize, &LazyValue<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        let buf = self.buf;
        let mut pos = self.pos;
        let mut index = 0usize;
        loop {
            pos = scan::skip_ws(buf, pos);
            if pos >= buf.len() {
                return Ok(Applied::done(pos));
            }
            let child = self.child(pos)?;
            match f(index, &child)? {
                Flow::Pass => pos = child.skip()?,
                Flow::Advance(n) => pos = n,
                Flow::Break(x) => return Ok(Applied::stopped(pos, x)),
            }
            index += 1;
            while pos < buf.len() && matches!(buf[pos], b' ' | b'\t') {
                pos += 1;
            }
            match buf.get(pos) {
                None => return Ok(Applied::done(pos)),
                Some(&b'\n') => pos += 1,
                Some(&b'\r') => {
                    pos += 1;
                    if buf.get(pos) == Some(&b'\n') {
                        pos += 1;
                    }
                }
                Some(_) => return Err(Error::new(ErrorKind::ExpectedNewline, pos, "array")),
            }
        }
    }

    /// Scan the string under the cursor, returning its contents and the
    /// position one past the closing quote. Escapes are not decoded here.
    pub fn apply_string(&self) -> Result<(RawStr<'a>, usize)> {
        if self.kind != Kind::String {
            return Err(Error::new(ErrorKind::ExpectedQuoteChar, self.pos, "string"));
        }
        scan::scan_string(self.buf, self.pos)
    }

    /// Parse the number under the cursor through the numeric ladder,
    /// returning the value and the token's end position.
    pub fn apply_number(&self) -> Result<(Num, usize)> {
        if self.kind != Kind::Number {
            return Err(Error::mismatch(self.pos, "number"));
        }
        let end = scan::scan_number(self.buf, self.pos, &self.opts)?;
        let n = num::parse(self.buf, self.pos, end, &self.opts)?;
        Ok((n, end))
    }

    /// Advance past this value without materializing it, returning the
    /// position one past its final byte.
    pub fn skip(&self) -> Result<usize> {
        match self.kind {
            Kind::Object | Kind::Array => {
                if self.is_jsonlines_root() {
                    return Ok(self.apply_array(|_, _| Ok(Flow::<()>::Pass))?.end);
                }
                skip_balanced(self.buf, self.pos)
            }
            Kind::String => Ok(self.apply_string()?.1),
            Kind::Number => scan::scan_number(self.buf, self.pos, &self.opts),
            Kind::True | Kind::Null => Ok(self.pos + 4),
            Kind::False => Ok(self.pos + 5),
            Kind::Int | Kind::Float => {
                // Binary-only kinds never occur on a lazy view.
                Err(Error::new(ErrorKind::InvalidJson, self.pos, "value"))
            }
        }
    }

    /// Project as an object collection. Fails unless the kind is `Object`.
    pub fn as_object(&self) -> Result<LazyObject<'a>> {
        if self.kind != Kind::Object {
            return Err(Error::mismatch(self.pos, "object"));
        }
        Ok(LazyObject { value: *self })
    }

    /// Project as an array collection. Fails unless the kind is `Array`.
    pub fn as_array(&self) -> Result<LazyArray<'a>> {
        if self.kind != Kind::Array {
            return Err(Error::mismatch(self.pos, "array"));
        }
        Ok(LazyArray { value: *self })
    }
}

/// Iterative structural skip over a balanced `{...}` or `[...]` span.
///
/// Strings are honored (braces inside them don't count); depth is capped so
/// crafted input cannot wind the counter up indefinitely.
fn skip_balanced(buf: &[u8], start: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut pos = start;
    while pos < buf.len() {
        match buf[pos] {
            b'{' | b'[' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(Error::new(ErrorKind::InvalidJson, pos, "value"));
                }
                pos += 1;
            }
            b'}' | b']' => {
                depth -= 1;
                pos += 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            b'"' => {
                pos = scan::scan_string(buf, pos)?.1;
            }
            _ => pos += 1,
        }
    }
    Err(Error::eof(buf.len(), "value"))
}

// =============================================================================
// Lazy collections
// =============================================================================

/// An object projection of a [`LazyValue`]. All operations are O(members)
/// and re-parse on each call.
pub struct LazyObject<'a> {
    value: LazyValue<'a>,
}

impl<'a> LazyObject<'a> {
    /// Number of members, by a counting pass.
    pub fn len(&self) -> Result<usize> {
        let mut n = 0usize;
        self.value.apply_object(|_, _| {
            n += 1;
            Ok(Flow::<()>::Pass)
        })?;
        Ok(n)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// First member with this key, if any.
    pub fn get(&self, key: &str) -> Result<Option<LazyValue<'a>>> {
        let applied = self.value.apply_object(|k, child| {
            if k.matches(key) {
                Ok(Flow::Break(*child))
            } else {
                Ok(Flow::Pass)
            }
        })?;
        Ok(applied.result)
    }

    /// Snapshot of all members in input order, keys decoded.
    pub fn entries(&self) -> Result<Vec<(std::borrow::Cow<'a, str>, LazyValue<'a>)>> {
        let mut out = Vec::new();
        self.value.apply_object(|k, child| {
            out.push((k.decode()?, *child));
            Ok(Flow::<()>::Pass)
        })?;
        Ok(out)
    }
}

/// An array projection of a [`LazyValue`].
pub struct LazyArray<'a> {
    value: LazyValue<'a>,
}

impl<'a> LazyArray<'a> {
    /// Number of elements, by a counting pass.
    pub fn len(&self) -> Result<usize> {
        let mut n = 0usize;
        self.value.apply_array(|_, _| {
            n += 1;
            Ok(Flow::<()>::Pass)
        })?;
        Ok(n)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index`, if present.
    pub fn at(&self, index: usize) -> Result<Option<LazyValue<'a>>> {
        let applied = self.value.apply_array(|i, child| {
            if i == index {
                Ok(Flow::Break(*child))
            } else {
                Ok(Flow::Pass)
            }
        })?;
        Ok(applied.result)
    }

    /// Snapshot of all elements in positional order.
    pub fn elements(&self) -> Result<Vec<LazyValue<'a>>> {
        let mut out = Vec::new();
        self.value.apply_array(|_, child| {
            out.push(*child);
            Ok(Flow::<()>::Pass)
        })?;
        Ok(out)
    }
}

// =============================================================================
// Tests
// =============================================================================
