//! Binary tape reader.
//!
//! A tape value begins with a one-byte tag: the low 4 bits hold the kind,
//! the high 4 bits a size class. Containers store a u32 total-byte-length
//! (tag and length fields included) right after the tag, which is what makes
//! `skip` O(1). All reads are bounds-checked; a crafted tape fails with an
//! error, never a panic.

use num_bigint::BigInt;

use crate::lazy::LazyValue;
use crate::num::Num;
use crate::scan::RawStr;
use crate::types::{Error, ErrorKind, Kind, Options, Result};
use crate::view::{Applied, Flow};
use crate::writer;

// Tag kind nibbles.
pub(crate) const TAG_NULL: u8 = 0x0;
pub(crate) const TAG_FALSE: u8 = 0x1;
pub(crate) const TAG_TRUE: u8 = 0x2;
pub(crate) const TAG_INT: u8 = 0x3;
pub(crate) const TAG_FLOAT: u8 = 0x4;
pub(crate) const TAG_STRING: u8 = 0x5;
pub(crate) const TAG_ARRAY: u8 = 0x6;
pub(crate) const TAG_OBJECT: u8 = 0x7;

// Int size classes (i8/i16/i32/i64/i128, then length-prefixed big integer).
pub(crate) const INT_CLASS_BIG: u8 = 5;
// Float size classes (f32/f64, then length-prefixed decimal text).
pub(crate) const FLOAT_CLASS_F32: u8 = 0;
pub(crate) const FLOAT_CLASS_F64: u8 = 1;
pub(crate) const FLOAT_CLASS_BIG: u8 = 2;

pub(crate) fn make_tag(nibble: u8, class: u8) -> u8 {
    nibble | (class << 4)
}

fn split_tag(tag: u8) -> (u8, u8) {
    (tag & 0x0F, tag >> 4)
}

fn read_at<const N: usize>(tape: &[u8], offset: usize) -> Result<[u8; N]> {
    let end = offset
        .checked_add(N)
        .ok_or_else(|| Error::new(ErrorKind::UnexpectedEof, offset, "binary value"))?;
    let bytes = tape
        .get(offset..end)
        .ok_or_else(|| Error::eof(tape.len(), "binary value"))?;
    bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::InvalidBinaryTag, offset, "binary value"))
}

fn read_u32_at(tape: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_le_bytes(read_at::<4>(tape, offset)?))
}

fn read_len_prefixed(tape: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let len = read_u32_at(tape, offset)? as usize;
    let start = offset + 4;
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::new(ErrorKind::UnexpectedEof, offset, "binary value"))?;
    let bytes = tape
        .get(start..end)
        .ok_or_else(|| Error::eof(tape.len(), "binary value"))?;
    Ok((bytes, end))
}

// =============================================================================
// Binary (owned tape)
// =============================================================================

/// An owned binary re-encoding of a JSON document.
#[derive(Debug)]
pub struct Binary {
    tape: Vec<u8>,
    opts: Options,
    root_kind: Kind,
    root_class: u8,
}

impl Binary {
    /// Re-encode a lazy value into a fresh tape.
    pub fn from_lazy(value: &LazyValue<'_>) -> Result<Self> {
        let tape = writer::encode(value)?;
        Self::from_tape(tape, *value.options())
    }

    /// Re-admit a previously produced tape, validating the root tag.
    ///
    /// Tags with an unrecognized kind nibble are rejected with
    /// `InvalidBinaryTag`; nested values are validated as they are read.
    pub fn from_tape(tape: Vec<u8>, opts: Options) -> Result<Self> {
        let root = BinaryValue::at(&tape, 0, opts)?;
        let (root_kind, root_class) = (root.kind, root.class);
        Ok(Self {
            tape,
            opts,
            root_kind,
            root_class,
        })
    }

    /// The raw tape bytes (stable within a major version).
    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn into_tape(self) -> Vec<u8> {
        self.tape
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Cursor over the tape's root value.
    pub fn root(&self) -> BinaryValue<'_> {
        BinaryValue {
            tape: &self.tape,
            pos: 0,
            kind: self.root_kind,
            class: self.root_class,
            opts: self.opts,
        }
    }
}

// =============================================================================
// BinaryValue (cursor)
// =============================================================================

/// A cursor over one value on a binary tape.
#[derive(Debug, Clone, Copy)]
pub struct BinaryValue<'a> {
    tape: &'a [u8],
    pos: usize,
    kind: Kind,
    class: u8,
    opts: Options,
}

impl<'a> BinaryValue<'a> {
    /// Read and validate the tag at `pos`.
    pub(crate) fn at(tape: &'a [u8], pos: usize, opts: Options) -> Result<Self> {
        let Some(&tag) = tape.get(pos) else {
            return Err(Error::eof(tape.len(), "binary value"));
        };
        let (nibble, class) = split_tag(tag);
        let (kind, max_class) = match nibble {
            TAG_NULL => (Kind::Null, 0),
            TAG_FALSE => (Kind::False, 0),
            TAG_TRUE => (Kind::True, 0),
            TAG_INT => (Kind::Int, INT_CLASS_BIG),
            TAG_FLOAT => (Kind::Float, FLOAT_CLASS_BIG),
            TAG_STRING => (Kind::String, 0),
            TAG_ARRAY => (Kind::Array, 0),
            TAG_OBJECT => (Kind::Object, 0),
            _ => return Err(Error::new(ErrorKind::InvalidBinaryTag, pos, "binary value")),
        };
        if class > max_class {
            return Err(Error::new(ErrorKind::InvalidBinaryTag, pos, "binary value"));
        }
        Ok(Self {
            tape,
            pos,
            kind,
            class,
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

    /// Total byte length of a container, validated against the tape bounds.
    fn container_total(&self) -> Result<usize> {
        let total = read_u32_at(self.tape, self.pos + 1)? as usize;
        let end = self.pos.checked_add(total);
        if total < 9 || end.map_or(true, |e| e > self.tape.len()) {
            return Err(Error::new(ErrorKind::InvalidBinaryTag, self.pos, "binary value"));
        }
        Ok(total)
    }

    /// Advance past this value: O(1) for containers via the stored length.
    pub fn skip(&self) -> Result<usize> {
        match self.kind {
            Kind::Null | Kind::True | Kind::False => Ok(self.pos + 1),
            Kind::Int => match self.class {
                0 => Ok(self.pos + 2),
                1 => Ok(self.pos + 3),
                2 => Ok(self.pos + 5),
                3 => Ok(self.pos + 9),
                4 => Ok(self.pos + 17),
                _ => Ok(read_len_prefixed(self.tape, self.pos + 1)?.1),
            },
            Kind::Float => match self.class {
                FLOAT_CLASS_F32 => Ok(self.pos + 5),
                FLOAT_CLASS_F64 => Ok(self.pos + 9),
                _ => Ok(read_len_prefixed(self.tape, self.pos + 1)?.1),
            },
            Kind::String => Ok(read_len_prefixed(self.tape, self.pos + 1)?.1),
            Kind::Object | Kind::Array => Ok(self.pos + self.container_total()?),
            Kind::Number => Err(Error::new(ErrorKind::InvalidBinaryTag, self.pos, "binary value")),
        }
    }

    /// Iterate object members. Mirrors [`LazyValue::apply_object`].
    pub fn apply_object<T>(
        &self,
        mut f: impl FnMut(&RawStr<'a>, &BinaryValue<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        if self.kind != Kind::Object {
            return Err(Error::new(ErrorKind::ExpectedObjectChar, self.pos, "object"));
        }
        let total = self.container_total()?;
        let count = read_u32_at(self.tape, self.pos + 5)?;
        let mut p = self.pos + 9;
        for _ in 0..count {
            let key_cursor = BinaryValue::at(self.tape, p, self.opts)?;
            if key_cursor.kind != Kind::String {
                return Err(Error::new(ErrorKind::InvalidBinaryTag, p, "object key"));
            }
            let (key, after_key) = key_cursor.string_parts()?;
            let child = BinaryValue::at(self.tape, after_key, self.opts)?;
            match f(&key, &child)? {
                Flow::Pass => p = child.skip()?,
                Flow::Advance(n) => p = n,
                Flow::Break(x) => return Ok(Applied::stopped(p, x)),
            }
        }
        Ok(Applied::done(self.pos + total))
    }

    /// Iterate array elements. Mirrors [`LazyValue::apply_array`].
    pub fn apply_array<T>(
        &self,
        mut f: impl FnMut(usize, &BinaryValue<'a>) -> Result<Flow<T>>,
    ) -> Result<Applied<T>> {
        if self.kind != Kind::Array {
            return Err(Error::new(ErrorKind::ExpectedArrayChar, self.pos, "array"));
        }
        let total = self.container_total()?;
        let count = read_u32_at(self.tape, self.pos + 5)?;
        let mut p = self.pos + 9;
        for index in 0..count as usize {
            let child = BinaryValue::at(self.tape, p, self.opts)?;
            match f(index, &child)? {
                Flow::Pass => p = child.skip()?,
                Flow::Advance(n) => p = n,
                Flow::Break(x) => return Ok(Applied::stopped(p, x)),
            }
        }
        Ok(Applied::done(self.pos + total))
    }

    fn string_parts(&self) -> Result<(RawStr<'a>, usize)> {
        let (bytes, end) = read_len_prefixed(self.tape, self.pos + 1)?;
        // Tape strings are stored decoded, so the raw slice is the string.
        Ok((RawStr::new(bytes, self.pos + 5, false), end))
    }

    /// The string under the cursor and the position one past it.
    pub fn apply_string(&self) -> Result<(RawStr<'a>, usize)> {
        if self.kind != Kind::String {
            return Err(Error::new(ErrorKind::ExpectedQuoteChar, self.pos, "string"));
        }
        self.string_parts()
    }

    /// Decode the number under the cursor (`Int` or `Float` kinds).
    pub fn apply_number(&self) -> Result<(Num, usize)> {
        let payload = self.pos + 1;
        match self.kind {
            Kind::Int => match self.class {
                0 => {
                    let [b] = read_at::<1>(self.tape, payload)?;
                    Ok((Num::Int(b as i8 as i64), payload + 1))
                }
                1 => Ok((
                    Num::Int(i16::from_le_bytes(read_at(self.tape, payload)?) as i64),
                    payload + 2,
                )),
                2 => Ok((
                    Num::Int(i32::from_le_bytes(read_at(self.tape, payload)?) as i64),
                    payload + 4,
                )),
                3 => Ok((
                    Num::Int(i64::from_le_bytes(read_at(self.tape, payload)?)),
                    payload + 8,
                )),
                4 => Ok((
                    Num::Int128(i128::from_le_bytes(read_at(self.tape, payload)?)),
                    payload + 16,
                )),
                _ => {
                    let (bytes, end) = read_len_prefixed(self.tape, payload)?;
                    Ok((Num::Big(BigInt::from_signed_bytes_le(bytes)), end))
                }
            },
            Kind::Float => match self.class {
                FLOAT_CLASS_F32 => Ok((
                    Num::Float(f32::from_le_bytes(read_at(self.tape, payload)?) as f64),
                    payload + 4,
                )),
                FLOAT_CLASS_F64 => Ok((
                    Num::Float(f64::from_le_bytes(read_at(self.tape, payload)?)),
                    payload + 8,
                )),
                _ => {
                    let (bytes, end) = read_len_prefixed(self.tape, payload)?;
                    let text = std::str::from_utf8(bytes)
                        .map_err(|_| Error::new(ErrorKind::InvalidNumber, payload, "number"))?;
                    Ok((Num::BigNum(text.to_string()), end))
                }
            },
            _ => Err(Error::mismatch(self.pos, "number")),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
