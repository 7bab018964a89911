//! Binary tape writer.
//!
//! Re-encodes a lazy value into the tape format in a single traversal.
//! Container headers are emitted with placeholder lengths and patched once
//! the children have been written; numbers are eagerly classified into the
//! narrowest `Int` width or a `Float` class.

use crate::lazy::LazyValue;
use crate::num::Num;
use crate::reader::{
    make_tag, FLOAT_CLASS_BIG, FLOAT_CLASS_F32, FLOAT_CLASS_F64, INT_CLASS_BIG, TAG_ARRAY,
    TAG_FALSE, TAG_FLOAT, TAG_INT, TAG_NULL, TAG_OBJECT, TAG_STRING, TAG_TRUE,
};
use crate::scan::RawStr;
use crate::types::{
    Error, ErrorKind, Kind, Result, MAX_CONTAINER_BYTES, MAX_DEPTH, MAX_STRING_LENGTH,
};
use crate::view::Flow;

/// Encode one lazy value into a fresh tape.
pub(crate) fn encode(value: &LazyValue<'_>) -> Result<Vec<u8>> {
    let mut w = TapeWriter { out: Vec::new() };
    w.write_value(value, 0)?;
    Ok(w.out)
}

struct TapeWriter {
    out: Vec<u8>,
}

impl TapeWriter {
    /// Write the value under the cursor, returning the position one past it
    /// in the *source* buffer so the caller's driver can continue.
    fn write_value(&mut self, v: &LazyValue<'_>, depth: usize) -> Result<usize> {
        if depth > MAX_DEPTH {
            return Err(Error::new(ErrorKind::InvalidJson, v.pos(), "value"));
        }
        match v.kind() {
            Kind::Null => {
                self.out.push(make_tag(TAG_NULL, 0));
                v.skip()
            }
            Kind::True => {
                self.out.push(make_tag(TAG_TRUE, 0));
                v.skip()
            }
            Kind::False => {
                self.out.push(make_tag(TAG_FALSE, 0));
                v.skip()
            }
            Kind::String => {
                let (s, end) = v.apply_string()?;
                self.write_string(&s)?;
                Ok(end)
            }
            Kind::Number => {
                let (n, end) = v.apply_number()?;
                self.write_num(&n)?;
                Ok(end)
            }
            Kind::Object => self.write_object(v, depth),
            Kind::Array => self.write_array(v, depth),
            // Binary-only kinds never occur on a lazy view.
            Kind::Int | Kind::Float => {
                Err(Error::new(ErrorKind::InvalidJson, v.pos(), "value"))
            }
        }
    }

    fn write_object(&mut self, v: &LazyValue<'_>, depth: usize) -> Result<usize> {
        let header = self.begin_container(TAG_OBJECT);
        let mut count: u32 = 0;
        let applied = v.apply_object(|key, child| {
            self.write_string(key)?;
            let end = self.write_value(child, depth + 1)?;
            count += 1;
            Ok(Flow::<()>::Advance(end))
        })?;
        self.end_container(header, count)?;
        Ok(applied.end)
    }

    fn write_array(&mut self, v: &LazyValue<'_>, depth: usize) -> Result<usize> {
        let header = self.begin_container(TAG_ARRAY);
        let mut count: u32 = 0;
        let applied = v.apply_array(|_, child| {
            let end = self.write_value(child, depth + 1)?;
            count += 1;
            Ok(Flow::<()>::Advance(end))
        })?;
        self.end_container(header, count)?;
        Ok(applied.end)
    }

    /// Emit a container tag plus zeroed total/count fields; returns the tag
    /// position for the later patch.
    fn begin_container(&mut self, nibble: u8) -> usize {
        let start = self.out.len();
        self.out.push(make_tag(nibble, 0));
        self.out.extend_from_slice(&[0u8; 8]);
        start
    }

    fn end_container(&mut self, start: usize, count: u32) -> Result<()> {
        let total = self.out.len() - start;
        if total > MAX_CONTAINER_BYTES {
            return Err(Error::new(ErrorKind::InvalidJson, start, "value"));
        }
        self.out[start + 1..start + 5].copy_from_slice(&(total as u32).to_le_bytes());
        self.out[start + 5..start + 9].copy_from_slice(&count.to_le_bytes());
        Ok(())
    }

    fn write_string(&mut self, s: &RawStr<'_>) -> Result<()> {
        let decoded = s.decode()?;
        let bytes = decoded.as_bytes();
        if bytes.len() > MAX_STRING_LENGTH {
            return Err(Error::new(ErrorKind::InvalidJson, s.offset(), "string"));
        }
        self.out.push(make_tag(TAG_STRING, 0));
        self.out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn write_num(&mut self, n: &Num) -> Result<()> {
        match n {
            Num::Int(i) => self.write_int(*i),
            Num::Int128(i) => {
                self.out.push(make_tag(TAG_INT, 4));
                self.out.extend_from_slice(&i.to_le_bytes());
            }
            Num::Big(b) => {
                let bytes = b.to_signed_bytes_le();
                self.out.push(make_tag(TAG_INT, INT_CLASS_BIG));
                self.out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                self.out.extend_from_slice(&bytes);
            }
            Num::Float(f) => self.write_float(*f),
            Num::BigNum(text) => {
                self.out.push(make_tag(TAG_FLOAT, FLOAT_CLASS_BIG));
                self.out
                    .extend_from_slice(&(text.len() as u32).to_le_bytes());
                self.out.extend_from_slice(text.as_bytes());
            }
        }
        Ok(())
    }

    /// Narrowest-width two's-complement encoding.
    fn write_int(&mut self, i: i64) {
        if let Ok(v) = i8::try_from(i) {
            self.out.push(make_tag(TAG_INT, 0));
            self.out.extend_from_slice(&v.to_le_bytes());
        } else if let Ok(v) = i16::try_from(i) {
            self.out.push(make_tag(TAG_INT, 1));
            self.out.extend_from_slice(&v.to_le_bytes());
        } else if let Ok(v) = i32::try_from(i) {
            self.out.push(make_tag(TAG_INT, 2));
            self.out.extend_from_slice(&v.to_le_bytes());
        } else {
            self.out.push(make_tag(TAG_INT, 3));
            self.out.extend_from_slice(&i.to_le_bytes());
        }
    }

    fn write_float(&mut self, f: f64) {
        // binary32 only when the value survives the round trip exactly.
        let narrow = f as f32;
        if f64::from(narrow).to_bits() == f.to_bits() {
            self.out.push(make_tag(TAG_FLOAT, FLOAT_CLASS_F32));
            self.out.extend_from_slice(&narrow.to_le_bytes());
        } else {
            self.out.push(make_tag(TAG_FLOAT, FLOAT_CLASS_F64));
            self.out.extend_from_slice(&f.to_le_bytes());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
