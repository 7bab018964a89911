//! Numeric materialization ladder.
//!
//! Parses a delimited number token into the narrowest representation that
//! holds it: `i64`, then `i128`, then `BigInt` for integer forms; `f64`,
//! then raw decimal text for decimal/exponent forms.

use num_bigint::BigInt;

use crate::types::{Error, ErrorKind, Options, Result, Value};

/// A parsed number, narrowest-first.
#[derive(Debug, Clone, PartialEq)]
pub enum Num {
    Int(i64),
    Int128(i128),
    Big(BigInt),
    Float(f64),
    /// Decimal whose magnitude exceeds `f64`; raw token text retained.
    BigNum(String),
}

impl Num {
    pub fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::Int(i),
            Num::Int128(i) => Value::Int128(i),
            Num::Big(b) => Value::BigInt(b),
            Num::Float(f) => Value::Float(f),
            Num::BigNum(s) => Value::BigNum(s),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Num::Int(i) => Some(*i),
            Num::Int128(i) => i64::try_from(*i).ok(),
            Num::Big(b) => i64::try_from(b).ok(),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Num::Int(i) => Some(i128::from(*i)),
            Num::Int128(i) => Some(*i),
            Num::Big(b) => i128::try_from(b).ok(),
            _ => None,
        }
    }

    /// Float reading, coercing integer forms.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Num::Float(f) => Some(*f),
            Num::Int(i) => Some(*i as f64),
            Num::Int128(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Parse the token at `buf[start..end]`.
///
/// Under `float64` everything parses as `f64` and `NaN`/`Inf` spellings are
/// admitted. Otherwise integer-form tokens walk the i64 → i128 → BigInt
/// ladder and decimal/exponent tokens parse as `f64`, falling back to the
/// raw text when the finite token overflows `f64`.
pub fn parse(buf: &[u8], start: usize, end: usize, opts: &Options) -> Result<Num> {
    let text = std::str::from_utf8(&buf[start..end])
        .map_err(|_| Error::new(ErrorKind::InvalidNumber, start, "number"))?;

    if opts.float64 {
        return parse_float64(text, start).map(Num::Float);
    }

    let integer_form = !text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'));
    if integer_form {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Num::Int(i));
        }
        if let Ok(i) = text.parse::<i128>() {
            return Ok(Num::Int128(i));
        }
        return text
            .parse::<BigInt>()
            .map(Num::Big)
            .map_err(|_| Error::new(ErrorKind::InvalidNumber, start, "number"));
    }

    let f = text
        .parse::<f64>()
        .map_err(|_| Error::new(ErrorKind::InvalidNumber, start, "number"))?;
    if f.is_infinite() {
        // The token itself was finite; keep its text rather than losing it.
        return Ok(Num::BigNum(text.to_string()));
    }
    Ok(Num::Float(f))
}

fn parse_float64(text: &str, pos: usize) -> Result<f64> {
    let (neg, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mag = match rest {
        "NaN" => f64::NAN,
        "Inf" => f64::INFINITY,
        _ => rest
            .parse::<f64>()
            .map_err(|_| Error::new(ErrorKind::InvalidNumber, pos, "number"))?,
    };
    Ok(if neg { -mag } else { mag })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(s: &str, opts: &Options) -> Result<Num> {
        parse(s.as_bytes(), 0, s.len(), opts)
    }

    #[test]
    fn test_integer_ladder() {
        let opts = Options::new();
        assert_eq!(parse_str("42", &opts).unwrap(), Num::Int(42));
        assert_eq!(parse_str("-42", &opts).unwrap(), Num::Int(-42));
        assert_eq!(
            parse_str("9223372036854775807", &opts).unwrap(),
            Num::Int(i64::MAX)
        );
        // One past i64::MAX climbs to i128.
        assert_eq!(
            parse_str("9223372036854775808", &opts).unwrap(),
            Num::Int128(9223372036854775808)
        );
        // Past i128 climbs to BigInt.
        let huge = "170141183460469231731687303715884105728";
        assert!(matches!(parse_str(huge, &opts).unwrap(), Num::Big(_)));
    }

    #[test]
    fn test_float_forms() {
        let opts = Options::new();
        assert_eq!(parse_str("3.14", &opts).unwrap(), Num::Float(3.14));
        assert_eq!(parse_str("1e3", &opts).unwrap(), Num::Float(1000.0));
        assert_eq!(parse_str("-2.5E-2", &opts).unwrap(), Num::Float(-0.025));
        assert_eq!(parse_str("3600.0", &opts).unwrap(), Num::Float(3600.0));
    }

    #[test]
    fn test_bignum_overflow() {
        let opts = Options::new();
        assert_eq!(
            parse_str("1e999", &opts).unwrap(),
            Num::BigNum("1e999".to_string())
        );
        assert_eq!(
            parse_str("-1e999", &opts).unwrap(),
            Num::BigNum("-1e999".to_string())
        );
    }

    #[test]
    fn test_invalid_tokens() {
        let opts = Options::new();
        assert!(parse_str("1.2.3", &opts).is_err());
        assert!(parse_str("1e", &opts).is_err());
        assert!(parse_str("--1", &opts).is_err());
    }

    #[test]
    fn test_float64_mode() {
        let opts = Options::new().float64();
        assert_eq!(parse_str("42", &opts).unwrap(), Num::Float(42.0));
        assert_eq!(parse_str("+1.5", &opts).unwrap(), Num::Float(1.5));
        assert_eq!(parse_str("Inf", &opts).unwrap(), Num::Float(f64::INFINITY));
        assert_eq!(
            parse_str("-Inf", &opts).unwrap(),
            Num::Float(f64::NEG_INFINITY)
        );
        match parse_str("NaN", &opts).unwrap() {
            Num::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_promotion_is_narrowest_first() {
        let opts = Options::new();
        for i in [0i64, 1, -1, i64::MAX, i64::MIN] {
            assert_eq!(parse_str(&i.to_string(), &opts).unwrap(), Num::Int(i));
        }
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Num::Int(5).as_i64(), Some(5));
        assert_eq!(Num::Int128(5).as_i64(), Some(5));
        assert_eq!(Num::Int128(i128::MAX).as_i64(), None);
        assert_eq!(Num::Int(5).as_f64(), Some(5.0));
        assert_eq!(Num::Float(2.5).as_i64(), None);
        assert_eq!(Num::Big(BigInt::from(9)).as_i128(), Some(9));
    }
}
