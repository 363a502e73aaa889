//! Line parser for the data source.
//!
//! Grammar (fields separated by spaces/tabs):
//!
//! ```text
//! <k1>[.<k2>[.<k3>]] <TYPE> <value>
//! TYPE := INTEGER | COUNTER | COUNTER64 | STRING
//! ```
//!
//! The value is the remainder of the line after the type token. STRING values
//! are wrapped in double quotes; the interior is copied verbatim, there is no
//! escape processing. Blank lines and lines starting with `#` carry no record.
//!
//! Every failure is line-scoped: the caller logs it and moves on.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::consts::{MAX_KEY_DEPTH, TYPE_COUNTER, TYPE_COUNTER64, TYPE_INTEGER, TYPE_STRING};
use crate::key::Key;
use crate::record::{Counter64, Record, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Key, type or value field absent.
    MissingField,
    TooManyKeyComponents,
    /// Empty segment, non-digit character or component above u32::MAX.
    InvalidKey,
    UnknownType,
    /// Numeric literal malformed or out of range for its type.
    InvalidNumber,
    StringFormat,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseError::MissingField => "missing field",
            ParseError::TooManyKeyComponents => "too many key components",
            ParseError::InvalidKey => "invalid key",
            ParseError::UnknownType => "unknown type",
            ParseError::InvalidNumber => "invalid number",
            ParseError::StringFormat => "string format error",
        };
        f.write_str(s)
    }
}

impl std::error::Error for ParseError {}

impl Serialize for ParseError {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

#[inline]
fn is_sep(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn skip_seps(s: &[u8]) -> &[u8] {
    let n = s.iter().take_while(|b| is_sep(**b)).count();
    &s[n..]
}

/// Split off the next field; the rest starts at the following field.
fn next_field(s: &[u8]) -> Option<(&[u8], &[u8])> {
    let s = skip_seps(s);
    if s.is_empty() {
        return None;
    }
    match s.iter().position(|b| is_sep(*b)) {
        Some(i) => Some((&s[..i], skip_seps(&s[i..]))),
        None => Some((s, &[])),
    }
}

fn strip_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse a key such as `1.2.3`.
pub fn parse_key(tok: &[u8]) -> Result<Key, ParseError> {
    let mut parts = [0u32; MAX_KEY_DEPTH];
    let mut n = 0usize;
    for seg in tok.split(|b| *b == b'.') {
        if n == MAX_KEY_DEPTH {
            return Err(ParseError::TooManyKeyComponents);
        }
        if seg.is_empty() || !seg.iter().all(u8::is_ascii_digit) {
            return Err(ParseError::InvalidKey);
        }
        // all-digit ASCII, so from_utf8 cannot fail
        let s = std::str::from_utf8(seg).map_err(|_| ParseError::InvalidKey)?;
        parts[n] = s.parse::<u32>().map_err(|_| ParseError::InvalidKey)?;
        n += 1;
    }
    Key::new(&parts[..n]).ok_or(ParseError::InvalidKey)
}

fn parse_number<T: std::str::FromStr>(raw: &[u8]) -> Result<T, ParseError> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| ParseError::InvalidNumber)?
        .trim();
    if s.is_empty() {
        return Err(ParseError::MissingField);
    }
    s.parse::<T>().map_err(|_| ParseError::InvalidNumber)
}

/// Counters take plain digits only; `FromStr` alone would accept a `+`.
fn parse_unsigned<T: std::str::FromStr>(raw: &[u8]) -> Result<T, ParseError> {
    let digits = skip_seps(raw);
    if matches!(digits.first(), Some(b'+') | Some(b'-')) {
        return Err(ParseError::InvalidNumber);
    }
    parse_number::<T>(raw)
}

fn parse_string(raw: &[u8]) -> Result<Value, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingField);
    }
    if raw.len() < 2 || raw[0] != b'"' || raw[raw.len() - 1] != b'"' {
        return Err(ParseError::StringFormat);
    }
    let inner = &raw[1..raw.len() - 1];
    if inner.contains(&b'"') {
        return Err(ParseError::StringFormat);
    }
    Ok(Value::OctetString(inner.to_vec()))
}

/// Parse one source line (with or without its terminator).
///
/// `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &[u8]) -> Result<Option<Record>, ParseError> {
    let line = strip_line_end(line);
    let body = skip_seps(line);
    if body.is_empty() || body[0] == b'#' {
        return Ok(None);
    }

    let (key_tok, rest) = next_field(body).ok_or(ParseError::MissingField)?;
    let key = parse_key(key_tok)?;

    let (type_tok, value_raw) = next_field(rest).ok_or(ParseError::MissingField)?;
    let value = match type_tok {
        t if t == TYPE_INTEGER.as_bytes() => Value::Integer32(parse_number::<i32>(value_raw)?),
        t if t == TYPE_COUNTER.as_bytes() => Value::Counter32(parse_unsigned::<u32>(value_raw)?),
        t if t == TYPE_COUNTER64.as_bytes() => {
            Value::Counter64(Counter64::from_u64(parse_unsigned::<u64>(value_raw)?))
        }
        t if t == TYPE_STRING.as_bytes() => parse_string(value_raw)?,
        _ => return Err(ParseError::UnknownType),
    };

    Ok(Some(Record::new(key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(line: &str) -> Record {
        parse_line(line.as_bytes()).unwrap().unwrap()
    }

    fn err(line: &str) -> ParseError {
        parse_line(line.as_bytes()).unwrap_err()
    }

    #[test]
    fn parses_every_type() {
        let r = rec("1.2.3 INTEGER 42\n");
        assert_eq!(r.key.as_slice(), &[1, 2, 3]);
        assert_eq!(r.value, Value::Integer32(42));

        assert_eq!(rec("7 INTEGER -17").value, Value::Integer32(-17));
        assert_eq!(rec("1.3.0 COUNTER 7").value, Value::Counter32(7));
        assert_eq!(
            rec("4 COUNTER64 4294967298").value,
            Value::Counter64(Counter64 { low: 2, high: 1 })
        );
        assert_eq!(
            rec("1.2.4 STRING \"hello\"").value,
            Value::OctetString(b"hello".to_vec())
        );
    }

    #[test]
    fn string_keeps_interior_verbatim() {
        assert_eq!(
            rec("1 STRING \"two  words\\n\"\r\n").value,
            Value::OctetString(b"two  words\\n".to_vec())
        );
        assert_eq!(rec("1 STRING \"\"").value, Value::OctetString(Vec::new()));
    }

    #[test]
    fn tabs_and_runs_of_spaces_separate_fields() {
        let r = rec("5.0\tCOUNTER   12");
        assert_eq!(r.key.as_slice(), &[5, 0]);
        assert_eq!(r.value, Value::Counter32(12));
    }

    #[test]
    fn blank_and_comment_lines_carry_nothing() {
        assert_eq!(parse_line(b"\n"), Ok(None));
        assert_eq!(parse_line(b"   \t\r\n"), Ok(None));
        assert_eq!(parse_line(b"# 1.1 INTEGER 1\n"), Ok(None));
    }

    #[test]
    fn key_rejections() {
        assert_eq!(err("1.2.3.4 INTEGER 1"), ParseError::TooManyKeyComponents);
        assert_eq!(err("1.x INTEGER 1"), ParseError::InvalidKey);
        assert_eq!(err("1..2 INTEGER 1"), ParseError::InvalidKey);
        assert_eq!(err(".1 INTEGER 1"), ParseError::InvalidKey);
        assert_eq!(err("1.-2 INTEGER 1"), ParseError::InvalidKey);
        assert_eq!(err("4294967296 INTEGER 1"), ParseError::InvalidKey);
    }

    #[test]
    fn type_rejections() {
        assert_eq!(err("1 GAUGE 1"), ParseError::UnknownType);
        assert_eq!(err("1 integer 1"), ParseError::UnknownType);
        assert_eq!(err("1"), ParseError::MissingField);
        assert_eq!(err("1 INTEGER"), ParseError::MissingField);
    }

    #[test]
    fn number_rejections() {
        assert_eq!(err("1 INTEGER abc"), ParseError::InvalidNumber);
        assert_eq!(err("1 INTEGER 2147483648"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER -1"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER 4294967296"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER64 18446744073709551616"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER +5"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER64 +5"), ParseError::InvalidNumber);
        assert_eq!(err("1 COUNTER64 -5"), ParseError::InvalidNumber);
    }

    #[test]
    fn integer_keeps_its_sign() {
        assert_eq!(rec("1 INTEGER +5").value, Value::Integer32(5));
        assert_eq!(rec("1 INTEGER -5").value, Value::Integer32(-5));
        assert_eq!(rec("1 COUNTER 5").value, Value::Counter32(5));
    }

    #[test]
    fn string_format_rejections() {
        assert_eq!(err("9.9 STRING hello"), ParseError::StringFormat);
        assert_eq!(err("9.9 STRING \"hello"), ParseError::StringFormat);
        assert_eq!(err("9.9 STRING hello\""), ParseError::StringFormat);
        assert_eq!(err("9.9 STRING \""), ParseError::StringFormat);
        assert_eq!(err("9.9 STRING \"a\"b\""), ParseError::StringFormat);
        assert_eq!(err("9.9 STRING \"x\" "), ParseError::StringFormat);
    }

    #[test]
    fn non_utf8_string_bytes_are_kept() {
        let line = b"2 STRING \"\xff\xfe\"\n";
        let r = parse_line(line).unwrap().unwrap();
        assert_eq!(r.value, Value::OctetString(vec![0xff, 0xfe]));
    }

    #[test]
    fn messages_match_log_vocabulary() {
        assert_eq!(ParseError::TooManyKeyComponents.to_string(), "too many key components");
        assert_eq!(ParseError::InvalidKey.to_string(), "invalid key");
        assert_eq!(ParseError::UnknownType.to_string(), "unknown type");
        assert_eq!(ParseError::StringFormat.to_string(), "string format error");
    }
}
