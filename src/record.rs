//! Typed values and records served by the agent.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::consts::{TYPE_COUNTER, TYPE_COUNTER64, TYPE_INTEGER, TYPE_STRING};
use crate::key::Key;

// ASN.1/SMI tags a protocol engine puts on the wire for each variant.
pub const ASN_INTEGER: u8 = 0x02;
pub const ASN_OCTET_STR: u8 = 0x04;
pub const ASN_COUNTER: u8 = 0x41;
pub const ASN_COUNTER64: u8 = 0x46;

/// Unsigned 64-bit counter kept as two 32-bit halves (low, then high),
/// the layout SNMP agent libraries expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Counter64 {
    pub low: u32,
    pub high: u32,
}

impl Counter64 {
    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Self {
            low: (v & 0xFFFF_FFFF) as u32,
            high: (v >> 32) as u32,
        }
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        ((self.high as u64) << 32) | self.low as u64
    }
}

impl From<u64> for Counter64 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

/// A record value. Each variant carries its own natively sized payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Integer32(i32),
    Counter32(u32),
    Counter64(Counter64),
    /// Raw bytes between the quotes of a STRING literal.
    OctetString(Vec<u8>),
}

impl Value {
    /// Type token used in the source file.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer32(_) => TYPE_INTEGER,
            Value::Counter32(_) => TYPE_COUNTER,
            Value::Counter64(_) => TYPE_COUNTER64,
            Value::OctetString(_) => TYPE_STRING,
        }
    }

    pub fn asn_tag(&self) -> u8 {
        match self {
            Value::Integer32(_) => ASN_INTEGER,
            Value::Counter32(_) => ASN_COUNTER,
            Value::Counter64(_) => ASN_COUNTER64,
            Value::OctetString(_) => ASN_OCTET_STR,
        }
    }
}

/// Source-file syntax of the value (STRING re-quoted, bytes shown lossily).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer32(v) => write!(f, "{}", v),
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Counter64(c) => write!(f, "{}", c.as_u64()),
            Value::OctetString(b) => write!(f, "\"{}\"", String::from_utf8_lossy(b)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Value", 2)?;
        st.serialize_field("type", self.type_name())?;
        match self {
            Value::Integer32(v) => st.serialize_field("value", v)?,
            Value::Counter32(v) => st.serialize_field("value", v)?,
            Value::Counter64(c) => st.serialize_field("value", &c.as_u64())?,
            Value::OctetString(b) => {
                st.serialize_field("value", &String::from_utf8_lossy(b))?
            }
        }
        st.end()
    }
}

/// One row of the table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub key: Key,
    pub value: Value,
}

impl Record {
    pub fn new(key: Key, value: Value) -> Self {
        Self { key, value }
    }
}

/// One source line: `<key> <TYPE> <value>`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.value.type_name(), self.value)
    }
}
