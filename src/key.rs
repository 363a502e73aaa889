//! Record keys (OID suffixes under the base OID) and their total order.
//!
//! The same ordering drives snapshot construction and successor lookups:
//! - components are compared one by one, the first mismatch decides;
//! - if one key is a strict prefix of the other, the shorter key sorts first.
//!
//! The prefix rule is what lets a caller pass a truncated key as a walk cursor.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};

use crate::consts::MAX_KEY_DEPTH;

/// Compare two component sequences (keys, cursors or full OIDs).
pub fn compare(a: &[u32], b: &[u32]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            return if x > y {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
    }
    a.len().cmp(&b.len())
}

/// Fixed-capacity key with 1..=MAX_KEY_DEPTH components. Copy, no heap.
#[derive(Clone, Copy)]
pub struct Key {
    parts: [u32; MAX_KEY_DEPTH],
    len: u8,
}

impl Key {
    /// Build a key from components. None if empty or deeper than MAX_KEY_DEPTH.
    pub fn new(parts: &[u32]) -> Option<Self> {
        if parts.is_empty() || parts.len() > MAX_KEY_DEPTH {
            return None;
        }
        let mut buf = [0u32; MAX_KEY_DEPTH];
        buf[..parts.len()].copy_from_slice(parts);
        Some(Self {
            parts: buf,
            len: parts.len() as u8,
        })
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.parts[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false: a key has at least one component.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self.as_slice(), other.as_slice())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_oid(self.as_slice()))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

/// Dotted notation, no leading dot: `1.3.6.1`.
pub fn format_oid(parts: &[u32]) -> String {
    let mut out = String::with_capacity(parts.len() * 3);
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&p.to_string());
    }
    out
}

/// Parse a dotted OID (`1.3.6.1` or `.1.3.6.1`) from user input.
///
/// Used for the base OID and query cursors, so depth is unbounded here.
/// An empty string (or a lone dot) is the empty OID.
pub fn parse_oid(s: &str) -> Result<Vec<u32>> {
    let s = s.trim();
    let s = s.strip_prefix('.').unwrap_or(s);
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split('.')
        .map(|seg| {
            if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                return Err(anyhow!("invalid OID component '{}' in '{}'", seg, s));
            }
            seg.parse::<u32>()
                .map_err(|e| anyhow!("OID component '{}' out of range: {}", seg, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_mismatch_decides() {
        assert_eq!(compare(&[1, 2, 3], &[1, 2, 4]), Ordering::Less);
        assert_eq!(compare(&[1, 3], &[1, 2, 9]), Ordering::Greater);
        assert_eq!(compare(&[2], &[1, 9, 9]), Ordering::Greater);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(compare(&[1, 2], &[1, 2, 0]), Ordering::Less);
        assert_eq!(compare(&[1, 2, 0], &[1, 2]), Ordering::Greater);
        assert_eq!(compare(&[], &[0]), Ordering::Less);
    }

    #[test]
    fn equal_keys_compare_equal() {
        assert_eq!(compare(&[5, 0], &[5, 0]), Ordering::Equal);
        assert_eq!(compare(&[], &[]), Ordering::Equal);
    }

    #[test]
    fn agrees_with_slice_ordering() {
        let samples: &[&[u32]] = &[&[], &[0], &[1], &[1, 0], &[1, 2, 3], &[1, 3], &[u32::MAX]];
        for a in samples {
            for b in samples {
                assert_eq!(compare(a, b), a.cmp(b), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn key_bounds() {
        assert!(Key::new(&[]).is_none());
        assert!(Key::new(&[1, 2, 3, 4]).is_none());
        let k = Key::new(&[1, 2, 3]).unwrap();
        assert_eq!(k.as_slice(), &[1, 2, 3]);
        assert_eq!(k.len(), 3);
        assert_eq!(k.to_string(), "1.2.3");
    }

    #[test]
    fn key_ord_ignores_unused_capacity() {
        let a = Key::new(&[1]).unwrap();
        let b = Key::new(&[1, 0]).unwrap();
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn parse_oid_forms() {
        assert_eq!(parse_oid("1.3.6.1").unwrap(), vec![1, 3, 6, 1]);
        assert_eq!(parse_oid(".1.3.6.1").unwrap(), vec![1, 3, 6, 1]);
        assert_eq!(parse_oid("").unwrap(), Vec::<u32>::new());
        assert_eq!(parse_oid(".").unwrap(), Vec::<u32>::new());
        assert!(parse_oid("1..3").is_err());
        assert!(parse_oid("1.x").is_err());
        assert!(parse_oid("1.-2").is_err());
        assert!(parse_oid("99999999999").is_err());
    }

    #[test]
    fn format_oid_roundtrip() {
        assert_eq!(format_oid(&[1, 3, 6]), "1.3.6");
        assert_eq!(format_oid(&[]), "");
    }
}
