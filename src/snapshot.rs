//! Immutable sorted tables and their construction from a line source.
//!
//! A `Snapshot` is built once per successful load and never mutated after;
//! the store swaps whole snapshots. Records are kept in a `Vec` sorted by key
//! so exact and successor lookups are binary searches.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;

use crate::consts::{DUMP_START_MARKER, DUMP_STOP_MARKER};
use crate::key::{compare, Key};
use crate::parse::{parse_line, ParseError};
use crate::record::{Record, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from arbitrary records; the first occurrence of a key wins and
    /// later ones are logged as duplicates (position is the 1-based ordinal).
    pub fn from_records<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut b = SnapshotBuilder::new();
        for (i, r) in records.into_iter().enumerate() {
            if let Err(dup) = b.insert(i + 1, r) {
                warn!(
                    "duplicate index {} at record {} (first at record {}). Ignored.",
                    dup.key,
                    i + 1,
                    dup.first_line
                );
            }
        }
        b.build()
    }

    /// Build from records that must have unique keys.
    ///
    /// Err names the first repeated key and where it was first seen.
    pub fn try_from_records<I: IntoIterator<Item = Record>>(
        records: I,
    ) -> std::result::Result<Self, DuplicateKey> {
        let mut b = SnapshotBuilder::new();
        for (i, r) in records.into_iter().enumerate() {
            b.insert(i + 1, r)?;
        }
        Ok(b.build())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending key order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Exact match.
    pub fn get(&self, key: &[u32]) -> Option<&Record> {
        self.records
            .binary_search_by(|r| compare(r.key.as_slice(), key))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Smallest record whose key is strictly greater than `cursor`.
    ///
    /// `cursor` may be any length, including empty (yields the first record)
    /// or a strict prefix of stored keys (yields the first key under it).
    pub fn get_next(&self, cursor: &[u32]) -> Option<&Record> {
        let idx = self
            .records
            .partition_point(|r| compare(r.key.as_slice(), cursor).is_le());
        self.records.get(idx)
    }

    /// Write the table in source syntax between start/stop markers.
    pub fn dump<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "{}", DUMP_START_MARKER)?;
        for r in &self.records {
            writeln!(w, "{}", r)?;
        }
        writeln!(w, "{}", DUMP_STOP_MARKER)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Rejected insert: the key is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: Key,
    /// Line (or insert ordinal) that holds the key.
    pub first_line: usize,
}

/// Sorted, duplicate-rejecting accumulator for one load.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    map: BTreeMap<Key, (usize, Value)>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert keeping sort order. A key seen before is rejected and the
    /// earlier record stays.
    pub fn insert(&mut self, line: usize, rec: Record) -> std::result::Result<(), DuplicateKey> {
        match self.map.entry(rec.key) {
            Entry::Occupied(e) => Err(DuplicateKey {
                key: rec.key,
                first_line: e.get().0,
            }),
            Entry::Vacant(e) => {
                e.insert((line, rec.value));
                Ok(())
            }
        }
    }

    pub fn build(self) -> Snapshot {
        let records = self
            .map
            .into_iter()
            .map(|(key, (_, value))| Record { key, value })
            .collect();
        Snapshot { records }
    }
}

/// Why a line did not make it into the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    Parse { error: ParseError },
    Duplicate { first_line: usize },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Parse { error } => write!(f, "{}", error),
            RejectReason::Duplicate { first_line } => {
                write!(f, "duplicate index (first seen at line {})", first_line)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line: usize,
    pub reason: RejectReason,
}

/// Per-load accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub lines: usize,
    pub records: usize,
    pub rejected: Vec<RejectedLine>,
}

/// Read a whole source and build a snapshot.
///
/// Bad lines are logged (with `origin` and 1-based line number) and skipped.
/// Only an I/O error aborts the load.
pub fn load_snapshot<R: BufRead>(mut reader: R, origin: &str) -> Result<(Snapshot, LoadReport)> {
    let mut builder = SnapshotBuilder::new();
    let mut report = LoadReport::default();
    let mut buf = Vec::with_capacity(256);
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("read {} at line {}", origin, line_no + 1))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let reason = match parse_line(&buf) {
            Ok(None) => continue,
            Ok(Some(rec)) => match builder.insert(line_no, rec) {
                Ok(()) => continue,
                Err(dup) => {
                    warn!(
                        "{}: duplicate index {} at line {} (first at line {}). Ignored.",
                        origin, dup.key, line_no, dup.first_line
                    );
                    RejectReason::Duplicate {
                        first_line: dup.first_line,
                    }
                }
            },
            Err(error) => {
                warn!("{}: line {}: {}. Ignored.", origin, line_no, error);
                RejectReason::Parse { error }
            }
        };
        report.rejected.push(RejectedLine {
            line: line_no,
            reason,
        });
    }

    report.lines = line_no;
    report.records = builder.len();
    Ok((builder.build(), report))
}
