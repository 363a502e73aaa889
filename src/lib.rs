//! snmpdatad: serve a file-defined table of typed values to SNMP-style
//! Get / GetNext queries.
//!
//! Layout:
//! - key / record / parse: keys, values and the source line grammar;
//! - snapshot / store: immutable sorted tables and the swappable active one;
//! - lock / reload: keeping the store in sync with the source file;
//! - agent: the query adapter a protocol engine calls.

// Base modules
pub mod consts;
pub mod config;
pub mod metrics;

// Data model
pub mod key;
pub mod record;
pub mod parse;

// Tables
pub mod snapshot;
pub mod store;

// Reload pipeline
pub mod lock;
pub mod reload;

// Query adapter
pub mod agent;

// Convenient re-exports
pub use agent::{Agent, Lookup, Mode, NextLookup, Response};
pub use config::AgentConfig;
pub use key::{compare, format_oid, parse_oid, Key};
pub use lock::{lock_source, try_lock_source, SourceLock};
pub use metrics::{Metrics, MetricsSnapshot};
pub use parse::{parse_line, ParseError};
pub use record::{Counter64, Record, Value};
pub use reload::{PollLoop, Poller, ReloadOutcome, ReloadPolicy, Reloader, Tick};
pub use snapshot::{
    load_snapshot, DuplicateKey, LoadReport, RejectReason, RejectedLine, Snapshot, SnapshotBuilder,
};
pub use store::Store;
