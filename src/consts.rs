//! Fixed bounds and defaults shared by the parser, store, reload loop and CLI.

// -------- Keys --------
/// Maximum number of components in a record key (the OID suffix under the base).
pub const MAX_KEY_DEPTH: usize = 3;

// -------- Source file --------
pub const DEFAULT_DATA_FILE: &str = "/var/spool/snmp/snmp.data";

// -------- Base OID --------
// NET-SNMP-EXAMPLES-MIB::netSnmpExampleScalars subtree.
pub const DEFAULT_BASE_OID: &[u32] = &[1, 3, 6, 1, 4, 1, 8072, 2, 1, 2, 0];
pub const MIN_BASE_OID_LEN: usize = 6;

// -------- Reload loop --------
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Polls a detected change may be deferred while queries keep arriving.
pub const DEFAULT_FORCE_RELOAD_AFTER_POLLS: u32 = 10;

// -------- Source grammar --------
pub const TYPE_INTEGER: &str = "INTEGER";
pub const TYPE_COUNTER: &str = "COUNTER";
pub const TYPE_COUNTER64: &str = "COUNTER64";
pub const TYPE_STRING: &str = "STRING";

pub const DUMP_START_MARKER: &str = "--start--";
pub const DUMP_STOP_MARKER: &str = "--stop--";
