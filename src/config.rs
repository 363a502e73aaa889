//! Centralized configuration for the agent.
//!
//! Sources, lowest to highest precedence:
//! - built-in defaults (see `consts`);
//! - environment (`AgentConfig::from_env()`);
//! - fluent `with_*` setters (the CLI applies its flags through these).
//!
//! Env:
//! - SNMPDATAD_FILE               path to the data source
//! - SNMPDATAD_BASE_OID           dotted base OID, e.g. 1.3.6.1.4.1.8072.2.1.2.0
//! - SNMPDATAD_DEBUG              1|true|yes|on: dump the table after each reload
//! - SNMPDATAD_POLL_MS            poll interval in milliseconds
//! - SNMPDATAD_FORCE_RELOAD_POLLS polls a pending change may wait while busy

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::consts::{
    DEFAULT_BASE_OID, DEFAULT_DATA_FILE, DEFAULT_FORCE_RELOAD_AFTER_POLLS,
    DEFAULT_POLL_INTERVAL_MS, MIN_BASE_OID_LEN,
};
use crate::key::{format_oid, parse_oid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Data source. Env: SNMPDATAD_FILE
    pub data_file: PathBuf,

    /// Prefix stripped from request OIDs before lookup and re-added to answers.
    /// Env: SNMPDATAD_BASE_OID
    pub base_oid: Vec<u32>,

    /// Log a full table dump after each installed reload.
    /// Env: SNMPDATAD_DEBUG (default false)
    pub debug: bool,

    /// Poll tick. Env: SNMPDATAD_POLL_MS (default 500)
    pub poll_interval_ms: u64,

    /// A detected change waits at most this many polls while queries keep
    /// arriving. Env: SNMPDATAD_FORCE_RELOAD_POLLS (default 10)
    pub force_reload_after_polls: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            base_oid: DEFAULT_BASE_OID.to_vec(),
            debug: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            force_reload_after_polls: DEFAULT_FORCE_RELOAD_AFTER_POLLS,
        }
    }
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

impl AgentConfig {
    /// Defaults overridden by whatever SNMPDATAD_* variables are set and valid.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SNMPDATAD_FILE") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.data_file = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("SNMPDATAD_BASE_OID") {
            if let Ok(oid) = parse_oid(&v) {
                if !oid.is_empty() {
                    cfg.base_oid = oid;
                }
            }
        }

        if let Ok(v) = std::env::var("SNMPDATAD_DEBUG") {
            cfg.debug = env_flag(&v);
        }

        if let Ok(v) = std::env::var("SNMPDATAD_POLL_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.poll_interval_ms = n;
            }
        }

        if let Ok(v) = std::env::var("SNMPDATAD_FORCE_RELOAD_POLLS") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.force_reload_after_polls = n;
            }
        }

        cfg
    }

    pub fn with_data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_base_oid(mut self, oid: Vec<u32>) -> Self {
        self.base_oid = oid;
        self
    }

    /// Parse a dotted base OID string and set it.
    pub fn with_base_oid_str(self, oid: &str) -> Result<Self> {
        let parsed = parse_oid(oid)?;
        Ok(self.with_base_oid(parsed))
    }

    pub fn with_debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_force_reload_after_polls(mut self, polls: u32) -> Self {
        self.force_reload_after_polls = polls;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_oid.len() < MIN_BASE_OID_LEN {
            return Err(anyhow!(
                "too short base OID: {} < {}",
                self.base_oid.len(),
                MIN_BASE_OID_LEN
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll interval must be > 0 ms"));
        }
        if self.force_reload_after_polls == 0 {
            return Err(anyhow!("force_reload_after_polls must be >= 1"));
        }
        Ok(())
    }
}

impl fmt::Display for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AgentConfig {{ \
             data_file: {}, \
             base_oid: {}, \
             debug: {}, \
             poll_interval_ms: {}, \
             force_reload_after_polls: {} \
             }}",
            self.data_file.display(),
            format_oid(&self.base_oid),
            self.debug,
            self.poll_interval_ms,
            self.force_reload_after_polls,
        )
    }
}
