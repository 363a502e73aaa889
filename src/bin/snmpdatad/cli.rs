use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use snmpdatad::AgentConfig;

/// Read-only SNMP data table agent
#[derive(Parser, Debug)]
#[command(
    name = "snmpdatad",
    version,
    about = "Serve a file-defined table to SNMP Get/GetNext queries"
)]
pub struct Cli {
    /// Verbose logging; dump the table after every reload
    #[arg(short = 'd', long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

/// Where the table comes from and where it is mounted.
/// Unset flags fall back to SNMPDATAD_* env, then built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Data file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,
    /// Base OID the table is registered under (at least 6 components)
    #[arg(short = 'b', long)]
    pub base_oid: Option<String>,
}

impl SourceArgs {
    pub fn config(&self, debug: bool) -> Result<AgentConfig> {
        let mut cfg = AgentConfig::from_env();
        if let Some(f) = &self.file {
            cfg = cfg.with_data_file(f);
        }
        if let Some(b) = &self.base_oid {
            cfg = cfg.with_base_oid_str(b)?;
        }
        if debug {
            cfg = cfg.with_debug(true);
        }
        Ok(cfg)
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Load the table, follow file changes and answer queries on stdin
    ///
    /// Console commands:
    ///   get|getnext|getbulk|set <oid> | walk [oid] | stats | quit
    Serve {
        #[command(flatten)]
        src: SourceArgs,
        /// Poll interval in milliseconds
        #[arg(long)]
        poll_ms: Option<u64>,
        /// Busy polls a pending change may wait before a forced reload
        #[arg(long)]
        force_after: Option<u32>,
    },
    /// Parse a data file and report rejected lines
    Check {
        #[command(flatten)]
        src: SourceArgs,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the table a data file loads into (sorted, duplicates dropped)
    Dump {
        #[command(flatten)]
        src: SourceArgs,
        /// JSON output (array of records)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Exact lookup of a full OID
    Get {
        #[command(flatten)]
        src: SourceArgs,
        /// Full OID, e.g. 1.3.6.1.4.1.8072.2.1.2.0.1.2.3
        oid: String,
    },
    /// GetNext walk from an OID (default: base OID) to the end of the table
    Walk {
        #[command(flatten)]
        src: SourceArgs,
        /// Start after this OID
        oid: Option<String>,
        /// JSON output (array)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
