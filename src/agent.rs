//! Query adapter: the entry points a protocol engine calls.
//!
//! Two layers:
//! - `lookup_exact` / `lookup_next` work on keys relative to the base OID;
//! - `handle` takes full request OIDs, strips the configured base prefix
//!   and re-adds it to successor answers.
//!
//! Absence is an ordinary result (NoSuchInstance / EndOfView), never an error.
//!
//! `Agent` also owns startup: config validation, the initial load (which
//! must succeed) and, for a serving agent, the background poller.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::key::{compare, format_oid, Key};
use crate::metrics::Metrics;
use crate::record::Value;
use crate::reload::{PollLoop, Poller, ReloadOutcome, ReloadPolicy, Reloader};
use crate::store::Store;

/// Request mode as handed over by the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Get,
    GetNext,
    GetBulk,
    Set,
}

impl FromStr for Mode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Mode::Get),
            "getnext" | "next" => Ok(Mode::GetNext),
            "getbulk" | "bulk" => Ok(Mode::GetBulk),
            "set" => Ok(Mode::Set),
            other => Err(anyhow!("invalid mode '{}': use get|getnext|getbulk|set", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Get => "GET",
            Mode::GetNext => "GETNEXT",
            Mode::GetBulk => "GETBULK",
            Mode::Set => "SET",
        };
        f.write_str(s)
    }
}

/// Exact lookup by key relative to the base OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Value),
    NotFound,
}

/// Successor lookup by key relative to the base OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLookup {
    Found { key: Key, value: Value },
    EndOfView,
}

/// Answer to a full-OID request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Full OID of the answered instance plus its value.
    Value { oid: Vec<u32>, value: Value },
    NoSuchInstance,
    EndOfView,
    Unsupported(Mode),
}

pub struct Agent {
    config: AgentConfig,
    store: Arc<Store>,
    metrics: Arc<Metrics>,
    /// Present until handed to the poller.
    reloader: Option<Reloader>,
    poller: Option<Poller>,
}

impl Agent {
    /// Validate config and perform the initial load. No background polling.
    pub fn open(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        if !config.data_file.exists() {
            return Err(anyhow!("not found: {}", config.data_file.display()));
        }

        let store = Arc::new(Store::default());
        let metrics = Arc::new(Metrics::new());
        let mut reloader = Reloader::new(&config.data_file, store.clone(), metrics.clone())
            .with_dump(config.debug);

        initial_load(&mut reloader, &config)?;

        Ok(Self {
            config,
            store,
            metrics,
            reloader: Some(reloader),
            poller: None,
        })
    }

    /// `open` plus the background poller that follows source changes.
    pub fn start(config: AgentConfig) -> Result<Self> {
        let mut agent = Self::open(config)?;
        let reloader = agent
            .reloader
            .take()
            .ok_or_else(|| anyhow!("reloader already taken"))?;
        let policy = ReloadPolicy::new(agent.config.force_reload_after_polls);
        let poll = PollLoop::new(reloader, policy, agent.metrics.clone());
        agent.poller = Some(Poller::spawn(poll, agent.config.poll_interval())?);
        info!(
            "agent serving {} under {}",
            agent.config.data_file.display(),
            format_oid(&agent.config.base_oid)
        );
        Ok(agent)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn base_oid(&self) -> &[u32] {
        &self.config.base_oid
    }

    /// Run one reload attempt now. Only for agents without a poller.
    pub fn reload_now(&mut self) -> Result<ReloadOutcome> {
        match self.reloader.as_mut() {
            Some(r) => r.reload(),
            None => Err(anyhow!("reload is driven by the poller")),
        }
    }

    pub fn lookup_exact(&self, key: &[u32]) -> Lookup {
        self.metrics.record_get();
        match self.store.get(key) {
            Some(r) => Lookup::Found(r.value),
            None => Lookup::NotFound,
        }
    }

    pub fn lookup_next(&self, key: &[u32]) -> NextLookup {
        self.metrics.record_getnext();
        match self.store.get_next(key) {
            Some(r) => NextLookup::Found {
                key: r.key,
                value: r.value,
            },
            None => NextLookup::EndOfView,
        }
    }

    /// Serve one request for a full OID.
    pub fn handle(&self, mode: Mode, oid: &[u32]) -> Response {
        match mode {
            Mode::Get => match self.strip_base(oid) {
                Some(suffix) => match self.lookup_exact(suffix) {
                    Lookup::Found(value) => Response::Value {
                        oid: oid.to_vec(),
                        value,
                    },
                    Lookup::NotFound => {
                        debug!("(get) {} not found", format_oid(oid));
                        Response::NoSuchInstance
                    }
                },
                None => {
                    self.metrics.record_get();
                    Response::NoSuchInstance
                }
            },
            Mode::GetNext => {
                let cursor: &[u32] = match self.strip_base(oid) {
                    Some(suffix) => suffix,
                    // before the subtree (or a prefix of it): start at its first record
                    None if compare(oid, self.base_oid()).is_lt() => &[],
                    None => {
                        self.metrics.record_getnext();
                        return Response::EndOfView;
                    }
                };
                match self.lookup_next(cursor) {
                    NextLookup::Found { key, value } => {
                        let mut full = self.config.base_oid.clone();
                        full.extend_from_slice(key.as_slice());
                        debug!("(getnext) {} -> {}", format_oid(oid), format_oid(&full));
                        Response::Value { oid: full, value }
                    }
                    NextLookup::EndOfView => {
                        debug!("(getnext) next OID for {} not found", format_oid(oid));
                        Response::EndOfView
                    }
                }
            }
            Mode::GetBulk | Mode::Set => {
                self.metrics.record_unsupported();
                debug!("unsupported request mode {} for {}", mode, format_oid(oid));
                Response::Unsupported(mode)
            }
        }
    }

    /// Successive GetNext answers starting after `from`, until EndOfView.
    pub fn walk(&self, from: &[u32]) -> Walk<'_> {
        Walk {
            agent: self,
            cursor: from.to_vec(),
            done: false,
        }
    }

    /// Stop the poller (if any) and release the agent.
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(p) = self.poller.take() {
            p.shutdown()?;
        }
        Ok(())
    }

    fn strip_base<'a>(&self, oid: &'a [u32]) -> Option<&'a [u32]> {
        oid.strip_prefix(self.base_oid())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("polling", &self.poller.is_some())
            .finish()
    }
}

/// Iterator over a GetNext walk; see `Agent::walk`.
pub struct Walk<'a> {
    agent: &'a Agent,
    cursor: Vec<u32>,
    done: bool,
}

impl Iterator for Walk<'_> {
    type Item = (Vec<u32>, Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.agent.handle(Mode::GetNext, &self.cursor) {
            Response::Value { oid, value } => {
                self.cursor = oid.clone();
                Some((oid, value))
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

/// First load at startup. A busy source is retried for up to
/// `force_reload_after_polls` poll intervals; anything else fails startup.
fn initial_load(reloader: &mut Reloader, config: &AgentConfig) -> Result<()> {
    let attempts = config.force_reload_after_polls.max(1);
    for attempt in 1..=attempts {
        match reloader
            .reload()
            .with_context(|| format!("initial load of {}", config.data_file.display()))?
        {
            ReloadOutcome::Installed(_) => return Ok(()),
            ReloadOutcome::Locked => {
                warn!(
                    "initial load: {} is locked (attempt {}/{})",
                    config.data_file.display(),
                    attempt,
                    attempts
                );
                if attempt < attempts {
                    std::thread::sleep(config.poll_interval());
                }
            }
        }
    }
    Err(anyhow!(
        "initial load of {}: source stayed locked",
        config.data_file.display()
    ))
}
