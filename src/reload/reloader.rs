use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::consts::{DUMP_START_MARKER, DUMP_STOP_MARKER};
use crate::lock::try_lock_source;
use crate::metrics::Metrics;
use crate::snapshot::{load_snapshot, LoadReport};
use crate::store::Store;

/// Result of an attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot is active.
    Installed(LoadReport),
    /// Source lock held elsewhere; nothing changed, retry next poll.
    Locked,
}

/// Keeps the store in sync with one source file.
pub struct Reloader {
    path: PathBuf,
    store: Arc<Store>,
    metrics: Arc<Metrics>,
    /// mtime captured by the last installed load.
    last_mtime: Option<SystemTime>,
    dump: bool,
}

impl Reloader {
    pub fn new<P: Into<PathBuf>>(path: P, store: Arc<Store>, metrics: Arc<Metrics>) -> Self {
        Self {
            path: path.into(),
            store,
            metrics,
            last_mtime: None,
            dump: false,
        }
    }

    /// Log the whole active table after each install.
    pub fn with_dump(mut self, on: bool) -> Self {
        self.dump = on;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_mtime(&self) -> Option<SystemTime> {
        self.last_mtime
    }

    /// True when the source mtime is past the one of the last install
    /// (or nothing was installed yet). Err if the file cannot be stat'ed.
    pub fn source_changed(&self) -> Result<bool> {
        let mtime = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .with_context(|| format!("stat {}", self.path.display()))?;
        Ok(match self.last_mtime {
            None => true,
            Some(last) => mtime > last,
        })
    }

    /// One reload attempt.
    ///
    /// The source is read through the locked handle; the store is only
    /// touched once the whole file has been read. Any error leaves the
    /// current snapshot and the recorded mtime as they were.
    pub fn reload(&mut self) -> Result<ReloadOutcome> {
        let res = self.reload_inner();
        if res.is_err() {
            self.metrics.record_reload_failed();
        }
        res
    }

    fn reload_inner(&mut self) -> Result<ReloadOutcome> {
        let lock = match try_lock_source(&self.path)? {
            Some(l) => l,
            None => {
                debug!("reload: {} is locked, skip this attempt", self.path.display());
                self.metrics.record_reload_locked();
                return Ok(ReloadOutcome::Locked);
            }
        };

        // Taken before reading: a write racing with the read bumps mtime
        // past this value and gets picked up on a later poll.
        let mtime = lock
            .file()
            .metadata()
            .and_then(|m| m.modified())
            .with_context(|| format!("stat {}", self.path.display()))?;

        let origin = self.path.display().to_string();
        let (snapshot, report) = load_snapshot(BufReader::new(lock.file()), &origin)?;

        let records = snapshot.len();
        self.store.install(snapshot);
        drop(lock);

        self.last_mtime = Some(mtime);
        self.metrics.record_reload_installed(report.rejected.len());
        info!(
            "loaded {} record(s) from {} ({} line(s) rejected)",
            records,
            origin,
            report.rejected.len()
        );

        if self.dump {
            self.log_dump();
        }
        Ok(ReloadOutcome::Installed(report))
    }

    fn log_dump(&self) {
        let snap = self.store.snapshot();
        info!("{}", DUMP_START_MARKER);
        for r in snap.iter() {
            info!("{}", r);
        }
        info!("{}", DUMP_STOP_MARKER);
    }
}

impl std::fmt::Debug for Reloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloader")
            .field("path", &self.path)
            .field("last_mtime", &self.last_mtime)
            .field("dump", &self.dump)
            .finish()
    }
}
