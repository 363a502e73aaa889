use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::policy::ReloadPolicy;
use super::reloader::{ReloadOutcome, Reloader};
use crate::metrics::Metrics;

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Source could not be stat'ed; retried next poll.
    SourceMissing,
    Unchanged,
    /// Change seen, held back by the policy.
    Deferred,
    Reloaded(ReloadOutcome),
    /// Attempt failed; current snapshot kept.
    Failed,
}

/// One poll step: change detection, policy, reload.
pub struct PollLoop {
    reloader: Reloader,
    policy: ReloadPolicy,
    metrics: Arc<Metrics>,
    seen_queries: u64,
}

impl PollLoop {
    pub fn new(reloader: Reloader, policy: ReloadPolicy, metrics: Arc<Metrics>) -> Self {
        let seen_queries = metrics.queries_total();
        Self {
            reloader,
            policy,
            metrics,
            seen_queries,
        }
    }

    pub fn reloader(&self) -> &Reloader {
        &self.reloader
    }

    pub fn tick(&mut self) -> Tick {
        self.metrics.record_poll();
        let total = self.metrics.queries_total();
        let queries = total.saturating_sub(self.seen_queries);
        self.seen_queries = total;

        let changed = match self.reloader.source_changed() {
            Ok(c) => c,
            Err(e) => {
                debug!("poll: {:#}", e);
                return Tick::SourceMissing;
            }
        };
        if !changed {
            return Tick::Unchanged;
        }
        if !self.policy.should_reload(changed, queries) {
            debug!(
                "poll: {} changed, reload deferred ({} queries since last poll, pending {})",
                self.reloader.path().display(),
                queries,
                self.policy.pending()
            );
            return Tick::Deferred;
        }

        match self.reloader.reload() {
            Ok(outcome) => Tick::Reloaded(outcome),
            Err(e) => {
                warn!(
                    "reload of {} failed, keeping current table: {:#}",
                    self.reloader.path().display(),
                    e
                );
                Tick::Failed
            }
        }
    }
}

/// Background thread ticking a PollLoop every `interval`.
pub struct Poller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn(mut poll: PollLoop, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let name = "snmpdatad-poll".to_string();
        let path = poll.reloader().path().display().to_string();

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || {
                info!("poller started for {} (every {:?})", path, interval);
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            poll.tick();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("poller stopped for {}", path);
            })
            .context("spawn poller thread")?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it. A tick in progress finishes first.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<()> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.handle.take() {
            h.join().map_err(|_| anyhow!("poller thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let _ = self.stop_and_join();
    }
}
