//! Reload pipeline split into submodules:
//! - reloader.rs: Reloader (one attempt: lock, read, build, install).
//! - policy.rs: ReloadPolicy (when a detected change is acted upon).
//! - poller.rs: PollLoop (one tick) and Poller (background thread driving it).
//!
//! A failed or skipped attempt never touches the active snapshot.

mod policy;
mod poller;
mod reloader;

pub use policy::ReloadPolicy;
pub use poller::{PollLoop, Poller, Tick};
pub use reloader::{ReloadOutcome, Reloader};
