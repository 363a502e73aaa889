//! Advisory locking of the data source.
//!
//! Cross-platform (fs2) exclusive lock taken on the source file itself:
//! - the reload loop only ever tries (never waits): a busy source means
//!   "skip this attempt, retry on the next poll";
//! - producers that rewrite the source can hold the same lock while writing.
//!
//! The lock is released on Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Open source file holding an exclusive advisory lock.
pub struct SourceLock {
    file: File,
    path: PathBuf,
}

impl SourceLock {
    fn new(file: File, path: &Path) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
        }
    }

    /// Locked handle; read the source through it.
    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SourceLock {
    fn drop(&mut self) {
        // fs2 unlock errors on drop are ignored deliberately.
        let _ = self.file.unlock();
    }
}

impl std::fmt::Debug for SourceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLock").field("path", &self.path).finish()
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("open source {}", path.display()))
}

/// Try to lock the source without blocking.
///
/// Ok(None) when another holder has it; Err when the file cannot be opened
/// or the lock call fails for any other reason.
pub fn try_lock_source(path: &Path) -> Result<Option<SourceLock>> {
    let file = open_source(path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(SourceLock::new(file, path))),
        Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("try_lock_exclusive {}", path.display())),
    }
}

/// Lock the source, blocking until acquired. For producers of the file.
pub fn lock_source(path: &Path) -> Result<SourceLock> {
    let file = open_source(path)?;
    file.lock_exclusive()
        .with_context(|| format!("lock_exclusive {}", path.display()))?;
    Ok(SourceLock::new(file, path))
}
