//! Cross-process publish lock
//!
//! An exclusive advisory lock on `<data_dir>/.trailhead.lock`. Every
//! orchestrator over the same layout takes it before a run or a rollback,
//! so a CLI invocation cannot promote while a running service is mid-run.
//! The lock is released when the guard drops, or when the holding process
//! exits.

use crate::errors::{io_error, Result};
use crate::layout::DataLayout;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use trailhead_core::errors::{ExError, TrailError};

/// Held exclusive lock on a layout's lock file
#[derive(Debug)]
pub struct PublishLock {
    file: File,
    path: PathBuf,
}

impl PublishLock {
    /// Take the lock without waiting
    ///
    /// # Errors
    /// `Concurrency` when another holder has it, `Io` when the lock file
    /// cannot be opened.
    pub fn try_acquire(layout: &DataLayout) -> Result<Self> {
        fs::create_dir_all(layout.data_dir()).map_err(|e| io_error("create_data_dir", e))?;
        let path = layout.lock_file();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| io_error("open_lock_file", e))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self { file, path }),
            Err(e) if is_contended(&e) => {
                tracing::debug!(path = %path.display(), "publish lock held elsewhere");
                Err(ExError::from(TrailError::RefreshInProgress))
            }
            Err(e) => Err(io_error("lock_file", e)),
        }
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release publish lock");
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trailhead_core::errors::ExErrorKind;

    fn layout_in(dir: &TempDir) -> DataLayout {
        DataLayout::new(dir.path().join("data").join("trails.json"))
    }

    #[test]
    fn test_second_holder_is_refused() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);

        let held = PublishLock::try_acquire(&layout).unwrap();
        let err = PublishLock::try_acquire(&layout).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Concurrency);
        assert!(layout.lock_file().is_file());

        drop(held);
        PublishLock::try_acquire(&layout).unwrap();
    }

    #[test]
    fn test_distinct_layouts_do_not_contend() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let _a = PublishLock::try_acquire(&layout_in(&first)).unwrap();
        let _b = PublishLock::try_acquire(&layout_in(&second)).unwrap();
    }
}
