//! Staging directory lifecycle
//!
//! The backup root holds one staging directory per in-flight snapshot plus
//! the published archives:
//!
//! ```text
//! backups/
//! ├── 20240102-0304/           staging (transient)
//! │   ├── notes.csv
//! │   └── ...
//! └── 20240101-1200.tar.gz     published archive
//! ```
//!
//! The root is created idempotently and never removed. A staging directory
//! is removed only after its archive is confirmed on disk; failed runs keep
//! theirs for inspection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use portex_core::{ExportError, SnapshotStamp};
use tracing::debug;

/// Owner of the staging directory lifecycle under one backup root
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Create a staging area over a backup root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StagingArea { root: root.into() }
    }

    /// The backup root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Idempotently ensure the backup root exists
    ///
    /// A non-directory at the root path is a config error, not an I/O one:
    /// the installation is unusable until an operator moves it aside.
    pub fn ensure_root(&self) -> portex_core::Result<()> {
        if self.root.exists() {
            if !self.root.is_dir() {
                return Err(ExportError::Config(format!(
                    "backup root {} exists and is not a directory",
                    self.root.display()
                )));
            }
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;
        debug!(target: "portex::staging", root = %self.root.display(), "created backup root");
        Ok(())
    }

    /// Allocate the staging directory for a snapshot
    ///
    /// A directory already present for this stamp (same-minute rerun) fails
    /// deterministically; nothing is merged or overwritten.
    pub fn create(&self, stamp: &SnapshotStamp) -> portex_core::Result<PathBuf> {
        let dir = self.root.join(stamp.dir_name());
        match fs::create_dir(&dir) {
            Ok(()) => Ok(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ExportError::StagingCollision(dir))
            }
            Err(e) => Err(ExportError::Io(e)),
        }
    }

    /// Remove a staging directory after its archive is confirmed
    pub fn remove(&self, staging: &Path) -> portex_core::Result<()> {
        fs::remove_dir_all(staging)?;
        debug!(target: "portex::staging", staging = %staging.display(), "removed staging directory");
        Ok(())
    }
}
