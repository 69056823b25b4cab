//! Export configuration
//!
//! Configuration for one export run: backup root, cross-table consistency
//! mode, compression backend selection, and timeouts.

use std::path::PathBuf;
use std::time::Duration;

use crate::archive::{CompressionBackend, GzipBackend, TarCommandBackend};

/// Cross-table consistency mode
///
/// The registry issues one query per table. Whether those queries observe a
/// mutually consistent database is an explicit choice, not an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// Wrap the whole run in one snapshot-isolated read transaction.
    /// Every table sees the same point in time.
    SingleSnapshot,
    /// One independent query per table. Each table sees a stable snapshot
    /// of itself, but a row written between two queries can make tables
    /// disagree.
    PerTable,
}

/// Compression backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Embedded gzip tar writer (default)
    Gzip,
    /// External `tar` process
    TarCommand,
}

/// Export configuration
///
/// Controls where snapshots land and how the run behaves.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Backup root directory; staging directories and archives live here
    pub backup_root: PathBuf,
    /// Cross-table consistency mode
    pub consistency: Consistency,
    /// Compression backend for the archive step
    pub compression: Compression,
    /// Per-query deadline; `None` disables cancellation
    pub query_timeout: Option<Duration>,
    /// Deadline for the external archive process; `None` waits indefinitely
    pub archive_timeout: Option<Duration>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            backup_root: PathBuf::from("backups"),
            consistency: Consistency::SingleSnapshot,
            compression: Compression::Gzip,
            query_timeout: Some(Duration::from_secs(30)),
            archive_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl ExportConfig {
    /// Create config for testing
    ///
    /// Short timeouts so failure tests do not stall the suite.
    pub fn for_testing(backup_root: impl Into<PathBuf>) -> Self {
        ExportConfig {
            backup_root: backup_root.into(),
            consistency: Consistency::SingleSnapshot,
            compression: Compression::Gzip,
            query_timeout: Some(Duration::from_secs(2)),
            archive_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Set the backup root
    pub fn with_backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.backup_root = root.into();
        self
    }

    /// Set the consistency mode
    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// Set the compression backend
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the per-query deadline
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the archive-step deadline
    pub fn with_archive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.archive_timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBackupRoot);
        }
        Ok(())
    }

    /// Instantiate the configured compression backend
    pub fn backend(&self) -> Box<dyn CompressionBackend> {
        match self.compression {
            Compression::Gzip => Box::new(GzipBackend::default()),
            Compression::TarCommand => Box::new(TarCommandBackend::new(self.archive_timeout)),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The backup root path is empty
    #[error("backup root path is empty")]
    EmptyBackupRoot,
}
