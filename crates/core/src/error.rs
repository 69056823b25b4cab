//! Error types for the export pipeline
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every failure is reported under one of four kinds: Config, Query, Io,
//! Archive. A staging-directory collision gets its own variant for precise
//! matching but is reported under the Io kind.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Error types for the export pipeline
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unusable backup root or invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// SQL failure, schema/column mismatch, or query timeout
    #[error("query failed for table '{table}': {message}")]
    Query {
        /// Logical table the query belongs to
        table: String,
        /// Description of the underlying failure
        message: String,
    },

    /// I/O error (file write failure, directory operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A staging directory for the computed timestamp already exists
    #[error("staging directory already exists: {0}")]
    StagingCollision(PathBuf),

    /// Compression failure or broken archive publish step
    #[error("archive error: {0}")]
    Archive(String),
}

impl ExportError {
    /// The reported kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Config(_) => ErrorKind::Config,
            ExportError::Query { .. } => ErrorKind::Query,
            ExportError::Io(_) | ExportError::StagingCollision(_) => ErrorKind::Io,
            ExportError::Archive(_) => ErrorKind::Archive,
        }
    }
}

/// The four-way error taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ConfigError: root dir unusable, invalid configuration
    Config,
    /// QueryError: SQL failure, schema mismatch, query timeout
    Query,
    /// IOError: file write failure, staging-dir collision
    Io,
    /// ArchiveError: compression failure
    Archive,
}

impl ErrorKind {
    /// Stable name used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::Query => "QueryError",
            ErrorKind::Io => "IOError",
            ErrorKind::Archive => "ArchiveError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = ExportError::Config("backup root is a file".to_string());
        let msg = err.to_string();
        assert!(msg.contains("config error"));
        assert!(msg.contains("backup root is a file"));
    }

    #[test]
    fn test_error_display_query() {
        let err = ExportError::Query {
            table: "orders".to_string(),
            message: "no such column: queue_id".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("no such column"));
    }

    #[test]
    fn test_error_display_collision() {
        let err = ExportError::StagingCollision(PathBuf::from("/backups/20240102-0304"));
        assert!(err.to_string().contains("20240102-0304"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ExportError::Config(String::new()).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            ExportError::Query {
                table: String::new(),
                message: String::new()
            }
            .kind(),
            ErrorKind::Query
        );
        assert_eq!(
            ExportError::StagingCollision(PathBuf::new()).kind(),
            ErrorKind::Io
        );
        assert_eq!(ExportError::Archive(String::new()).kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Config.as_str(), "ConfigError");
        assert_eq!(ErrorKind::Query.as_str(), "QueryError");
        assert_eq!(ErrorKind::Io.as_str(), "IOError");
        assert_eq!(ErrorKind::Archive.as_str(), "ArchiveError");
    }
}
