//! Portex - portable point-in-time exports of a service database
//!
//! Portex reads a fixed registry of tables under a consistent view,
//! serializes each table to a self-describing CSV file in a timestamped
//! staging directory, and publishes the staging directory as a single
//! compressed archive with atomic rename semantics.
//!
//! # Quick Start
//!
//! ```ignore
//! use portex::{ExportConfig, ExportEngine, SqliteSession};
//!
//! let session = SqliteSession::open("service.db".as_ref())?;
//! let config = ExportConfig::default().with_backup_root("backups");
//! let mut engine = ExportEngine::new(config, session);
//!
//! let report = engine.run()?;
//! println!("archived {} rows to {}", report.total_rows(), report.archive_path.display());
//! ```
//!
//! # Architecture
//!
//! The pipeline lives in `portex-engine`; foundational types (scalar codec,
//! export registry, error taxonomy, snapshot stamps) live in `portex-core`.
//! Internal details of the staging and archive steps are not exposed - the
//! engine API is the public surface.

// Re-export the public API from the member crates
pub use portex_core::{
    registry, ErrorKind, ExportError, Result, Scalar, SnapshotStamp, TableExport,
};
pub use portex_engine::{
    ArchiveInfo, Compression, Consistency, DbSession, ExportConfig, ExportEngine, ExportReport,
    ExportState, SessionError, SqliteSession, TableResult,
};
