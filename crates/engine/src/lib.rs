//! The Portex export pipeline
//!
//! Components, leaf-first:
//! - [`session`]: database session abstraction plus the SQLite backend
//! - [`reader`]: streams one registry entry's rows out of the session
//! - [`writer`]: streams rows into a portable CSV file
//! - [`staging`]: staging directory lifecycle under the backup root
//! - [`archive`]: compression backends and the atomic archive publish
//! - [`engine`]: the snapshot lifecycle state machine tying it together
//! - [`config`]: export configuration

#![warn(clippy::all)]

pub mod archive;
pub mod config;
pub mod engine;
pub mod reader;
pub mod session;
pub mod staging;
pub mod writer;

pub use archive::{ArchiveBuilder, ArchiveInfo, CompressionBackend, GzipBackend, TarCommandBackend};
pub use config::{Compression, ConfigError, Consistency, ExportConfig};
pub use engine::{ExportEngine, ExportReport, ExportState, TableResult};
pub use reader::SnapshotReader;
pub use session::{DbSession, RowSink, SessionError, SqliteSession, StreamError};
pub use staging::StagingArea;
pub use writer::RecordWriter;
