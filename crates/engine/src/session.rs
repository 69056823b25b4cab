//! Database session abstraction
//!
//! The engine never talks to a driver directly; it goes through the
//! [`DbSession`] trait so tests can substitute in-memory doubles and other
//! backends can be added without touching the pipeline.
//!
//! Rows are delivered by internal iteration: the session drives a sink
//! closure once per row, in result order, keeping exactly one row in flight.
//! The sequence is lazy, finite, and non-restartable.

use std::time::Duration;

use portex_core::{ExportError, Scalar};
use thiserror::Error;

mod sqlite;

pub use sqlite::SqliteSession;

/// Row sink driven once per row by [`DbSession::stream_query`]
///
/// The sink returns an [`ExportError`] to abort the stream; sink errors pass
/// through the session untouched so I/O failures keep their kind.
pub type RowSink<'a> = dyn FnMut(&[Scalar]) -> portex_core::Result<()> + 'a;

/// A live database session owned by one export run
///
/// Implementations must verify the produced column count against
/// `expected_columns` before delivering any row.
pub trait DbSession {
    /// Open a snapshot-isolated read transaction spanning subsequent queries
    fn begin_snapshot(&mut self) -> Result<(), SessionError>;

    /// Close the snapshot opened by [`DbSession::begin_snapshot`]
    fn end_snapshot(&mut self) -> Result<(), SessionError>;

    /// Execute `sql`, driving `sink` once per row; returns the row count
    fn stream_query(
        &mut self,
        sql: &str,
        expected_columns: usize,
        sink: &mut RowSink<'_>,
    ) -> Result<u64, StreamError>;
}

/// Session-level failures
#[derive(Debug, Error)]
pub enum SessionError {
    /// The statement failed to prepare or execute
    #[error("query execution failed: {0}")]
    Execute(String),

    /// The query produced a different column count than the registry header
    #[error("query produced {actual} columns, expected {expected}")]
    ColumnMismatch {
        /// Columns the registry entry declares
        expected: usize,
        /// Columns the statement actually produced
        actual: usize,
    },

    /// The query exceeded its deadline and was cancelled
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of one streamed query: either the session itself or the sink
#[derive(Debug, Error)]
pub enum StreamError {
    /// The session failed (reported as a query error, tagged with the table)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The sink failed (passes through with its original kind)
    #[error(transparent)]
    Export(#[from] ExportError),
}
