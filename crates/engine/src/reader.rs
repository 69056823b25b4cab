//! Snapshot reader
//!
//! Runs one registry entry's query against the session and feeds the rows
//! to a sink. Session failures come back tagged with the entry's table
//! name; sink failures (I/O) pass through with their original kind.

use portex_core::{ExportError, TableExport};
use tracing::debug;

use crate::session::{DbSession, RowSink, SessionError, StreamError};

/// Streams registry entries out of a database session
///
/// Owns the session for the duration of the run; the session is an
/// exclusive resource and is not shared between runs.
pub struct SnapshotReader<S> {
    session: S,
}

impl<S: DbSession> SnapshotReader<S> {
    /// Create a reader over a live session
    pub fn new(session: S) -> Self {
        SnapshotReader { session }
    }

    /// Open the snapshot bracket for the single-snapshot consistency mode
    pub fn begin_snapshot(&mut self) -> portex_core::Result<()> {
        self.session
            .begin_snapshot()
            .map_err(|e| query_error("snapshot", e))
    }

    /// Close the snapshot bracket
    pub fn end_snapshot(&mut self) -> portex_core::Result<()> {
        self.session
            .end_snapshot()
            .map_err(|e| query_error("snapshot", e))
    }

    /// Stream one entry's rows into `sink`; returns the row count
    pub fn stream(
        &mut self,
        entry: &TableExport,
        sink: &mut RowSink<'_>,
    ) -> portex_core::Result<u64> {
        debug!(target: "portex::reader", table = entry.table, "running export query");
        match self.session.stream_query(entry.query, entry.columns(), sink) {
            Ok(rows) => Ok(rows),
            Err(StreamError::Session(e)) => Err(query_error(entry.table, e)),
            Err(StreamError::Export(e)) => Err(e),
        }
    }
}

fn query_error(table: &str, e: SessionError) -> ExportError {
    ExportError::Query {
        table: table.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SqliteSession;
    use portex_core::Scalar;

    fn entry() -> TableExport {
        TableExport {
            table: "queues",
            file_name: "queues.csv",
            header: &["ID", "NAME", "DESCRIPTION"],
            query: "SELECT id, title, description FROM queues",
        }
    }

    fn fixture_reader() -> SnapshotReader<SqliteSession> {
        let session = SqliteSession::open_in_memory().unwrap();
        session
            .connection()
            .execute_batch(
                "CREATE TABLE queues (id INTEGER PRIMARY KEY, title TEXT, description TEXT);
                 INSERT INTO queues VALUES (1, 'Walk-in', NULL);",
            )
            .unwrap();
        SnapshotReader::new(session)
    }

    #[test]
    fn test_stream_counts_rows() {
        let mut reader = fixture_reader();
        let mut rows: Vec<Vec<Scalar>> = Vec::new();
        let count = reader
            .stream(&entry(), &mut |row| {
                rows.push(row.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(rows[0][1], Scalar::Text("Walk-in".into()));
    }

    #[test]
    fn test_session_failure_is_tagged_with_table() {
        let mut reader = fixture_reader();
        let broken = TableExport {
            query: "SELECT id, title, description FROM missing",
            ..entry()
        };
        let err = reader.stream(&broken, &mut |_| Ok(())).unwrap_err();
        match err {
            ExportError::Query { table, .. } => assert_eq!(table, "queues"),
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn test_sink_error_keeps_kind() {
        let mut reader = fixture_reader();
        let err = reader
            .stream(&entry(), &mut |_| {
                Err(ExportError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "disk full",
                )))
            })
            .unwrap_err();
        assert_eq!(err.kind(), portex_core::ErrorKind::Io);
    }
}
