//! SQLite-backed database session
//!
//! Maps SQLite storage classes onto the scalar model and enforces the
//! per-query deadline through the connection's interrupt handle: a watchdog
//! thread is armed per statement and interrupts the connection if the
//! deadline passes. An interrupted statement surfaces as a timeout, not a
//! crash.
//!
//! The snapshot bracket is a deferred transaction; SQLite pins one database
//! snapshot for its whole duration, which gives the cross-table consistency
//! mode its guarantee.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use portex_core::Scalar;

use super::{DbSession, RowSink, SessionError, StreamError};

/// SQLite implementation of [`DbSession`]
pub struct SqliteSession {
    conn: Connection,
    query_timeout: Option<Duration>,
    in_snapshot: bool,
}

impl SqliteSession {
    /// Open a session against a database file
    pub fn open(path: &Path) -> Result<Self, SessionError> {
        let conn = Connection::open(path).map_err(|e| SessionError::Execute(e.to_string()))?;
        debug!(target: "portex::session", path = %path.display(), "opened sqlite session");
        Ok(SqliteSession {
            conn,
            query_timeout: None,
            in_snapshot: false,
        })
    }

    /// Open an in-memory session (used by tests and fixtures)
    pub fn open_in_memory() -> Result<Self, SessionError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SessionError::Execute(e.to_string()))?;
        Ok(SqliteSession {
            conn,
            query_timeout: None,
            in_snapshot: false,
        })
    }

    /// Set the per-query deadline
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Direct access to the connection, for fixture setup in tests
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DbSession for SqliteSession {
    fn begin_snapshot(&mut self) -> Result<(), SessionError> {
        self.conn
            .execute_batch("BEGIN DEFERRED")
            .map_err(|e| SessionError::Execute(e.to_string()))?;
        self.in_snapshot = true;
        Ok(())
    }

    fn end_snapshot(&mut self) -> Result<(), SessionError> {
        if !self.in_snapshot {
            return Ok(());
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| SessionError::Execute(e.to_string()))?;
        self.in_snapshot = false;
        Ok(())
    }

    fn stream_query(
        &mut self,
        sql: &str,
        expected_columns: usize,
        sink: &mut RowSink<'_>,
    ) -> Result<u64, StreamError> {
        let deadline = self
            .query_timeout
            .map(|timeout| QueryDeadline::arm(&self.conn, timeout));

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| stream_err(e, deadline.as_ref()))?;

        let actual = stmt.column_count();
        if actual != expected_columns {
            return Err(SessionError::ColumnMismatch {
                expected: expected_columns,
                actual,
            }
            .into());
        }

        let mut rows = stmt
            .query([])
            .map_err(|e| stream_err(e, deadline.as_ref()))?;

        let mut count = 0u64;
        let mut buf: Vec<Scalar> = Vec::with_capacity(expected_columns);
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(stream_err(e, deadline.as_ref()).into()),
            };
            buf.clear();
            for i in 0..expected_columns {
                let value = row
                    .get_ref(i)
                    .map_err(|e| stream_err(e, deadline.as_ref()))?;
                buf.push(scalar_from(value));
            }
            sink(&buf)?;
            count += 1;
        }

        Ok(count)
    }
}

/// Convert a SQLite storage value into the scalar model
///
/// TEXT and BLOB are both normalized to UTF-8 text (lossy for blobs; the
/// exported schema declares none, this guards against drift).
fn scalar_from(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Int(i),
        ValueRef::Real(f) => Scalar::Float(f),
        ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Scalar::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

fn stream_err(e: rusqlite::Error, deadline: Option<&QueryDeadline>) -> SessionError {
    if let Some(deadline) = deadline {
        let interrupted = matches!(
            &e,
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::OperationInterrupted
        );
        if interrupted && deadline.expired() {
            return SessionError::Timeout(deadline.timeout);
        }
    }
    SessionError::Execute(e.to_string())
}

/// Per-statement deadline enforced via `sqlite3_interrupt`
///
/// Dropping the guard disarms the watchdog and joins the thread, so an
/// expired deadline can never interrupt a later statement.
struct QueryDeadline {
    cancel: mpsc::Sender<()>,
    expired: Arc<AtomicBool>,
    watchdog: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl QueryDeadline {
    fn arm(conn: &Connection, timeout: Duration) -> Self {
        let handle = conn.get_interrupt_handle();
        let (cancel, armed) = mpsc::channel();
        let expired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&expired);
        let watchdog = std::thread::spawn(move || {
            if armed.recv_timeout(timeout).is_err() {
                flag.store(true, Ordering::SeqCst);
                handle.interrupt();
            }
        });
        QueryDeadline {
            cancel,
            expired,
            watchdog: Some(watchdog),
            timeout,
        }
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

impl Drop for QueryDeadline {
    fn drop(&mut self) {
        let _ = self.cancel.send(());
        if let Some(watchdog) = self.watchdog.take() {
            let _ = watchdog.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_session() -> SqliteSession {
        let session = SqliteSession::open_in_memory().unwrap();
        session
            .connection()
            .execute_batch(
                "CREATE TABLE queues (id INTEGER PRIMARY KEY, title TEXT, description TEXT);
                 INSERT INTO queues VALUES (1, 'Walk-in', 'Front desk queue');
                 INSERT INTO queues VALUES (2, 'Mail-in', NULL);",
            )
            .unwrap();
        session
    }

    fn collect_rows(
        session: &mut SqliteSession,
        sql: &str,
        columns: usize,
    ) -> Result<(u64, Vec<Vec<Scalar>>), StreamError> {
        let mut rows = Vec::new();
        let count = session.stream_query(sql, columns, &mut |row| {
            rows.push(row.to_vec());
            Ok(())
        })?;
        Ok((count, rows))
    }

    #[test]
    fn test_streams_rows_in_order() {
        let mut session = fixture_session();
        let (count, rows) = collect_rows(
            &mut session,
            "SELECT id, title, description FROM queues ORDER BY id",
            3,
        )
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            rows[0],
            vec![
                Scalar::Int(1),
                Scalar::Text("Walk-in".into()),
                Scalar::Text("Front desk queue".into()),
            ]
        );
        assert_eq!(rows[1][2], Scalar::Null);
    }

    #[test]
    fn test_column_mismatch_before_rows() {
        let mut session = fixture_session();
        let err = collect_rows(&mut session, "SELECT id, title FROM queues", 3).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Session(SessionError::ColumnMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_missing_table_is_execute_error() {
        let mut session = fixture_session();
        let err = collect_rows(&mut session, "SELECT id FROM absent", 1).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Session(SessionError::Execute(_))
        ));
    }

    #[test]
    fn test_sink_error_passes_through() {
        let mut session = fixture_session();
        let result = session.stream_query("SELECT id FROM queues", 1, &mut |_| {
            Err(portex_core::ExportError::Archive("sink refused".into()))
        });
        assert!(matches!(
            result,
            Err(StreamError::Export(portex_core::ExportError::Archive(_)))
        ));
    }

    #[test]
    fn test_snapshot_bracket() {
        let mut session = fixture_session();
        session.begin_snapshot().unwrap();
        let (count, _) = collect_rows(&mut session, "SELECT id FROM queues", 1).unwrap();
        assert_eq!(count, 2);
        session.end_snapshot().unwrap();
        // idempotent once closed
        session.end_snapshot().unwrap();
    }

    #[test]
    fn test_deadline_disarms_after_query() {
        let mut session = fixture_session().with_query_timeout(Some(Duration::from_millis(50)));
        let (count, _) = collect_rows(&mut session, "SELECT id FROM queues", 1).unwrap();
        assert_eq!(count, 2);
        std::thread::sleep(Duration::from_millis(80));
        // an expired watchdog from the previous query must not poison this one
        let (count, _) = collect_rows(&mut session, "SELECT id FROM queues", 1).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_runaway_query_times_out() {
        let mut session =
            fixture_session().with_query_timeout(Some(Duration::from_millis(100)));
        let err = collect_rows(
            &mut session,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
             SELECT count(*) FROM c",
            1,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Session(SessionError::Timeout(_))
        ));
    }

    #[test]
    fn test_blob_normalized_to_text() {
        let session = SqliteSession::open_in_memory().unwrap();
        session
            .connection()
            .execute_batch("CREATE TABLE t (b BLOB); INSERT INTO t VALUES (x'68656a')")
            .unwrap();
        let mut session = session;
        let (_, rows) = collect_rows(&mut session, "SELECT b FROM t", 1).unwrap();
        assert_eq!(rows[0][0], Scalar::Text("hej".into()));
    }
}
