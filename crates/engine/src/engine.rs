//! Export engine
//!
//! Orchestrates one snapshot through its lifecycle:
//!
//! ```text
//! INIT -> STAGING_READY -> EXPORTING -> ARCHIVING -> COMPLETE
//!              |               |            |
//!              +---------------+------------+--> FAILED (terminal)
//! ```
//!
//! The engine asks the staging area for a directory, drives every registry
//! entry through the reader and a record writer, then hands the completed
//! staging directory to the archive builder and removes staging once the
//! archive is confirmed. Any failure short-circuits to FAILED with the
//! staging directory preserved.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use portex_core::{registry, validate_registry, ExportError, SnapshotStamp, TableExport};

use crate::archive::ArchiveBuilder;
use crate::config::{Consistency, ExportConfig};
use crate::reader::SnapshotReader;
use crate::session::DbSession;
use crate::staging::StagingArea;
use crate::writer::RecordWriter;

/// Snapshot lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    /// Nothing done yet
    Init,
    /// Backup root and staging directory exist
    StagingReady,
    /// Registry entries are being exported
    Exporting,
    /// All entries succeeded; archive step running
    Archiving,
    /// Archive confirmed, staging removed
    Complete,
    /// Terminal failure; staging preserved if it was created
    Failed,
}

impl ExportState {
    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportState::Init => "INIT",
            ExportState::StagingReady => "STAGING_READY",
            ExportState::Exporting => "EXPORTING",
            ExportState::Archiving => "ARCHIVING",
            ExportState::Complete => "COMPLETE",
            ExportState::Failed => "FAILED",
        }
    }
}

/// Outcome of one successfully exported table
#[derive(Debug, Clone, Serialize)]
pub struct TableResult {
    /// Logical table name
    pub table: String,
    /// File the table was written to inside the archive
    pub file_name: String,
    /// Data rows written (header excluded)
    pub rows: u64,
}

/// Final report of a completed snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Snapshot stamp (`YYYYMMDD-HHMM`)
    pub stamp: String,
    /// Published archive path
    pub archive_path: PathBuf,
    /// Archive size in bytes
    pub archive_size_bytes: u64,
    /// Per-table results in registry order
    pub tables: Vec<TableResult>,
}

impl ExportReport {
    /// Total data rows across all tables
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Drives one snapshot from INIT to COMPLETE or FAILED
///
/// The session and the staging directory are exclusively owned by this run;
/// concurrent runs against the same backup root are not supported.
pub struct ExportEngine<S> {
    config: ExportConfig,
    reader: SnapshotReader<S>,
    entries: &'static [TableExport],
    stamp: Option<SnapshotStamp>,
    state: ExportState,
}

impl<S: DbSession> ExportEngine<S> {
    /// Create an engine over a session, exporting the canonical registry
    pub fn new(config: ExportConfig, session: S) -> Self {
        ExportEngine {
            config,
            reader: SnapshotReader::new(session),
            entries: registry(),
            stamp: None,
            state: ExportState::Init,
        }
    }

    /// Export a different set of entries (fixtures, partial registries)
    pub fn with_entries(mut self, entries: &'static [TableExport]) -> Self {
        self.entries = entries;
        self
    }

    /// Pin the snapshot stamp instead of reading the clock
    pub fn with_stamp(mut self, stamp: SnapshotStamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Run the snapshot to completion
    ///
    /// Returns the report on COMPLETE; on FAILED the originating error is
    /// returned and the engine stays in its terminal state.
    pub fn run(&mut self) -> portex_core::Result<ExportReport> {
        if self.state != ExportState::Init {
            return Err(ExportError::Config(format!(
                "engine already ran to {}",
                self.state.as_str()
            )));
        }

        match self.run_inner() {
            Ok(report) => {
                self.transition(ExportState::Complete);
                info!(
                    target: "portex::engine",
                    stamp = %report.stamp,
                    archive = %report.archive_path.display(),
                    tables = report.tables.len(),
                    rows = report.total_rows(),
                    "snapshot complete"
                );
                Ok(report)
            }
            Err(err) => {
                self.state = ExportState::Failed;
                tracing::error!(
                    target: "portex::engine",
                    kind = err.kind().as_str(),
                    error = %err,
                    "snapshot failed"
                );
                Err(err)
            }
        }
    }

    fn run_inner(&mut self) -> portex_core::Result<ExportReport> {
        self.config
            .validate()
            .map_err(|e| ExportError::Config(e.to_string()))?;
        validate_registry(self.entries).map_err(|e| ExportError::Config(e.to_string()))?;

        let stamp = self.stamp.unwrap_or_else(SnapshotStamp::now);
        let area = StagingArea::new(&self.config.backup_root);
        area.ensure_root()?;
        let staging = area.create(&stamp)?;
        self.transition(ExportState::StagingReady);

        match self.export_and_archive(&area, &staging, &stamp) {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(
                    target: "portex::engine",
                    staging = %staging.display(),
                    "staging directory preserved for inspection"
                );
                Err(err)
            }
        }
    }

    fn export_and_archive(
        &mut self,
        area: &StagingArea,
        staging: &Path,
        stamp: &SnapshotStamp,
    ) -> portex_core::Result<ExportReport> {
        self.transition(ExportState::Exporting);

        if self.config.consistency == Consistency::SingleSnapshot {
            self.reader.begin_snapshot()?;
        }

        let mut tables = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let rows = self.export_entry(entry, staging)?;
            debug!(target: "portex::engine", table = entry.table, rows, "table exported");
            tables.push(TableResult {
                table: entry.table.to_string(),
                file_name: entry.file_name.to_string(),
                rows,
            });
        }

        if self.config.consistency == Consistency::SingleSnapshot {
            self.reader.end_snapshot()?;
        }

        self.transition(ExportState::Archiving);
        let builder = ArchiveBuilder::new(self.config.backend());
        let archive = builder.build(staging, &self.config.backup_root, stamp)?;

        area.remove(staging)?;

        Ok(ExportReport {
            stamp: stamp.dir_name(),
            archive_path: archive.path,
            archive_size_bytes: archive.size_bytes,
            tables,
        })
    }

    fn export_entry(&mut self, entry: &TableExport, staging: &Path) -> portex_core::Result<u64> {
        let path = staging.join(entry.file_name);
        let mut writer = RecordWriter::create(&path, entry.header)?;
        self.reader
            .stream(entry, &mut |row| writer.write_row(row))?;
        writer.finish()
    }

    fn transition(&mut self, next: ExportState) {
        debug!(
            target: "portex::engine",
            from = self.state.as_str(),
            to = next.as_str(),
            "state transition"
        );
        self.state = next;
    }
}
