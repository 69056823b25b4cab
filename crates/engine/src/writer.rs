//! Portable record writer
//!
//! Streams a header plus a row sequence into a CSV file: UTF-8, comma
//! separated, header row first, one record per row in column order. Every
//! scalar goes through the canonical codec, so nulls become empty fields
//! and timestamps render in one deterministic format.
//!
//! The destination is a scoped resource: rows are streamed through a
//! buffered writer with O(1) rows in flight, and the file handle is closed
//! on every exit path. `finish` flushes and fsyncs before reporting the row
//! count.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use portex_core::{ExportError, Scalar};

/// Streaming CSV writer for one exported table
pub struct RecordWriter {
    path: PathBuf,
    csv: csv::Writer<BufWriter<File>>,
    rows: u64,
}

impl std::fmt::Debug for RecordWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl RecordWriter {
    /// Create the destination file and write the header record
    pub fn create(path: &Path, header: &[&str]) -> portex_core::Result<Self> {
        let file = File::create(path)?;
        let mut csv = csv::Writer::from_writer(BufWriter::new(file));
        csv.write_record(header).map_err(csv_error)?;
        Ok(RecordWriter {
            path: path.to_path_buf(),
            csv,
            rows: 0,
        })
    }

    /// Write exactly one record for `row`, preserving column order
    pub fn write_row(&mut self, row: &[Scalar]) -> portex_core::Result<()> {
        for value in row {
            self.csv
                .write_field(value.to_field().as_ref())
                .map_err(csv_error)?;
        }
        // empty iterator terminates the record
        self.csv
            .write_record(None::<&[u8]>)
            .map_err(csv_error)?;
        self.rows += 1;
        Ok(())
    }

    /// Destination path of this writer
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, fsync and close the file; returns the data-row count
    pub fn finish(mut self) -> portex_core::Result<u64> {
        self.csv.flush()?;
        let buf = self
            .csv
            .into_inner()
            .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        let file = buf
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(self.rows)
    }
}

fn csv_error(e: csv::Error) -> ExportError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => ExportError::Io(io),
        other => ExportError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("csv encoding failed: {other:?}"),
        )),
    }
}
