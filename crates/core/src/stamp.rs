//! Snapshot timestamps and artifact naming
//!
//! A snapshot is identified by its creation time at minute granularity.
//! Both on-disk names derive from the stamp as pure functions:
//!
//! ```text
//! <BACKUP_ROOT>/<YYYYMMDD-HHMM>/          staging directory (transient)
//! <BACKUP_ROOT>/<YYYYMMDD-HHMM>.tar.gz    published archive
//! ```

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};

/// Minute-granularity snapshot timestamp
///
/// Two runs within the same minute map to the same stamp; the staging
/// manager turns that into a deterministic collision failure rather than
/// merging into an existing directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotStamp(NaiveDateTime);

impl SnapshotStamp {
    /// Stamp for the current local time
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    /// Stamp for a given datetime, dropping seconds and below
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let floored = dt
            .date()
            .and_hms_opt(dt.hour(), dt.minute(), 0)
            .unwrap_or(dt);
        SnapshotStamp(floored)
    }

    /// Name of the staging directory for this snapshot
    pub fn dir_name(&self) -> String {
        self.0.format("%Y%m%d-%H%M").to_string()
    }

    /// Name of the published archive for this snapshot
    pub fn archive_name(&self) -> String {
        format!("{}.tar.gz", self.dir_name())
    }
}

impl fmt::Display for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}
