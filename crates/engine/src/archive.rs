//! Archive building and atomic publish
//!
//! Compresses a completed staging directory into one `.tar.gz` archive.
//! The compression mechanism is a capability behind [`CompressionBackend`]
//! with an embedded gzip writer and an external `tar` process variant,
//! selected by configuration.
//!
//! ## Atomicity
//!
//! The archive is built at a hidden temp path in the destination directory
//! and renamed into place only after the backend reports success, then the
//! parent directory is fsynced. Either the complete archive exists at the
//! final path or nothing does; on failure the temp file is removed and the
//! staging directory is left untouched.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use thiserror::Error;
use tracing::{debug, info};

use portex_core::{ExportError, SnapshotStamp};

/// Capability for compressing a staging directory into an archive file
pub trait CompressionBackend {
    /// Short backend name for logs and config output
    fn name(&self) -> &'static str;

    /// Compress the files of `staging` into an archive at `destination`
    fn compress_dir(&self, staging: &Path, destination: &Path) -> Result<(), ArchiveFailure>;
}

/// Backend-level failures
#[derive(Debug, Error)]
pub enum ArchiveFailure {
    /// I/O error while building the archive
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compression step itself failed
    #[error("{0}")]
    Backend(String),

    /// The external process exceeded its deadline and was killed
    #[error("archive step timed out after {0:?}")]
    Timeout(Duration),
}

/// Embedded gzip tar writer
pub struct GzipBackend {
    level: GzLevel,
}

impl GzipBackend {
    /// Create a backend with the default compression level
    pub fn new() -> Self {
        GzipBackend {
            level: GzLevel::default(),
        }
    }
}

impl Default for GzipBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionBackend for GzipBackend {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress_dir(&self, staging: &Path, destination: &Path) -> Result<(), ArchiveFailure> {
        let file = File::create(destination)?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.level);
        let mut builder = tar::Builder::new(encoder);

        // stable entry order regardless of directory iteration order
        let mut entries = fs::read_dir(staging)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_file() {
                builder.append_path_with_name(&path, entry.file_name())?;
            }
        }

        let encoder = builder.into_inner()?;
        let buf = encoder.finish()?;
        let file = buf.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

/// External `tar` process backend
///
/// Runs `tar -C <staging> -czf <destination> .` bounded by an optional
/// deadline; on expiry the process is killed and the step fails.
pub struct TarCommandBackend {
    timeout: Option<Duration>,
}

impl TarCommandBackend {
    /// Create a backend with the given process deadline
    pub fn new(timeout: Option<Duration>) -> Self {
        TarCommandBackend { timeout }
    }
}

impl CompressionBackend for TarCommandBackend {
    fn name(&self) -> &'static str {
        "tar-command"
    }

    fn compress_dir(&self, staging: &Path, destination: &Path) -> Result<(), ArchiveFailure> {
        let mut child = Command::new("tar")
            .arg("-C")
            .arg(staging)
            .arg("-czf")
            .arg(destination)
            .arg(".")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => {
                let started = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ArchiveFailure::Timeout(limit));
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(ArchiveFailure::Backend(format!(
                "tar exited with {status}: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Information about a published archive
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Final archive path
    pub path: PathBuf,
    /// Archive size in bytes
    pub size_bytes: u64,
}

/// Builds and atomically publishes the snapshot archive
pub struct ArchiveBuilder {
    backend: Box<dyn CompressionBackend>,
}

impl ArchiveBuilder {
    /// Create a builder over a compression backend
    pub fn new(backend: Box<dyn CompressionBackend>) -> Self {
        ArchiveBuilder { backend }
    }

    /// Compress `staging` and publish `<root>/<stamp>.tar.gz`
    ///
    /// This is an atomic operation: either the complete archive appears at
    /// the final path or no file is left behind.
    pub fn build(
        &self,
        staging: &Path,
        root: &Path,
        stamp: &SnapshotStamp,
    ) -> portex_core::Result<ArchiveInfo> {
        let final_path = root.join(stamp.archive_name());
        if final_path.exists() {
            return Err(ExportError::Archive(format!(
                "archive already exists: {}",
                final_path.display()
            )));
        }
        let temp_path = root.join(format!(".{}.tmp", stamp.archive_name()));

        debug!(
            target: "portex::archive",
            backend = self.backend.name(),
            staging = %staging.display(),
            "compressing staging directory"
        );

        match self.build_inner(staging, &temp_path, &final_path) {
            Ok(info) => {
                info!(
                    target: "portex::archive",
                    path = %info.path.display(),
                    size_bytes = info.size_bytes,
                    "archive published"
                );
                Ok(info)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn build_inner(
        &self,
        staging: &Path,
        temp_path: &Path,
        final_path: &Path,
    ) -> portex_core::Result<ArchiveInfo> {
        self.backend
            .compress_dir(staging, temp_path)
            .map_err(|e| ExportError::Archive(e.to_string()))?;

        fs::rename(temp_path, final_path)?;

        // make the rename durable before reporting success
        if let Some(parent) = final_path.parent() {
            File::open(parent)?.sync_all()?;
        }

        let size_bytes = fs::metadata(final_path)?.len();
        Ok(ArchiveInfo {
            path: final_path.to_path_buf(),
            size_bytes,
        })
    }
}
