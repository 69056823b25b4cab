//! Core types for Portex
//!
//! This crate defines the foundational types used throughout the system:
//! - Scalar: unified value enum with the canonical value-to-text codec
//! - TableExport: one entry of the export registry (table, header, query, file)
//! - SnapshotStamp: minute-granularity snapshot timestamp and naming
//! - ExportError: error type hierarchy with the four reported kinds

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod registry;
pub mod stamp;
pub mod value;

pub use error::{ErrorKind, ExportError, Result};
pub use registry::{registry, validate_registry, RegistryError, TableExport};
pub use stamp::SnapshotStamp;
pub use value::Scalar;
