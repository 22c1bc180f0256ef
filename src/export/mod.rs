//! Project export.
//!
//! Exports a project's observations and media into a plain directory:
//! - [`exporter`] - The `Exporter` over a log store and a blob store
//! - [`file`] - Atomic writes and streaming copies
//! - [`types`] - Export statistics and output names

pub mod exporter;
pub mod file;
pub mod types;

pub use exporter::Exporter;
pub use types::{ExportStats, MEDIA_DIR, OBSERVATIONS_FILE};
