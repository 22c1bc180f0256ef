//! Storage layer for a project directory.
//!
//! Two stores live side by side in a project:
//! - an append-only, multi-writer record log with a SQLite secondary index
//! - a filesystem blob store for media attachments
//!
//! # Submodules
//!
//! - [`feed`] - Append-only feed files, one per writer
//! - [`schema`] - Record index schema
//! - [`index`] - SQLite record index
//! - [`log`] - Log store combining feeds and index
//! - [`blob`] - Blob store
//! - [`source`] - Traits the exporter reads through

pub mod blob;
pub mod feed;
pub mod index;
pub mod log;
pub mod schema;
pub mod source;

pub use blob::BlobStore;
pub use index::StreamOptions;
pub use log::{AccessMode, LogStore, OBSERVATION_TYPE, RecordStream};
pub use source::{MediaSource, ObservationSource};
