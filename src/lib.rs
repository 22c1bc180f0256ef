//! Mapeo project exporter.
//!
//! Reads a project's observations from its append-only log store and its
//! media from its blob store, and writes both into a plain directory.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`export`] - The exporter and its output files
//! - [`storage`] - Log store, record index and blob store
//! - [`model`] - Data types (Observation, MediaKey)
//! - [`config`] - Path resolution and project layout
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod storage;

pub use error::{Error, Result};
pub use export::{ExportStats, Exporter};
