//! Data models for the exporter.
//!
//! This module contains the two things an export moves around:
//! - Observation (an opaque JSON document from the log store)
//! - MediaKey (the name of one blob in the blob store)

pub mod media;

pub use media::MediaKey;

/// A record read from the log store.
///
/// Observations are never interpreted: they are written to
/// `observations.json` exactly as stored, key order included.
pub type Observation = serde_json::Value;
