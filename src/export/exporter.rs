//! Project exporter.
//!
//! Reads every observation from the log store and every blob from the blob
//! store, and writes them into a plain output directory:
//!
//! ```text
//! <output>/
//!   observations.json   pretty-printed array, stream order
//!   media/<key>         raw blob bytes
//! ```
//!
//! The run is strictly sequential and stops at the first error. Files
//! already written stay in place; there is no rollback and no resume.

use std::fs;
use std::io::ErrorKind;
use std::path::{self, Path, PathBuf};

use tracing::{debug, info};

use crate::config::ProjectLayout;
use crate::error::{Error, Result};
use crate::export::file::{atomic_write, copy_to_file};
use crate::export::types::{ExportStats, MEDIA_DIR, OBSERVATIONS_FILE};
use crate::model::{MediaKey, Observation};
use crate::storage::{
    AccessMode, BlobStore, LogStore, MediaSource, ObservationSource, StreamOptions,
};

/// Exporter over one project's log store and blob store.
///
/// Both stores are owned by the exporter and closed when it is dropped.
pub struct Exporter<O = LogStore, M = BlobStore> {
    log: O,
    blobs: M,
}

impl Exporter<LogStore, BlobStore> {
    /// Open the project at `project_dir` for export.
    ///
    /// The log store is opened read-only, so nothing in the project is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if either store fails to open.
    pub fn open(project_dir: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(project_dir.as_ref());

        let log = LogStore::open(layout.root(), AccessMode::ReadOnly)?;
        let blobs = BlobStore::open(layout.media_dir())?;

        info!(project = %layout.root().display(), "Opened project for export");
        Ok(Self::from_parts(log, blobs))
    }
}

impl<O: ObservationSource, M: MediaSource> Exporter<O, M> {
    /// Build an exporter over already-open stores.
    #[must_use]
    pub fn from_parts(log: O, blobs: M) -> Self {
        Self { log, blobs }
    }

    /// Read every observation into memory, in stream order.
    ///
    /// `options` is handed to the log store unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first read error from the stream.
    pub fn observations(&self, options: &StreamOptions) -> Result<Vec<Observation>> {
        self.log.observation_stream(options)?.collect()
    }

    /// Every media key currently in the blob store.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn media(&self) -> Result<Vec<MediaKey>> {
        self.blobs.list()
    }

    /// Copy the blob named `key` to `destination`.
    ///
    /// The caller must make sure the parent directory of `destination`
    /// exists. On failure the partially written destination is removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::MediaNotFound` if the key does not exist, or an I/O
    /// error if the transfer fails.
    pub fn copy_file(&self, key: &MediaKey, destination: &Path) -> Result<u64> {
        let reader = self.blobs.open_read(key)?;
        copy_to_file(reader, destination)
    }

    /// Count what an export would write, without writing anything.
    ///
    /// `bytes` is always zero in the result.
    ///
    /// # Errors
    ///
    /// Returns an error if reading either store fails.
    pub fn preview(&self) -> Result<ExportStats> {
        let observations = self.observations(&StreamOptions::default())?.len();
        let media = self.media()?.len();
        Ok(ExportStats {
            observations,
            media,
            bytes: 0,
        })
    }

    /// Export every observation and media file into `output_dir`.
    ///
    /// `output_dir` is created if missing. Observations and keys are both
    /// read before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::OutputDirectoryRequired` for an empty path and
    /// `Error::OutputOverlapsSource` when `<output_dir>/media` would land in
    /// or around the blob store (both before touching the filesystem), or the
    /// first read, write or copy error.
    pub fn export(&self, output_dir: impl AsRef<Path>) -> Result<ExportStats> {
        let output_dir = output_dir.as_ref();
        if output_dir.as_os_str().is_empty() {
            return Err(Error::OutputDirectoryRequired);
        }
        self.check_overlap(output_dir)?;

        let observations = self.observations(&StreamOptions::default())?;
        let keys = self.media()?;
        debug!(
            observations = observations.len(),
            media = keys.len(),
            "Collected export contents"
        );

        fs::create_dir_all(output_dir)?;
        let observations_path = output_dir.join(OBSERVATIONS_FILE);
        atomic_write(
            &observations_path,
            &serde_json::to_string_pretty(&observations)?,
        )?;
        info!(
            count = observations.len(),
            path = %observations_path.display(),
            "Wrote observations"
        );

        let mut stats = ExportStats {
            observations: observations.len(),
            ..ExportStats::default()
        };

        let media_dir = output_dir.join(MEDIA_DIR);
        for key in &keys {
            let destination = media_dir.join(key.to_relative_path());
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }

            let bytes = self.copy_file(key, &destination)?;
            debug!(key = %key, bytes, "Copied media");

            stats.media += 1;
            stats.bytes += bytes;
        }

        info!(
            observations = stats.observations,
            media = stats.media,
            bytes = stats.bytes,
            output = %output_dir.display(),
            "Export complete"
        );
        Ok(stats)
    }

    /// `<output_dir>/media` must neither contain nor sit inside the blob
    /// store.
    fn check_overlap(&self, output_dir: &Path) -> Result<()> {
        let Some(location) = self.blobs.location() else {
            return Ok(());
        };

        let source = resolve_existing(location)?;
        let target = resolve_existing(&output_dir.join(MEDIA_DIR))?;
        if target.starts_with(&source) || source.starts_with(&target) {
            return Err(Error::OutputOverlapsSource {
                path: output_dir.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Canonicalize the longest existing prefix of `path` and append the rest.
///
/// Follows symlinks wherever they exist without creating anything.
fn resolve_existing(path: &Path) -> Result<PathBuf> {
    let absolute = path::absolute(path)?;
    let mut missing = Vec::new();
    let mut current = absolute.as_path();

    loop {
        match current.canonicalize() {
            Ok(resolved) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc: PathBuf, part| acc.join(part)));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                match (current.file_name(), current.parent()) {
                    (Some(name), Some(parent)) => {
                        missing.push(name.to_os_string());
                        current = parent;
                    }
                    _ => return Err(Error::Io(e)),
                }
            }
            Err(e) => return Err(Error::Io(e)),
        }
    }
}
