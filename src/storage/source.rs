//! Read-side traits the exporter works against.
//!
//! `LogStore` and `BlobStore` are the implementations used for real
//! projects; anything else that can produce observations and blobs can be
//! exported the same way.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::model::{MediaKey, Observation};
use crate::storage::blob::BlobStore;
use crate::storage::index::StreamOptions;
use crate::storage::log::{LogStore, OBSERVATION_TYPE, RecordStream};

/// Something that can stream observation records.
pub trait ObservationSource {
    /// Lazy, finite, one-shot stream of observations.
    type Stream: Iterator<Item = Result<Observation>>;

    /// Start a stream of every observation, configured by `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be started.
    fn observation_stream(&self, options: &StreamOptions) -> Result<Self::Stream>;
}

/// Something that holds media blobs.
pub trait MediaSource {
    type Reader: Read;

    /// Every key present right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn list(&self) -> Result<Vec<MediaKey>>;

    /// Open the blob named `key` for reading.
    ///
    /// # Errors
    ///
    /// Returns `Error::MediaNotFound` if the key does not exist.
    fn open_read(&self, key: &MediaKey) -> Result<Self::Reader>;

    /// Directory the blobs live in, for sources backed by the filesystem.
    fn location(&self) -> Option<&Path> {
        None
    }
}

impl ObservationSource for LogStore {
    type Stream = RecordStream;

    fn observation_stream(&self, options: &StreamOptions) -> Result<RecordStream> {
        self.stream(OBSERVATION_TYPE, options)
    }
}

impl MediaSource for BlobStore {
    type Reader = File;

    fn list(&self) -> Result<Vec<MediaKey>> {
        BlobStore::list(self)
    }

    fn open_read(&self, key: &MediaKey) -> Result<File> {
        BlobStore::open_read(self, key)
    }

    fn location(&self) -> Option<&Path> {
        Some(self.root())
    }
}
