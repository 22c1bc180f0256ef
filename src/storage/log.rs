//! Multi-writer append-only log store.
//!
//! A project holds one feed per writer under `feeds/` and a record index
//! built from them. Read-only opens index into memory and never write to
//! the project; read-write opens persist the index at `index.db` and
//! catch up incrementally.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ProjectLayout;
use crate::error::{Error, Result};
use crate::storage::feed::{Feed, read_record, validate_feed_key};
use crate::storage::index::{RecordIndex, RecordLocation, StreamOptions};

/// Record `type` that marks an observation.
pub const OBSERVATION_TYPE: &str = "observation";

/// How a log store may touch the project directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Never write: the index is built in memory.
    ReadOnly,
    /// Allow appends and persist the index.
    ReadWrite,
}

/// Append-only log store over one project directory.
#[derive(Debug)]
pub struct LogStore {
    layout: ProjectLayout,
    mode: AccessMode,
    index: RecordIndex,
}

impl LogStore {
    /// Open the log store for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreOpen` if `root` is not a directory, or an error if
    /// the index cannot be opened or a feed cannot be indexed.
    pub fn open(root: impl AsRef<Path>, mode: AccessMode) -> Result<Self> {
        let layout = ProjectLayout::new(root.as_ref());

        if !layout.root().is_dir() {
            return Err(Error::StoreOpen {
                path: layout.root().to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let index = match mode {
            AccessMode::ReadOnly => RecordIndex::in_memory()?,
            AccessMode::ReadWrite => {
                fs::create_dir_all(layout.feeds_dir())?;
                RecordIndex::open(&layout.index_path())?
            }
        };

        let mut store = Self {
            layout,
            mode,
            index,
        };
        let indexed = store.catch_up()?;
        info!(
            root = %store.layout.root().display(),
            ?mode,
            indexed,
            "Opened log store"
        );
        Ok(store)
    }

    /// Keys of every feed in the project, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the feeds directory cannot be read.
    pub fn feeds(&self) -> Result<Vec<String>> {
        let dir = self.layout.feeds_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_feed_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Index whatever the feeds gained since the last catch-up.
    ///
    /// Feeds are visited in key order. Returns the number of newly indexed
    /// records.
    ///
    /// # Errors
    ///
    /// Returns an error if a feed cannot be read or holds a corrupt record.
    pub fn catch_up(&mut self) -> Result<usize> {
        let mut total = 0;
        for key in self.feeds()? {
            total += self.catch_up_feed(&key)?;
        }
        Ok(total)
    }

    fn catch_up_feed(&mut self, key: &str) -> Result<usize> {
        let feed = Feed::new(key, self.layout.feed_path(key));
        let progress = self.index.progress(key)?;

        let (entries, end) = feed.read_from(progress.indexed_bytes, progress.indexed_len)?;
        if entries.is_empty() {
            return Ok(0);
        }

        self.index.record(key, &entries, end)?;
        debug!(feed = key, count = entries.len(), "Indexed feed tail");
        Ok(entries.len())
    }

    /// Create a new, empty feed and return its key.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadOnly` on a read-only store, or an I/O error.
    pub fn create_feed(&self) -> Result<String> {
        self.ensure_writable()?;
        let key = Uuid::new_v4().simple().to_string();
        File::create(self.layout.feed_path(&key))?;
        debug!(feed = %key, "Created feed");
        Ok(key)
    }

    /// Append a record to `feed` and index it. Returns its sequence number.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadOnly` on a read-only store, `Error::InvalidFeedKey`
    /// for a malformed key, or an I/O or index error.
    pub fn append(&mut self, feed: &str, value: &Value) -> Result<u64> {
        self.ensure_writable()?;
        validate_feed_key(feed)?;

        Feed::new(feed, self.layout.feed_path(feed)).append(value)?;
        self.catch_up_feed(feed)?;
        Ok(self.index.progress(feed)?.indexed_len.saturating_sub(1))
    }

    /// Stream every record of `record_type` in index order.
    ///
    /// The returned stream reads records from their feeds lazily, one per
    /// call to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query fails.
    pub fn stream(&self, record_type: &str, options: &StreamOptions) -> Result<RecordStream> {
        let locations = self.index.locate(record_type, options)?;
        debug!(record_type, count = locations.len(), ?options, "Streaming records");
        Ok(RecordStream {
            layout: self.layout.clone(),
            locations: locations.into_iter(),
            handles: HashMap::new(),
        })
    }

    /// Number of indexed records of `record_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query fails.
    pub fn count(&self, record_type: &str) -> Result<u64> {
        self.index.count(record_type)
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(Error::ReadOnly),
        }
    }
}

/// Lazy, forward-only stream of records.
///
/// One-shot: once drained it stays empty.
#[derive(Debug)]
pub struct RecordStream {
    layout: ProjectLayout,
    locations: std::vec::IntoIter<RecordLocation>,
    handles: HashMap<String, File>,
}

impl RecordStream {
    fn read(&mut self, location: &RecordLocation) -> Result<Value> {
        let file = match self.handles.entry(location.feed.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(File::open(self.layout.feed_path(&location.feed))?),
        };

        read_record(
            file,
            &location.feed,
            location.seq,
            location.offset,
            location.length,
        )
    }
}

impl Iterator for RecordStream {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let location = self.locations.next()?;
        Some(self.read(&location))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.locations.size_hint()
    }
}
