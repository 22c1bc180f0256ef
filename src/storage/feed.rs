//! Append-only feed files.
//!
//! Each writer owns one feed: a file holding one JSON value per line.
//! A record's sequence number is its line index. Records are never
//! rewritten; a trailing line without a newline is an unfinished append
//! and is ignored until it is completed.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};

/// A record read from a feed during catch-up.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Line index within the feed.
    pub seq: u64,
    /// Byte offset of the line.
    pub offset: u64,
    /// Length of the line, excluding the newline.
    pub length: u64,
    /// Decoded record.
    pub value: Value,
}

impl FeedEntry {
    /// The record's `type` field, if it has a string one.
    #[must_use]
    pub fn record_type(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }
}

/// Check a feed key: `[A-Za-z0-9_-]+`.
///
/// # Errors
///
/// Returns `Error::InvalidFeedKey` for anything else.
pub fn validate_feed_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidFeedKey(key.to_string()))
    }
}

/// Handle on one feed file.
#[derive(Debug, Clone)]
pub struct Feed {
    key: String,
    path: PathBuf,
}

impl Feed {
    #[must_use]
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every complete record starting at `offset`.
    ///
    /// `first_seq` is the sequence number of the record at `offset`.
    /// Returns the entries plus the offset just past the last complete line.
    ///
    /// # Errors
    ///
    /// Returns `Error::Corruption` if a complete line is not valid JSON, or an
    /// I/O error if the file cannot be read.
    pub fn read_from(&self, offset: u64, first_seq: u64) -> Result<(Vec<FeedEntry>, u64)> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);

        let mut entries = Vec::new();
        let mut position = offset;
        let mut seq = first_seq;
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 || line.last() != Some(&b'\n') {
                // EOF, or a torn append still in progress
                break;
            }

            let body = &line[..line.len() - 1];
            let value = serde_json::from_slice(body).map_err(|e| Error::Corruption {
                feed: self.key.clone(),
                seq,
                message: e.to_string(),
            })?;

            entries.push(FeedEntry {
                seq,
                offset: position,
                length: body.len() as u64,
                value,
            });

            position += read as u64;
            seq += 1;
        }

        Ok((entries, position))
    }

    /// Append one record and flush it to disk.
    ///
    /// Returns the byte offset the record was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn append(&self, value: &Value) -> Result<u64> {
        let line = serde_json::to_string(value)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let offset = file.seek(SeekFrom::End(0))?;

        writeln!(file, "{line}")?;
        file.sync_all()?;

        Ok(offset)
    }
}

/// Read a single record given its location.
///
/// # Errors
///
/// Returns `Error::Corruption` if the bytes are not valid JSON.
pub fn read_record(file: &mut File, feed: &str, seq: u64, offset: u64, length: u64) -> Result<Value> {
    file.seek(SeekFrom::Start(offset))?;
    let len = usize::try_from(length).map_err(|_| Error::Corruption {
        feed: feed.to_string(),
        seq,
        message: format!("record length {length} out of range"),
    })?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| Error::Corruption {
        feed: feed.to_string(),
        seq,
        message: e.to_string(),
    })
}
