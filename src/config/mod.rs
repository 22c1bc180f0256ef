//! Configuration management.
//!
//! This module resolves the paths an export works with and names the
//! on-disk layout of a project directory.
//!
//! # Layout
//!
//! ```text
//! <project>/
//!   feeds/<feed-key>.jsonl   append-only record feeds, one per writer
//!   index.db                 persisted record index (read-write opens only)
//!   media/                   blob store root
//! ```

use crate::error::{Error, Result};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `--input` is not given.
pub const INPUT_ENV: &str = "MAPEO_EXPORT_INPUT";

/// Environment variable consulted when `--output` is not given.
pub const OUTPUT_ENV: &str = "MAPEO_EXPORT_OUTPUT";

/// Paths inside a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Describe the project rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one `.jsonl` file per feed.
    #[must_use]
    pub fn feeds_dir(&self) -> PathBuf {
        self.root.join("feeds")
    }

    /// File backing the feed with the given key.
    #[must_use]
    pub fn feed_path(&self, feed: &str) -> PathBuf {
        self.feeds_dir().join(format!("{feed}.jsonl"))
    }

    /// Persisted index location.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.db")
    }

    /// Blob store root.
    #[must_use]
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }
}

/// Resolve a command-line path against the working directory.
///
/// Relative paths are joined onto `cwd`; absolute paths are kept as given.
#[must_use]
pub fn resolve_path(cwd: &Path, arg: &Path) -> PathBuf {
    if arg.as_os_str().is_empty() || arg == Path::new(".") {
        cwd.to_path_buf()
    } else {
        cwd.join(arg)
    }
}

/// Check that the input path exists and is a directory.
///
/// # Errors
///
/// Returns `Error::InputNotFound` if nothing exists at `path`, and
/// `Error::InputNotDirectory` if something other than a directory does.
pub fn validate_input_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::InputNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::InputNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::Io(e)),
    }
}
