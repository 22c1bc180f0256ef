//! Media key model.
//!
//! Keys are relative, `/`-separated paths such as `original/ab12.jpg`.
//! The same key names a file under the blob store root and a file under
//! `<output>/media`, so a key must never escape either directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of one blob in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaKey(String);

impl MediaKey {
    /// Parse and validate a key.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMediaKey` if the key is empty, absolute, or
    /// contains `.`/`..` or empty segments.
    pub fn parse(key: &str) -> Result<Self> {
        let valid = !key.is_empty()
            && !key.contains('\\')
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

        if valid {
            Ok(Self(key.to_string()))
        } else {
            Err(Error::InvalidMediaKey(key.to_string()))
        }
    }

    /// Build a key from a path relative to the blob store root.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMediaKey` if the path has non-normal components
    /// or is not valid UTF-8.
    pub fn from_relative_path(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| Error::InvalidMediaKey(path.display().to_string()))?;
                    segments.push(segment);
                }
                _ => return Err(Error::InvalidMediaKey(path.display().to_string())),
            }
        }
        Self::parse(&segments.join("/"))
    }

    /// The key as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform path for this key, relative to whatever root it is joined onto.
    #[must_use]
    pub fn to_relative_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MediaKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MediaKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MediaKey> for String {
    fn from(key: MediaKey) -> Self {
        key.0
    }
}

impl AsRef<str> for MediaKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
