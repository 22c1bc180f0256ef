//! Filesystem blob store.
//!
//! Blobs are plain files under a root directory; a blob's key is its path
//! relative to the root with `/` separators. Writes land in a hidden
//! temporary file first and are renamed into place, so listing never sees
//! a half-written blob.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::model::MediaKey;

/// Blob store rooted at one directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open the store rooted at `root`.
    ///
    /// A missing root is an empty store; it is not created until the first
    /// `put`.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreOpen` if `root` exists but is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        match fs::metadata(&root) {
            Ok(meta) if !meta.is_dir() => {
                return Err(Error::StoreOpen {
                    path: root,
                    reason: "blob store root is not a directory".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %root.display(), "Blob store root missing, treating as empty");
            }
            Err(e) => return Err(Error::Io(e)),
        }

        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every key in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory walk fails.
    pub fn list(&self) -> Result<Vec<MediaKey>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::Other(format!("blob outside store root: {e}")))?;
            keys.push(MediaKey::from_relative_path(relative)?);
        }

        debug!(root = %self.root.display(), count = keys.len(), "Listed blobs");
        Ok(keys)
    }

    /// Open a reader over the blob named `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MediaNotFound` if no blob has that key.
    pub fn open_read(&self, key: &MediaKey) -> Result<File> {
        let path = self.path_for(key);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(File::open(&path)?),
            Ok(_) => Err(Error::MediaNotFound {
                key: key.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::MediaNotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Store `bytes` under `key`, replacing any existing blob.
    ///
    /// # Errors
    ///
    /// Returns an error if any file operation fails.
    pub fn put(&self, key: &MediaKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidMediaKey(key.to_string()))?;
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidMediaKey(key.to_string()))?;
        let temp_path = parent.join(format!(".{file_name}.tmp"));

        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&temp_path, &path)?;
        trace!(key = %key, size = bytes.len(), "Stored blob");
        Ok(())
    }

    fn path_for(&self, key: &MediaKey) -> PathBuf {
        self.root.join(key.to_relative_path())
    }
}

/// Dotfiles and dot-directories hold in-flight writes, not blobs.
fn is_hidden(entry: &DirEntry) -> bool {
    let hidden = entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'));
    if hidden {
        trace!(path = %entry.path().display(), "Skipping hidden entry");
    }
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn key(s: &str) -> MediaKey {
        MediaKey::parse(s).unwrap()
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path().join("media")).unwrap();

        assert!(store.list().unwrap().is_empty());
        assert!(!store.root().exists());
    }

    #[test]
    fn test_file_root_fails_to_open() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("media");
        fs::write(&root, "not a dir").unwrap();

        assert!(matches!(
            BlobStore::open(&root),
            Err(Error::StoreOpen { .. })
        ));
    }

    #[test]
    fn test_put_list_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path().join("media")).unwrap();

        store.put(&key("c"), b"three").unwrap();
        store.put(&key("a"), b"one").unwrap();
        store.put(&key("original/b.jpg"), &[0xff, 0xd8]).unwrap();

        let keys: Vec<String> = store.list().unwrap().into_iter().map(String::from).collect();
        assert_eq!(keys, vec!["a", "c", "original/b.jpg"]);

        let mut bytes = Vec::new();
        store
            .open_read(&key("original/b.jpg"))
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8]);
    }

    #[test]
    fn test_list_skips_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("media");
        fs::create_dir_all(root.join(".tmp")).unwrap();
        fs::write(root.join(".tmp").join("partial"), "x").unwrap();
        fs::write(root.join(".photo.tmp"), "x").unwrap();
        fs::write(root.join("photo"), "x").unwrap();

        let store = BlobStore::open(&root).unwrap();
        let keys = store.list().unwrap();

        assert_eq!(keys, vec![key("photo")]);
    }

    #[test]
    fn test_open_read_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("media");
        fs::create_dir_all(root.join("original")).unwrap();
        let store = BlobStore::open(&root).unwrap();

        assert!(matches!(
            store.open_read(&key("nope")),
            Err(Error::MediaNotFound { key }) if key == "nope"
        ));
        // A directory is not a blob
        assert!(matches!(
            store.open_read(&key("original")),
            Err(Error::MediaNotFound { .. })
        ));
    }
}
