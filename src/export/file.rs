//! File operations for export output.
//!
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - Blob copies that never leave a truncated file behind

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` appended)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Copy everything `reader` yields into a new file at `destination`.
///
/// The parent directory must already exist. If the transfer fails, the
/// partially written destination is removed before the error is returned.
///
/// # Errors
///
/// Returns an error if the file cannot be created or any read/write fails.
pub fn copy_to_file<R: Read>(mut reader: R, destination: &Path) -> Result<u64> {
    let file = File::create(destination)?;
    let mut writer = BufWriter::new(file);

    let copied = io::copy(&mut reader, &mut writer).and_then(|n| {
        writer.flush()?;
        Ok(n)
    });

    match copied {
        Ok(n) => Ok(n),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination) {
                warn!(
                    path = %destination.display(),
                    error = %cleanup,
                    "Failed to remove partial file"
                );
            }
            Err(e.into())
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
