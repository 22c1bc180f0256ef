//! Types shared by the export pipeline.

use serde::Serialize;

/// Name of the observations file inside the output directory.
pub const OBSERVATIONS_FILE: &str = "observations.json";

/// Name of the media subdirectory inside the output directory.
pub const MEDIA_DIR: &str = "media";

/// Statistics for an export run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Number of observations written to `observations.json`.
    pub observations: usize,
    /// Number of media files copied.
    pub media: usize,
    /// Total bytes of media copied.
    pub bytes: u64,
}

impl ExportStats {
    /// Observations plus media files.
    #[must_use]
    pub fn total(&self) -> usize {
        self.observations + self.media
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
