//! Error types for the exporter.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - A single failure exit code, as the CLI contract requires
//! - Context-aware recovery hints for usage errors
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Usage
    MissingOutput,
    InputNotFound,
    InputNotDirectory,
    InvalidArgument,

    // Exporter contract
    OutputDirectoryRequired,
    OutputOverlapsSource,

    // Stores
    StoreOpenFailed,
    IndexError,
    Corruption,
    ReadOnly,
    MediaNotFound,
    InvalidMediaKey,
    InvalidFeedKey,

    // I/O
    IoError,
    JsonError,

    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::MissingOutput => "MISSING_OUTPUT",
            Self::InputNotFound => "INPUT_NOT_FOUND",
            Self::InputNotDirectory => "INPUT_NOT_DIRECTORY",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::OutputDirectoryRequired => "OUTPUT_DIRECTORY_REQUIRED",
            Self::OutputOverlapsSource => "OUTPUT_OVERLAPS_SOURCE",
            Self::StoreOpenFailed => "STORE_OPEN_FAILED",
            Self::IndexError => "INDEX_ERROR",
            Self::Corruption => "CORRUPTION",
            Self::ReadOnly => "READ_ONLY",
            Self::MediaNotFound => "MEDIA_NOT_FOUND",
            Self::InvalidMediaKey => "INVALID_MEDIA_KEY",
            Self::InvalidFeedKey => "INVALID_FEED_KEY",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for this error.
    ///
    /// Every failure exits with 1; scripts distinguish causes through the
    /// code string in `--json` mode.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while exporting a project.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Specify an output directory with `--output`")]
    MissingOutput,

    #[error("Input directory does not exist: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Input directory does not exist: {}", path.display())]
    InputNotDirectory { path: PathBuf },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("outputDirectory is required")]
    OutputDirectoryRequired,

    #[error("Output directory overlaps the project's media store: {}", path.display())]
    OutputOverlapsSource { path: PathBuf },

    #[error("Failed to open store at {}: {reason}", path.display())]
    StoreOpen { path: PathBuf, reason: String },

    #[error("Index error: {0}")]
    Index(#[from] rusqlite::Error),

    #[error("Corrupt record in feed {feed} at seq {seq}: {message}")]
    Corruption {
        feed: String,
        seq: u64,
        message: String,
    },

    #[error("Log store was opened read-only")]
    ReadOnly,

    #[error("Media not found: {key}")]
    MediaNotFound { key: String },

    #[error("Invalid media key: {0:?}")]
    InvalidMediaKey(String),

    #[error("Invalid feed key: {0:?}")]
    InvalidFeedKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingOutput => ErrorCode::MissingOutput,
            Self::InputNotFound { .. } => ErrorCode::InputNotFound,
            Self::InputNotDirectory { .. } => ErrorCode::InputNotDirectory,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::OutputDirectoryRequired => ErrorCode::OutputDirectoryRequired,
            Self::OutputOverlapsSource { .. } => ErrorCode::OutputOverlapsSource,
            Self::StoreOpen { .. } => ErrorCode::StoreOpenFailed,
            Self::Index(_) => ErrorCode::IndexError,
            Self::Corruption { .. } => ErrorCode::Corruption,
            Self::ReadOnly => ErrorCode::ReadOnly,
            Self::MediaNotFound { .. } => ErrorCode::MediaNotFound,
            Self::InvalidMediaKey(_) => ErrorCode::InvalidMediaKey,
            Self::InvalidFeedKey(_) => ErrorCode::InvalidFeedKey,
            Self::Io(_) | Self::Walk(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint for humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingOutput => Some("See more help with `--help`.".to_string()),
            Self::InputNotFound { .. } => Some(
                "Pass the project directory with `--input`, or run from inside it.".to_string(),
            ),
            Self::InputNotDirectory { .. } => {
                Some("A file was found at the input path.".to_string())
            }
            Self::InvalidArgument(_) => Some("See more help with `--help`.".to_string()),
            Self::OutputOverlapsSource { .. } => Some(
                "Choose an output directory outside the project being exported.".to_string(),
            ),
            Self::StoreOpen { .. } => Some(
                "Check that the input points at a project directory (feeds/, media/).".to_string(),
            ),
            Self::Corruption { .. } => Some(
                "The feed file is damaged; restore the project from a backup or sync it again."
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_one() {
        let errors = [
            Error::MissingOutput,
            Error::InputNotFound {
                path: PathBuf::from("/nope"),
            },
            Error::OutputDirectoryRequired,
            Error::MediaNotFound {
                key: "photo1".into(),
            },
            Error::Other("boom".into()),
        ];
        for err in &errors {
            assert_eq!(err.exit_code(), 1, "{err}");
        }
    }

    #[test]
    fn test_input_messages_name_path() {
        let err = Error::InputNotDirectory {
            path: PathBuf::from("/tmp/project.txt"),
        };
        assert!(err.to_string().contains("/tmp/project.txt"));
        assert_eq!(
            err.hint().as_deref(),
            Some("A file was found at the input path.")
        );
        assert_eq!(err.error_code(), ErrorCode::InputNotDirectory);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::MissingOutput.to_structured_json();
        assert_eq!(json["error"]["code"], "MISSING_OUTPUT");
        assert_eq!(json["error"]["exit_code"], 1);
        assert!(json["error"]["hint"].as_str().unwrap().contains("--help"));
    }

    #[test]
    fn test_structured_json_without_hint() {
        let json = Error::OutputDirectoryRequired.to_structured_json();
        assert_eq!(json["error"]["code"], "OUTPUT_DIRECTORY_REQUIRED");
        assert!(json["error"].get("hint").is_none());
    }
}
