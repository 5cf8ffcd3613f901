//! Domain-level error types for mail-transcript.
//!
//! Two layers: `ProviderError` is what an archive provider returns from a
//! single accessor, `AppError` is what aborts a whole command.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reported by an archive provider for one accessor call.
///
/// Whether it is fatal depends on where it happens: opening the archive
/// aborts the run, fetching a single message or subfolder does not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The archive container could not be opened.
    #[error("cannot open archive {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    /// An index or entry the provider advertised is gone.
    #[error("item not found: {message}")]
    NotFound { message: String },

    /// The item exists but cannot be decoded.
    #[error("corrupt item: {message}")]
    Corrupt { message: String },

    /// Underlying read failed.
    #[error("read failed: {message}")]
    Io { message: String },
}

impl ProviderError {
    /// Create an open error for the given archive path.
    pub fn open(path: &Path, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a corrupt-item error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a read error with context.
    pub fn io(context: &str, err: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{context}: {err}"),
        }
    }
}

/// Application-level errors. Any of these ends the current command.
#[derive(Error, Debug)]
pub enum AppError {
    /// The archive could not be opened or has no readable root.
    #[error("Cannot open archive: {source}")]
    ArchiveOpen {
        #[source]
        source: ProviderError,
    },

    /// The transcript destination cannot be prepared for writing.
    #[error("Cannot write transcript to {}: {message}", path.display())]
    Destination {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// JSON serialization failed.
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Wrap a provider failure that happened while opening the archive.
    #[must_use]
    pub const fn archive_open(source: ProviderError) -> Self {
        Self::ArchiveOpen { source }
    }

    /// Create a destination error from an IO failure.
    pub fn destination(path: &Path, err: std::io::Error) -> Self {
        Self::Destination {
            path: path.to_path_buf(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a JSON error.
    pub fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for provider accessors.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
