//! Error types for relink.
//!
//! Every public operation returns one of these for expected failure
//! conditions (missing path, occupied destination, non-link target). Only
//! programming defects are allowed to panic.

use crate::relocate::MoveOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the relink library.
#[derive(Debug, Error)]
pub enum RelinkError {
    // Path resolution errors
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Path already exists: {0}")]
    PathAlreadyExists(PathBuf),

    #[error("Source must be a regular file or directory: {0}")]
    InvalidSourceKind(PathBuf),

    #[error("Invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },

    #[error("Path is not valid UTF-8 and cannot be recorded: {0}")]
    UnrepresentablePath(PathBuf),

    // Relocation errors
    #[error(
        "Move failed: {moved} of {total} files moved ({rate:.1}%), below the {threshold:.1}% threshold",
        moved = .outcome.moved_count,
        total = .outcome.total_count,
        rate = .outcome.success_rate()
    )]
    MoveFailed {
        outcome: MoveOutcome,
        threshold: f64,
    },

    // Link errors
    #[error("Failed to create symlink {link} -> {target}: {reason}")]
    LinkCreation {
        link: PathBuf,
        target: PathBuf,
        reason: String,
        /// Set when a relocated tree was moved back after the failure
        rolled_back: bool,
    },

    #[error("Not a symbolic link: {0}")]
    NotASymlink(PathBuf),

    #[error("Failed to remove symlink {link}: {reason}")]
    LinkRemoval { link: PathBuf, reason: String },

    #[error(
        "Rollback failed: data is at {destination}, nothing is left at {source_path}, and no link exists \
         (link error: {link_error}; rollback error: {rollback_error})"
    )]
    UnrecoverableRollbackFailure {
        source_path: PathBuf,
        destination: PathBuf,
        link_error: String,
        rollback_error: String,
    },

    // Registry errors
    #[error("Link {link} could not be recorded: {reason}")]
    NotRecorded {
        link: PathBuf,
        reason: String,
        /// Set when the link (and any relocated data) was undone
        rolled_back: bool,
    },

    #[error("Registry file {path} is corrupt: {message}")]
    RegistryCorrupt { path: PathBuf, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for relink operations.
pub type Result<T> = std::result::Result<T, RelinkError>;

impl From<std::io::Error> for RelinkError {
    fn from(err: std::io::Error) -> Self {
        RelinkError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<toml::ser::Error> for RelinkError {
    fn from(err: toml::ser::Error) -> Self {
        RelinkError::Serialization {
            message: err.to_string(),
        }
    }
}

impl RelinkError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RelinkError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True when the failure left the filesystem in a state that needs
    /// manual repair.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, RelinkError::UnrecoverableRollbackFailure { .. })
    }
}
