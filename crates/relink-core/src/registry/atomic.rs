//! Atomic file replacement for the registry.
//!
//! Implements atomic writes using:
//! 1. Write to a temp file in the target's directory
//! 2. fsync to ensure data reaches disk
//! 3. Optional backup of the previous file
//! 4. Atomic rename over the target path

use crate::error::{RelinkError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Replace `path` with `contents` without ever exposing a partial file.
pub fn atomic_write(path: &Path, contents: &str, keep_backup: bool) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| RelinkError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    // Same directory as the target so the final rename never crosses volumes
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| RelinkError::Io {
        message: format!("Failed to create temp file in {}", parent.display()),
        path: Some(parent.to_path_buf()),
        source: Some(e),
    })?;

    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.flush())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| RelinkError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;

    if keep_backup && path.exists() {
        let backup_path = backup_path(path);
        if let Err(e) = fs::copy(path, &backup_path) {
            // Not fatal, the write itself can still succeed
            warn!("Failed to create backup {}: {}", backup_path.display(), e);
        } else {
            debug!("Created backup: {}", backup_path.display());
        }
    }

    temp.persist(path).map_err(|e| RelinkError::Io {
        message: format!("Failed to rename temp file over {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// `links.toml` -> `links.toml.bak`
pub fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}
