//! Symbolic link creation and removal.
//!
//! [`LinkManager`] wraps a platform [`LinkPrimitive`] with the checks the
//! workflows rely on: link mode chosen from the target's type, and removal
//! refused for anything that is not a link.

pub mod primitive;

pub use primitive::{native, LinkPrimitive};

use crate::error::{RelinkError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// What a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    #[serde(alias = "文件")]
    File,
    #[serde(alias = "目录")]
    Directory,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::File => "file",
            LinkKind::Directory => "directory",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-agnostic link operations.
pub struct LinkManager {
    primitive: Box<dyn LinkPrimitive>,
}

impl LinkManager {
    pub fn new(primitive: Box<dyn LinkPrimitive>) -> Self {
        Self { primitive }
    }

    /// Manager backed by the running platform's primitive.
    pub fn native() -> Self {
        Self::new(primitive::native())
    }

    /// Create a symbolic link at `link` resolving to `target`.
    ///
    /// The link mode follows the target's type at creation time. A target
    /// that is itself a link is classified by what it resolves to.
    pub fn create(&self, target: &Path, link: &Path) -> Result<LinkKind> {
        let kind = match std::fs::metadata(target) {
            Ok(meta) if meta.is_dir() => LinkKind::Directory,
            Ok(_) => LinkKind::File,
            Err(_) => return Err(RelinkError::PathNotFound(target.to_path_buf())),
        };

        self.primitive
            .create(target, link, kind)
            .map_err(|e| RelinkError::LinkCreation {
                link: link.to_path_buf(),
                target: target.to_path_buf(),
                reason: e.to_string(),
                rolled_back: false,
            })?;

        debug!("Created {} link {} -> {}", kind, link.display(), target.display());
        Ok(kind)
    }

    /// Remove the symbolic link at `link`.
    ///
    /// Refuses with [`RelinkError::NotASymlink`] when the path holds real
    /// data or nothing at all.
    pub fn remove(&self, link: &Path) -> Result<()> {
        if !paths::classify(link).is_symlink() {
            return Err(RelinkError::NotASymlink(link.to_path_buf()));
        }
        self.remove_classified(link)
    }

    /// Remove a path the caller has already classified as a symlink.
    pub(crate) fn remove_classified(&self, link: &Path) -> Result<()> {
        let first = match self.primitive.remove(link) {
            Ok(()) => {
                debug!("Removed link {}", link.display());
                return Ok(());
            }
            Err(e) => e,
        };

        warn!(
            "Generic removal of {} failed ({}), trying platform fallback",
            link.display(),
            first
        );
        self.primitive
            .remove_fallback(link)
            .map_err(|second| RelinkError::LinkRemoval {
                link: link.to_path_buf(),
                reason: format!("{first}; {second}"),
            })
    }
}

impl fmt::Debug for LinkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkManager").finish_non_exhaustive()
    }
}
