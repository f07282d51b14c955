//! Destination resolution for relocations.
//!
//! The plan is computed from a single look at the source and destination
//! before anything is moved.

use crate::error::{RelinkError, Result};
use crate::link::LinkKind;
use crate::paths::{self, PathKind};
use std::path::{Path, PathBuf};

/// Where a relocation will put its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: LinkKind,
}

impl RelocationPlan {
    /// Resolve the final destination for moving `source` to `destination_input`.
    ///
    /// - directory source: the destination must not exist
    /// - file source, existing directory destination: `destination/<file name>`,
    ///   which must not exist
    /// - file source, existing file destination: error
    /// - anything else: the destination is used as given
    pub fn resolve(source: &Path, destination_input: &Path) -> Result<Self> {
        paths::require_utf8(source)?;
        let kind = match paths::classify(source) {
            PathKind::Directory => LinkKind::Directory,
            PathKind::File => LinkKind::File,
            PathKind::Missing => return Err(RelinkError::PathNotFound(source.to_path_buf())),
            PathKind::Symlink { .. } => {
                return Err(RelinkError::InvalidSourceKind(source.to_path_buf()))
            }
        };
        let destination = Self::final_destination(source, kind, destination_input)?;
        paths::require_utf8(&destination)?;

        if paths::same_key(&destination, source) || is_within(&destination, source) {
            return Err(RelinkError::InvalidDestination {
                path: destination,
                reason: "destination is inside the source".to_string(),
            });
        }

        Ok(Self {
            source: source.to_path_buf(),
            destination,
            kind,
        })
    }

    fn final_destination(source: &Path, kind: LinkKind, input: &Path) -> Result<PathBuf> {
        let existing = paths::classify(input);
        if !existing.exists() {
            return Ok(input.to_path_buf());
        }

        match kind {
            LinkKind::Directory => Err(RelinkError::PathAlreadyExists(input.to_path_buf())),
            LinkKind::File => {
                // A link to a directory counts as a directory here.
                let is_dir = match existing {
                    PathKind::Directory => true,
                    PathKind::Symlink { .. } => input.is_dir(),
                    _ => false,
                };
                if !is_dir {
                    return Err(RelinkError::PathAlreadyExists(input.to_path_buf()));
                }
                let name = source.file_name().ok_or_else(|| {
                    RelinkError::InvalidSourceKind(source.to_path_buf())
                })?;
                let candidate = input.join(name);
                if paths::classify(&candidate).exists() {
                    return Err(RelinkError::PathAlreadyExists(candidate));
                }
                Ok(candidate)
            }
        }
    }
}

fn is_within(path: &Path, ancestor: &Path) -> bool {
    let path_key = paths::canonical_key(path);
    let ancestor_key = paths::canonical_key(ancestor);
    Path::new(&path_key).starts_with(Path::new(&ancestor_key))
}
