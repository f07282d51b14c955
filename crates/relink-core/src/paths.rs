//! Path normalization, validation and classification.
//!
//! Nothing in this module mutates the filesystem. Classification is a
//! single `symlink_metadata` probe so each decision point looks at the path
//! exactly once.

use crate::error::{RelinkError, Result};
use crate::platform;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// What currently occupies a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Directory,
    /// A symbolic link; `target` is the raw link content when readable.
    Symlink { target: Option<PathBuf> },
}

impl PathKind {
    pub fn exists(&self) -> bool {
        !matches!(self, PathKind::Missing)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, PathKind::Symlink { .. })
    }
}

/// Strip surrounding whitespace and one layer of matching quotes.
///
/// Shells and file managers often hand over paths as `"C:\My Data"`; only a
/// matching pair is removed, so `"abc'` is left alone.
pub fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Turn user input into an absolute, normalized path.
///
/// The parent directory is canonicalized when it exists; the final
/// component is kept as given so that a symlink at the path is not followed.
pub fn normalize(raw: &str) -> Result<PathBuf> {
    let stripped = strip_quotes(raw);
    if stripped.is_empty() {
        return Err(RelinkError::Config {
            message: "empty path".to_string(),
        });
    }
    absolutize(Path::new(stripped))
}

/// Same as [`normalize`] for an already-typed path.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let lexical = lexical_normalize(&absolute);

    let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
        // Filesystem root
        return Ok(lexical);
    };
    match fs::canonicalize(parent) {
        Ok(parent) => Ok(platform::strip_verbatim_prefix(parent).join(name)),
        Err(_) => Ok(lexical),
    }
}

/// Validate a normalized path.
///
/// Fails with [`RelinkError::PathNotFound`] when `must_exist` is set and
/// nothing (not even a dangling link) is at `path`.
pub fn validate(path: &Path, must_exist: bool) -> Result<PathBuf> {
    let path = absolutize(path)?;
    if must_exist && !classify(&path).exists() {
        return Err(RelinkError::PathNotFound(path));
    }
    Ok(path)
}

/// Fail with [`RelinkError::UnrepresentablePath`] unless `path` is valid UTF-8.
///
/// The registry stores paths as TOML strings, so anything else could be
/// linked but never recorded.
pub fn require_utf8(path: &Path) -> Result<()> {
    match path.to_str() {
        Some(_) => Ok(()),
        None => Err(RelinkError::UnrepresentablePath(path.to_path_buf())),
    }
}

/// Classify the entry at `path` without following a final symlink.
pub fn classify(path: &Path) -> PathKind {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => PathKind::Symlink {
            target: fs::read_link(path).ok(),
        },
        Ok(meta) if meta.is_dir() => PathKind::Directory,
        Ok(_) => PathKind::File,
        Err(e) if e.kind() == io::ErrorKind::NotFound => PathKind::Missing,
        // Permission errors on an ancestor: something is there, we just
        // cannot tell what. Treat as a file so callers refuse to clobber it.
        Err(_) => PathKind::File,
    }
}

/// Comparison key for registry records.
///
/// Lexically normalized and case-folded on case-insensitive filesystems.
pub fn canonical_key(path: &Path) -> String {
    let normalized = lexical_normalize(path);
    let text = normalized.to_string_lossy();
    if platform::is_case_insensitive_fs() {
        text.to_lowercase()
    } else {
        text.into_owned()
    }
}

/// Whether two paths name the same entry under [`canonical_key`] rules.
pub fn same_key(a: &Path, b: &Path) -> bool {
    canonical_key(a) == canonical_key(b)
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` above the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
