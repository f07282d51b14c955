//! Descriptive information about a path, for display before acting on it.

use crate::paths::{self, PathKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Snapshot of what is at a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathInfo {
    pub path: PathBuf,
    /// `missing`, `file`, `directory` or `symlink`
    pub kind: &'static str,
    /// Raw link content when the path is a symlink
    pub link_target: Option<PathBuf>,
    /// Whether the link resolves to something, for symlinks
    pub target_exists: Option<bool>,
    /// Bytes of regular files, following a link at `path`
    pub size_bytes: u64,
    /// Regular files counted in `size_bytes`
    pub file_count: usize,
}

impl PathInfo {
    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Describe `path`. Unreadable entries inside a directory are skipped.
pub fn inspect(path: &Path) -> PathInfo {
    let kind = paths::classify(path);
    let mut info = PathInfo {
        path: path.to_path_buf(),
        kind: match kind {
            PathKind::Missing => "missing",
            PathKind::File => "file",
            PathKind::Directory => "directory",
            PathKind::Symlink { .. } => "symlink",
        },
        link_target: None,
        target_exists: None,
        size_bytes: 0,
        file_count: 0,
    };

    if let PathKind::Symlink { target } = &kind {
        info.link_target = target.clone();
        info.target_exists = Some(path.exists());
    }

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    info.file_count += 1;
                    info.size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
                }
            }
        }
        Ok(meta) => {
            info.file_count = 1;
            info.size_bytes = meta.len();
        }
        Err(_) => {}
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("a.bin"), vec![0u8; 1024]).unwrap();
        fs::write(temp_dir.path().join("sub/b.bin"), vec![0u8; 2048]).unwrap();

        let info = inspect(temp_dir.path());
        assert_eq!(info.kind, "directory");
        assert_eq!(info.file_count, 2);
        assert_eq!(info.size_bytes, 3072);
        assert!(info.link_target.is_none());
    }

    #[test]
    fn test_inspect_missing() {
        let temp_dir = TempDir::new().unwrap();
        let info = inspect(&temp_dir.path().join("nope"));
        assert_eq!(info.kind, "missing");
        assert_eq!(info.size_bytes, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_dangling_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(temp_dir.path().join("gone"), &link).unwrap();

        let info = inspect(&link);
        assert_eq!(info.kind, "symlink");
        assert_eq!(info.target_exists, Some(false));
        assert_eq!(info.link_target, Some(temp_dir.path().join("gone")));
    }
}
