//! Dry-run listing of what a relocation will create.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Destination paths a move would produce, sampled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MovePreview {
    pub destination: PathBuf,
    pub total_dirs: usize,
    pub total_files: usize,
    /// Up to `sample` destination directories, in walk order
    pub sample_dirs: Vec<PathBuf>,
    /// Up to `sample` destination files, in walk order
    pub sample_files: Vec<PathBuf>,
}

impl MovePreview {
    pub(crate) fn build(source: &Path, destination: &Path, sample: usize) -> Self {
        let mut preview = MovePreview {
            destination: destination.to_path_buf(),
            ..MovePreview::default()
        };

        if !source.is_dir() {
            preview.total_files = 1;
            if sample > 0 {
                preview.sample_files.push(destination.to_path_buf());
            }
            return preview;
        }

        for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = destination.join(relative);
            if entry.file_type().is_dir() {
                preview.total_dirs += 1;
                if preview.sample_dirs.len() < sample {
                    preview.sample_dirs.push(target);
                }
            } else {
                preview.total_files += 1;
                if preview.sample_files.len() < sample {
                    preview.sample_files.push(target);
                }
            }
        }
        preview
    }

    /// Directories not shown in the sample.
    pub fn hidden_dirs(&self) -> usize {
        self.total_dirs.saturating_sub(self.sample_dirs.len())
    }

    /// Files not shown in the sample.
    pub fn hidden_files(&self) -> usize {
        self.total_files.saturating_sub(self.sample_files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_preview_directory_counts_and_samples() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        fs::create_dir_all(source.join("a/b")).unwrap();
        for i in 0..5 {
            fs::write(source.join("a").join(format!("{i}.txt")), "x").unwrap();
        }

        let destination = temp_dir.path().join("dst");
        let preview = MovePreview::build(&source, &destination, 3);
        // root, a, a/b
        assert_eq!(preview.total_dirs, 3);
        assert_eq!(preview.total_files, 5);
        assert_eq!(preview.sample_files.len(), 3);
        assert_eq!(preview.hidden_files(), 2);
        assert_eq!(preview.hidden_dirs(), 0);
        assert_eq!(preview.sample_dirs[0], destination);
        assert!(preview.sample_files.iter().all(|p| p.starts_with(&destination)));
    }

    #[test]
    fn test_preview_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("file.txt");
        fs::write(&source, "x").unwrap();

        let preview = MovePreview::build(&source, Path::new("/store/file.txt"), 10);
        assert_eq!(preview.total_files, 1);
        assert_eq!(preview.total_dirs, 0);
        assert_eq!(preview.sample_files, vec![PathBuf::from("/store/file.txt")]);
    }
}
