//! Bulk relocation of files and directory trees.
//!
//! A tree is first moved with a single rename. When that is not possible
//! (different volume, locked entry) the relocator walks the tree and moves
//! each file on its own, skipping files that fail. The move counts as
//! successful when the share of moved files reaches the configured
//! threshold; files already moved stay at the destination either way.

mod mover;
mod plan;
mod preview;

pub use mover::{FileMover, FsMover};
pub use plan::RelocationPlan;
pub use preview::MovePreview;

use crate::config::RelocationConfig;
use crate::error::{RelinkError, Result};
use crate::reporter::{RelinkEvent, Reporter};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// How a move was carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStrategy {
    /// Single rename of the whole entry
    #[default]
    Rename,
    /// Entry-by-entry walk
    Walk,
}

/// A file that could not be moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Statistics of a finished move.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub moved_count: usize,
    pub total_count: usize,
    pub failures: Vec<MoveFailure>,
    pub strategy: MoveStrategy,
    /// The source root was left behind because it still holds entries.
    pub residue: bool,
}

impl MoveOutcome {
    /// Percentage of files moved; 100 when there was nothing to move.
    pub fn success_rate(&self) -> f64 {
        if self.total_count == 0 {
            100.0
        } else {
            self.moved_count as f64 * 100.0 / self.total_count as f64
        }
    }

    pub fn is_success(&self, threshold: f64) -> bool {
        self.success_rate() >= threshold
    }

    /// True when every file moved and nothing was left behind.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.residue && self.moved_count == self.total_count
    }

    fn skip(&mut self, path: PathBuf, reason: String, reporter: &dyn Reporter) {
        reporter.report(RelinkEvent::FileSkipped {
            path: path.clone(),
            reason: reason.clone(),
        });
        self.failures.push(MoveFailure { path, reason });
    }
}

/// Moves trees and files with a skip-and-continue policy.
pub struct BulkRelocator {
    mover: Arc<dyn FileMover>,
    reporter: Arc<dyn Reporter>,
    threshold: f64,
}

impl BulkRelocator {
    pub fn new(mover: Arc<dyn FileMover>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            mover,
            reporter,
            threshold: RelocationConfig::DEFAULT_SUCCESS_THRESHOLD,
        }
    }

    /// Set the success threshold in percent.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Move the tree at `source` to `destination`.
    ///
    /// Returns the outcome whether or not it meets the threshold; use
    /// [`BulkRelocator::check`] to turn a below-threshold outcome into an
    /// error. Only failing to create the destination root is fatal.
    pub fn move_tree(&self, source: &Path, destination: &Path) -> Result<MoveOutcome> {
        let total = count_files(source);

        let rename_err = match self.mover.rename(source, destination) {
            Ok(()) => {
                let outcome = MoveOutcome {
                    moved_count: total,
                    total_count: total,
                    strategy: MoveStrategy::Rename,
                    ..MoveOutcome::default()
                };
                self.finish(&outcome);
                return Ok(outcome);
            }
            Err(e) => e,
        };
        self.reporter.report(RelinkEvent::WalkFallback {
            source: source.to_path_buf(),
            reason: rename_err.to_string(),
        });

        fs::create_dir_all(destination).map_err(|e| RelinkError::io_with_path(e, destination))?;

        let mut outcome = MoveOutcome {
            total_count: total,
            strategy: MoveStrategy::Walk,
            ..MoveOutcome::default()
        };

        for entry in WalkDir::new(source).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source).to_path_buf();
                    outcome.skip(path, e.to_string(), self.reporter.as_ref());
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = destination.join(relative);

            if entry.file_type().is_dir() {
                // Mirrored now so empty directories survive the move.
                if let Err(e) = fs::create_dir_all(&target) {
                    debug!("Could not mirror {}: {}", target.display(), e);
                }
                continue;
            }

            if let Some(parent) = target.parent() {
                if !parent.is_dir() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        outcome.skip(
                            entry.path().to_path_buf(),
                            format!("cannot create {}: {}", parent.display(), e),
                            self.reporter.as_ref(),
                        );
                        continue;
                    }
                }
            }

            match self.mover.move_file(entry.path(), &target) {
                Ok(()) => outcome.moved_count += 1,
                Err(e) => outcome.skip(
                    entry.path().to_path_buf(),
                    e.to_string(),
                    self.reporter.as_ref(),
                ),
            }
        }

        outcome.residue = !remove_empty_dirs(source);
        if outcome.residue {
            self.reporter.report(RelinkEvent::SourceResidue {
                path: source.to_path_buf(),
            });
        }

        self.finish(&outcome);
        Ok(outcome)
    }

    /// Move a single file, creating the destination's parent directories.
    pub fn move_file(&self, source: &Path, destination: &Path) -> Result<MoveOutcome> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| RelinkError::io_with_path(e, parent))?;
        }

        let mut outcome = MoveOutcome {
            total_count: 1,
            strategy: MoveStrategy::Rename,
            ..MoveOutcome::default()
        };
        match self.mover.move_file(source, destination) {
            Ok(()) => outcome.moved_count = 1,
            Err(e) => outcome.skip(source.to_path_buf(), e.to_string(), self.reporter.as_ref()),
        }
        self.finish(&outcome);
        Ok(outcome)
    }

    /// Fail with [`RelinkError::MoveFailed`] when `outcome` is below the threshold.
    pub fn check(&self, outcome: MoveOutcome) -> Result<MoveOutcome> {
        if outcome.is_success(self.threshold) {
            Ok(outcome)
        } else {
            Err(RelinkError::MoveFailed {
                outcome,
                threshold: self.threshold,
            })
        }
    }

    /// List what a move would create, without moving anything.
    pub fn preview(&self, source: &Path, destination: &Path, sample: usize) -> MovePreview {
        MovePreview::build(source, destination, sample)
    }

    fn finish(&self, outcome: &MoveOutcome) {
        self.reporter.report(RelinkEvent::MoveFinished {
            moved: outcome.moved_count,
            total: outcome.total_count,
            success_rate: outcome.success_rate(),
        });
    }
}

impl std::fmt::Debug for BulkRelocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkRelocator")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// Count non-directory entries under `root`. Unreadable entries count once
/// each so they show up as failures later instead of vanishing.
fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter(|entry| match entry {
            Ok(entry) => !entry.file_type().is_dir(),
            Err(_) => true,
        })
        .count()
}

/// Remove empty directories under `root` bottom-up, then `root` itself.
///
/// Returns `true` when `root` is gone afterwards.
fn remove_empty_dirs(root: &Path) -> bool {
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            // Fails harmlessly on non-empty directories.
            let _ = fs::remove_dir(entry.path());
        }
    }
    match fs::remove_dir(root) {
        Ok(()) => true,
        Err(_) => !root.exists(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testing::CollectingReporter;
    use crate::reporter::TracingReporter;
    use std::collections::HashSet;
    use std::io;
    use tempfile::TempDir;

    /// Mover that never renames whole trees and refuses listed file names.
    struct SelectiveMover {
        refused: HashSet<String>,
    }

    impl SelectiveMover {
        fn refusing(names: impl IntoIterator<Item = String>) -> Self {
            Self {
                refused: names.into_iter().collect(),
            }
        }
    }

    impl FileMover for SelectiveMover {
        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "cross-device link"))
        }

        fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
            let name = from.file_name().unwrap().to_string_lossy().to_string();
            if self.refused.contains(&name) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "file is locked",
                ));
            }
            FsMover.move_file(from, to)
        }
    }

    fn build_tree(root: &Path, files: usize) {
        for i in 0..files {
            let dir = root.join(format!("group{}", i % 4)).join("nested");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("file{i:03}.bin")), format!("{i}")).unwrap();
        }
    }

    fn relocator_with(mover: impl FileMover + 'static) -> BulkRelocator {
        BulkRelocator::new(Arc::new(mover), Arc::new(TracingReporter))
    }

    #[test]
    fn test_success_rate_edges() {
        assert_eq!(MoveOutcome::default().success_rate(), 100.0);
        let outcome = MoveOutcome {
            moved_count: 9,
            total_count: 10,
            ..MoveOutcome::default()
        };
        assert_eq!(outcome.success_rate(), 90.0);
        assert!(outcome.is_success(90.0));
        assert!(!outcome.is_success(90.5));
    }

    #[test]
    fn test_rename_path_moves_whole_tree() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        build_tree(&source, 8);

        let outcome = relocator_with(FsMover)
            .move_tree(&source, &destination)
            .unwrap();
        assert_eq!(outcome.strategy, MoveStrategy::Rename);
        assert_eq!(outcome.moved_count, 8);
        assert_eq!(outcome.total_count, 8);
        assert!(outcome.is_complete());
        assert!(!source.exists());
        assert!(destination.join("group0/nested/file000.bin").is_file());
    }

    #[test]
    fn test_walk_fallback_moves_everything_and_cleans_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        build_tree(&source, 12);
        fs::create_dir_all(source.join("empty/deeper")).unwrap();

        let outcome = relocator_with(SelectiveMover::refusing(Vec::new()))
            .move_tree(&source, &destination)
            .unwrap();
        assert_eq!(outcome.strategy, MoveStrategy::Walk);
        assert_eq!(outcome.moved_count, 12);
        assert!(outcome.is_complete());
        assert!(!source.exists());
        assert!(destination.join("empty/deeper").is_dir());
    }

    #[test]
    fn test_five_failures_in_hundred_is_success() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        build_tree(&source, 100);

        let refused = (0..5).map(|i| format!("file{i:03}.bin"));
        let reporter = CollectingReporter::default();
        let relocator = BulkRelocator::new(
            Arc::new(SelectiveMover::refusing(refused)),
            Arc::new(reporter.clone()),
        );

        let outcome = relocator.move_tree(&source, &destination).unwrap();
        assert_eq!(outcome.total_count, 100);
        assert_eq!(outcome.moved_count, 95);
        assert_eq!(outcome.success_rate(), 95.0);
        assert_eq!(outcome.failures.len(), 5);
        assert!(outcome.residue);
        assert!(relocator.check(outcome).is_ok());

        let skipped = reporter
            .events()
            .into_iter()
            .filter(|e| matches!(e, RelinkEvent::FileSkipped { .. }))
            .count();
        assert_eq!(skipped, 5);
        // Refused files stay where they were.
        assert!(source.join("group0/nested/file000.bin").is_file());
    }

    #[test]
    fn test_fifteen_failures_in_hundred_is_failure() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        build_tree(&source, 100);

        let refused = (0..15).map(|i| format!("file{i:03}.bin"));
        let relocator = relocator_with(SelectiveMover::refusing(refused));
        let outcome = relocator.move_tree(&source, &destination).unwrap();
        assert_eq!(outcome.success_rate(), 85.0);

        let moved_files = WalkDir::new(&destination)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        assert_eq!(moved_files, 85);

        match relocator.check(outcome) {
            Err(RelinkError::MoveFailed { outcome, threshold }) => {
                assert_eq!(outcome.moved_count, 85);
                assert_eq!(threshold, 90.0);
            }
            other => panic!("expected MoveFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_is_configurable() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        build_tree(&source, 100);

        let refused = (0..15).map(|i| format!("file{i:03}.bin"));
        let relocator = relocator_with(SelectiveMover::refusing(refused)).with_threshold(80.0);
        let outcome = relocator.move_tree(&source, &destination).unwrap();
        assert!(relocator.check(outcome).is_ok());
    }

    #[test]
    fn test_unwritable_destination_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        build_tree(&source, 3);
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = relocator_with(SelectiveMover::refusing(Vec::new()))
            .move_tree(&source, &blocker.join("dst"))
            .unwrap_err();
        assert!(matches!(err, RelinkError::Io { .. }));
        // Nothing moved.
        assert_eq!(count_files(&source), 3);
    }

    #[test]
    fn test_empty_tree_is_full_success() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).unwrap();

        let outcome = relocator_with(SelectiveMover::refusing(Vec::new()))
            .move_tree(&source, &temp_dir.path().join("dst"))
            .unwrap();
        assert_eq!(outcome.total_count, 0);
        assert_eq!(outcome.success_rate(), 100.0);
        assert!(!source.exists());
    }

    #[test]
    fn test_move_single_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("file.txt");
        fs::write(&source, "x").unwrap();
        let destination = temp_dir.path().join("a/b/file.txt");

        let outcome = relocator_with(FsMover).move_file(&source, &destination).unwrap();
        assert_eq!(outcome.moved_count, 1);
        assert!(destination.is_file());
    }

    #[test]
    fn test_move_single_file_failure_is_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("locked.txt");
        fs::write(&source, "x").unwrap();

        let relocator =
            relocator_with(SelectiveMover::refusing(vec!["locked.txt".to_string()]));
        let outcome = relocator
            .move_file(&source, &temp_dir.path().join("out/locked.txt"))
            .unwrap();
        assert_eq!(outcome.moved_count, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(relocator.check(outcome).is_err());
    }
}
