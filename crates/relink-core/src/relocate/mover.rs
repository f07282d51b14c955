//! Low-level move operations used by the relocator.

use std::fs;
use std::io;
use std::path::Path;

/// File operations the relocator is built from.
///
/// The default [`FsMover`] talks to the real filesystem; other
/// implementations let the skip-and-continue policy be exercised without
/// needing unmovable files.
pub trait FileMover: Send + Sync {
    /// Move a whole entry (file or directory tree) in one step.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Move a single non-directory entry, crossing volumes if needed.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileMover`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl FileMover for FsMover {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    /// Rename, falling back to copy-then-delete.
    ///
    /// If the original cannot be deleted after copying, the copy is removed
    /// again so each file lives in exactly one place.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let rename_err = match fs::rename(from, to) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let meta = fs::symlink_metadata(from)?;
        if meta.file_type().is_symlink() {
            return Err(io::Error::new(
                rename_err.kind(),
                format!("cannot move symbolic link: {rename_err}"),
            ));
        }

        fs::copy(from, to)?;
        if let Err(e) = fs::remove_file(from) {
            let _ = fs::remove_file(to);
            return Err(e);
        }
        Ok(())
    }
}
