//! Platform link primitives.
//!
//! The primitive is a black box keyed by path and target: it either creates
//! or removes a link, or fails with the OS diagnostic. [`native`] selects the
//! implementation for the running platform once; everything above this
//! module is platform-agnostic.

use super::LinkKind;
use std::io;
use std::path::Path;

/// Create and remove symbolic links on a concrete platform.
pub trait LinkPrimitive: Send + Sync {
    /// Create a link at `link` resolving to `target`.
    ///
    /// `kind` describes the target; platforms that distinguish file and
    /// directory links use it to pick the link mode.
    fn create(&self, target: &Path, link: &Path, kind: LinkKind) -> io::Result<()>;

    /// Remove the link entry at `link` (never its target).
    fn remove(&self, link: &Path) -> io::Result<()>;

    /// Second removal strategy used when [`LinkPrimitive::remove`] fails.
    fn remove_fallback(&self, _link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no fallback removal on this platform",
        ))
    }
}

/// Select the primitive for the running platform.
pub fn native() -> Box<dyn LinkPrimitive> {
    #[cfg(unix)]
    {
        Box::new(UnixLinker)
    }
    #[cfg(windows)]
    {
        Box::new(WindowsLinker)
    }
}

/// POSIX symlinks: one link type for files and directories.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixLinker;

#[cfg(unix)]
impl LinkPrimitive for UnixLinker {
    fn create(&self, target: &Path, link: &Path, _kind: LinkKind) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    fn remove(&self, link: &Path) -> io::Result<()> {
        std::fs::remove_file(link)
    }
}

/// Windows symlinks: separate file and directory link modes.
///
/// A directory link is removed like a directory, so a failing
/// `remove_file` falls back to `remove_dir`.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsLinker;

#[cfg(windows)]
impl LinkPrimitive for WindowsLinker {
    fn create(&self, target: &Path, link: &Path, kind: LinkKind) -> io::Result<()> {
        match kind {
            LinkKind::Directory => std::os::windows::fs::symlink_dir(target, link),
            LinkKind::File => std::os::windows::fs::symlink_file(target, link),
        }
    }

    fn remove(&self, link: &Path) -> io::Result<()> {
        std::fs::remove_file(link)
    }

    fn remove_fallback(&self, link: &Path) -> io::Result<()> {
        std::fs::remove_dir(link)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unix_create_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        std::fs::create_dir(&target).unwrap();

        let linker = UnixLinker;
        linker.create(&target, &link, LinkKind::Directory).unwrap();
        assert_eq!(std::fs::read_link(&link).unwrap(), target);

        linker.remove(&link).unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(target.is_dir());
    }

    #[test]
    fn test_default_fallback_is_unsupported() {
        let err = UnixLinker.remove_fallback(Path::new("/nowhere")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
