//! Advisory probe for symlink creation rights.
//!
//! Windows only allows symlink creation for elevated processes or when
//! Developer Mode is enabled; Unix allows it for everyone, but read-only or
//! exotic filesystems can still refuse. Rather than guessing from the
//! process token, the probe creates a scratch link and reports whether that
//! worked. The answer is advisory: callers surface it as a warning and never
//! branch on it.

use crate::link::primitive::{native, LinkPrimitive};
use crate::link::LinkKind;
use std::path::Path;
use tracing::debug;

/// Check whether this process can create symbolic links in the system
/// temporary directory.
pub fn can_create_links() -> bool {
    match tempfile::TempDir::new() {
        Ok(dir) => probe_in(dir.path(), native().as_ref()),
        Err(e) => {
            debug!("Link capability probe could not create a scratch dir: {}", e);
            false
        }
    }
}

/// Run the probe inside an existing directory with a given primitive.
pub(crate) fn probe_in(dir: &Path, primitive: &dyn LinkPrimitive) -> bool {
    let target = dir.join("probe-target");
    let link = dir.join("probe-link");
    if let Err(e) = std::fs::write(&target, b"") {
        debug!("Link capability probe could not write {}: {}", target.display(), e);
        return false;
    }
    match primitive.create(&target, &link, LinkKind::File) {
        Ok(()) => {
            let _ = primitive.remove(&link);
            true
        }
        Err(reason) => {
            debug!("Link capability probe failed: {}", reason);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    struct RefusingPrimitive;

    impl LinkPrimitive for RefusingPrimitive {
        fn create(&self, _target: &Path, _link: &Path, _kind: LinkKind) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "privilege not held"))
        }

        fn remove(&self, _link: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_probe_reports_refusal() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!probe_in(temp_dir.path(), &RefusingPrimitive));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_succeeds_on_unix() {
        assert!(can_create_links());
    }
}
