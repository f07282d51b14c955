//! Progress and diagnostic reporting.
//!
//! Core operations never print. They hand [`RelinkEvent`]s to an injected
//! [`Reporter`]; front ends decide how to present them. The default
//! [`TracingReporter`] turns events into log records.

use std::path::PathBuf;
use tracing::{info, warn};

/// Something worth telling the user while an operation runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RelinkEvent {
    /// The registry file could not be parsed and was replaced by an empty one.
    RegistryRecovered { path: PathBuf, reason: String },
    /// The privilege probe says link creation will probably fail.
    LinkPrivilegeMissing,
    /// A whole-tree rename was not possible; moving entry by entry.
    WalkFallback { source: PathBuf, reason: String },
    /// A single file could not be moved and was left in place.
    FileSkipped { path: PathBuf, reason: String },
    /// The source root still holds entries after a walk-based move.
    SourceResidue { path: PathBuf },
    /// A tree move finished (successfully or not).
    MoveFinished {
        moved: usize,
        total: usize,
        success_rate: f64,
    },
    /// Link creation failed after a move; moving data back.
    RollbackStarted { from: PathBuf, to: PathBuf },
}

/// Sink for [`RelinkEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: RelinkEvent);
}

/// Reporter that logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: RelinkEvent) {
        match event {
            RelinkEvent::RegistryRecovered { path, reason } => warn!(
                "Registry {} was unreadable and has been reset: {}",
                path.display(),
                reason
            ),
            RelinkEvent::LinkPrivilegeMissing => {
                warn!("This process may lack the privilege to create symbolic links")
            }
            RelinkEvent::WalkFallback { source, reason } => info!(
                "Could not move {} in one step ({}), moving entries individually",
                source.display(),
                reason
            ),
            RelinkEvent::FileSkipped { path, reason } => {
                warn!("Skipped {}: {}", path.display(), reason)
            }
            RelinkEvent::SourceResidue { path } => warn!(
                "Source {} is not empty after the move and was left in place",
                path.display()
            ),
            RelinkEvent::MoveFinished {
                moved,
                total,
                success_rate,
            } => info!(
                "Moved {}/{} files ({:.1}%)",
                moved, total, success_rate
            ),
            RelinkEvent::RollbackStarted { from, to } => warn!(
                "Rolling back: moving {} back to {}",
                from.display(),
                to.display()
            ),
        }
    }
}
