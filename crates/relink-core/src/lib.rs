//! Relink Core - move files and directories elsewhere and leave links behind.
//!
//! A relocation moves a file or directory tree to a new location and
//! creates a symbolic link at the original path. Every link created this
//! way is kept in a TOML registry so it can be listed, checked against the
//! filesystem and deleted later.
//!
//! The library never prints. Progress and warnings go through a
//! [`Reporter`]; the default [`TracingReporter`] emits `tracing` records.
//!
//! # Example
//!
//! ```rust,ignore
//! use relink_core::Relinker;
//! use std::path::Path;
//!
//! fn main() -> relink_core::Result<()> {
//!     let mut relinker = Relinker::open_default()?;
//!
//!     let report = relinker.relocate_and_link(
//!         Path::new("/home/me/games"),
//!         Path::new("/mnt/storage"),
//!     )?;
//!     println!("{} -> {}", report.record.link.display(), report.record.target.display());
//!
//!     for diagnosis in relinker.status() {
//!         println!("{}: {}", diagnosis.record.link.display(), diagnosis.summary());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inspect;
pub mod link;
pub mod paths;
pub mod platform;
pub mod reconcile;
pub mod registry;
pub mod relocate;
pub mod reporter;

mod relinker;

// Re-export commonly used types
pub use config::{RegistryConfig, RelocationConfig};
pub use error::{RelinkError, Result};
pub use inspect::PathInfo;
pub use link::{LinkKind, LinkManager, LinkPrimitive};
pub use paths::PathKind;
pub use reconcile::{LinkDiagnosis, LinkStatus};
pub use registry::{LinkRecord, LinkRegistry, LoadStatus, RegistryStore, TomlFileStore};
pub use relocate::{
    BulkRelocator, FileMover, FsMover, MoveFailure, MoveOutcome, MovePreview, MoveStrategy,
    RelocationPlan,
};
pub use reporter::{RelinkEvent, Reporter, TracingReporter};

pub use relinker::{
    DeleteReport, LinkRemoval, RecordPurge, RelinkerBuilder, RelocationReport, Relinker,
};
