//! The user-facing workflows: move-then-link, direct link, and link deletion.
//!
//! [`Relinker`] owns the registry and decides on rollback. Lower layers
//! report errors upward unchanged; the only compensating action is moving
//! relocated data back when the link cannot be created or recorded.

use crate::config::{self, RelocationConfig};
use crate::error::{RelinkError, Result};
use crate::inspect::{self, PathInfo};
use crate::link::{LinkKind, LinkManager, LinkPrimitive};
use crate::paths::{self, PathKind};
use crate::platform;
use crate::reconcile::{self, LinkDiagnosis};
use crate::registry::{LinkRecord, LinkRegistry, LoadStatus, RegistryStore, TomlFileStore};
use crate::relocate::{BulkRelocator, FileMover, FsMover, MoveOutcome, MovePreview, RelocationPlan};
use crate::reporter::{RelinkEvent, Reporter, TracingReporter};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Result of a successful relocate-and-link.
#[derive(Debug, Clone)]
pub struct RelocationReport {
    pub plan: RelocationPlan,
    pub outcome: MoveOutcome,
    pub record: LinkRecord,
}

/// What happened to the link itself during a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LinkRemoval {
    /// The link was removed; holds what it pointed to
    Removed { previous_target: Option<PathBuf> },
    /// Nothing was at the path
    Absent,
    Failed { reason: String },
}

/// What happened to the registry record during a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RecordPurge {
    Purged,
    NoRecord,
    /// Not attempted because the link is still on disk
    Skipped,
    Failed { reason: String },
}

/// Independent outcomes of [`Relinker::delete_link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub link: PathBuf,
    pub link_removal: LinkRemoval,
    pub record: RecordPurge,
}

impl DeleteReport {
    pub fn is_success(&self) -> bool {
        !matches!(self.link_removal, LinkRemoval::Failed { .. })
            && !matches!(self.record, RecordPurge::Failed { .. })
    }
}

/// Builder for configuring [`Relinker`] initialization.
///
/// # Example
///
/// ```rust,ignore
/// use relink_core::Relinker;
///
/// let mut relinker = Relinker::builder("/home/me/.config/relink/links.toml")
///     .success_threshold(95.0)
///     .keep_backup(true)
///     .build()?;
/// relinker.relocate_and_link("/data/cache".as_ref(), "/mnt/big/cache".as_ref())?;
/// ```
pub struct RelinkerBuilder {
    registry_path: PathBuf,
    success_threshold: f64,
    keep_backup: bool,
    preview_sample: usize,
    probe_privilege: bool,
    reporter: Arc<dyn Reporter>,
    linker: Option<Box<dyn LinkPrimitive>>,
    mover: Arc<dyn FileMover>,
    store: Option<Box<dyn RegistryStore>>,
}

impl RelinkerBuilder {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            success_threshold: RelocationConfig::DEFAULT_SUCCESS_THRESHOLD,
            keep_backup: false,
            preview_sample: RelocationConfig::PREVIEW_SAMPLE,
            probe_privilege: true,
            reporter: Arc::new(TracingReporter),
            linker: None,
            mover: Arc::new(FsMover),
            store: None,
        }
    }

    /// Minimum percentage of files a walk-based move must move.
    ///
    /// Default: `90.0`
    pub fn success_threshold(mut self, threshold: f64) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Keep `<registry>.bak` with the previous registry on every save.
    ///
    /// Default: `false`
    pub fn keep_backup(mut self, enable: bool) -> Self {
        self.keep_backup = enable;
        self
    }

    /// Number of destination paths listed by [`Relinker::preview`].
    ///
    /// Default: `50`
    pub fn preview_sample(mut self, sample: usize) -> Self {
        self.preview_sample = sample;
        self
    }

    /// Probe for link privilege before the first link is created.
    ///
    /// Default: `true`
    pub fn probe_privilege(mut self, enable: bool) -> Self {
        self.probe_privilege = enable;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the platform link primitive.
    pub fn linker(mut self, linker: Box<dyn LinkPrimitive>) -> Self {
        self.linker = Some(linker);
        self
    }

    /// Replace the file mover used for relocation and rollback.
    pub fn mover(mut self, mover: Arc<dyn FileMover>) -> Self {
        self.mover = mover;
        self
    }

    /// Replace the registry store; the registry path is ignored then.
    pub fn store(mut self, store: Box<dyn RegistryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the relinker, loading the registry once.
    pub fn build(self) -> Result<Relinker> {
        let threshold = config::validate_threshold(self.success_threshold)?;

        let store = self.store.unwrap_or_else(|| {
            Box::new(TomlFileStore::new(&self.registry_path).with_backup(self.keep_backup))
        });
        let registry = LinkRegistry::open(store);
        if let LoadStatus::Recovered(error) = registry.load_status() {
            self.reporter.report(RelinkEvent::RegistryRecovered {
                path: registry.location(),
                reason: error.to_string(),
            });
        }

        let links = match self.linker {
            Some(linker) => LinkManager::new(linker),
            None => LinkManager::native(),
        };
        let relocator =
            BulkRelocator::new(self.mover, self.reporter.clone()).with_threshold(threshold);

        debug!(
            "Relinker ready on {}: registry {} ({} records), threshold {:.1}%",
            platform::current_platform(),
            registry.location().display(),
            registry.len(),
            threshold
        );

        Ok(Relinker {
            links,
            registry,
            relocator,
            reporter: self.reporter,
            preview_sample: self.preview_sample,
            probe_privilege: self.probe_privilege,
            can_link: OnceLock::new(),
        })
    }
}

/// Composes path resolution, relocation, linking and the registry.
pub struct Relinker {
    links: LinkManager,
    registry: LinkRegistry,
    relocator: BulkRelocator,
    reporter: Arc<dyn Reporter>,
    preview_sample: usize,
    probe_privilege: bool,
    /// Probed on first use
    can_link: OnceLock<bool>,
}

impl Relinker {
    pub fn builder(registry_path: impl Into<PathBuf>) -> RelinkerBuilder {
        RelinkerBuilder::new(registry_path)
    }

    /// Relinker over the default registry location with default options.
    pub fn open_default() -> Result<Self> {
        Self::builder(platform::default_registry_path()?).build()
    }

    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    /// Advisory result of the privilege probe, run once on first use.
    pub fn link_capability(&self) -> bool {
        *self
            .can_link
            .get_or_init(|| !self.probe_privilege || platform::can_create_links())
    }

    /// Move `source` to `destination` and leave a link at `source`.
    ///
    /// Nothing is linked or recorded when the move falls below the success
    /// threshold; files already moved stay at the destination. When the
    /// link cannot be created or recorded after a successful move, the data
    /// is moved back once. Destination parents created for the move are
    /// removed again on failure if they are still empty.
    pub fn relocate_and_link(
        &mut self,
        source: &Path,
        destination: &Path,
    ) -> Result<RelocationReport> {
        let source = paths::validate(source, true)?;
        let destination = paths::absolutize(destination)?;
        let plan = RelocationPlan::resolve(&source, &destination)?;
        info!(
            "Relocating {} {} -> {}",
            plan.kind,
            plan.source.display(),
            plan.destination.display()
        );
        self.warn_if_unprivileged();

        let parent = plan.destination.parent().map(Path::to_path_buf);
        let created = parent.as_deref().and_then(first_missing_ancestor);

        match self.relocate_planned(&plan) {
            Ok((outcome, record)) => {
                info!(
                    "Linked {} -> {}",
                    record.link.display(),
                    record.target.display()
                );
                Ok(RelocationReport {
                    plan,
                    outcome,
                    record,
                })
            }
            Err(e) => {
                if let (Some(parent), Some(created)) = (parent, created) {
                    remove_empty_parents(&parent, &created);
                }
                Err(e)
            }
        }
    }

    fn relocate_planned(&mut self, plan: &RelocationPlan) -> Result<(MoveOutcome, LinkRecord)> {
        let outcome = match plan.kind {
            LinkKind::Directory => {
                if let Some(parent) = plan.destination.parent() {
                    fs::create_dir_all(parent).map_err(|e| RelinkError::io_with_path(e, parent))?;
                }
                self.relocator.move_tree(&plan.source, &plan.destination)?
            }
            LinkKind::File => self.relocator.move_file(&plan.source, &plan.destination)?,
        };
        let outcome = self.relocator.check(outcome)?;

        let kind = match self.links.create(&plan.destination, &plan.source) {
            Ok(kind) => kind,
            Err(link_error) => {
                let reason = match link_error {
                    RelinkError::LinkCreation { reason, .. } => reason,
                    other => other.to_string(),
                };
                return Err(match self.move_back(plan) {
                    Ok(()) => RelinkError::LinkCreation {
                        link: plan.source.clone(),
                        target: plan.destination.clone(),
                        reason,
                        rolled_back: true,
                    },
                    Err(rollback_error) => self.unrecoverable(plan, reason, rollback_error),
                });
            }
        };

        match self.registry.upsert(&plan.source, &plan.destination, kind) {
            Ok(record) => Ok((outcome, record)),
            Err(save_error) => Err(self.undo_unrecorded(plan, save_error)),
        }
    }

    /// Create a link at `link` resolving to the existing `target`.
    ///
    /// No data is moved; `link` must not exist.
    pub fn create_direct_link(&mut self, target: &Path, link: &Path) -> Result<LinkRecord> {
        let target = paths::validate(target, true)?;
        let link = paths::absolutize(link)?;
        if paths::classify(&link).exists() {
            return Err(RelinkError::PathAlreadyExists(link));
        }
        paths::require_utf8(&target)?;
        paths::require_utf8(&link)?;
        self.warn_if_unprivileged();

        let kind = self.links.create(&target, &link)?;
        self.registry.upsert(&link, &target, kind).map_err(|e| {
            let reason = e.to_string();
            let rolled_back = match self.links.remove_classified(&link) {
                Ok(()) => true,
                Err(remove_error) => {
                    warn!("Unrecorded link {} left in place: {}", link.display(), remove_error);
                    false
                }
            };
            RelinkError::NotRecorded {
                link: link.clone(),
                reason,
                rolled_back,
            }
        })
    }

    /// Delete the link at `link` and its registry record.
    ///
    /// - nothing at the path: only the stale record is purged
    /// - a real file or directory: [`RelinkError::NotASymlink`], nothing changes
    /// - a link: it is removed, then the record is purged
    pub fn delete_link(&mut self, link: &Path) -> Result<DeleteReport> {
        let link = paths::absolutize(link)?;

        let (link_removal, record) = match paths::classify(&link) {
            PathKind::Missing => {
                debug!("{} is gone, purging stale record only", link.display());
                (LinkRemoval::Absent, self.purge_record(&link))
            }
            PathKind::File | PathKind::Directory => {
                return Err(RelinkError::NotASymlink(link));
            }
            PathKind::Symlink { target } => match self.links.remove_classified(&link) {
                Ok(()) => (
                    LinkRemoval::Removed {
                        previous_target: target,
                    },
                    self.purge_record(&link),
                ),
                Err(e) => (
                    LinkRemoval::Failed {
                        reason: e.to_string(),
                    },
                    RecordPurge::Skipped,
                ),
            },
        };

        Ok(DeleteReport {
            link,
            link_removal,
            record,
        })
    }

    /// All recorded links in registry order.
    pub fn list_links(&self) -> &[LinkRecord] {
        self.registry.list()
    }

    /// Compare every record with the filesystem.
    pub fn status(&self) -> Vec<LinkDiagnosis> {
        reconcile::diagnose_all(self.registry.list())
    }

    /// Drop records whose link path no longer exists.
    pub fn prune_missing(&mut self) -> Result<Vec<LinkRecord>> {
        let removed = self
            .registry
            .retain(|record| paths::classify(&record.link).exists())?;
        if !removed.is_empty() {
            info!("Pruned {} stale records", removed.len());
        }
        Ok(removed)
    }

    /// Describe what is at `path`.
    pub fn inspect(&self, path: &Path) -> Result<PathInfo> {
        Ok(inspect::inspect(&paths::absolutize(path)?))
    }

    /// Resolve the plan for a relocation and list what it would create.
    pub fn preview(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(RelocationPlan, MovePreview)> {
        let source = paths::validate(source, true)?;
        let destination = paths::absolutize(destination)?;
        let plan = RelocationPlan::resolve(&source, &destination)?;
        let preview = self
            .relocator
            .preview(&plan.source, &plan.destination, self.preview_sample);
        Ok((plan, preview))
    }

    fn purge_record(&mut self, link: &Path) -> RecordPurge {
        match self.registry.remove(link) {
            Ok(true) => RecordPurge::Purged,
            Ok(false) => RecordPurge::NoRecord,
            Err(e) => RecordPurge::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn warn_if_unprivileged(&self) {
        if !self.link_capability() {
            self.reporter.report(RelinkEvent::LinkPrivilegeMissing);
        }
    }

    /// Remove a link whose record could not be saved, then move the data back.
    fn undo_unrecorded(&self, plan: &RelocationPlan, save_error: RelinkError) -> RelinkError {
        let reason = save_error.to_string();
        if let Err(remove_error) = self.links.remove_classified(&plan.source) {
            warn!(
                "Unrecorded link {} left in place: {}",
                plan.source.display(),
                remove_error
            );
            return RelinkError::NotRecorded {
                link: plan.source.clone(),
                reason,
                rolled_back: false,
            };
        }

        match self.move_back(plan) {
            Ok(()) => RelinkError::NotRecorded {
                link: plan.source.clone(),
                reason,
                rolled_back: true,
            },
            Err(rollback_error) => self.unrecoverable(
                plan,
                format!("registry update failed: {reason}"),
                rollback_error,
            ),
        }
    }

    /// Move relocated data back to the source path.
    ///
    /// Succeeds only when every file is back and the destination is gone.
    fn move_back(&self, plan: &RelocationPlan) -> std::result::Result<(), String> {
        self.reporter.report(RelinkEvent::RollbackStarted {
            from: plan.destination.clone(),
            to: plan.source.clone(),
        });

        let result = match plan.kind {
            LinkKind::Directory => self.relocator.move_tree(&plan.destination, &plan.source),
            LinkKind::File => self.relocator.move_file(&plan.destination, &plan.source),
        };

        match result {
            Ok(outcome) if outcome.is_complete() => {
                info!("Rolled back {}", plan.source.display());
                Ok(())
            }
            Ok(outcome) => Err(match outcome.failures.first() {
                Some(first) => format!(
                    "{} of {} files moved back; first failure {}: {}",
                    outcome.moved_count,
                    outcome.total_count,
                    first.path.display(),
                    first.reason
                ),
                None => format!(
                    "{} of {} files moved back; {} was not emptied",
                    outcome.moved_count,
                    outcome.total_count,
                    plan.destination.display()
                ),
            }),
            Err(e) => Err(e.to_string()),
        }
    }

    fn unrecoverable(
        &self,
        plan: &RelocationPlan,
        link_error: String,
        rollback_error: String,
    ) -> RelinkError {
        RelinkError::UnrecoverableRollbackFailure {
            source_path: plan.source.clone(),
            destination: plan.destination.clone(),
            link_error,
            rollback_error,
        }
    }
}

/// Topmost ancestor of `path`, itself included, that does not exist yet.
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    let mut missing = None;
    for ancestor in path.ancestors() {
        if paths::classify(ancestor).exists() {
            break;
        }
        missing = Some(ancestor.to_path_buf());
    }
    missing
}

/// Remove `leaf` and its parents up to and including `top` while they are empty.
fn remove_empty_parents(leaf: &Path, top: &Path) {
    for dir in leaf.ancestors() {
        if !dir.starts_with(top) || fs::remove_dir(dir).is_err() {
            break;
        }
        debug!("Removed empty directory {}", dir.display());
    }
}

impl std::fmt::Debug for Relinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relinker")
            .field("registry", &self.registry)
            .field("relocator", &self.relocator)
            .field("can_link", &self.can_link)
            .finish_non_exhaustive()
    }
}
