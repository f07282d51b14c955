//! Drift detection between registry records and the filesystem.
//!
//! Read-only: diagnosing never creates, removes or rewrites anything.

use crate::paths::{self, PathKind};
use crate::registry::LinkRecord;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One problem found with a recorded link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Nothing exists at the link path
    LinkMissing,
    /// The link path holds a regular file or directory
    NotASymlink,
    /// The link resolves somewhere other than the recorded target
    TargetMismatch { actual: PathBuf },
    /// The link content could not be read
    ReadLinkFailed,
    /// The recorded target does not exist
    TargetMissing,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::LinkMissing => f.write_str("link missing"),
            LinkStatus::NotASymlink => f.write_str("not a symlink"),
            LinkStatus::TargetMismatch { actual } => {
                write!(f, "points elsewhere -> {}", actual.display())
            }
            LinkStatus::ReadLinkFailed => f.write_str("link unreadable"),
            LinkStatus::TargetMissing => f.write_str("target missing"),
        }
    }
}

/// Diagnosis of one record; an empty status list means healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDiagnosis {
    pub record: LinkRecord,
    pub statuses: Vec<LinkStatus>,
}

impl LinkDiagnosis {
    pub fn is_healthy(&self) -> bool {
        self.statuses.is_empty()
    }

    /// `ok`, or the statuses joined with ` | `.
    pub fn summary(&self) -> String {
        if self.is_healthy() {
            return "ok".to_string();
        }
        self.statuses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Compare one record against what is on disk.
pub fn diagnose(record: &LinkRecord) -> LinkDiagnosis {
    let mut statuses = Vec::new();

    match paths::classify(&record.link) {
        PathKind::Missing => statuses.push(LinkStatus::LinkMissing),
        PathKind::File | PathKind::Directory => statuses.push(LinkStatus::NotASymlink),
        PathKind::Symlink { target: None } => statuses.push(LinkStatus::ReadLinkFailed),
        PathKind::Symlink {
            target: Some(actual),
        } => {
            let resolved = resolve_link_content(&record.link, &actual);
            if !paths::same_key(&resolved, &record.target) {
                statuses.push(LinkStatus::TargetMismatch { actual });
            }
        }
    }

    if !paths::classify(&record.target).exists() {
        statuses.push(LinkStatus::TargetMissing);
    }

    LinkDiagnosis {
        record: record.clone(),
        statuses,
    }
}

/// Diagnose every record, preserving order.
pub fn diagnose_all(records: &[LinkRecord]) -> Vec<LinkDiagnosis> {
    records.iter().map(diagnose).collect()
}

/// Relative link content is relative to the directory holding the link.
fn resolve_link_content(link: &Path, content: &Path) -> PathBuf {
    if content.is_absolute() {
        return crate::platform::strip_verbatim_prefix(content.to_path_buf());
    }
    match link.parent() {
        Some(parent) => parent.join(content),
        None => content.to_path_buf(),
    }
}
