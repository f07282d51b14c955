//! Human-readable and JSON rendering of core results.

use relink_core::{
    DeleteReport, LinkDiagnosis, LinkKind, LinkRecord, LinkRemoval, LinkStatus, MoveOutcome,
    MovePreview, PathInfo, RecordPurge, RelocationPlan, RelocationReport,
};
use serde::Serialize;
use std::path::Path;

/// Failures shown after a move before the rest is summarised.
const MAX_LISTED_FAILURES: usize = 20;

/// Flattened status row for `status --json`.
#[derive(Debug, Serialize)]
pub struct StatusLine<'a> {
    pub link: &'a Path,
    pub target: &'a Path,
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub healthy: bool,
    pub problems: &'a [LinkStatus],
}

pub fn status_lines(diagnoses: &[LinkDiagnosis]) -> Vec<StatusLine<'_>> {
    diagnoses
        .iter()
        .map(|d| StatusLine {
            link: &d.record.link,
            target: &d.record.target,
            kind: d.record.kind,
            healthy: d.is_healthy(),
            problems: &d.statuses,
        })
        .collect()
}

pub fn print_relocation(report: &RelocationReport) {
    let outcome = &report.outcome;
    println!(
        "Moved {}/{} files ({:.1}%)",
        outcome.moved_count,
        outcome.total_count,
        outcome.success_rate()
    );
    print_failures(outcome);
    println!(
        "Linked {} -> {}",
        report.record.link.display(),
        report.record.target.display()
    );
}

pub fn print_failures(outcome: &MoveOutcome) {
    for failure in outcome.failures.iter().take(MAX_LISTED_FAILURES) {
        println!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
    if outcome.failures.len() > MAX_LISTED_FAILURES {
        println!(
            "  ... and {} more",
            outcome.failures.len() - MAX_LISTED_FAILURES
        );
    }
}

pub fn print_delete(report: &DeleteReport) {
    match &report.link_removal {
        LinkRemoval::Removed { .. } => println!("Removed link {}", report.link.display()),
        LinkRemoval::Absent => println!("No link at {}", report.link.display()),
        LinkRemoval::Failed { reason } => {
            println!("Failed to remove {}: {}", report.link.display(), reason)
        }
    }
    match &report.record {
        RecordPurge::Purged => println!("Removed registry record"),
        RecordPurge::NoRecord => println!("No registry record"),
        RecordPurge::Skipped => println!("Registry record kept"),
        RecordPurge::Failed { reason } => println!("Failed to update registry: {reason}"),
    }
}

pub fn print_records(records: &[LinkRecord]) {
    if records.is_empty() {
        println!("No links recorded");
        return;
    }
    for record in records {
        println!(
            "{}  {:<9}  {} -> {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.kind.as_str(),
            record.link.display(),
            record.target.display()
        );
    }
}

pub fn print_status(diagnoses: &[LinkDiagnosis]) {
    if diagnoses.is_empty() {
        println!("No links recorded");
        return;
    }
    for diagnosis in diagnoses {
        println!(
            "[{}] {} -> {}",
            diagnosis.summary(),
            diagnosis.record.link.display(),
            diagnosis.record.target.display()
        );
    }
    let broken = diagnoses.iter().filter(|d| !d.is_healthy()).count();
    println!("{} link(s), {} with problems", diagnoses.len(), broken);
}

pub fn print_info(info: &PathInfo) {
    println!("Path: {}", info.path.display());
    println!("Type: {}", info.kind);
    if let Some(target) = &info.link_target {
        println!("Link target: {}", target.display());
    }
    if let Some(exists) = info.target_exists {
        println!("Target exists: {}", if exists { "yes" } else { "no" });
    }
    if info.kind != "missing" {
        println!(
            "Size: {:.2} MiB in {} file(s)",
            info.size_mib(),
            info.file_count
        );
    }
}

pub fn print_preview(plan: &RelocationPlan, preview: &MovePreview) {
    println!(
        "{} {} -> {}",
        plan.kind,
        plan.source.display(),
        plan.destination.display()
    );
    println!(
        "{} director(ies), {} file(s)",
        preview.total_dirs, preview.total_files
    );
    for dir in &preview.sample_dirs {
        println!("  dir  {}", dir.display());
    }
    if preview.hidden_dirs() > 0 {
        println!("  ... {} more directories", preview.hidden_dirs());
    }
    for file in &preview.sample_files {
        println!("  file {}", file.display());
    }
    if preview.hidden_files() > 0 {
        println!("  ... {} more files", preview.hidden_files());
    }
}
