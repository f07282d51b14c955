//! Relink CLI - move files and directories behind symlinks.
//!
//! Thin front end over `relink-core`. Results go to stdout; log records go
//! to stderr.

mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use relink_core::{paths, platform, RelinkError, Relinker, RelocationConfig};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relink")]
#[command(about = "Move files elsewhere and leave symlinks behind", version)]
struct Args {
    /// Registry file (defaults to the user config directory)
    #[arg(long, global = true, env = "RELINK_REGISTRY")]
    registry: Option<PathBuf>,

    /// Minimum percentage of files a move must move to count as a success
    #[arg(long, global = true, default_value_t = RelocationConfig::DEFAULT_SUCCESS_THRESHOLD)]
    threshold: f64,

    /// Keep a .bak copy of the registry on every save
    #[arg(long, global = true)]
    keep_backup: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move SOURCE to DEST and leave a link at SOURCE
    Move { source: String, dest: String },
    /// Create LINK pointing at the existing TARGET
    Link { target: String, link: String },
    /// Remove a link and its registry record
    Unlink { link: String },
    /// List recorded links
    List {
        #[arg(long)]
        json: bool,
    },
    /// Compare recorded links with the filesystem
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Drop records whose link no longer exists
    Prune,
    /// Describe what is at PATH
    Info { path: String },
    /// Show what moving SOURCE to DEST would create
    Preview { source: String, dest: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG narrows or widens individual targets on top of the base level.
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let registry = match args.registry {
        Some(path) => paths::absolutize(&path)?,
        None => platform::default_registry_path()?,
    };
    debug!("Using registry {}", registry.display());

    let mut relinker = Relinker::builder(&registry)
        .success_threshold(args.threshold)
        .keep_backup(args.keep_backup)
        .build()
        .context("failed to initialise relink")?;

    match args.command {
        Command::Move { source, dest } => {
            let source = paths::normalize(&source)?;
            let dest = paths::normalize(&dest)?;
            match relinker.relocate_and_link(&source, &dest) {
                Ok(report) => output::print_relocation(&report),
                Err(RelinkError::MoveFailed { outcome, threshold }) => {
                    output::print_failures(&outcome);
                    bail!(
                        "moved {}/{} files ({:.1}%), below the {:.1}% threshold; nothing was linked",
                        outcome.moved_count,
                        outcome.total_count,
                        outcome.success_rate(),
                        threshold
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Link { target, link } => {
            let target = paths::normalize(&target)?;
            let link = paths::normalize(&link)?;
            let record = relinker.create_direct_link(&target, &link)?;
            println!(
                "Linked {} -> {}",
                record.link.display(),
                record.target.display()
            );
        }
        Command::Unlink { link } => {
            let link = paths::normalize(&link)?;
            let report = relinker.delete_link(&link)?;
            output::print_delete(&report);
            if !report.is_success() {
                bail!("could not fully remove {}", report.link.display());
            }
        }
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(relinker.list_links())?);
            } else {
                output::print_records(relinker.list_links());
            }
        }
        Command::Status { json } => {
            let diagnoses = relinker.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&output::status_lines(&diagnoses))?);
            } else {
                output::print_status(&diagnoses);
            }
        }
        Command::Prune => {
            let removed = relinker.prune_missing()?;
            for record in &removed {
                println!("Pruned {}", record.link.display());
            }
            println!("{} record(s) pruned", removed.len());
        }
        Command::Info { path } => {
            let info = relinker.inspect(&paths::normalize(&path)?)?;
            output::print_info(&info);
        }
        Command::Preview { source, dest } => {
            let source = paths::normalize(&source)?;
            let dest = paths::normalize(&dest)?;
            let (plan, preview) = relinker.preview(&source, &dest)?;
            output::print_preview(&plan, &preview);
        }
    }

    Ok(())
}
