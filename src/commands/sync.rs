use std::path::PathBuf;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;

use crate::core::{Config, OpenOutcome, RepositorySession, SessionError};
use crate::engine::{GitCli, VcsEngine};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub remote_url: String,
    pub clone_dir: PathBuf,
    pub branch: Option<String>,
    pub reference: Option<String>,
    pub pull: bool,
    pub fetch_tags: bool,
    pub json: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub remote_url: String,
    pub clone_dir: PathBuf,
    pub outcome: OpenOutcome,
    pub checked_out: Option<String>,
    pub fetched_tags: bool,
    pub pulled: bool,
    pub head: String,
}

pub async fn run(options: &SyncOptions, config: &Config) -> Result<SyncReport, SessionError> {
    let mut session = RepositorySession::with_engine(
        &options.remote_url,
        &options.clone_dir,
        GitCli::from_config(config),
    );

    let pb = spinner(!options.json);
    let result = execute(&mut session, options, &pb).await;
    pb.finish_and_clear();
    let report = result?;

    if options.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "failed to serialize report"),
        }
    } else {
        print_report(&report);
    }

    Ok(report)
}

/// Drive the session through the requested steps in lifecycle order:
/// open-or-clone, checkout, fetch tags, pull, read HEAD. The first failure
/// stops the run.
pub async fn execute<E: VcsEngine>(
    session: &mut RepositorySession<E>,
    options: &SyncOptions,
    pb: &ProgressBar,
) -> Result<SyncReport, SessionError> {
    pb.set_message(format!("Opening {}...", options.clone_dir.display()));
    let outcome = session.open_or_clone(options.branch.as_deref()).await?;

    if let Some(reference) = &options.reference {
        pb.set_message(format!("Checking out '{}'...", reference));
        session.checkout(reference).await?;
    }

    if options.fetch_tags {
        pb.set_message("Fetching tags...");
        session.fetch_all_tags().await?;
    }

    if options.pull {
        pb.set_message("Pulling latest changes...");
        session.pull_latest().await?;
    }

    let head = session.current_commit_hash().await?;

    Ok(SyncReport {
        remote_url: session.remote_url().to_string(),
        clone_dir: session.working_path().to_path_buf(),
        outcome,
        checked_out: options.reference.clone(),
        fetched_tags: options.fetch_tags,
        pulled: options.pull,
        head,
    })
}

fn spinner(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_report(report: &SyncReport) {
    match report.outcome {
        OpenOutcome::Cloned => println!(
            "{} Cloned {} into {}",
            "✓".green().bold(),
            report.remote_url.bright_yellow(),
            report.clone_dir.display()
        ),
        OpenOutcome::Attached => println!(
            "{} Repository already exists at {}",
            "✓".green().bold(),
            report.clone_dir.display()
        ),
    }

    if let Some(reference) = &report.checked_out {
        println!("{} Checked out '{}'", "✓".green().bold(), reference.bright_yellow());
    }
    if report.fetched_tags {
        println!("{} Fetched all tags", "✓".green().bold());
    }
    if report.pulled {
        println!("{} Pulled latest changes", "✓".green().bold());
    }

    println!("Current commit hash: {}", report.head.bright_cyan());
}
