use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::*;
use repo_session::commands::sync::{self, SyncOptions};
use repo_session::Config;
use tracing_subscriber::EnvFilter;

/// Exit code for failures outside the session itself (config, setup).
const SETUP_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(name = "repo-session")]
#[command(about = "Clone or open a git working copy, then check out, fetch tags and pull")]
#[command(version)]
struct Cli {
    /// Remote repository to clone
    #[arg(long)]
    remote_url: String,
    /// Working copy location; reused when it already holds a clone
    #[arg(long)]
    clone_dir: PathBuf,
    /// Branch to clone instead of the remote's default
    #[arg(long)]
    branch: Option<String>,
    /// Branch, tag or commit to check out
    #[arg(long = "ref", value_name = "REF")]
    reference: Option<String>,
    /// Pull the current branch's upstream
    #[arg(long)]
    pull: bool,
    /// Fetch every tag from the remote
    #[arg(long)]
    fetch_tags: bool,
    /// Settings file (defaults to ~/.repo-session.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print a JSON summary instead of status lines
    #[arg(long)]
    json: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    let options = SyncOptions {
        remote_url: cli.remote_url,
        clone_dir: cli.clone_dir,
        branch: cli.branch,
        reference: cli.reference,
        pull: cli.pull,
        fetch_tags: cli.fetch_tags,
        json: cli.json,
    };

    match sync::run(&options, &config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e.kind();
            if options.json {
                let body = serde_json::json!({ "error": kind, "message": e.to_string() });
                println!("{}", body);
            } else {
                eprintln!("{} {}", "✗".red().bold(), e);
            }
            ExitCode::from(kind.exit_code())
        }
    }
}
