//! [`VcsEngine`] backed by the system `git` binary.
//!
//! Each capability is one `git` invocation run through
//! [`tokio::process::Command`]. Prompts are disabled so a missing credential
//! fails the command instead of hanging it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{EngineError, VcsEngine};
use crate::core::config::{Config, PullMode};

#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    pull_mode: PullMode,
    quiet: bool,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.git_binary.clone(),
            pull_mode: config.pull_mode,
            quiet: config.quiet,
        }
    }

    fn clone_args(&self, remote_url: &str, dest: &Path, branch: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["clone".into()];
        if self.quiet {
            args.push("--quiet".into());
        }
        if let Some(branch) = branch {
            args.push("--branch".into());
            args.push(branch.into());
        }
        args.push("--".into());
        args.push(remote_url.into());
        args.push(dest.into());
        args
    }

    fn pull_args(&self) -> Vec<&'static str> {
        let mut args = vec!["pull"];
        args.extend_from_slice(self.pull_mode.git_args());
        if self.quiet {
            args.push("--quiet");
        }
        args
    }

    /// Run `git [-C work_dir] <args>` and return its trimmed stdout.
    async fn run<I, S>(&self, work_dir: Option<&Path>, args: I) -> Result<String, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let label = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        if let Some(dir) = work_dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(&args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(command = %label, "spawning git");

        let output = cmd.output().await.map_err(|source| EngineError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command = %label, status = %output.status, %stderr, "git exited with failure");
            return Err(EngineError::Failed {
                command: label,
                status: output.status.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl VcsEngine for GitCli {
    #[instrument(skip(self), fields(dest = %dest.display()))]
    async fn clone_repo(
        &self,
        remote_url: &str,
        dest: &Path,
        branch: Option<&str>,
    ) -> Result<(), EngineError> {
        self.run(None, self.clone_args(remote_url, dest, branch))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(work_dir = %work_dir.display()))]
    async fn checkout(&self, work_dir: &Path, reference: &str) -> Result<(), EngineError> {
        let mut args = vec!["checkout"];
        if self.quiet {
            args.push("--quiet");
        }
        // `--` forces `reference` to be read as a revision, never a pathspec.
        args.push(reference);
        args.push("--");
        self.run(Some(work_dir), args).await.map(drop)
    }

    #[instrument(skip(self), fields(work_dir = %work_dir.display()))]
    async fn fetch_tags(&self, work_dir: &Path) -> Result<(), EngineError> {
        let mut args = vec!["fetch", "--tags"];
        if self.quiet {
            args.push("--quiet");
        }
        self.run(Some(work_dir), args).await.map(drop)
    }

    #[instrument(skip(self), fields(work_dir = %work_dir.display()))]
    async fn pull(&self, work_dir: &Path) -> Result<(), EngineError> {
        debug!(mode = ?self.pull_mode, "pulling upstream");
        self.run(Some(work_dir), self.pull_args()).await.map(drop)
    }

    #[instrument(skip(self), fields(work_dir = %work_dir.display()))]
    async fn head_commit_hash(&self, work_dir: &Path) -> Result<String, EngineError> {
        match self
            .run(Some(work_dir), ["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])
            .await
        {
            Ok(hash) => Ok(hash),
            // `--verify --quiet` exits 1 without a message only when HEAD is unborn.
            Err(EngineError::Failed {
                code: Some(1),
                stderr,
                ..
            }) if stderr.is_empty() =>
            {
                Err(EngineError::EmptyRepository)
            }
            Err(e) => Err(e),
        }
    }

    async fn is_valid_working_copy(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }
        let toplevel = match self.run(Some(path), ["rev-parse", "--show-toplevel"]).await {
            Ok(toplevel) => toplevel,
            Err(_) => return false,
        };
        match (
            tokio::fs::canonicalize(&toplevel).await,
            tokio::fs::canonicalize(path).await,
        ) {
            (Ok(toplevel), Ok(path)) => toplevel == path,
            _ => false,
        }
    }
}
