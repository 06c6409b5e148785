//! The version-control engine seam.
//!
//! A [`RepositorySession`](crate::core::RepositorySession) never touches
//! repository internals itself. Everything goes through [`VcsEngine`], whose
//! production implementation is [`GitCli`].

pub mod git;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use git::GitCli;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("'{reference}' is not a usable reference name")]
    InvalidReference { reference: String },
    #[error("HEAD does not point at a commit yet")]
    EmptyRepository,
}

/// Capabilities consumed from the version-control engine.
///
/// Every method blocks (asynchronously) until the underlying command has
/// finished; failures are reported as-is and never retried.
#[async_trait]
pub trait VcsEngine: Send + Sync {
    /// Clone `remote_url` into `dest`, optionally limited to `branch`.
    async fn clone_repo(
        &self,
        remote_url: &str,
        dest: &Path,
        branch: Option<&str>,
    ) -> Result<(), EngineError>;

    /// Switch the working copy to `reference` (branch, tag or commit).
    async fn checkout(&self, work_dir: &Path, reference: &str) -> Result<(), EngineError>;

    /// Retrieve every tag from the default remote.
    async fn fetch_tags(&self, work_dir: &Path) -> Result<(), EngineError>;

    /// Fetch and integrate the upstream of the current branch.
    async fn pull(&self, work_dir: &Path) -> Result<(), EngineError>;

    /// Full hex id of the checked-out commit, or
    /// [`EngineError::EmptyRepository`] when HEAD is unborn.
    async fn head_commit_hash(&self, work_dir: &Path) -> Result<String, EngineError>;

    /// Whether `path` is the top level of an existing working copy.
    async fn is_valid_working_copy(&self, path: &Path) -> bool;
}
