use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::error::SessionError;
use crate::engine::{EngineError, GitCli, VcsEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
}

/// What `open_or_clone` had to do to reach [`SessionState::Ready`].
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpenOutcome {
    Attached,
    Cloned,
}

/// Handle on one working copy of one remote.
///
/// Nothing but [`open_or_clone`](Self::open_or_clone) works until it has
/// succeeded once. Dropping the session leaves the working copy on disk.
pub struct RepositorySession<E = GitCli> {
    remote_url: String,
    working_path: PathBuf,
    state: SessionState,
    engine: E,
}

impl RepositorySession<GitCli> {
    pub fn new(remote_url: impl Into<String>, working_path: impl Into<PathBuf>) -> Self {
        Self::with_engine(remote_url, working_path, GitCli::new())
    }
}

impl<E: VcsEngine> RepositorySession<E> {
    pub fn with_engine(
        remote_url: impl Into<String>,
        working_path: impl Into<PathBuf>,
        engine: E,
    ) -> Self {
        Self {
            remote_url: remote_url.into(),
            working_path: working_path.into(),
            state: SessionState::Uninitialized,
            engine,
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Uninitialized => Err(SessionError::NotReady { operation }),
        }
    }

    /// Attach to the working copy if one exists, otherwise clone the remote
    /// into the working path. `branch` picks what to clone; `None` (or an
    /// empty name) means the remote's default branch.
    pub async fn open_or_clone(&mut self, branch: Option<&str>) -> Result<OpenOutcome, SessionError> {
        if self.is_ready() {
            return Ok(OpenOutcome::Attached);
        }

        if self.engine.is_valid_working_copy(&self.working_path).await {
            info!(path = %self.working_path.display(), "repository already exists, attaching");
            self.state = SessionState::Ready;
            return Ok(OpenOutcome::Attached);
        }

        let branch = branch.filter(|b| !b.is_empty());
        match branch {
            Some(branch) => info!(
                %branch,
                remote = %self.remote_url,
                path = %self.working_path.display(),
                "cloning branch"
            ),
            None => info!(
                remote = %self.remote_url,
                path = %self.working_path.display(),
                "cloning default branch"
            ),
        }

        self.engine
            .clone_repo(&self.remote_url, &self.working_path, branch)
            .await
            .map_err(|source| SessionError::Clone {
                remote_url: self.remote_url.clone(),
                path: self.working_path.clone(),
                source,
            })?;

        self.state = SessionState::Ready;
        Ok(OpenOutcome::Cloned)
    }

    pub async fn checkout(&mut self, reference: &str) -> Result<(), SessionError> {
        self.ensure_ready("check out")?;

        if reference.is_empty() || reference.starts_with('-') {
            return Err(SessionError::Checkout {
                reference: reference.to_string(),
                source: EngineError::InvalidReference {
                    reference: reference.to_string(),
                },
            });
        }

        info!(%reference, "checking out");
        self.engine
            .checkout(&self.working_path, reference)
            .await
            .map_err(|source| SessionError::Checkout {
                reference: reference.to_string(),
                source,
            })
    }

    pub async fn fetch_all_tags(&mut self) -> Result<(), SessionError> {
        self.ensure_ready("fetch tags")?;

        info!("fetching all tags");
        self.engine
            .fetch_tags(&self.working_path)
            .await
            .map_err(|source| SessionError::Fetch { source })
    }

    /// Integrate upstream changes for the current branch. A conflicted merge
    /// is reported as an error and left for the caller to resolve.
    pub async fn pull_latest(&mut self) -> Result<(), SessionError> {
        self.ensure_ready("pull")?;

        info!("pulling latest changes");
        self.engine
            .pull(&self.working_path)
            .await
            .map_err(|source| SessionError::Pull { source })
    }

    pub async fn current_commit_hash(&self) -> Result<String, SessionError> {
        self.ensure_ready("read the current commit")?;

        let hash = self
            .engine
            .head_commit_hash(&self.working_path)
            .await
            .map_err(|source| match source {
                EngineError::EmptyRepository => SessionError::EmptyRepository {
                    path: self.working_path.clone(),
                },
                source => SessionError::Head { source },
            })?;
        debug!(%hash, "resolved HEAD");
        Ok(hash)
    }
}
