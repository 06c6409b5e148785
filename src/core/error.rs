use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot {operation}: repository not opened or cloned yet")]
    NotReady { operation: &'static str },
    #[error("failed to clone {remote_url} into {}: {source}", .path.display())]
    Clone {
        remote_url: String,
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("failed to check out '{reference}': {source}")]
    Checkout {
        reference: String,
        #[source]
        source: EngineError,
    },
    #[error("failed to fetch tags: {source}")]
    Fetch {
        #[source]
        source: EngineError,
    },
    #[error("failed to pull latest changes: {source}")]
    Pull {
        #[source]
        source: EngineError,
    },
    #[error("repository at {} has no commits yet", .path.display())]
    EmptyRepository { path: PathBuf },
    #[error("failed to read the current commit: {source}")]
    Head {
        #[source]
        source: EngineError,
    },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotReady,
    Clone,
    Checkout,
    Fetch,
    Pull,
    EmptyRepository,
    Head,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NotReady { .. } => ErrorKind::NotReady,
            SessionError::Clone { .. } => ErrorKind::Clone,
            SessionError::Checkout { .. } => ErrorKind::Checkout,
            SessionError::Fetch { .. } => ErrorKind::Fetch,
            SessionError::Pull { .. } => ErrorKind::Pull,
            SessionError::EmptyRepository { .. } => ErrorKind::EmptyRepository,
            SessionError::Head { .. } => ErrorKind::Head,
        }
    }
}

impl ErrorKind {
    /// Process exit code reported by the CLI. 1 and 2 stay reserved for
    /// setup failures and usage errors.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::NotReady => 10,
            ErrorKind::Clone => 11,
            ErrorKind::Checkout => 12,
            ErrorKind::Fetch => 13,
            ErrorKind::Pull => 14,
            ErrorKind::EmptyRepository => 15,
            ErrorKind::Head => 16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotReady => "not-ready",
            ErrorKind::Clone => "clone",
            ErrorKind::Checkout => "checkout",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Pull => "pull",
            ErrorKind::EmptyRepository => "empty-repository",
            ErrorKind::Head => "head",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [ErrorKind; 7] = [
        ErrorKind::NotReady,
        ErrorKind::Clone,
        ErrorKind::Checkout,
        ErrorKind::Fetch,
        ErrorKind::Pull,
        ErrorKind::EmptyRepository,
        ErrorKind::Head,
    ];

    #[test]
    fn exit_codes_are_distinct_and_clear_of_reserved_codes() {
        let codes: HashSet<u8> = ALL.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), ALL.len());
        assert!(!codes.contains(&0) && !codes.contains(&1) && !codes.contains(&2));
    }

    #[test]
    fn serialized_kind_matches_display() {
        for kind in ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
    }

    #[test]
    fn message_carries_engine_output() {
        let err = SessionError::Pull {
            source: EngineError::Failed {
                command: "pull --no-rebase --no-edit".to_string(),
                status: "exit status: 1".to_string(),
                code: Some(1),
                stderr: "There is no tracking information for the current branch.".to_string(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::Pull);
        assert!(err.to_string().contains("no tracking information"));
    }
}
