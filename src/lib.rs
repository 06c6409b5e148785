pub mod commands;
pub mod core;
pub mod engine;

pub use crate::core::config::Config;
pub use crate::core::error::{ErrorKind, SessionError};
pub use crate::core::session::RepositorySession;
pub use crate::engine::{EngineError, GitCli, VcsEngine};
