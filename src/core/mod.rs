pub mod config;
pub mod error;
pub mod session;

pub use config::{Config, PullMode};
pub use error::{ErrorKind, SessionError};
pub use session::{OpenOutcome, RepositorySession, SessionState};
