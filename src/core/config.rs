use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use dirs::home_dir;
use serde::Deserialize;
use tracing::debug;

pub const GLOBAL_CONFIG_FILE: &str = ".repo-session.json";
pub const GIT_BINARY_ENV: &str = "REPO_SESSION_GIT";
pub const PULL_MODE_ENV: &str = "REPO_SESSION_PULL_MODE";

/// How `pull` integrates upstream changes. Conflicts are never resolved,
/// whichever mode is chosen.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PullMode {
    #[default]
    Merge,
    #[serde(rename = "ff-only")]
    FastForwardOnly,
    Rebase,
}

impl PullMode {
    pub fn git_args(self) -> &'static [&'static str] {
        match self {
            PullMode::Merge => &["--no-rebase", "--no-edit"],
            PullMode::FastForwardOnly => &["--ff-only"],
            PullMode::Rebase => &["--rebase"],
        }
    }
}

impl FromStr for PullMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(PullMode::Merge),
            "ff-only" | "ff_only" => Ok(PullMode::FastForwardOnly),
            "rebase" => Ok(PullMode::Rebase),
            other => bail!("unknown pull mode '{}' (expected merge, ff-only or rebase)", other),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub git_binary: PathBuf,
    pub pull_mode: PullMode,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            pull_mode: PullMode::default(),
            quiet: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve settings for one run.
    ///
    /// An explicit file replaces the global one and must exist. Environment
    /// variables are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                Self::load_from_file(path)?
            }
            None => match Self::global_path() {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn global_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(GLOBAL_CONFIG_FILE))
    }

    /// Missing files yield defaults; malformed ones are errors.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(git) = lookup(GIT_BINARY_ENV).filter(|v| !v.trim().is_empty()) {
            self.git_binary = PathBuf::from(git.trim());
        }
        if let Some(mode) = lookup(PULL_MODE_ENV).filter(|v| !v.trim().is_empty()) {
            self.pull_mode = mode
                .parse()
                .with_context(|| format!("invalid {}", PULL_MODE_ENV))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_use_git_from_path_and_merge() {
        let config = Config::new();
        assert_eq!(config.git_binary, PathBuf::from("git"));
        assert_eq!(config.pull_mode, PullMode::Merge);
        assert!(!config.quiet);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "pull_mode": "ff-only" }"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.pull_mode, PullMode::FastForwardOnly);
        assert_eq!(config.git_binary, PathBuf::from("git"));
    }

    #[test]
    fn full_file_round_trips_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "git_binary": "/usr/local/bin/git", "pull_mode": "rebase", "quiet": true }"#,
        )
        .unwrap();
        let expected = Config {
            git_binary: PathBuf::from("/usr/local/bin/git"),
            pull_mode: PullMode::Rebase,
            quiet: true,
        };
        assert_eq!(Config::load_from_file(&path).unwrap(), expected);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [(GIT_BINARY_ENV, "/opt/git/bin/git"), (PULL_MODE_ENV, "rebase")]
            .into_iter()
            .collect();
        let mut config = Config::new();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.git_binary, PathBuf::from("/opt/git/bin/git"));
        assert_eq!(config.pull_mode, PullMode::Rebase);
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let mut config = Config::new();
        config
            .apply_env_from(|key| match key {
                GIT_BINARY_ENV => Some("  ".to_string()),
                PULL_MODE_ENV => Some("".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn bad_pull_mode_in_environment_is_rejected() {
        let mut config = Config::new();
        let err = config
            .apply_env_from(|key| (key == PULL_MODE_ENV).then(|| "squash".to_string()))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("squash"));
    }

    #[test]
    fn pull_mode_parses_both_spellings() {
        assert_eq!("FF-ONLY".parse::<PullMode>().unwrap(), PullMode::FastForwardOnly);
        assert_eq!("ff_only".parse::<PullMode>().unwrap(), PullMode::FastForwardOnly);
        assert_eq!(" merge ".parse::<PullMode>().unwrap(), PullMode::Merge);
    }
}
