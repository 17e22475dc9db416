//! Agent configuration.
//!
//! Loaded from an optional TOML file; command-line flags override file values.

use anyhow::{Context, Result};
use grove_hal::{DEFAULT_ROOT_HELPER, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Timeout for commands that do not specify one.
    pub default_timeout_secs: u64,
    /// Escalation wrapper for privileged commands; empty disables escalation.
    pub root_helper: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            root_helper: DEFAULT_ROOT_HELPER.to_string(),
            log_file: None,
        }
    }
}

impl AgentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse agent config TOML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        default_timeout_secs: Option<u64>,
        root_helper: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Self {
        if let Some(secs) = default_timeout_secs {
            self.default_timeout_secs = secs;
        }
        if let Some(helper) = root_helper {
            self.root_helper = helper;
        }
        if log_file.is_some() {
            self.log_file = log_file;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AgentConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.root_helper, "sudo");
        assert_eq!(cfg.default_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn file_values_and_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(
            &path,
            "default_timeout_secs = 120\nroot_helper = \"doas\"\nlog_file = \"/tmp/grove.log\"\n",
        )
        .unwrap();

        let cfg = AgentConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(cfg.default_timeout_secs, 120);
        assert_eq!(cfg.root_helper, "doas");
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/grove.log")));

        let cfg = cfg.with_overrides(Some(5), Some(String::new()), None);
        assert_eq!(cfg.default_timeout_secs, 5);
        assert!(cfg.root_helper.is_empty());
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/grove.log")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = AgentConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AgentConfig::from_toml_str("default_timeout_secs = \"soon\"").is_err());
    }
}
