// src/config.rs
//! Configuration file parsing
//!
//! Supports TOML configuration files with the following sections:
//! - [index] - Python package index endpoint, timeout, retries
//! - [os] - OS package prefix, probe command, install command
//! - [fallback] - Fallback (pip) install command
//!
//! Every key has a default, so an empty file (or no file) is valid.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Package index settings
    #[serde(default)]
    pub index: IndexSection,

    /// OS package manager settings
    #[serde(default)]
    pub os: OsSection,

    /// Fallback installer settings
    #[serde(default)]
    pub fallback: FallbackSection,
}

/// Package index configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSection {
    /// Base URL of the JSON API; `<url>/<name>/json` is fetched
    #[serde(default = "default_index_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts for transport errors and 5xx responses
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl IndexSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OS package manager configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OsSection {
    /// Prefix prepended to the Python name to form the OS candidate
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Metadata query command; the candidate name is appended
    #[serde(default = "default_query_command")]
    pub query_command: Vec<String>,

    /// Install command; OS package names are appended
    #[serde(default = "default_os_install_command")]
    pub install_command: Vec<String>,

    /// Probe timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for OsSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            query_command: default_query_command(),
            install_command: default_os_install_command(),
            probe_timeout_secs: default_timeout_secs(),
        }
    }
}

impl OsSection {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Fallback installer configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackSection {
    /// Install command; requirement specs are appended
    #[serde(default = "default_fallback_install_command")]
    pub install_command: Vec<String>,
}

impl Default for FallbackSection {
    fn default() -> Self {
        Self {
            install_command: default_fallback_install_command(),
        }
    }
}

fn default_index_url() -> String {
    "https://pypi.org/pypi".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_prefix() -> String {
    crate::names::DEFAULT_OS_PREFIX.to_string()
}

fn default_query_command() -> Vec<String> {
    vec!["apt-cache".to_string(), "show".to_string()]
}

fn default_os_install_command() -> Vec<String> {
    ["sudo", "apt", "install", "-y"].map(String::from).to_vec()
}

fn default_fallback_install_command() -> Vec<String> {
    ["sudo", "pip3", "install", "--break-system-packages"]
        .map(String::from)
        .to_vec()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.index.url)
            .map_err(|e| Error::Config(format!("index.url '{}': {e}", self.index.url)))?;

        for (key, command) in [
            ("os.query_command", &self.os.query_command),
            ("os.install_command", &self.os.install_command),
            ("fallback.install_command", &self.fallback.install_command),
        ] {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(Error::Config(format!("{key} must name a program")));
            }
        }

        if self.index.retries == 0 {
            return Err(Error::Config("index.retries must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.index.url, "https://pypi.org/pypi");
        assert_eq!(config.index.timeout(), Duration::from_secs(30));
        assert_eq!(config.index.retries, 3);
        assert_eq!(config.os.prefix, "python3-");
        assert_eq!(config.os.query_command, vec!["apt-cache", "show"]);
        assert_eq!(config.os.install_command, vec!["sudo", "apt", "install", "-y"]);
        assert_eq!(
            config.fallback.install_command,
            vec!["sudo", "pip3", "install", "--break-system-packages"]
        );
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
            [os]
            install_command = ["apt-get", "install", "-y"]

            [fallback]
            install_command = ["pip", "install", "--user"]
            "#,
        )
        .unwrap();

        assert_eq!(config.os.install_command, vec!["apt-get", "install", "-y"]);
        assert_eq!(config.os.prefix, "python3-");
        assert_eq!(config.fallback.install_command, vec!["pip", "install", "--user"]);
    }

    #[test]
    fn test_rejects_empty_command() {
        let err = Config::parse("[fallback]\ninstall_command = []\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = Config::parse("[index]\nurl = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_key() {
        assert!(Config::parse("[index]\nmirror = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aptpip.toml");
        std::fs::write(&path, "[index]\nretries = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.index.retries, 5);

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
