//! Configuration values for the loader, installers and fetch helpers.
//!
//! Core algorithms never read process state. Each component receives an explicit
//! configuration value at construction time; the `from_env` constructors here are
//! the only place the process environment is consulted, and the CLI is their
//! only caller.
//!
//! # Settings file (`rosdep.toml`)
//!
//! ```toml
//! [loader]
//! dependency_types = ["build", "exec"]
//! underlay_key = "base"
//!
//! [installer]
//! python_version = "3"
//! sudo = false
//! ```
//!
//! # Priority
//!
//! 1. Settings file values
//! 2. Environment variables (`ROS_PYTHON_VERSION`, `ROSDEP_PYTHON`,
//!    `API_TOKEN_GITHUB`, `GHCR_PAT`)
//! 3. Defaults

mod parser;

pub use parser::parse_config;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use crate::constants::{
    DEPRECATED_GITHUB_TOKEN_ENV, FETCH_TIMEOUT, GITHUB_TOKEN_ENV, PYTHON_INTERPRETER_ENV,
    PYTHON_VERSION_ENV,
};
use crate::manifest::DependencyType;

static DEPRECATED_TOKEN_WARNING: Once = Once::new();

/// Configuration of the resource dependency loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Environment that dependency conditions are evaluated against
    pub environment: BTreeMap<String, String>,
    /// If set, every view registered by the loader chains to this view
    pub underlay_key: Option<String>,
    /// Allow-list of dependency categories; empty means all except `doc`
    pub dependency_types: Vec<DependencyType>,
}

impl LoaderConfig {
    /// Snapshot the process environment for condition evaluation.
    pub fn from_env() -> Self {
        Self {
            environment: std::env::vars().collect(),
            ..Self::default()
        }
    }

    /// Builder-style setter for one environment entry.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// How install commands are elevated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationMode {
    /// Run commands unchanged
    None,
    /// Prefix commands with `sudo -H`
    #[default]
    Sudo,
}

/// Configuration of the pip backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipConfig {
    /// Python major version pip is discovered for (e.g. `"3"`)
    pub python_version: String,
    /// Interpreter running alongside rosdep, tried as `<interpreter> -m pip`
    pub interpreter: Option<PathBuf>,
    /// Major version of [`interpreter`](Self::interpreter), if known
    pub interpreter_version: Option<String>,
    /// Privilege elevation for install commands
    pub elevation: ElevationMode,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            python_version: "3".to_string(),
            interpreter: None,
            interpreter_version: None,
            elevation: ElevationMode::default(),
        }
    }
}

impl PipConfig {
    /// Read `ROS_PYTHON_VERSION` and `ROSDEP_PYTHON`.
    pub fn from_env() -> Self {
        let python_version = std::env::var(PYTHON_VERSION_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "3".to_string());
        let interpreter = std::env::var_os(PYTHON_INTERPRETER_ENV).map(PathBuf::from);

        Self {
            python_version,
            interpreter,
            ..Self::default()
        }
    }
}

/// Configuration of remote content retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// `User-Agent` header value
    pub user_agent: String,
    /// Token attached to requests for the trusted raw-content host
    pub github_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("rosdep/{}", env!("CARGO_PKG_VERSION")),
            github_token: None,
            timeout: FETCH_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Read the GitHub token from `API_TOKEN_GITHUB`, falling back to the
    /// deprecated `GHCR_PAT`.
    pub fn from_env() -> Self {
        let github_token = resolve_github_token(
            std::env::var(GITHUB_TOKEN_ENV).ok(),
            std::env::var(DEPRECATED_GITHUB_TOKEN_ENV).ok(),
        );
        Self {
            github_token,
            ..Self::default()
        }
    }
}

/// Pick the GitHub token: the current variable wins over the deprecated one.
///
/// Logs a deprecation warning once per process when the deprecated variable
/// supplies the token.
pub fn resolve_github_token(current: Option<String>, deprecated: Option<String>) -> Option<String> {
    if uses_deprecated_token(current.as_deref(), deprecated.as_deref()) {
        DEPRECATED_TOKEN_WARNING.call_once(|| {
            tracing::warn!(
                "{} is deprecated. Please use {} instead.",
                DEPRECATED_GITHUB_TOKEN_ENV,
                GITHUB_TOKEN_ENV
            );
        });
    }
    current.or(deprecated)
}

fn uses_deprecated_token(current: Option<&str>, deprecated: Option<&str>) -> bool {
    current.is_none() && deprecated.is_some()
}

/// `[loader]` table of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Allow-list of dependency categories
    #[serde(default)]
    pub dependency_types: Vec<DependencyType>,
    /// Underlay view for loader-registered views
    #[serde(default)]
    pub underlay_key: Option<String>,
}

/// `[installer]` table of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerSettings {
    /// Python major version for pip discovery
    #[serde(default)]
    pub python_version: Option<String>,
    /// Interpreter tried as `<interpreter> -m pip`
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
    /// Whether install commands are prefixed with `sudo -H`
    #[serde(default)]
    pub sudo: Option<bool>,
}

/// Contents of a `rosdep.toml` settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Loader settings
    #[serde(default)]
    pub loader: LoaderSettings,
    /// Installer settings
    #[serde(default)]
    pub installer: InstallerSettings,
}

impl Settings {
    /// Load a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        parse_config(path)
    }

    /// Overlay loader settings onto `config`.
    pub fn apply_loader(&self, config: &mut LoaderConfig) {
        if !self.loader.dependency_types.is_empty() {
            config.dependency_types.clone_from(&self.loader.dependency_types);
        }
        if self.loader.underlay_key.is_some() {
            config.underlay_key.clone_from(&self.loader.underlay_key);
        }
    }

    /// Overlay installer settings onto `config`.
    pub fn apply_pip(&self, config: &mut PipConfig) {
        if let Some(version) = &self.installer.python_version {
            config.python_version.clone_from(version);
        }
        if self.installer.interpreter.is_some() {
            config.interpreter.clone_from(&self.installer.interpreter);
        }
        if let Some(sudo) = self.installer.sudo {
            config.elevation = if sudo {
                ElevationMode::Sudo
            } else {
                ElevationMode::None
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_precedence() {
        assert_eq!(
            resolve_github_token(Some("new".into()), Some("old".into())),
            Some("new".to_string())
        );
        assert_eq!(resolve_github_token(None, Some("old".into())), Some("old".to_string()));
        assert_eq!(resolve_github_token(Some("new".into()), None), Some("new".to_string()));
        assert_eq!(resolve_github_token(None, None), None);
    }

    #[test]
    fn test_deprecated_token_warning_only_when_used() {
        assert!(uses_deprecated_token(None, Some("old")));
        assert!(!uses_deprecated_token(Some("new"), Some("old")));
        assert!(!uses_deprecated_token(Some("new"), None));
        assert!(!uses_deprecated_token(None, None));
    }

    #[test]
    fn test_fetch_config_default_user_agent() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("rosdep/"));
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_settings_overlay() {
        let settings: Settings = toml::from_str(
            r#"
            [loader]
            dependency_types = ["build", "exec"]
            underlay_key = "base"

            [installer]
            python_version = "2"
            sudo = false
            "#,
        )
        .unwrap();

        let mut loader = LoaderConfig::default();
        settings.apply_loader(&mut loader);
        assert_eq!(loader.dependency_types, vec![DependencyType::Build, DependencyType::Exec]);
        assert_eq!(loader.underlay_key.as_deref(), Some("base"));

        let mut pip = PipConfig::default();
        settings.apply_pip(&mut pip);
        assert_eq!(pip.python_version, "2");
        assert_eq!(pip.elevation, ElevationMode::None);
    }

    #[test]
    fn test_empty_settings_keep_defaults() {
        let settings = Settings::default();
        let mut pip = PipConfig::default();
        settings.apply_pip(&mut pip);
        assert_eq!(pip, PipConfig::default());
    }

    #[test]
    fn test_settings_load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("rosdep.toml");
        std::fs::write(&path, "[installer]\nsudo = true\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.installer.sudo, Some(true));
    }
}
