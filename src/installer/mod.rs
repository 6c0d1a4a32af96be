//! Package backend installers.
//!
//! An installer takes backend package names (already mapped from abstract keys)
//! plus optional version constraints and produces an [`InstallPlan`]: one
//! command per package that still needs installing. Detection and planning
//! happen strictly before anything executes; [`InstallPlan::execute`] then runs
//! the commands one at a time, in order.
//!
//! Requests arrive in one of three shapes (a whitespace separated string, a
//! list, or a mapping with a `packages` field) and are normalized once at the
//! boundary by [`InstallArgs::from_value`].

pub mod pip;

pub use pip::{ListingFn, PipInstaller};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::config::ElevationMode;
use crate::core::RosdepError;
use crate::process::ProcessRunner;

/// Operations every package backend offers.
pub trait PackageManagerInstaller {
    /// Installer key, e.g. `"pip"`.
    fn name(&self) -> &str;

    /// Subset of `requested` already satisfied on the host.
    ///
    /// Never fails: probe errors count as "not installed".
    fn detect(&self, requested: &BTreeSet<String>) -> BTreeSet<String>;

    /// Package identifiers of `request`, each carrying the request's version
    /// specifier. Does not modify `request`.
    fn resolve(&self, request: &InstallerRequest) -> Result<Vec<String>> {
        Ok(request.resolved())
    }

    /// [`resolve`](Self::resolve) for an untyped request value.
    ///
    /// # Errors
    ///
    /// [`RosdepError::InvalidData`] if `value` is not a string, sequence or
    /// mapping with a `packages` field.
    fn resolve_value(&self, value: &Value) -> Result<Vec<String>> {
        self.resolve(&InstallerRequest::from_value(value)?)
    }

    /// Commands installing the packages of `resolved` that are not yet present.
    ///
    /// # Errors
    ///
    /// [`RosdepError::InstallFailed`] if no backend executable can be located.
    fn get_install_plan(&self, resolved: &[String], options: &InstallOptions) -> Result<InstallPlan>;

    /// Human-readable versions of the backend tooling.
    fn get_version_strings(&self) -> Result<Vec<String>>;
}

/// Package list of a request, in one of its accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallArgs {
    /// Whitespace separated names
    Text(String),
    /// Ordered names
    List(Vec<String>),
    /// Mapping form; a missing `packages` field means no packages
    Mapping {
        /// Names from the `packages` field
        packages: Vec<String>,
    },
}

impl InstallArgs {
    /// Convert an untyped value into one of the accepted shapes.
    ///
    /// # Errors
    ///
    /// [`RosdepError::InvalidData`] for any other shape, or for non-string list
    /// elements.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Sequence(items) => Ok(Self::List(string_list(items)?)),
            Value::Mapping(mapping) => {
                let packages = match mapping.get("packages") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::String(text)) => split_names(text),
                    Some(Value::Sequence(items)) => string_list(items)?,
                    Some(other) => {
                        return Err(invalid(format!(
                            "'packages' must be a string or a list, got {}",
                            shape_name(other)
                        )));
                    }
                };
                Ok(Self::Mapping {
                    packages,
                })
            }
            other => Err(invalid(format!(
                "install arguments must be a string, a list or a mapping, got {}",
                shape_name(other)
            ))),
        }
    }

    /// Canonical ordered list of package identifiers.
    pub fn packages(&self) -> Vec<String> {
        match self {
            Self::Text(text) => split_names(text),
            Self::List(items) | Self::Mapping { packages: items } => items.clone(),
        }
    }
}

impl From<&str> for InstallArgs {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<String>> for InstallArgs {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

fn split_names(text: &str) -> Vec<String> {
    text.split_whitespace().map(ToString::to_string).collect()
}

fn string_list(items: &[Value]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(name) => Ok(name.clone()),
            other => Err(invalid(format!(
                "package names must be strings, got {}",
                shape_name(other)
            ))),
        })
        .collect()
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn invalid(reason: String) -> anyhow::Error {
    RosdepError::InvalidData {
        reason,
    }
    .into()
}

/// Optional version-relational values of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraints {
    /// `==`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    /// `>=`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    /// `<=`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
    /// `>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    /// `<`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
}

impl VersionConstraints {
    /// Whether no value is set.
    pub fn is_empty(&self) -> bool {
        self.clauses().next().is_none()
    }

    /// Canonical specifier: clauses in the order `==`, `>=`, `<=`, `>`, `<`,
    /// comma separated. Empty when no value is set.
    pub fn specifier(&self) -> String {
        self.clauses()
            .map(|(op, version)| format!("{op}{version}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn clauses(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("==", &self.eq),
            (">=", &self.gte),
            ("<=", &self.lte),
            (">", &self.gt),
            ("<", &self.lt),
        ]
        .into_iter()
        .filter_map(|(op, value)| value.as_deref().map(|v| (op, v)))
    }

    fn from_mapping(mapping: &serde_yaml::Mapping) -> Result<Self> {
        let field = |key: &str| -> Result<Option<String>> {
            match mapping.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(Value::Number(n)) => Ok(Some(n.to_string())),
                Some(other) => Err(invalid(format!(
                    "version constraint '{key}' must be a string, got {}",
                    shape_name(other)
                ))),
            }
        };
        Ok(Self {
            eq: field("eq")?,
            gte: field("gte")?,
            lte: field("lte")?,
            gt: field("gt")?,
            lt: field("lt")?,
        })
    }
}

/// A package list plus optional version constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerRequest {
    /// Requested packages
    pub packages: InstallArgs,
    /// Constraints applied to every package
    pub constraints: VersionConstraints,
}

impl InstallerRequest {
    /// Request without constraints.
    pub fn new(packages: impl Into<InstallArgs>) -> Self {
        Self {
            packages: packages.into(),
            constraints: VersionConstraints::default(),
        }
    }

    /// Builder-style setter for the constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: VersionConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Build a request from an untyped value. In the mapping form the
    /// constraint fields (`eq`, `gte`, `lte`, `gt`, `lt`) sit next to `packages`.
    ///
    /// # Errors
    ///
    /// [`RosdepError::InvalidData`] for unsupported shapes.
    pub fn from_value(value: &Value) -> Result<Self> {
        let packages = InstallArgs::from_value(value)?;
        let constraints = match value {
            Value::Mapping(mapping) => VersionConstraints::from_mapping(mapping)?,
            _ => VersionConstraints::default(),
        };
        Ok(Self {
            packages,
            constraints,
        })
    }

    /// Package identifiers with the specifier appended to each.
    pub fn resolved(&self) -> Vec<String> {
        let specifier = self.constraints.specifier();
        self.packages
            .packages()
            .into_iter()
            .map(|name| format!("{name}{specifier}"))
            .collect()
    }
}

/// Caller flags for [`PackageManagerInstaller::get_install_plan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// The backend may prompt (unused by non-interactive backends)
    pub interactive: bool,
    /// Install every package, forcing reinstallation
    pub reinstall: bool,
    /// Suppress backend output
    pub quiet: bool,
}

/// How a planned command installs its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallKind {
    /// Installs exactly the given constrained spec
    Constrained,
    /// Upgrade-or-install of a bare name
    Upgrade,
}

/// One planned process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallCommand {
    /// Package identifier this command installs
    pub package: String,
    /// Install semantics
    pub kind: InstallKind,
    /// Whether [`argv`](Self::argv) was wrapped for elevated privileges
    pub elevated: bool,
    /// Full command line
    pub argv: Vec<String>,
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Ordered commands for one installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    /// Installer key the commands belong to
    pub installer: String,
    /// Commands in execution order
    pub commands: Vec<InstallCommand>,
}

impl InstallPlan {
    /// A plan with no commands.
    pub fn empty(installer: impl Into<String>) -> Self {
        Self {
            installer: installer.into(),
            commands: Vec::new(),
        }
    }

    /// Whether there is nothing to install.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Run every command sequentially, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// [`RosdepError::InstallFailed`] naming the package whose command could
    /// not be spawned or exited non-zero.
    pub fn execute(&self, runner: &dyn ProcessRunner) -> Result<()> {
        for command in &self.commands {
            tracing::info!(target: "installer", "Executing: {}", command);
            let failure = |reason: String| RosdepError::InstallFailed {
                installer: self.installer.clone(),
                reason: format!("{}: {reason}", command.package),
            };

            let output = runner.run(&command.argv).map_err(|e| failure(e.to_string()))?;
            if !output.success() {
                let status = output
                    .status
                    .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
                let stderr = output.stderr.trim();
                let reason = if stderr.is_empty() {
                    status
                } else {
                    format!("{status}: {stderr}")
                };
                return Err(failure(reason).into());
            }
        }
        Ok(())
    }
}

impl ElevationMode {
    /// Wrap `argv` for this mode; returns the command and whether it was elevated.
    pub fn apply(self, argv: Vec<String>) -> (Vec<String>, bool) {
        match self {
            Self::None => (argv, false),
            Self::Sudo => {
                let mut elevated = vec!["sudo".to_string(), "-H".to_string()];
                elevated.extend(argv);
                (elevated, true)
            }
        }
    }
}
