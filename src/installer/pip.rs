//! pip backend.
//!
//! Backend discovery tries, in order, `pip<ver>`, `<interpreter> -m pip` and
//! `python<ver> -m pip`, where `<ver>` is the configured Python major version.
//! The first candidate answering `--version` with exit code 0 is used, and its
//! reported version decides whether `--break-system-packages` is needed.
//! Discovery runs on every call; the installer keeps no state between calls.

use anyhow::Result;
use semver::Version;
use std::collections::BTreeSet;
use std::io;

use super::{InstallCommand, InstallKind, InstallOptions, InstallPlan, PackageManagerInstaller};
use crate::config::PipConfig;
use crate::constants::{
    CONSTRAINT_CHARS, PIP_BREAK_SYSTEM_PACKAGES, PIP_INSTALLER, PIP_SYSTEM_PROTECTION_VERSION,
};
use crate::core::RosdepError;
use crate::process::{ProcessRunner, SystemRunner};

/// Caller-supplied replacement for the bulk listing. Receives the full
/// `pip freeze` command line and returns its output.
///
/// When set, the per-package `pip show` fallback is disabled.
pub type ListingFn = Box<dyn Fn(&[String]) -> io::Result<String>>;

/// A discovered pip executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipBackend {
    /// Command prefix invoking pip
    pub command: Vec<String>,
    /// Version text as reported by pip, e.g. `24.0`
    pub version_text: Option<String>,
}

impl PipBackend {
    /// Reported version padded to three components.
    pub fn version(&self) -> Option<Version> {
        self.version_text.as_deref().and_then(parse_version)
    }

    /// Whether this pip refuses system installs without an override flag.
    pub fn enforces_system_protection(&self) -> bool {
        match (self.version(), parse_version(PIP_SYSTEM_PROTECTION_VERSION)) {
            (Some(version), Some(threshold)) => version >= threshold,
            _ => false,
        }
    }

    fn with_args(&self, args: &[&str]) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.extend(args.iter().map(ToString::to_string));
        argv
    }
}

/// [`PackageManagerInstaller`] for pip.
pub struct PipInstaller<R: ProcessRunner = SystemRunner> {
    runner: R,
    config: PipConfig,
    listing: Option<ListingFn>,
}

impl<R: ProcessRunner> std::fmt::Debug for PipInstaller<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipInstaller")
            .field("config", &self.config)
            .field("custom_listing", &self.listing.is_some())
            .finish_non_exhaustive()
    }
}

impl PipInstaller<SystemRunner> {
    /// Installer spawning real processes.
    pub fn system(config: PipConfig) -> Self {
        Self::new(SystemRunner, config)
    }
}

impl<R: ProcessRunner> PipInstaller<R> {
    /// Create an installer over `runner`.
    pub fn new(runner: R, config: PipConfig) -> Self {
        Self {
            runner,
            config,
            listing: None,
        }
    }

    /// Replace the bulk listing with `listing` and disable the `pip show` fallback.
    #[must_use]
    pub fn with_listing(mut self, listing: ListingFn) -> Self {
        self.listing = Some(listing);
        self
    }

    /// Runner used for probes; also the natural runner for executing plans.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Candidate command prefixes, in probing order.
    pub fn candidates(&self) -> Vec<Vec<String>> {
        let version = &self.config.python_version;
        let mut candidates = vec![vec![format!("pip{version}")]];

        if let Some(interpreter) = &self.config.interpreter {
            let matches = self.config.interpreter_version.as_ref().is_none_or(|v| v == version);
            if matches {
                candidates.push(vec![
                    interpreter.display().to_string(),
                    "-m".to_string(),
                    "pip".to_string(),
                ]);
            }
        }

        candidates.push(vec![format!("python{version}"), "-m".to_string(), "pip".to_string()]);
        candidates
    }

    /// Probe the candidates and return the first working pip.
    pub fn discover(&self) -> Option<PipBackend> {
        for candidate in self.candidates() {
            let mut probe = candidate.clone();
            probe.push("--version".to_string());

            match self.runner.run(&probe) {
                Ok(output) if output.success() => {
                    tracing::debug!(target: "pip", "Using pip command: {}", candidate.join(" "));
                    return Some(PipBackend {
                        command: candidate,
                        version_text: parse_version_output(&output.stdout),
                    });
                }
                Ok(output) => {
                    tracing::debug!(
                        target: "pip",
                        "{} exited with {:?}",
                        probe.join(" "),
                        output.status
                    );
                }
                Err(e) => {
                    tracing::debug!(target: "pip", "{} unavailable: {}", candidate.join(" "), e);
                }
            }
        }
        None
    }

    fn require_backend(&self) -> Result<PipBackend> {
        self.discover().ok_or_else(|| {
            RosdepError::InstallFailed {
                installer: PIP_INSTALLER.to_string(),
                reason: "pip is not installed".to_string(),
            }
            .into()
        })
    }

    fn bulk_listing(&self, backend: &PipBackend) -> String {
        let argv = backend.with_args(&["freeze"]);
        let result = match &self.listing {
            Some(listing) => listing(argv.as_slice()),
            None => self.runner.run(&argv).map(|output| {
                if output.success() {
                    output.stdout
                } else {
                    String::new()
                }
            }),
        };
        result.unwrap_or_else(|e| {
            tracing::debug!(target: "pip", "pip freeze failed: {}", e);
            String::new()
        })
    }

    /// Subset of `requested` installed according to `backend`.
    fn detect_with(&self, backend: &PipBackend, requested: &BTreeSet<String>) -> BTreeSet<String> {
        let listed = parse_listing(&self.bulk_listing(backend));
        let mut installed = BTreeSet::new();

        for package in requested {
            let name = base_name(package);
            if listed.contains(name) {
                installed.insert(package.clone());
            } else if self.listing.is_none() && self.shows_package(backend, name) {
                // Some packages are only visible to `pip show`
                tracing::debug!(target: "pip", "{} detected by pip show", name);
                installed.insert(package.clone());
            }
        }
        installed
    }

    fn shows_package(&self, backend: &PipBackend, name: &str) -> bool {
        match self.runner.run(&backend.with_args(&["show", name])) {
            Ok(output) => output.success() && !output.stdout.trim().is_empty(),
            Err(e) => {
                tracing::debug!(target: "pip", "pip show {} failed: {}", name, e);
                false
            }
        }
    }
}

impl<R: ProcessRunner> PackageManagerInstaller for PipInstaller<R> {
    fn name(&self) -> &str {
        PIP_INSTALLER
    }

    fn detect(&self, requested: &BTreeSet<String>) -> BTreeSet<String> {
        let Some(backend) = self.discover() else {
            tracing::warn!(target: "pip", "pip not found; treating all packages as missing");
            return BTreeSet::new();
        };
        self.detect_with(&backend, requested)
    }

    fn get_install_plan(&self, resolved: &[String], options: &InstallOptions) -> Result<InstallPlan> {
        let backend = self.require_backend()?;

        let packages: Vec<&String> = if options.reinstall {
            resolved.iter().collect()
        } else {
            let requested: BTreeSet<String> = resolved.iter().cloned().collect();
            let installed = self.detect_with(&backend, &requested);
            resolved.iter().filter(|p| !installed.contains(*p)).collect()
        };

        let mut plan = InstallPlan::empty(PIP_INSTALLER);
        if packages.is_empty() {
            return Ok(plan);
        }

        let mut base = backend.with_args(&["install"]);
        if backend.enforces_system_protection() {
            base.push(PIP_BREAK_SYSTEM_PACKAGES.to_string());
        }
        if options.quiet {
            base.push("-q".to_string());
        }
        if options.reinstall {
            base.push("-I".to_string());
        }

        for package in packages {
            let mut argv = base.clone();
            let kind = if has_constraint(package) {
                InstallKind::Constrained
            } else {
                argv.push("-U".to_string());
                InstallKind::Upgrade
            };
            argv.push(package.clone());

            let (argv, elevated) = self.config.elevation.apply(argv);
            plan.commands.push(InstallCommand {
                package: package.clone(),
                kind,
                elevated,
                argv,
            });
        }

        tracing::debug!(target: "pip", "Planned {} pip commands", plan.len());
        Ok(plan)
    }

    fn get_version_strings(&self) -> Result<Vec<String>> {
        let backend = self.require_backend()?;
        let mut versions =
            vec![format!("pip {}", backend.version_text.as_deref().unwrap_or("unknown"))];

        // Kept under the "setuptools" name for compatibility with existing reports
        match self.runner.run(&backend.with_args(&["show", "setuptools"])) {
            Ok(output) if output.success() => {
                if let Some(version) = parse_show_version(&output.stdout) {
                    versions.push(format!("setuptools {version}"));
                }
            }
            Ok(_) => tracing::debug!(target: "pip", "setuptools is not installed"),
            Err(e) => tracing::debug!(target: "pip", "pip show setuptools failed: {}", e),
        }
        Ok(versions)
    }
}

/// Name without any trailing version constraint.
pub fn base_name(package: &str) -> &str {
    package.find(CONSTRAINT_CHARS).map_or(package, |i| &package[..i]).trim()
}

/// Whether `package` carries a version constraint.
pub fn has_constraint(package: &str) -> bool {
    package.contains(CONSTRAINT_CHARS)
}

/// Package names from `pip freeze` output (`name==version` or `name @ url` lines).
pub fn parse_listing(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(|line| {
            let end = [line.find("=="), line.find(" @ ")].into_iter().flatten().min();
            end.map_or(line, |i| &line[..i]).trim().to_string()
        })
        .collect()
}

/// Version from `pip --version` output such as `pip 24.0 from /usr/lib/... (python 3.12)`.
fn parse_version_output(stdout: &str) -> Option<String> {
    let mut words = stdout.split_whitespace();
    match (words.next(), words.next()) {
        (Some("pip"), Some(version)) => Some(version.to_string()),
        _ => None,
    }
}

/// `Version:` field of `pip show` output.
fn parse_show_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a pip-style version (`24`, `24.0`, `23.3.1`, `24.1b1`) into semver,
/// keeping the leading digits of up to three components.
fn parse_version(text: &str) -> Option<Version> {
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(text.split('.')) {
        let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            break;
        }
        *slot = digits.parse().ok()?;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}
