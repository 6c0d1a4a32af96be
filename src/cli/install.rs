//! `install` and `versions`: drive the pip backend.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use super::CliConfig;
use crate::installer::{
    InstallOptions, InstallerRequest, PackageManagerInstaller, PipInstaller, VersionConstraints,
};
use crate::process::ProcessRunner;

/// Resolve version constraints, plan and run pip installs.
///
/// Constraints apply to every named package and are combined in the order
/// `--eq`, `--gte`, `--lte`, `--gt`, `--lt`.
#[derive(Args)]
pub struct InstallCommand {
    /// Package names
    #[arg(required = true)]
    packages: Vec<String>,

    /// Require exactly this version
    #[arg(long, value_name = "VERSION")]
    eq: Option<String>,

    /// Require at least this version
    #[arg(long, value_name = "VERSION")]
    gte: Option<String>,

    /// Require at most this version
    #[arg(long, value_name = "VERSION")]
    lte: Option<String>,

    /// Require a version above this one
    #[arg(long, value_name = "VERSION")]
    gt: Option<String>,

    /// Require a version below this one
    #[arg(long, value_name = "VERSION")]
    lt: Option<String>,

    /// Reinstall packages even if already present
    #[arg(long)]
    reinstall: bool,

    /// Pass -q to pip
    #[arg(long)]
    quiet_install: bool,

    /// Print the commands instead of running them
    #[arg(short, long)]
    simulate: bool,

    /// With --simulate, print the plan as JSON
    #[arg(long, requires = "simulate")]
    json: bool,
}

impl InstallCommand {
    pub fn execute(&self, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
        let installer = PipInstaller::system(config.pip_config()?);
        self.run(&installer, installer.runner(), out)
    }

    fn request(&self) -> InstallerRequest {
        InstallerRequest::new(self.packages.clone()).with_constraints(VersionConstraints {
            eq: self.eq.clone(),
            gte: self.gte.clone(),
            lte: self.lte.clone(),
            gt: self.gt.clone(),
            lt: self.lt.clone(),
        })
    }

    /// Plan with `installer` and execute with `runner` (unless simulating).
    pub fn run<I: PackageManagerInstaller>(
        &self,
        installer: &I,
        runner: &dyn ProcessRunner,
        out: &mut dyn Write,
    ) -> Result<()> {
        let resolved = installer.resolve(&self.request())?;
        let options = InstallOptions {
            interactive: false,
            reinstall: self.reinstall,
            quiet: self.quiet_install,
        };
        let plan = installer.get_install_plan(&resolved, &options)?;

        if plan.is_empty() {
            writeln!(out, "All required packages are installed")?;
            return Ok(());
        }

        if self.simulate && self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
            return Ok(());
        }

        if self.simulate {
            for command in &plan.commands {
                writeln!(out, "{command}")?;
            }
            return Ok(());
        }

        plan.execute(runner)?;
        writeln!(out, "Installed {} package(s) with {}", plan.len(), installer.name())?;
        Ok(())
    }
}

pub fn print_versions(config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let installer = PipInstaller::system(config.pip_config()?);
    for line in installer.get_version_strings()? {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
