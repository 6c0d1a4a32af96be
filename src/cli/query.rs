//! Loader queries: `keys`, `resources`, `views` and `view-key`.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use super::CliConfig;
use crate::loader::DependencyLoader;
use crate::manifest::DependencyType;

/// Print the dependency keys of a resource, sorted, one per line.
#[derive(Args)]
pub struct KeysCommand {
    /// Resource name
    resource: String,

    /// Only keys declared by the resource itself (no implicit closure)
    #[arg(long)]
    direct: bool,

    /// Restrict to these dependency types (repeatable; default: all but doc)
    #[arg(long = "dep-type", value_name = "TYPE")]
    dep_types: Vec<DependencyType>,
}

impl KeysCommand {
    pub fn execute(&self, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
        let mut loader_config = config.loader_config()?;
        if !self.dep_types.is_empty() {
            loader_config.dependency_types.clone_from(&self.dep_types);
        }

        let loader = config.loader(loader_config)?;
        for key in loader.get_rosdeps(&self.resource, !self.direct)? {
            writeln!(out, "{key}")?;
        }
        Ok(())
    }
}

/// Print the view a resource resolves into.
#[derive(Args)]
pub struct ViewKeyCommand {
    /// Resource name
    resource: String,
}

impl ViewKeyCommand {
    pub fn execute(&self, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
        let loader = config.loader(config.loader_config()?)?;
        writeln!(out, "{}", loader.get_view_key(&self.resource)?)?;
        Ok(())
    }
}

pub fn list_resources(config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let loader = config.loader(config.loader_config()?)?;
    for name in loader.get_loadable_resources()? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub fn list_views(config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let loader = config.loader(config.loader_config()?)?;
    for name in loader.get_loadable_views()? {
        let marker = if loader.is_metapackage(&name)? {
            " (metapackage)"
        } else {
            ""
        };
        writeln!(out, "{name}{marker}")?;
    }
    Ok(())
}
