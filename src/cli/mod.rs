//! Command-line interface for rosdep.
//!
//! # Commands
//!
//! - `keys` - Print the dependency keys of a resource
//! - `resources` - List loadable resources
//! - `views` - List loadable views
//! - `view-key` - Print the view a resource resolves into
//! - `install` - Resolve, plan and run pip installs
//! - `versions` - Print backend tool versions
//! - `fetch` - Retrieve a URL and write it to stdout
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Enable debug logging
//! - `--quiet` / `-q` - Only log errors
//! - `--config` / `-c` - Path to a `rosdep.toml` settings file
//! - `--index` - Path to the resource index file
//!
//! # Example
//!
//! ```bash
//! rosdep --index workspace.toml keys roscpp
//! rosdep install requests --gte 2.0 --simulate
//! ```

mod fetch;
mod install;
mod query;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{LoaderConfig, PipConfig, Settings};
use crate::index::WorkspaceIndex;
use crate::loader::ResourceIndexLoader;

/// Default resource index location, relative to the working directory.
pub const DEFAULT_INDEX_PATH: &str = "rosdep-index.toml";

/// Values shared by every command, derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter chosen by `--verbose`/`--quiet`; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Settings file, if given
    pub settings_path: Option<PathBuf>,
    /// Resource index file
    pub index_path: PathBuf,
}

impl CliConfig {
    /// Settings from the settings file, or defaults.
    pub fn settings(&self) -> Result<Settings> {
        match &self.settings_path {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
        }
    }

    /// Loader configuration: process environment overlaid with settings.
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let mut config = LoaderConfig::from_env();
        self.settings()?.apply_loader(&mut config);
        Ok(config)
    }

    /// pip configuration: process environment overlaid with settings.
    pub fn pip_config(&self) -> Result<PipConfig> {
        let mut config = PipConfig::from_env();
        self.settings()?.apply_pip(&mut config);
        Ok(config)
    }

    /// Loader over the configured index file.
    pub fn loader(&self, config: LoaderConfig) -> Result<ResourceIndexLoader> {
        let index = WorkspaceIndex::load(&self.index_path)?;
        Ok(ResourceIndexLoader::from_workspace(index, config))
    }
}

/// Main CLI structure for rosdep.
#[derive(Parser)]
#[command(
    name = "rosdep",
    about = "Resolve resource dependency keys and install system packages",
    version,
    author
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a rosdep.toml settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the resource index file
    #[arg(long, global = true, env = "ROSDEP_INDEX", default_value = DEFAULT_INDEX_PATH)]
    index: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dependency keys of a resource
    Keys(query::KeysCommand),

    /// List loadable resources
    Resources,

    /// List loadable views
    Views,

    /// Print the view a resource resolves into
    ViewKey(query::ViewKeyCommand),

    /// Install Python packages with pip
    Install(install::InstallCommand),

    /// Print backend tool versions
    Versions,

    /// Fetch a URL and write its content to stdout
    Fetch(fetch::FetchCommand),
}

impl Cli {
    /// Build the shared configuration from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            settings_path: self.config.clone(),
            index_path: self.index.clone(),
        }
    }

    /// Install the global tracing subscriber. Logs go to stderr so command
    /// output on stdout stays machine readable.
    pub fn init_logging(&self) {
        let filter = match self.build_config().log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Execute the selected command, writing results to stdout.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.execute_with_config(&config, &mut out).await
    }

    /// Execute the selected command with an explicit configuration and output.
    pub async fn execute_with_config(self, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
        match self.command {
            Commands::Keys(cmd) => cmd.execute(config, out),
            Commands::Resources => query::list_resources(config, out),
            Commands::Views => query::list_views(config, out),
            Commands::ViewKey(cmd) => cmd.execute(config, out),
            Commands::Install(cmd) => cmd.execute(config, out),
            Commands::Versions => install::print_versions(config, out),
            Commands::Fetch(cmd) => cmd.execute(out).await,
        }
    }
}
