//! rosdep - resource dependency resolution and package installation
//!
//! Computes the abstract dependency keys of resources in a workspace and turns
//! backend package names into install commands.
//!
//! # Architecture Overview
//!
//! - A [`loader::ResourceIndexLoader`] answers dependency questions about
//!   resources listed in a resource index. Resources use either a structured
//!   manifest (typed, conditional dependencies) or a legacy manifest (flat keys
//!   whose closure follows the depends-on relation); both shapes mix freely.
//! - An [`installer::PackageManagerInstaller`] (currently pip) detects which
//!   packages are present, attaches version constraints and synthesizes an
//!   [`installer::InstallPlan`] executed one command at a time.
//! - Mapping abstract keys to backend package names happens outside this crate.
//!
//! # Core Modules
//!
//! - [`core`] - Error types and user-facing error rendering
//! - [`constants`] - Shared names and thresholds
//! - [`config`] - Explicit configuration values and the `rosdep.toml` settings file
//! - [`manifest`] - Manifest shapes, dependency types and condition evaluation
//! - [`index`] - Collaborator traits and in-memory index and view implementations
//! - [`loader`] - Dependency closure computation and view registration
//! - [`process`] - Subprocess execution seam
//! - [`installer`] - Package backends, requests and install plans
//! - [`fetch`] - Remote content retrieval
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use rosdep::config::LoaderConfig;
//! use rosdep::index::WorkspaceIndex;
//! use rosdep::loader::{DependencyLoader, ResourceIndexLoader};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let index = WorkspaceIndex::load(Path::new("rosdep-index.toml"))?;
//! let loader = ResourceIndexLoader::from_workspace(index, LoaderConfig::from_env());
//! for key in loader.get_rosdeps("roscpp", true)? {
//!     println!("{key}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetch;
pub mod index;
pub mod installer;
pub mod loader;
pub mod manifest;
pub mod process;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
