//! Collaborators of the dependency loader.
//!
//! The loader never reads the filesystem itself. It talks to:
//!
//! - a [`ResourceIndex`] listing resources, their manifests and their
//!   depends-on relation (one for packages, one for stacks);
//! - a [`ManifestParser`] turning a structured manifest location into a
//!   [`PackageManifest`];
//! - a [`ViewDatabase`] it registers views into.
//!
//! [`WorkspaceIndex`] bundles in-memory implementations loadable from a TOML
//! file:
//!
//! ```toml
//! [packages.roscpp]
//! format = "legacy"
//! rosdeps = ["boost"]
//! depends = ["rosconsole"]
//!
//! [packages.rosconsole]
//! format = "structured"
//! [[packages.rosconsole.dependencies]]
//! type = "build"
//! name = "log4cxx"
//! condition = "$ROS_VERSION == 1"
//!
//! [stacks.ros_comm]
//! format = "structured"
//! ```

mod table;
mod views;

pub use table::{DeclaredDependency, ResourceEntry, ResourceTable};
pub use views::{ViewEntry, ViewStore};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::RosdepError;
use crate::manifest::{Manifest, PackageManifest};

/// Raw abstract-key-to-platform-package data of one view.
pub type ViewData = BTreeMap<String, serde_yaml::Value>;

/// Lists and locates resources. Read-only from the loader's point of view.
pub trait ResourceIndex {
    /// Names of all indexed resources.
    fn list(&self) -> Result<BTreeSet<String>>;

    /// Manifest summary of `name`.
    ///
    /// # Errors
    ///
    /// [`RosdepError::ResourceNotFound`] for unknown names.
    fn get_manifest(&self, name: &str) -> Result<Manifest>;

    /// Manifest location of `name`.
    ///
    /// # Errors
    ///
    /// [`RosdepError::ResourceNotFound`] for unknown names.
    fn get_path(&self, name: &str) -> Result<PathBuf>;

    /// Resources `name` depends on: direct only, or the transitive set when `implicit`.
    ///
    /// # Errors
    ///
    /// [`RosdepError::ResourceNotFound`] for unknown names.
    fn get_depends(&self, name: &str, implicit: bool) -> Result<Vec<String>>;
}

/// Parses structured manifests.
pub trait ManifestParser {
    /// Parse the structured manifest at `path`.
    fn parse_package(&self, path: &Path) -> Result<PackageManifest>;
}

/// Externally owned store of view data. The loader writes to it and never reads
/// resolved results back.
pub trait ViewDatabase {
    /// Whether `view_name` has been registered.
    fn is_loaded(&self, view_name: &str) -> bool;

    /// Register data for `view_name`, chained to `view_dependencies`.
    fn set_view_data(
        &mut self,
        view_name: &str,
        data: ViewData,
        view_dependencies: Vec<String>,
        origin: &str,
    );
}

/// Packages and stacks of one workspace, as read from an index file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceIndex {
    /// Buildable resources
    #[serde(default)]
    pub packages: ResourceTable,
    /// Grouping containers
    #[serde(default)]
    pub stacks: ResourceTable,
}

impl WorkspaceIndex {
    /// Parse an index from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::IndexParseError`] naming `origin` on invalid TOML.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RosdepError::IndexParseError {
                file: origin.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Read and parse an index file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resource index: {}", path.display()))?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Split into the collaborators a loader needs: packages, stacks, parser.
    pub fn into_collaborators(
        self,
    ) -> (Arc<dyn ResourceIndex>, Arc<dyn ResourceIndex>, Arc<dyn ManifestParser>) {
        let shared = Arc::new(self);
        (
            Arc::new(shared.packages.clone()),
            Arc::new(shared.stacks.clone()),
            shared,
        )
    }
}

impl ManifestParser for WorkspaceIndex {
    fn parse_package(&self, path: &Path) -> Result<PackageManifest> {
        self.packages
            .find_by_path(path)
            .or_else(|| self.stacks.find_by_path(path))
            .map(|(name, entry)| table::to_package_manifest(name, entry))
            .ok_or_else(|| {
                RosdepError::InvalidData {
                    reason: format!("no manifest at {}", path.display()),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{DependencyType, ManifestFormat};

    const INDEX: &str = r#"
[packages.roscpp]
format = "legacy"
rosdeps = ["boost"]
depends = ["rosconsole"]

[packages.rosconsole]
format = "structured"
[[packages.rosconsole.dependencies]]
type = "build"
name = "log4cxx"
condition = "$ROS_VERSION == 1"

[stacks.ros_comm]
format = "structured"
[[stacks.ros_comm.dependencies]]
type = "exec"
name = "roscpp"
"#;

    #[test]
    fn test_parse_index() {
        let index = WorkspaceIndex::from_toml(INDEX, "inline").unwrap();
        assert_eq!(index.packages.len(), 2);
        assert_eq!(index.stacks.len(), 1);

        let roscpp = index.packages.get("roscpp").unwrap();
        assert_eq!(roscpp.format, ManifestFormat::Legacy);
        assert_eq!(roscpp.rosdeps, vec!["boost"]);

        let rosconsole = index.packages.get("rosconsole").unwrap();
        assert_eq!(rosconsole.dependencies[0].dep_type, DependencyType::Build);
        assert_eq!(rosconsole.dependencies[0].condition.as_deref(), Some("$ROS_VERSION == 1"));
    }

    #[test]
    fn test_parser_finds_stacks_and_packages() {
        let index = WorkspaceIndex::from_toml(INDEX, "inline").unwrap();
        let stack = index.parse_package(Path::new("ros_comm/package.xml")).unwrap();
        assert_eq!(stack.name, "ros_comm");
        let package = index.parse_package(Path::new("rosconsole/package.xml")).unwrap();
        assert_eq!(package.dependencies.len(), 1);
        assert!(index.parse_package(Path::new("missing/package.xml")).is_err());
    }

    #[test]
    fn test_invalid_index() {
        let err = WorkspaceIndex::from_toml("[packages.x]\nformat = \"xml\"\n", "bad.toml")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosdepError>(),
            Some(RosdepError::IndexParseError { file, .. }) if file == "bad.toml"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("index.toml");
        std::fs::write(&path, INDEX).unwrap();
        let index = WorkspaceIndex::load(&path).unwrap();
        assert_eq!(index.packages.list().unwrap().len(), 2);
    }
}
