//! In-memory resource table backing [`ResourceIndex`] and [`ManifestParser`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::{ManifestParser, ResourceIndex};
use crate::core::RosdepError;
use crate::manifest::{Dependency, DependencyType, Manifest, ManifestFormat, PackageManifest};

/// A dependency row of a structured entry, as written in the index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    /// Dependency category
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    /// Abstract dependency key
    pub name: String,
    /// Optional condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// One indexed resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Manifest format
    #[serde(default)]
    pub format: ManifestFormat,
    /// Direct dependency keys (legacy format)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rosdeps: Vec<String>,
    /// Names of resources this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
    /// Declared dependencies (structured format)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DeclaredDependency>,
    /// Manifest location; defaults to `<name>/package.xml` or `<name>/manifest.xml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ResourceEntry {
    /// A legacy entry with direct keys and depends.
    pub fn legacy(rosdeps: &[&str], depends: &[&str]) -> Self {
        Self {
            format: ManifestFormat::Legacy,
            rosdeps: rosdeps.iter().map(ToString::to_string).collect(),
            depends: depends.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// A structured entry with declared dependencies and depends.
    pub fn structured(dependencies: Vec<DeclaredDependency>, depends: &[&str]) -> Self {
        Self {
            format: ManifestFormat::Structured,
            dependencies,
            depends: depends.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    fn manifest_path(&self, name: &str) -> PathBuf {
        self.path.clone().unwrap_or_else(|| match self.format {
            ManifestFormat::Structured => Path::new(name).join("package.xml"),
            ManifestFormat::Legacy => Path::new(name).join("manifest.xml"),
        })
    }
}

impl DeclaredDependency {
    /// Shorthand constructor used by fixtures.
    pub fn new(dep_type: DependencyType, name: &str, condition: Option<&str>) -> Self {
        Self {
            dep_type,
            name: name.to_string(),
            condition: condition.map(ToString::to_string),
        }
    }
}

/// Named resources of one kind (packages or stacks).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTable {
    entries: BTreeMap<String, ResourceEntry>,
}

impl ResourceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: ResourceEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, entry: ResourceEntry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Result<&ResourceEntry> {
        self.entries.get(name).ok_or_else(|| {
            RosdepError::ResourceNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Find the entry whose manifest lives at `path`.
    pub(crate) fn find_by_path(&self, path: &Path) -> Option<(&str, &ResourceEntry)> {
        self.entries
            .iter()
            .find(|(name, entry)| entry.manifest_path(name) == path)
            .map(|(name, entry)| (name.as_str(), entry))
    }
}

impl ResourceIndex for ResourceTable {
    fn list(&self) -> Result<BTreeSet<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn get_manifest(&self, name: &str) -> Result<Manifest> {
        let entry = self.entry(name)?;
        Ok(Manifest {
            format: entry.format,
            rosdeps: entry.rosdeps.clone(),
        })
    }

    fn get_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.entry(name)?.manifest_path(name))
    }

    fn get_depends(&self, name: &str, implicit: bool) -> Result<Vec<String>> {
        let entry = self.entry(name)?;
        if !implicit {
            return Ok(entry.depends.clone());
        }

        // Breadth-first, first-seen order; the visited set keeps cyclic tables finite
        let mut ordered = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([name]);
        let mut queue: VecDeque<&str> = entry.depends.iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            ordered.push(current.to_string());
            queue.extend(self.entry(current)?.depends.iter().map(String::as_str));
        }

        Ok(ordered)
    }
}

impl ManifestParser for ResourceTable {
    fn parse_package(&self, path: &Path) -> Result<PackageManifest> {
        let (name, entry) = self.find_by_path(path).ok_or_else(|| RosdepError::InvalidData {
            reason: format!("no manifest at {}", path.display()),
        })?;
        Ok(to_package_manifest(name, entry))
    }
}

pub(crate) fn to_package_manifest(name: &str, entry: &ResourceEntry) -> PackageManifest {
    entry.dependencies.iter().fold(PackageManifest::new(name), |manifest, declared| {
        manifest.with_dependency(
            declared.dep_type,
            Dependency {
                name: declared.name.clone(),
                condition: declared.condition.clone(),
            },
        )
    })
}
