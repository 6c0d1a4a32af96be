//! Manifest shapes understood by the dependency loader.
//!
//! Two manifest formats coexist in one resource graph:
//!
//! - **Structured** manifests ([`PackageManifest`]) list dependencies per
//!   [`DependencyType`], each with an optional condition evaluated against the
//!   current environment.
//! - **Legacy** manifests carry a flat list of dependency keys with no
//!   conditions; their closure is computed by walking the depends-on relation.
//!
//! The index reports a lightweight [`Manifest`] for every resource; structured
//! manifests are parsed in full by a [`ManifestParser`](crate::index::ManifestParser).

pub mod condition;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::core::RosdepError;
pub use condition::{Condition, evaluate_condition};

/// Dependency category declared in a structured manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Needed to build the resource
    Build,
    /// Build tools, e.g. code generators
    Buildtool,
    /// Needed by resources building against this one
    BuildExport,
    /// Build tools needed by resources building against this one
    BuildtoolExport,
    /// Needed at runtime
    Exec,
    /// Needed to run the tests
    Test,
    /// Needed to build documentation
    Doc,
}

impl DependencyType {
    /// Every valid dependency category.
    pub const ALL: [Self; 7] = [
        Self::Build,
        Self::Buildtool,
        Self::BuildExport,
        Self::BuildtoolExport,
        Self::Exec,
        Self::Test,
        Self::Doc,
    ];

    /// Categories included when the caller supplies no allow-list: all except `doc`.
    pub fn default_set() -> BTreeSet<Self> {
        Self::ALL.into_iter().filter(|t| *t != Self::Doc).collect()
    }

    /// Intersect a caller-supplied allow-list with the valid categories, falling
    /// back to [`default_set`](Self::default_set) when the list is empty.
    pub fn include_set(requested: &[Self]) -> BTreeSet<Self> {
        if requested.is_empty() {
            Self::default_set()
        } else {
            Self::ALL.into_iter().filter(|t| requested.contains(t)).collect()
        }
    }

    /// Name as written in manifests and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Buildtool => "buildtool",
            Self::BuildExport => "build_export",
            Self::BuildtoolExport => "buildtool_export",
            Self::Exec => "exec",
            Self::Test => "test",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = RosdepError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or_else(|| {
            RosdepError::InvalidData {
                reason: format!("unknown dependency type '{s}'"),
            }
        })
    }
}

/// A dependency declared in a structured manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Abstract dependency key
    pub name: String,
    /// Optional condition, e.g. `$ROS_VERSION == 2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Dependency {
    /// Create an unconditional dependency.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
        }
    }

    /// Create a dependency guarded by a condition.
    pub fn conditional(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: Some(condition.into()),
        }
    }

    /// Evaluate this dependency's condition; an absent condition is true.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::InvalidCondition`] for a malformed condition.
    pub fn evaluate(&self, env: &BTreeMap<String, String>) -> Result<bool> {
        evaluate_condition(self.condition.as_deref(), env)
    }
}

/// A fully parsed structured manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// Resource name
    pub name: String,
    /// Declared dependencies per category
    pub dependencies: BTreeMap<DependencyType, Vec<Dependency>>,
}

impl PackageManifest {
    /// Create an empty manifest.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Builder-style helper adding a dependency under `dep_type`.
    #[must_use]
    pub fn with_dependency(mut self, dep_type: DependencyType, dependency: Dependency) -> Self {
        self.dependencies.entry(dep_type).or_default().push(dependency);
        self
    }

    /// Dependency names of the included categories whose condition holds under `env`.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::InvalidCondition`] for a malformed condition.
    pub fn evaluated_keys(
        &self,
        include: &BTreeSet<DependencyType>,
        env: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>> {
        let mut keys = BTreeSet::new();
        for dep_type in include {
            for dependency in self.dependencies.get(dep_type).into_iter().flatten() {
                if dependency.evaluate(env)? {
                    keys.insert(dependency.name.clone());
                }
            }
        }
        Ok(keys)
    }
}

/// Manifest format of an indexed resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestFormat {
    /// Per-dependency categories and conditions
    Structured,
    /// Flat key list, closure computed through the depends-on relation
    #[default]
    Legacy,
}

/// What the resource index reports about a resource's manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Manifest format
    pub format: ManifestFormat,
    /// Dependency keys declared directly in a legacy manifest
    pub rosdeps: Vec<String>,
}

impl Manifest {
    /// A structured manifest marker.
    pub fn structured() -> Self {
        Self {
            format: ManifestFormat::Structured,
            rosdeps: Vec::new(),
        }
    }

    /// A legacy manifest with the given direct keys.
    pub fn legacy<I, S>(rosdeps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format: ManifestFormat::Legacy,
            rosdeps: rosdeps.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this manifest uses the structured format.
    pub fn is_structured(&self) -> bool {
        self.format == ManifestFormat::Structured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_excludes_doc() {
        let set = DependencyType::default_set();
        assert_eq!(set.len(), 6);
        assert!(!set.contains(&DependencyType::Doc));
    }

    #[test]
    fn test_include_set_intersects() {
        let set = DependencyType::include_set(&[DependencyType::Doc, DependencyType::Exec]);
        assert_eq!(set, BTreeSet::from([DependencyType::Exec, DependencyType::Doc]));
        assert_eq!(DependencyType::include_set(&[]), DependencyType::default_set());
    }

    #[test]
    fn test_dependency_type_round_trip_names() {
        for dep_type in DependencyType::ALL {
            assert_eq!(dep_type.as_str().parse::<DependencyType>().unwrap(), dep_type);
        }
        assert!("runtime".parse::<DependencyType>().is_err());
    }

    #[test]
    fn test_evaluated_keys_filters_conditions_and_categories() {
        let manifest = PackageManifest::new("nav")
            .with_dependency(DependencyType::Build, Dependency::new("eigen"))
            .with_dependency(
                DependencyType::Exec,
                Dependency::conditional("python3-yaml", "$ROS_PYTHON_VERSION == 3"),
            )
            .with_dependency(
                DependencyType::Exec,
                Dependency::conditional("python-yaml", "$ROS_PYTHON_VERSION == 2"),
            )
            .with_dependency(DependencyType::Doc, Dependency::new("doxygen"));

        let env = BTreeMap::from([("ROS_PYTHON_VERSION".to_string(), "3".to_string())]);
        let keys = manifest.evaluated_keys(&DependencyType::default_set(), &env).unwrap();
        assert_eq!(keys, BTreeSet::from(["eigen".to_string(), "python3-yaml".to_string()]));
    }
}
