//! Resource dependency loader.
//!
//! Computes the set of abstract dependency keys of an indexed resource. Two
//! manifest formats coexist in one workspace:
//!
//! - **structured** manifests declare typed, optionally conditional dependencies
//!   and are answered from the parsed manifest alone;
//! - **legacy** manifests list flat keys, and their implicit closure walks the
//!   depends-on relation, unioning the keys of every reachable resource
//!   (structured resources met on the way contribute their evaluated keys).
//!
//! The loader also registers one empty view per loadable view name into a
//! [`ViewDatabase`], chained to an optional underlay view.
//!
//! Index listings are cached after first use; the cache assumes the index does
//! not change for the lifetime of the loader.

use anyhow::Result;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::constants::{DEFAULT_VIEW_KEY, NO_DATA_ORIGIN};
use crate::core::RosdepError;
use crate::index::{ManifestParser, ResourceIndex, ViewData, ViewDatabase, WorkspaceIndex};
use crate::manifest::DependencyType;

/// Operations every dependency loader offers.
pub trait DependencyLoader {
    /// Register `view_name` in `db` with empty data. No-op if already loaded.
    ///
    /// # Errors
    ///
    /// [`RosdepError::ResourceNotFound`] if `view_name` is not a loadable view.
    fn load_view(&self, view_name: &str, db: &mut dyn ViewDatabase) -> Result<()>;

    /// Every stack name plus [`DEFAULT_VIEW_KEY`].
    fn get_loadable_views(&self) -> Result<BTreeSet<String>>;

    /// Every package name.
    fn get_loadable_resources(&self) -> Result<BTreeSet<String>>;

    /// Dependency keys of `resource_name`.
    ///
    /// For legacy packages, `implicit` extends the result over the transitive
    /// depends-on closure. Structured resources always answer with their own
    /// evaluated keys.
    ///
    /// # Errors
    ///
    /// - [`RosdepError::ResourceNotFound`] for names that are neither packages nor stacks
    /// - [`RosdepError::CircularDependency`] if the closure walk meets a cycle
    /// - [`RosdepError::InvalidCondition`] for malformed conditions
    fn get_rosdeps(&self, resource_name: &str, implicit: bool) -> Result<BTreeSet<String>>;

    /// Whether `resource_name` is a stack whose manifest is structured.
    fn is_metapackage(&self, resource_name: &str) -> Result<bool>;

    /// View a resource's keys are resolved in.
    ///
    /// # Errors
    ///
    /// [`RosdepError::ResourceNotFound`] for unknown resources.
    fn get_view_key(&self, resource_name: &str) -> Result<String>;
}

/// [`DependencyLoader`] over a package index, a stack index and a manifest parser.
pub struct ResourceIndexLoader {
    packages: Arc<dyn ResourceIndex>,
    stacks: Arc<dyn ResourceIndex>,
    parser: Arc<dyn ManifestParser>,
    config: LoaderConfig,
    include: BTreeSet<DependencyType>,
    resources: OnceCell<BTreeSet<String>>,
    structured_paths: OnceCell<BTreeMap<String, PathBuf>>,
}

impl std::fmt::Debug for ResourceIndexLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceIndexLoader")
            .field("config", &self.config)
            .field("include", &self.include)
            .finish_non_exhaustive()
    }
}

impl ResourceIndexLoader {
    /// Create a loader over explicit collaborators.
    pub fn new(
        packages: Arc<dyn ResourceIndex>,
        stacks: Arc<dyn ResourceIndex>,
        parser: Arc<dyn ManifestParser>,
        config: LoaderConfig,
    ) -> Self {
        let include = DependencyType::include_set(&config.dependency_types);
        Self {
            packages,
            stacks,
            parser,
            config,
            include,
            resources: OnceCell::new(),
            structured_paths: OnceCell::new(),
        }
    }

    /// Create a loader over a [`WorkspaceIndex`].
    pub fn from_workspace(index: WorkspaceIndex, config: LoaderConfig) -> Self {
        let (packages, stacks, parser) = index.into_collaborators();
        Self::new(packages, stacks, parser, config)
    }

    /// Dependency categories this loader includes.
    pub fn included_types(&self) -> &BTreeSet<DependencyType> {
        &self.include
    }

    fn loadable_resources(&self) -> Result<&BTreeSet<String>> {
        if let Some(cached) = self.resources.get() {
            return Ok(cached);
        }
        let listed = self.packages.list()?;
        tracing::debug!(target: "loader", "Indexed {} packages", listed.len());
        Ok(self.resources.get_or_init(|| listed))
    }

    /// Manifest locations of every structured package and stack.
    fn structured_paths(&self) -> Result<&BTreeMap<String, PathBuf>> {
        if let Some(cached) = self.structured_paths.get() {
            return Ok(cached);
        }

        let mut paths = BTreeMap::new();
        for index in [&self.packages, &self.stacks] {
            for name in index.list()? {
                if paths.contains_key(&name) || !index.get_manifest(&name)?.is_structured() {
                    continue;
                }
                let path = index.get_path(&name)?;
                paths.insert(name, path);
            }
        }
        tracing::debug!(target: "loader", "Found {} structured manifests", paths.len());
        Ok(self.structured_paths.get_or_init(|| paths))
    }

    fn structured_keys(&self, path: &std::path::Path) -> Result<BTreeSet<String>> {
        let manifest = self.parser.parse_package(path)?;
        manifest.evaluated_keys(&self.include, &self.config.environment)
    }

    /// Keys a single resource contributes, without following depends.
    fn direct_keys(&self, name: &str) -> Result<BTreeSet<String>> {
        if let Some(path) = self.structured_paths()?.get(name) {
            return self.structured_keys(path);
        }
        Ok(self.packages.get_manifest(name)?.rosdeps.into_iter().collect())
    }
}

impl DependencyLoader for ResourceIndexLoader {
    fn load_view(&self, view_name: &str, db: &mut dyn ViewDatabase) -> Result<()> {
        if db.is_loaded(view_name) {
            return Ok(());
        }
        if !self.get_loadable_views()?.contains(view_name) {
            return Err(RosdepError::ResourceNotFound {
                name: view_name.to_string(),
            }
            .into());
        }

        tracing::debug!(target: "loader", "Loading view [{}] with resource loader", view_name);
        let view_dependencies = self.config.underlay_key.iter().cloned().collect();
        db.set_view_data(view_name, ViewData::new(), view_dependencies, NO_DATA_ORIGIN);
        Ok(())
    }

    fn get_loadable_views(&self) -> Result<BTreeSet<String>> {
        let mut views = self.stacks.list()?;
        views.insert(DEFAULT_VIEW_KEY.to_string());
        Ok(views)
    }

    fn get_loadable_resources(&self) -> Result<BTreeSet<String>> {
        Ok(self.loadable_resources()?.clone())
    }

    fn get_rosdeps(&self, resource_name: &str, implicit: bool) -> Result<BTreeSet<String>> {
        if let Some(path) = self.structured_paths()?.get(resource_name) {
            return self.structured_keys(path);
        }

        if self.loadable_resources()?.contains(resource_name) {
            if !implicit {
                return self.direct_keys(resource_name);
            }
            let mut walk = ClosureWalk::new(self);
            walk.visit(resource_name)?;
            tracing::debug!(
                target: "loader",
                "Closure of {} reached {} resources",
                resource_name,
                walk.colors.len()
            );
            return Ok(walk.keys);
        }

        if self.stacks.list()?.contains(resource_name) {
            // Pure grouping container: no keys of its own
            return Ok(BTreeSet::new());
        }

        Err(RosdepError::ResourceNotFound {
            name: resource_name.to_string(),
        }
        .into())
    }

    fn is_metapackage(&self, resource_name: &str) -> Result<bool> {
        if !self.stacks.list()?.contains(resource_name) {
            return Ok(false);
        }
        Ok(self.stacks.get_manifest(resource_name)?.is_structured())
    }

    fn get_view_key(&self, resource_name: &str) -> Result<String> {
        if self.structured_paths()?.contains_key(resource_name)
            || self.loadable_resources()?.contains(resource_name)
        {
            Ok(DEFAULT_VIEW_KEY.to_string())
        } else {
            Err(RosdepError::ResourceNotFound {
                name: resource_name.to_string(),
            }
            .into())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the current DFS path
    Gray,
    /// Fully visited
    Black,
}

/// Depth-first walk over the depends-on relation collecting keys.
struct ClosureWalk<'a> {
    loader: &'a ResourceIndexLoader,
    colors: HashMap<String, Color>,
    path: Vec<String>,
    keys: BTreeSet<String>,
}

impl<'a> ClosureWalk<'a> {
    fn new(loader: &'a ResourceIndexLoader) -> Self {
        Self {
            loader,
            colors: HashMap::new(),
            path: Vec::new(),
            keys: BTreeSet::new(),
        }
    }

    fn visit(&mut self, name: &str) -> Result<()> {
        match self.colors.get(name) {
            Some(Color::Black) => return Ok(()),
            Some(Color::Gray) => {
                let start = self.path.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(name.to_string());
                return Err(RosdepError::CircularDependency {
                    chain: cycle.join(" -> "),
                }
                .into());
            }
            None => {}
        }

        self.colors.insert(name.to_string(), Color::Gray);
        self.path.push(name.to_string());

        self.keys.extend(self.loader.direct_keys(name)?);
        for child in self.loader.packages.get_depends(name, false)? {
            self.visit(&child)?;
        }

        self.path.pop();
        self.colors.insert(name.to_string(), Color::Black);
        Ok(())
    }
}
