//! In-memory view database.

use anyhow::Result;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{ViewData, ViewDatabase};
use crate::core::RosdepError;

/// Data registered for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    /// Raw key-to-package mapping data
    pub data: ViewData,
    /// Parent (underlay) views, nearest first
    pub view_dependencies: Vec<String>,
    /// Where the data came from (URL, file, or `<nodata>`)
    pub origin: String,
}

/// [`ViewDatabase`] keeping every view in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ViewStore {
    views: HashMap<String, ViewEntry>,
}

impl ViewStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered entry for `view_name`.
    pub fn get(&self, view_name: &str) -> Option<&ViewEntry> {
        self.views.get(view_name)
    }

    /// Names of all registered views, sorted.
    pub fn view_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.keys().cloned().collect();
        names.sort();
        names
    }

    /// Register view data from YAML text. The document must be a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::InvalidData`] if the text is not a YAML mapping.
    pub fn set_view_data_from_yaml(
        &mut self,
        view_name: &str,
        yaml: &str,
        view_dependencies: Vec<String>,
        origin: &str,
    ) -> Result<()> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| RosdepError::InvalidData {
            reason: format!("view data from {origin} is not valid YAML: {e}"),
        })?;

        let data = match value {
            Value::Mapping(mapping) => mapping
                .into_iter()
                .map(|(key, value)| match key {
                    Value::String(key) => Ok((key, value)),
                    other => Err(RosdepError::InvalidData {
                        reason: format!("view data from {origin} has non-string key {other:?}"),
                    }),
                })
                .collect::<std::result::Result<ViewData, RosdepError>>()?,
            Value::Null => ViewData::new(),
            _ => {
                return Err(RosdepError::InvalidData {
                    reason: format!("view data from {origin} must be a mapping"),
                }
                .into());
            }
        };

        self.set_view_data(view_name, data, view_dependencies, origin);
        Ok(())
    }

    /// Merge a view's data with its underlays; nearer views win on key conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::ResourceNotFound`] if the view or one of its
    /// underlays was never registered.
    pub fn merged_data(&self, view_name: &str) -> Result<ViewData> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        self.collect_chain(view_name, &mut chain, &mut seen)?;

        // chain is nearest-first; apply farthest first so nearer entries overwrite
        let mut merged = BTreeMap::new();
        for entry in chain.iter().rev() {
            merged.extend(entry.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(merged)
    }

    fn collect_chain<'a>(
        &'a self,
        view_name: &str,
        chain: &mut Vec<&'a ViewEntry>,
        seen: &mut HashSet<String>,
    ) -> Result<()> {
        if !seen.insert(view_name.to_string()) {
            return Ok(());
        }
        let entry = self.views.get(view_name).ok_or_else(|| RosdepError::ResourceNotFound {
            name: view_name.to_string(),
        })?;
        chain.push(entry);
        for parent in &entry.view_dependencies {
            self.collect_chain(parent, chain, seen)?;
        }
        Ok(())
    }
}

impl ViewDatabase for ViewStore {
    fn is_loaded(&self, view_name: &str) -> bool {
        self.views.contains_key(view_name)
    }

    fn set_view_data(
        &mut self,
        view_name: &str,
        data: ViewData,
        view_dependencies: Vec<String>,
        origin: &str,
    ) {
        tracing::debug!(
            target: "views",
            "Registering view [{}] from {} (underlays: {:?})",
            view_name,
            origin,
            view_dependencies
        );
        self.views.insert(
            view_name.to_string(),
            ViewEntry {
                data,
                view_dependencies,
                origin: origin.to_string(),
            },
        );
    }
}
