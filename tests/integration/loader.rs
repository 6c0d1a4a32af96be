use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rosdep::config::LoaderConfig;
use rosdep::constants::DEFAULT_VIEW_KEY;
use rosdep::core::RosdepError;
use rosdep::index::{
    DeclaredDependency, ResourceEntry, ResourceIndex, ResourceTable, ViewStore, WorkspaceIndex,
};
use rosdep::loader::{DependencyLoader, ResourceIndexLoader};
use rosdep::manifest::{DependencyType, Manifest};
use rosdep::test_utils::fixtures::{WORKSPACE_TOML, mixed_workspace};

fn keys(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(ToString::to_string).collect()
}

fn workspace_loader(config: LoaderConfig) -> ResourceIndexLoader {
    let index = WorkspaceIndex::from_toml(WORKSPACE_TOML, "fixture").unwrap();
    ResourceIndexLoader::from_workspace(index, config)
}

#[test]
fn test_mixed_closure() {
    let loader = ResourceIndexLoader::from_workspace(mixed_workspace(), LoaderConfig::default());
    assert_eq!(loader.get_rosdeps("a", true).unwrap(), keys(&["foo", "bar"]));
}

#[test]
fn test_structured_keys_follow_conditions() {
    let ros1 = workspace_loader(LoaderConfig::default().with_env("ROS_VERSION", "1"));
    assert_eq!(ros1.get_rosdeps("rosconsole", false).unwrap(), keys(&["log4cxx", "apr"]));

    let ros2 = workspace_loader(LoaderConfig::default().with_env("ROS_VERSION", "2"));
    assert_eq!(ros2.get_rosdeps("rosconsole", false).unwrap(), keys(&["apr"]));
}

#[test]
fn test_legacy_closure_is_a_set_over_all_paths() {
    // cpp_common is reached directly and through rosconsole
    let loader = workspace_loader(LoaderConfig::default());
    assert_eq!(
        loader.get_rosdeps("roscpp", true).unwrap(),
        keys(&["boost", "pkg-config", "apr", "console-bridge"])
    );
}

#[test]
fn test_doc_dependencies_need_opt_in() {
    let loader = workspace_loader(LoaderConfig::default());
    assert!(loader.get_rosdeps("rosdoc", false).unwrap().is_empty());

    let loader = workspace_loader(LoaderConfig {
        dependency_types: vec![DependencyType::Doc, DependencyType::Exec],
        ..LoaderConfig::default()
    });
    assert_eq!(loader.get_rosdeps("rosdoc", false).unwrap(), keys(&["doxygen"]));
}

#[test]
fn test_grouping_containers_and_unknown_names() {
    let loader = workspace_loader(LoaderConfig::default());
    assert!(loader.get_rosdeps("legacy_stack", true).unwrap().is_empty());
    assert!(loader.is_metapackage("ros_comm").unwrap());
    assert!(!loader.is_metapackage("legacy_stack").unwrap());

    for name in ["nope", ""] {
        let err = loader.get_rosdeps(name, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosdepError>(),
            Some(RosdepError::ResourceNotFound { .. })
        ));
    }
}

#[test]
fn test_view_registration() {
    let loader = workspace_loader(LoaderConfig {
        underlay_key: Some("base".to_string()),
        ..LoaderConfig::default()
    });
    let mut store = ViewStore::new();
    store.set_view_data_from_yaml("base", "boost:\n  ubuntu: libboost-dev\n", vec![], "base.yaml")
        .unwrap();

    for view in loader.get_loadable_views().unwrap() {
        loader.load_view(&view, &mut store).unwrap();
        loader.load_view(&view, &mut store).unwrap();
    }
    assert_eq!(store.view_names(), vec!["*default*", "base", "legacy_stack", "ros_comm"]);

    let merged = store.merged_data(DEFAULT_VIEW_KEY).unwrap();
    assert!(merged.contains_key("boost"));
    assert_eq!(loader.get_view_key("cpp_common").unwrap(), DEFAULT_VIEW_KEY);
}

/// Package index counting how often it is listed.
struct CountingIndex {
    inner: ResourceTable,
    lists: Cell<usize>,
}

impl ResourceIndex for CountingIndex {
    fn list(&self) -> Result<BTreeSet<String>> {
        self.lists.set(self.lists.get() + 1);
        self.inner.list()
    }

    fn get_manifest(&self, name: &str) -> Result<Manifest> {
        self.inner.get_manifest(name)
    }

    fn get_path(&self, name: &str) -> Result<PathBuf> {
        self.inner.get_path(name)
    }

    fn get_depends(&self, name: &str, implicit: bool) -> Result<Vec<String>> {
        self.inner.get_depends(name, implicit)
    }
}

#[test]
fn test_index_listings_are_cached() {
    let table = ResourceTable::new()
        .with("a", ResourceEntry::legacy(&["k"], &["b"]))
        .with(
            "b",
            ResourceEntry::structured(
                vec![DeclaredDependency::new(DependencyType::Exec, "j", None)],
                &[],
            ),
        );
    let packages = Arc::new(CountingIndex {
        inner: table.clone(),
        lists: Cell::new(0),
    });
    let loader = ResourceIndexLoader::new(
        packages.clone(),
        Arc::new(ResourceTable::new()),
        Arc::new(table),
        LoaderConfig::default(),
    );

    for _ in 0..3 {
        assert_eq!(loader.get_rosdeps("a", true).unwrap(), keys(&["k", "j"]));
        loader.get_view_key("b").unwrap();
    }
    // Once for the resource list, once for the structured manifest map
    assert_eq!(packages.lists.get(), 2);
}

#[test]
fn test_cycle_is_a_data_error() {
    let index = WorkspaceIndex {
        packages: ResourceTable::new()
            .with("p", ResourceEntry::legacy(&[], &["q"]))
            .with("q", ResourceEntry::legacy(&[], &["r"]))
            .with("r", ResourceEntry::legacy(&[], &["q"])),
        stacks: ResourceTable::new(),
    };
    let loader = ResourceIndexLoader::from_workspace(index, LoaderConfig::default());

    let err = loader.get_rosdeps("p", true).unwrap_err();
    match err.downcast_ref::<RosdepError>() {
        Some(RosdepError::CircularDependency { chain }) => assert_eq!(chain, "q -> r -> q"),
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}
