use std::collections::BTreeMap;

use rosdep::config::{ElevationMode, FetchConfig, LoaderConfig, PipConfig};
use rosdep::constants::DEFAULT_VIEW_KEY;
use rosdep::core::RosdepError;
use rosdep::fetch::fetch_url;
use rosdep::index::{ViewStore, WorkspaceIndex};
use rosdep::installer::{InstallOptions, InstallerRequest, PackageManagerInstaller, PipInstaller};
use rosdep::loader::{DependencyLoader, ResourceIndexLoader};
use rosdep::test_utils::fixtures::write_workspace;
use rosdep::test_utils::{ScriptedRunner, init_test_logging};

/// Abstract key to pip package name, standing in for the external rules table.
fn pip_names() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([("apr", "apr-py"), ("console-bridge", "console-bridge-py"), ("boost", "boost-py")])
}

#[test]
fn test_index_file_to_executed_plan() {
    init_test_logging(None);
    let temp = tempfile::tempdir().unwrap();
    let index = WorkspaceIndex::load(&write_workspace(temp.path()).unwrap()).unwrap();
    let loader = ResourceIndexLoader::from_workspace(index, LoaderConfig::default());

    let mapping = pip_names();
    let packages: Vec<String> = loader
        .get_rosdeps("roscpp", true)
        .unwrap()
        .iter()
        .filter_map(|key| mapping.get(key.as_str()).map(ToString::to_string))
        .collect();
    assert_eq!(packages, vec!["apr-py", "boost-py", "console-bridge-py"]);

    let runner = ScriptedRunner::new()
        .ok("pip3 --version", "pip 24.0 from /usr/lib/python3 (python 3.12)")
        .ok("pip3 freeze", "boost-py==1.0\n")
        .ok("sudo -H pip3 install --break-system-packages -U apr-py", "")
        .ok("sudo -H pip3 install --break-system-packages -U console-bridge-py", "");
    let installer = PipInstaller::new(runner, PipConfig::default());

    let resolved = installer.resolve(&InstallerRequest::new(packages)).unwrap();
    let plan = installer.get_install_plan(&resolved, &InstallOptions::default()).unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan.commands.iter().all(|c| c.elevated));

    plan.execute(installer.runner()).unwrap();
    let calls = installer.runner().calls();
    assert!(calls.ends_with(&[
        "sudo -H pip3 install --break-system-packages -U apr-py".to_string(),
        "sudo -H pip3 install --break-system-packages -U console-bridge-py".to_string(),
    ]));
}

#[test]
fn test_failed_install_is_reported() {
    let runner = ScriptedRunner::new()
        .ok("pip3 --version", "pip 23.0 from /x")
        .ok("pip3 freeze", "")
        .fail("pip3 install -U broken", 1, "ERROR: No matching distribution found for broken")
        .ok("pip3 install -U fine", "");
    let installer = PipInstaller::new(
        runner,
        PipConfig {
            elevation: ElevationMode::None,
            ..PipConfig::default()
        },
    );

    let plan = installer
        .get_install_plan(&["broken".to_string(), "fine".to_string()], &InstallOptions::default())
        .unwrap();
    let err = plan.execute(installer.runner()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RosdepError>(),
        Some(RosdepError::InstallFailed { reason, .. }) if reason.starts_with("broken")
    ));
    assert!(!installer.runner().calls().contains(&"pip3 install -U fine".to_string()));
}

#[tokio::test]
async fn test_fetched_rules_feed_the_view_chain() {
    let temp = tempfile::tempdir().unwrap();
    let rules = temp.path().join("base.yaml");
    std::fs::write(&rules, "boost:\n  ubuntu: [libboost-all-dev]\n").unwrap();

    let url = format!("file://{}", rules.display());
    let content = fetch_url(&url, &FetchConfig::default()).await.unwrap();

    let mut store = ViewStore::new();
    store
        .set_view_data_from_yaml("base", &String::from_utf8(content).unwrap(), vec![], &url)
        .unwrap();

    let index = WorkspaceIndex::load(&write_workspace(temp.path()).unwrap()).unwrap();
    let loader = ResourceIndexLoader::from_workspace(
        index,
        LoaderConfig {
            underlay_key: Some("base".to_string()),
            ..LoaderConfig::default()
        },
    );
    let view = loader.get_view_key("roscpp").unwrap();
    loader.load_view(&view, &mut store).unwrap();

    let merged = store.merged_data(DEFAULT_VIEW_KEY).unwrap();
    assert!(merged.contains_key("boost"));
    assert_eq!(store.get(DEFAULT_VIEW_KEY).unwrap().origin, "<nodata>");
}
