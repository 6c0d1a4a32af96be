use std::collections::BTreeSet;

use rosdep::config::{ElevationMode, PipConfig};
use rosdep::core::RosdepError;
use rosdep::installer::{
    InstallKind, InstallOptions, InstallerRequest, PackageManagerInstaller, PipInstaller,
    VersionConstraints,
};
use rosdep::test_utils::ScriptedRunner;

const PIP_VERSION: &str = "pip 23.3.1 from /usr/lib/python3/dist-packages/pip (python 3.12)";

fn pip(runner: ScriptedRunner) -> PipInstaller<ScriptedRunner> {
    PipInstaller::new(
        runner,
        PipConfig {
            elevation: ElevationMode::None,
            ..PipConfig::default()
        },
    )
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn request(constraints: VersionConstraints) -> InstallerRequest {
    InstallerRequest::new("x").with_constraints(constraints)
}

#[test]
fn test_specifier_composition() {
    let installer = pip(ScriptedRunner::new());

    let range = request(VersionConstraints {
        gte: Some("1.0".into()),
        lte: Some("2.0".into()),
        ..VersionConstraints::default()
    });
    assert_eq!(installer.resolve(&range).unwrap(), names(&["x>=1.0,<=2.0"]));

    let exact = request(VersionConstraints {
        eq: Some("1.0".into()),
        ..VersionConstraints::default()
    });
    assert_eq!(installer.resolve(&exact).unwrap(), names(&["x==1.0"]));

    let mixed = request(VersionConstraints {
        lt: Some("3".into()),
        eq: Some("1.2".into()),
        gte: Some("1.0".into()),
        ..VersionConstraints::default()
    });
    assert_eq!(installer.resolve(&mixed).unwrap(), names(&["x==1.2,>=1.0,<3"]));

    assert_eq!(installer.resolve(&request(VersionConstraints::default())).unwrap(), names(&["x"]));
}

#[test]
fn test_resolve_is_repeatable() {
    let installer = pip(ScriptedRunner::new());
    let request = InstallerRequest::new(names(&["a", "b"])).with_constraints(VersionConstraints {
        gt: Some("0.5".into()),
        ..VersionConstraints::default()
    });
    let first = installer.resolve(&request).unwrap();
    let second = installer.resolve(&request).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, names(&["a>0.5", "b>0.5"]));
}

#[test]
fn test_resolve_value_shapes() {
    let installer = pip(ScriptedRunner::new());
    let value = |text: &str| serde_yaml::from_str::<serde_yaml::Value>(text).unwrap();

    assert_eq!(installer.resolve_value(&value("python3-yaml six")).unwrap(), names(&["python3-yaml", "six"]));
    assert_eq!(installer.resolve_value(&value("[a, b]")).unwrap(), names(&["a", "b"]));
    assert_eq!(
        installer.resolve_value(&value("packages: [a]\ngte: '2.0'")).unwrap(),
        names(&["a>=2.0"])
    );

    for bad in ["17", "true", "null"] {
        let err = installer.resolve_value(&value(bad)).unwrap_err();
        assert!(
            matches!(err.downcast_ref::<RosdepError>(), Some(RosdepError::InvalidData { .. })),
            "{bad} should be InvalidData"
        );
    }
}

#[test]
fn test_detection_paths() {
    let requested: BTreeSet<String> = ["numpy", "argparse", "missing"].iter().map(ToString::to_string).collect();

    let runner = ScriptedRunner::new()
        .ok("pip3 --version", PIP_VERSION)
        .ok("pip3 freeze", "numpy==1.26.4\n")
        .ok("pip3 show argparse", "Name: argparse\nVersion: 1.4.0\n")
        .fail("pip3 show missing", 1, "WARNING: Package(s) not found: missing");
    let installed = pip(runner).detect(&requested);
    assert_eq!(installed.into_iter().collect::<Vec<_>>(), names(&["argparse", "numpy"]));

    let runner = ScriptedRunner::new()
        .ok("pip3 --version", PIP_VERSION)
        .ok("pip3 show argparse", "Name: argparse\nVersion: 1.4.0\n");
    let installed = pip(runner)
        .with_listing(Box::new(|_argv: &[String]| Ok::<_, std::io::Error>("numpy==1.26.4\n".to_string())))
        .detect(&requested);
    assert_eq!(installed.into_iter().collect::<Vec<_>>(), names(&["numpy"]));
}

#[test]
fn test_probe_errors_count_as_missing() {
    let runner = ScriptedRunner::new().ok("pip3 --version", PIP_VERSION).missing("pip3 freeze");
    let requested: BTreeSet<String> = ["x".to_string()].into();
    assert!(pip(runner).detect(&requested).is_empty());
}

#[test]
fn test_plan_for_partially_installed_request() {
    let runner = ScriptedRunner::new()
        .ok("pip3 --version", PIP_VERSION)
        .ok("pip3 freeze", "x==0.9\n");
    let plan = pip(runner)
        .get_install_plan(&names(&["x", "y==2.0"]), &InstallOptions::default())
        .unwrap();

    assert_eq!(plan.len(), 1);
    let command = &plan.commands[0];
    assert_eq!(command.package, "y==2.0");
    assert_eq!(command.kind, InstallKind::Constrained);
    assert!(!command.elevated);
    assert_eq!(command.argv, names(&["pip3", "install", "y==2.0"]));
}

#[test]
fn test_bare_names_upgrade_and_order_is_kept() {
    let runner = ScriptedRunner::new().ok("pip3 --version", PIP_VERSION).ok("pip3 freeze", "");
    let plan = pip(runner)
        .get_install_plan(&names(&["zeta", "alpha>1"]), &InstallOptions::default())
        .unwrap();

    let lines: Vec<String> = plan.commands.iter().map(ToString::to_string).collect();
    assert_eq!(lines, vec!["pip3 install -U zeta", "pip3 install alpha>1"]);
    assert_eq!(plan.commands[0].kind, InstallKind::Upgrade);
}

#[test]
fn test_system_protection_threshold() {
    for (version, expected) in [("pip 23.3.1 from /x", false), ("pip 24.0 from /x", true), ("pip 25.1.1 from /x", true)] {
        let runner = ScriptedRunner::new().ok("pip3 --version", version).ok("pip3 freeze", "");
        let plan = pip(runner).get_install_plan(&names(&["x"]), &InstallOptions::default()).unwrap();
        assert_eq!(
            plan.commands[0].argv.contains(&"--break-system-packages".to_string()),
            expected,
            "{version}"
        );
    }
}

#[test]
fn test_missing_backend_fails_planning() {
    let err = pip(ScriptedRunner::new())
        .get_install_plan(&names(&["x"]), &InstallOptions::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RosdepError>(),
        Some(RosdepError::InstallFailed { .. })
    ));
}
