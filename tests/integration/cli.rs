//! Binary-level tests: argument parsing, stdout and error rendering.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use rosdep::test_utils::fixtures::write_workspace;

fn rosdep(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rosdep").unwrap();
    cmd.current_dir(temp.path()).env_remove("ROSDEP_INDEX").env_remove("ROS_VERSION");
    cmd
}

#[test]
fn test_keys_from_default_index_location() {
    let temp = TempDir::new().unwrap();
    let written = write_workspace(temp.path()).unwrap();
    std::fs::rename(written, temp.path().join("rosdep-index.toml")).unwrap();

    rosdep(&temp)
        .args(["keys", "roscpp", "--direct"])
        .assert()
        .success()
        .stdout("boost\npkg-config\n");
}

#[test]
fn test_views_and_view_key() {
    let temp = TempDir::new().unwrap();
    let index = write_workspace(temp.path()).unwrap();

    rosdep(&temp)
        .arg("--index")
        .arg(&index)
        .arg("views")
        .assert()
        .success()
        .stdout(predicate::str::contains("ros_comm (metapackage)"));

    rosdep(&temp)
        .arg("--index")
        .arg(&index)
        .args(["view-key", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Resource 'ghost' not found"))
        .stderr(predicate::str::contains("rosdep resources"));
}

#[test]
fn test_missing_index_reports_file() {
    let temp = TempDir::new().unwrap();
    rosdep(&temp)
        .arg("resources")
        .assert()
        .failure()
        .stderr(predicate::str::contains("rosdep-index.toml"));
}

#[test]
fn test_fetch_file_url() {
    let temp = TempDir::new().unwrap();
    let rules = temp.path().join("rules.yaml");
    std::fs::write(&rules, "python3-yaml:\n  ubuntu: [python3-yaml]\n").unwrap();

    rosdep(&temp)
        .arg("fetch")
        .arg(rules.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("python3-yaml"));
}

#[test]
fn test_install_rejects_json_without_simulate() {
    let temp = TempDir::new().unwrap();
    rosdep(&temp).args(["install", "x", "--json"]).assert().failure().code(2);
}
