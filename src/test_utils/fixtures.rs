//! Ready-made resource indexes for tests.

use std::path::{Path, PathBuf};

use crate::index::{DeclaredDependency, ResourceEntry, ResourceTable, WorkspaceIndex};
use crate::manifest::DependencyType;

/// A small ROS-like workspace in index-file form.
///
/// - `roscpp` (legacy, keys `boost`, `pkg-config`) depends on `rosconsole` and `cpp_common`
/// - `rosconsole` (structured) has `log4cxx` only when `ROS_VERSION == 1`, and
///   depends on `cpp_common`
/// - `cpp_common` (legacy, key `console-bridge`)
/// - `rosdoc` (structured) has a `doc` dependency only
/// - stack `ros_comm` (structured, a metapackage) and stack `legacy_stack` (legacy)
pub const WORKSPACE_TOML: &str = r#"
[packages.roscpp]
format = "legacy"
rosdeps = ["boost", "pkg-config"]
depends = ["rosconsole", "cpp_common"]

[packages.rosconsole]
format = "structured"
depends = ["cpp_common"]
[[packages.rosconsole.dependencies]]
type = "build"
name = "log4cxx"
condition = "$ROS_VERSION == 1"
[[packages.rosconsole.dependencies]]
type = "exec"
name = "apr"

[packages.cpp_common]
format = "legacy"
rosdeps = ["console-bridge"]

[packages.rosdoc]
format = "structured"
[[packages.rosdoc.dependencies]]
type = "doc"
name = "doxygen"

[stacks.ros_comm]
format = "structured"
[[stacks.ros_comm.dependencies]]
type = "exec"
name = "roscpp"

[stacks.legacy_stack]
format = "legacy"
"#;

/// Two-resource workspace: legacy `a` (key `foo`) depends on structured `b`
/// (build key `bar`).
pub fn mixed_workspace() -> WorkspaceIndex {
    WorkspaceIndex {
        packages: ResourceTable::new()
            .with("a", ResourceEntry::legacy(&["foo"], &["b"]))
            .with(
                "b",
                ResourceEntry::structured(
                    vec![DeclaredDependency::new(DependencyType::Build, "bar", None)],
                    &[],
                ),
            ),
        stacks: ResourceTable::new(),
    }
}

/// Write [`WORKSPACE_TOML`] to `dir/index.toml` and return its path.
pub fn write_workspace(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join("index.toml");
    std::fs::write(&path, WORKSPACE_TOML)?;
    Ok(path)
}
