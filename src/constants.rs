//! Constants shared by the loader, installers and fetch helpers.

use std::time::Duration;

/// View that resources outside any stack resolve into.
///
/// It is the root of all dependencies and is superseded by an explicit underlay key.
pub const DEFAULT_VIEW_KEY: &str = "*default*";

/// Origin recorded for views registered by the resource loader, which carry no data.
pub const NO_DATA_ORIGIN: &str = "<nodata>";

/// Installer key for the pip backend.
pub const PIP_INSTALLER: &str = "pip";

/// First pip release that refuses to touch externally managed environments
/// unless explicitly overridden.
pub const PIP_SYSTEM_PROTECTION_VERSION: &str = "24.0";

/// Flag overriding pip's externally-managed-environment protection.
pub const PIP_BREAK_SYSTEM_PACKAGES: &str = "--break-system-packages";

/// Characters that start a version constraint suffix in a package identifier.
pub const CONSTRAINT_CHARS: [char; 5] = ['<', '>', '=', '!', '~'];

/// Host whose requests get the GitHub token attached.
pub const TRUSTED_RAW_HOST: &str = "raw.githubusercontent.com";

/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "API_TOKEN_GITHUB";

/// Deprecated name of [`GITHUB_TOKEN_ENV`].
pub const DEPRECATED_GITHUB_TOKEN_ENV: &str = "GHCR_PAT";

/// Environment variable selecting the Python major version for pip discovery.
pub const PYTHON_VERSION_ENV: &str = "ROS_PYTHON_VERSION";

/// Environment variable naming the Python interpreter rosdep runs alongside.
pub const PYTHON_INTERPRETER_ENV: &str = "ROSDEP_PYTHON";

/// Timeout for remote content retrieval (60 seconds).
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
