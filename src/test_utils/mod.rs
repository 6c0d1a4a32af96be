//! Test utilities for rosdep
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] for tracing output in tests
//! - [`ScriptedRunner`], a [`ProcessRunner`](crate::process::ProcessRunner)
//!   answering from a script instead of spawning processes
//! - [`fixtures`] with ready-made resource indexes
//!
//! # Example
//!
//! ```rust,no_run
//! use rosdep::test_utils::ScriptedRunner;
//!
//! let runner = ScriptedRunner::new()
//!     .ok("pip3 --version", "pip 24.0 from /usr/lib/python3 (python 3.12)")
//!     .ok("pip3 freeze", "requests==2.31.0\n");
//! ```

pub mod fixtures;
mod runner;

pub use runner::ScriptedRunner;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=loader=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show targets like "loader" and "pip"
            .with_thread_ids(false)
            .try_init();
    });
}
