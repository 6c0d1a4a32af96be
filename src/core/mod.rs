//! Core types shared across rosdep.
//!
//! - [`RosdepError`] - typed failures raised by the loader, installers and fetch helpers
//! - [`ErrorContext`] - user-facing wrapper with suggestions, used by the CLI
//! - [`user_friendly_error`] - maps any [`anyhow::Error`] to an [`ErrorContext`]
//!
//! Fallible functions return [`anyhow::Result`]; typed errors are recovered with
//! `error.downcast_ref::<RosdepError>()`.

pub mod error;

pub use error::{ErrorContext, RosdepError, user_friendly_error};
