//! Integration test suite for rosdep
//!
//! Exercises the public API end to end with in-memory collaborators and a
//! scripted process runner. No real subprocesses or network access.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **loader**: Dependency closures, views and caching
//! - **installer**: Request resolution, detection and install plans
//! - **end_to_end**: Index file to executed install plan
//! - **cli**: The `rosdep` binary

mod cli;
mod end_to_end;
mod installer;
mod loader;
