//! Shared test utilities for integration tests
//!
//! Provides common fixture creation and helper functions
//! used across multiple test files.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Python service with a repeated `return None` / `return session_id`
pub const USER_SERVICE: &str = include_str!("fixtures/user_service.py");

/// Rust module with an impl, a trait and a nested module
pub const LEDGER: &str = include_str!("fixtures/ledger.rs");

/// Copy a fixture into a fresh temp dir under `name`.
pub fn fixture_dir(
    name: &str,
    content: &str,
) -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child(name)
        .write_str(content)
        .expect("write fixture");

    // Return the prepared directory to the caller
    tmp
}

/// Read a file from the fixture dir as UTF-8.
pub fn read(
    tmp: &assert_fs::TempDir,
    name: &str,
) -> String
{
    std::fs::read_to_string(tmp.path().join(name)).expect("read fixture")
}
