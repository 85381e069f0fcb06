//! Shared test utilities for gitdrift CLI integration tests.

use assert_cmd::Command;

/// Get a Command for the gitdrift binary.
///
/// # Panics
///
/// Panics if the gitdrift binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn gitdrift_cmd() -> Command {
    Command::cargo_bin("gitdrift").expect("gitdrift binary should exist")
}
