//! # gitdrift CLI
//!
//! Command-line interface for branch drift analysis.
//!
//! This binary provides access to `drift-core` functionality.
//! Run `gitdrift --help` for usage information.

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
