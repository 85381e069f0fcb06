//! External command execution.
//!
//! Every interaction with the version-control tool and the filesystem
//! helpers (`cp`, `rm`) goes through [`Shell`]. Commands run with a captured
//! stdout/stderr, an optional working directory, and a hard per-invocation
//! deadline. A timed-out command is killed and surfaced as
//! [`DriftError::CommandTimeout`]; the caller decides whether that is fatal
//! to the run or only to one observation.
//!
//! Invocations carry an optional worker index for log correlation only.
//! Callers must never issue overlapping invocations against the same working
//! directory; different directories may run concurrently.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;
use wait_timeout::ChildExt;

use crate::errors::DriftError;

/// Hard ceiling for a single external command.
pub const COMMAND_TIMEOUT_SECS: u64 = 60;

/// Captured outcome of one external command.
#[derive(Debug, Clone)]
pub struct ShellResult {
    /// Process exit code (`-1` when the platform reports none).
    pub exit_code: i32,
    /// Full captured stdout.
    pub stdout: String,
    /// Full captured stderr.
    pub stderr: String,
}

impl ShellResult {
    /// Whether the command exited with code 0.
    pub fn is_successful(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executor for external commands.
pub struct Shell;

impl Shell {
    /// Run a command and capture both streams fully.
    ///
    /// `working_dir` is the directory the command runs in; `worker` is the
    /// invoking worker index, used only to attribute debug logs.
    ///
    /// # Errors
    ///
    /// [`DriftError::CommandSpawn`] when the process cannot be started and
    /// [`DriftError::CommandTimeout`] when it exceeds
    /// [`COMMAND_TIMEOUT_SECS`]. A non-zero exit code is not an error at
    /// this level; it is reported through [`ShellResult::exit_code`].
    pub fn run(
        argv: &[&str],
        working_dir: Option<&Path>,
        worker: Option<usize>,
    ) -> Result<ShellResult, DriftError> {
        Shell::run_with_timeout(argv, working_dir, worker, COMMAND_TIMEOUT_SECS)
    }

    /// Same as [`Shell::run`] with an explicit timeout in seconds.
    pub fn run_with_timeout(
        argv: &[&str],
        working_dir: Option<&Path>,
        worker: Option<usize>,
        timeout_secs: u64,
    ) -> Result<ShellResult, DriftError> {
        let command_line = argv.join(" ");
        debug!(worker, command = %command_line, "exec");

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DriftError::CommandSpawn {
                command: String::new(),
                reason: "empty argv".to_string(),
            })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| DriftError::CommandSpawn {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        // Drain both pipes on background threads so the child can never
        // block on a full pipe, and so everything written before a timeout
        // kill is still captured.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_to_string_lossy(stdout_pipe));
        let stderr_reader = thread::spawn(move || read_to_string_lossy(stderr_pipe));

        let timeout = Duration::from_secs(timeout_secs);
        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                let stdout = stdout_reader.join().unwrap_or_default();
                let stderr = stderr_reader.join().unwrap_or_default();
                debug!(worker, command = %command_line, %stdout, %stderr, "timeout");
                return Err(DriftError::CommandTimeout {
                    command: command_line,
                    timeout_secs,
                });
            }
            Err(e) => {
                let _ = child.kill();
                return Err(DriftError::CommandSpawn {
                    command: command_line,
                    reason: e.to_string(),
                });
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);
        debug!(worker, command = %command_line, exit_code, "exec done");

        Ok(ShellResult {
            exit_code,
            stdout,
            stderr,
        })
    }

    /// Run a shell-syntax command (pipelines, redirects) by writing it to a
    /// temporary script inside `working_dir` and executing that.
    ///
    /// Needed for compound queries like
    /// `git branch -a --format=... | grep -v HEAD` that are not expressible
    /// as a flat argv.
    pub fn run_script(
        script_body: &str,
        working_dir: &Path,
        worker: Option<usize>,
    ) -> Result<ShellResult, DriftError> {
        let script_path = working_dir.join(format!("command_{}.sh", Uuid::new_v4()));
        fs::write(&script_path, format!("#!/bin/sh\n{script_body}\n"))?;

        let script = script_path.to_string_lossy().to_string();
        let result = Shell::run(&["sh", &script], Some(working_dir), worker);
        let _ = fs::remove_file(&script_path);
        result
    }

    /// Recursively copy the contents of `source` into `dest`.
    ///
    /// Uses `cp -r <source>/. <dest>` so the directory contents land in
    /// `dest` itself rather than in a nested directory.
    pub fn copy_recursive(
        source: &Path,
        dest: &Path,
        worker: Option<usize>,
    ) -> Result<ShellResult, DriftError> {
        let from = format!("{}/.", trim_trailing_slash(source));
        let to = trim_trailing_slash(dest);
        Shell::run(&["cp", "-r", &from, &to], None, worker)
    }

    /// Recursively remove a directory and all of its contents.
    pub fn remove_recursive(dir: &Path, worker: Option<usize>) -> Result<ShellResult, DriftError> {
        let dir = dir.to_string_lossy().to_string();
        Shell::run(&["rm", "-rf", &dir], None, worker)
    }
}

fn read_to_string_lossy<R: Read>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn trim_trailing_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    s.trim_end_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================
