//! Error types for drift-core.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for branch-drift analysis.
///
/// The taxonomy distinguishes run-fatal failures (configuration, reference
/// preparation, matrix contract violations) from per-observation failures,
/// which callers convert into error-sentinel observations instead of
/// propagating.
#[derive(Error, Debug)]
pub enum DriftError {
    /// The analysis configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A required path does not exist or is not usable.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// An external command could not be spawned.
    #[error("Failed to spawn `{command}`: {reason}")]
    CommandSpawn {
        /// The command line that failed to start.
        command: String,
        /// Description of the spawn failure.
        reason: String,
    },

    /// An external command exceeded its execution deadline and was killed.
    ///
    /// Fatal to the invoking worker's current operation; never retried.
    #[error("Command `{command}` timed out after {timeout_secs}s")]
    CommandTimeout {
        /// The command line that timed out.
        command: String,
        /// The deadline that was exceeded.
        timeout_secs: u64,
    },

    /// Copying the source repository into an isolated directory failed.
    #[error("Could not clone repository from {source_path:?} into {dest:?}: {reason}")]
    CloneFailed {
        /// The source repository path.
        source_path: PathBuf,
        /// The destination directory.
        dest: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A temporary directory could not be created or removed.
    #[error("Workspace error at {path:?}: {reason}")]
    Workspace {
        /// The directory that could not be managed.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Branch discovery or metadata parsing failed on the working copy.
    #[error("Repository error in {location:?}: {reason}")]
    Repository {
        /// The working-copy location.
        location: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An ignore/whitelist/blacklist pattern is not a valid regex.
    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compile error.
        reason: String,
    },

    /// A distance relation violated the matrix construction contract.
    ///
    /// Indicates an upstream scheduling bug (missing or duplicated pair);
    /// aborts report generation for the affected metric.
    #[error("Matrix construction error: {0}")]
    MatrixConstruction(String),

    /// The embedding collaborator failed or returned a malformed point cloud.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
