//! # drift-core
//!
//! **Branch drift analysis** – core engine library.
//!
//! This crate measures how far the branches of a git repository have drifted
//! apart. It simulates every pairwise merge in throwaway working copies,
//! counts the resulting conflicts on three metrics (conflicting lines,
//! conflict blocks, conflicting files), reduces the observations into
//! symmetric distance matrices, embeds each matrix into 3-D space, and
//! condenses every metric into a single drift scalar.
//!
//! ## Main Types
//!
//! - [`Simulation`] – the entry point driving one full analysis run
//! - [`DriftReport`] – the serializable result snapshot
//! - [`DriftError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`shell`] – external command execution with timeout and stream capture
//! - [`workspace`] – temporary directory and file allocation
//! - [`repository`] – git working-copy handle (branches, checkout, merge)
//! - [`relation`] – distance observations and their join semantics
//! - [`matrix`] – reconciliation of observations into dense matrices
//! - [`point_cloud`] – embedded points, drift scalar, median
//! - [`embedding`] – the external embedding collaborator contract
//! - [`scheduler`] – pair enumeration and worker batches
//! - [`run_log`] – deterministic per-worker run log
//! - [`config`] – configuration file and run parameters
//! - [`simulation`] – the analysis coordinator
//! - [`report`] – report model
//! - [`errors`] – error types

// Modules
pub mod config;
pub mod embedding;
pub mod errors;
pub mod matrix;
pub mod point_cloud;
pub mod relation;
pub mod report;
pub mod repository;
pub mod run_log;
pub mod scheduler;
pub mod shell;
pub mod simulation;
pub mod workspace;

// Re-exports for convenience
pub use config::{ConfigFile, RunParameters};
pub use embedding::{Embedder, ScriptEmbedder, EMBEDDING_DIMENSIONS};
pub use errors::DriftError;
pub use matrix::MatrixResult;
pub use point_cloud::{median, PointCloud};
pub use relation::{
    is_error_value, Distance, DistanceObservation, DistanceRelation, DistanceSet, ERROR_DISTANCE,
};
pub use report::DriftReport;
pub use repository::Repository;
pub use run_log::{LogEntry, RunLog};
pub use scheduler::{enumerate_pairs, partition, MergePair, MergeWorker};
pub use shell::{Shell, ShellResult, COMMAND_TIMEOUT_SECS};
pub use simulation::Simulation;
pub use workspace::TempWorkspace;
