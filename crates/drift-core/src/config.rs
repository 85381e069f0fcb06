//! Analysis configuration.
//!
//! Two layers: the YAML [`ConfigFile`] an analyst checks in next to the
//! repository under study, and the [`RunParameters`] resolved per invocation
//! (paths, thread count, symmetry mode, embedding command).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::DriftError;

/// The analysis configuration file.
///
/// All pattern lists use regex search semantics: a pattern matches when it
/// is found anywhere in the branch name or file path, not only on a full
/// match.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Write a JSON report into the report directory.
    pub json_report: bool,

    /// Write an HTML report into the report directory.
    pub html_report: bool,

    /// Branches to exclude from the analysis. Empty list excludes nothing.
    #[serde(default)]
    pub ignore_branches: Vec<String>,

    /// Files to analyze exclusively. Applied before the blacklist. Empty
    /// list keeps everything.
    #[serde(default)]
    pub file_white_list: Vec<String>,

    /// Files to exclude from the analysis. Applied after the whitelist.
    #[serde(default)]
    pub file_black_list: Vec<String>,

    /// Only branches active within this many days are analyzed; 0 disables
    /// the cutoff.
    #[serde(default)]
    pub timeout_days: u32,

    /// Title for the report. A generated identifier is used when unset.
    #[serde(default)]
    pub report_identifier: Option<String>,
}

impl ConfigFile {
    /// Load and validate a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, DriftError> {
        if !path.is_file() {
            return Err(DriftError::PathNotFound(path.display().to_string()));
        }
        let raw = fs::read_to_string(path)?;
        let config: ConfigFile = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants no later stage re-checks.
    pub fn validate(&self) -> Result<(), DriftError> {
        if !self.json_report && !self.html_report {
            return Err(DriftError::InvalidConfiguration(
                "at least one report format (json_report or html_report) must be enabled"
                    .to_string(),
            ));
        }
        if let Some(title) = &self.report_identifier {
            if title.trim().is_empty() {
                return Err(DriftError::InvalidConfiguration(
                    "report_identifier must not be blank when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Per-invocation run context.
///
/// Everything the simulation needs that is not part of the checked-in
/// configuration file.
#[derive(Debug, Clone)]
pub struct RunParameters {
    /// Absolute path of the repository under analysis.
    pub input_repository: PathBuf,
    /// Existing writable directory all temporary clones live under.
    pub working_root: PathBuf,
    /// Directory report and log files are written to.
    pub report_path: PathBuf,
    /// Number of merge workers.
    pub threads: usize,
    /// Measure every ordered pair instead of one direction per pair.
    pub symmetry: bool,
    /// Embedding collaborator command, program plus leading arguments.
    pub embedding_command: Vec<String>,
}

impl RunParameters {
    /// Validate path and count invariants.
    pub fn validate(&self) -> Result<(), DriftError> {
        if !self.input_repository.is_dir() {
            return Err(DriftError::PathNotFound(
                self.input_repository.display().to_string(),
            ));
        }
        if !self.working_root.is_dir() {
            return Err(DriftError::PathNotFound(
                self.working_root.display().to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(DriftError::InvalidConfiguration(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.embedding_command.is_empty() {
            return Err(DriftError::InvalidConfiguration(
                "embedding command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
