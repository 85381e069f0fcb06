//! CLI definition and run orchestration for gitdrift.
//!
//! This module defines the command-line interface using `clap`, loads and
//! validates the analysis configuration, drives one `drift_core::Simulation`
//! run, and writes the report and log files into the report directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::warn;

use drift_core::{ConfigFile, DriftReport, RunParameters, Simulation};

// ============================================================================
// CLI Definition
// ============================================================================

/// Analyze how far the branches of a git repository have drifted apart
#[derive(Parser, Debug)]
#[command(name = "gitdrift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the analysis configuration file (YAML)
    pub config: PathBuf,

    /// Path of the repository to analyze
    #[arg(short, long, env = "GITDRIFT_INPUT")]
    pub input_repository: PathBuf,

    /// Existing writable directory for temporary working copies
    /// (default: the system temp directory)
    #[arg(long, env = "GITDRIFT_WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Directory report and log files are written to
    /// (default: the current directory)
    #[arg(long, env = "GITDRIFT_REPORT_DIR", default_value = ".")]
    pub report_dir: PathBuf,

    /// Number of parallel merge workers
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Measure both directions of every branch pair instead of one
    #[arg(long)]
    pub symmetry: bool,

    /// Embedding script invoked with python3
    /// (default: embedding.py next to the configuration file)
    #[arg(long)]
    pub embedding_script: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, env = "GITDRIFT_VERBOSE")]
    pub verbose: bool,
}

/// Parse arguments, run the analysis, report the outcome.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Always show warnings; show debug info only when --verbose is set.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("drift_core={log_level},drift_cli={log_level}");
    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = ConfigFile::load(&cli.config)
        .with_context(|| format!("could not load configuration {}", cli.config.display()))?;
    if config.html_report && !config.json_report {
        warn!("HTML rendering is not supported; only the log file will be written");
    }

    let params = build_parameters(cli, &config)?;
    fs::create_dir_all(&cli.report_dir)
        .with_context(|| format!("could not create report directory {}", cli.report_dir.display()))?;

    let simulation = Simulation::new(config.clone(), params)?;
    let result = simulation.run();

    // The log is worth keeping even when the run failed; pick up whatever
    // the workers managed to record before the failure.
    simulation.log().merge_worker_logs();
    let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli.report_dir.join(format!("drift_report_{stamp}.log"));
    if let Err(e) = fs::write(&log_path, simulation.log().lines().join("\n")) {
        warn!("could not write log file {}: {e}", log_path.display());
    }

    let report = result?;
    if config.json_report {
        let report_path = cli.report_dir.join(format!("drift_report_{stamp}.json"));
        fs::write(&report_path, report.to_json()?)
            .with_context(|| format!("could not write report {}", report_path.display()))?;
        println!("report written to {}", report_path.display());
    }
    println!("log written to {}", log_path.display());
    print_summary(&report);
    Ok(())
}

fn build_parameters(cli: &Cli, _config: &ConfigFile) -> anyhow::Result<RunParameters> {
    let working_root = match &cli.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::temp_dir(),
    };
    let embedding_script = match &cli.embedding_script {
        Some(script) => script.clone(),
        None => default_embedding_script(&cli.config),
    };
    Ok(RunParameters {
        input_repository: absolutize(&cli.input_repository)?,
        working_root: absolutize(&working_root)?,
        report_path: cli.report_dir.clone(),
        threads: cli.threads,
        symmetry: cli.symmetry,
        embedding_command: vec![
            "python3".to_string(),
            embedding_script.to_string_lossy().to_string(),
        ],
    })
}

/// `embedding.py` in the configuration file's directory.
fn default_embedding_script(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("embedding.py")
}

fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("path {} does not exist", path.display()))
}

fn print_summary(report: &DriftReport) {
    println!();
    println!("{}", report.report_title);
    println!(
        "branches: {} total, {} analyzed, {} in final result",
        report.number_of_branches_total,
        report.number_of_branches_analyzed,
        report.number_of_final_branches
    );
    println!("line drift:     {:.4}", report.line_drift);
    println!("conflict drift: {:.4}", report.conflict_drift);
    println!("file drift:     {:.4}", report.file_drift);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_embedding_script_next_to_config() {
        let script = default_embedding_script(Path::new("/etc/drift/analysis.yaml"));
        assert_eq!(script, Path::new("/etc/drift/embedding.py"));
    }

    #[test]
    fn test_default_embedding_script_bare_filename() {
        let script = default_embedding_script(Path::new("analysis.yaml"));
        assert_eq!(script, Path::new("embedding.py"));
    }

    #[test]
    fn test_cli_parses_minimal_invocation() {
        let cli = Cli::try_parse_from([
            "gitdrift",
            "drift.yaml",
            "--input-repository",
            "/tmp/repo",
        ])
        .unwrap();
        assert_eq!(cli.threads, 1);
        assert!(!cli.symmetry);
        assert_eq!(cli.report_dir, Path::new("."));
        assert!(cli.working_dir.is_none());
    }

    #[test]
    fn test_cli_requires_input_repository() {
        assert!(Cli::try_parse_from(["gitdrift", "drift.yaml"]).is_err());
    }
}
