//! The analysis coordinator.
//!
//! Drives one full run: clone the reference copy, select branches, prepare
//! each branch (filter files, commit the filtered tree), fan the merge pairs
//! out over workers with exclusive working copies, reduce the partial
//! results into matrices, embed, and assemble the [`DriftReport`].

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::config::{ConfigFile, RunParameters};
use crate::embedding::{Embedder, ScriptEmbedder};
use crate::errors::DriftError;
use crate::matrix::MatrixResult;
use crate::point_cloud::PointCloud;
use crate::relation::DistanceSet;
use crate::report::DriftReport;
use crate::repository::Repository;
use crate::run_log::RunLog;
use crate::scheduler::{enumerate_pairs, partition, MergeWorker};
use crate::workspace::TempWorkspace;

/// One configured analysis run.
pub struct Simulation {
    config: ConfigFile,
    params: RunParameters,
    workspace: TempWorkspace,
    log: Arc<RunLog>,
}

impl Simulation {
    /// Validate the inputs and set up the run context.
    pub fn new(config: ConfigFile, params: RunParameters) -> Result<Self, DriftError> {
        config.validate()?;
        params.validate()?;
        let workspace = TempWorkspace::new(&params.working_root)?;
        let log = Arc::new(RunLog::new(params.threads));
        Ok(Self {
            config,
            params,
            workspace,
            log,
        })
    }

    /// The run log, available even after a failed run for persistence.
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Run the analysis with the configured external embedding command.
    pub fn run(&self) -> Result<DriftReport, DriftError> {
        let embedder = ScriptEmbedder::new(self.params.embedding_command.clone(), &self.workspace);
        self.run_with(&embedder)
    }

    /// Run the analysis with an explicit embedding collaborator.
    ///
    /// Every temporary directory and file the run allocated is removed
    /// afterwards, on the error path as well.
    pub fn run_with(&self, embedder: &dyn Embedder) -> Result<DriftReport, DriftError> {
        let result = self.execute(embedder);
        self.workspace.cleanup_all();
        result
    }

    fn execute(&self, embedder: &dyn Embedder) -> Result<DriftReport, DriftError> {
        let timestamp = Utc::now();
        let checkout_clock = Instant::now();

        // Reference copy: branch discovery and branch preparation happen
        // here; workers clone from it so they see the filtered trees.
        let reference_dir = self.workspace.create_temp_dir()?;
        let mut reference = Repository::clone_from_path(
            &self.params.input_repository,
            &reference_dir,
            None,
            Arc::clone(&self.log),
        )?;
        reference.initialize_current_branch()?;

        let all_branches = reference.find_all_branches()?;
        let branches_of_interest = reference
            .find_branches_of_interest(self.config.timeout_days, &self.config.ignore_branches)?;
        info!(
            total = all_branches.len(),
            analyzed = branches_of_interest.len(),
            "branch selection done"
        );

        self.prepare_branches(&mut reference, &branches_of_interest)?;
        let checkout_millis = checkout_clock.elapsed().as_millis() as i64;

        let compare_clock = Instant::now();
        let pairs = enumerate_pairs(&branches_of_interest, self.params.symmetry, false);
        self.log
            .append(format!("measuring {} merge pairs", pairs.len()));

        let batches = partition(pairs, self.params.threads);
        let workers = self.spawn_workers(&reference, &branches_of_interest, batches)?;
        let partials = Self::run_workers(workers, self.params.threads);
        self.log.merge_worker_logs();

        let mut distances = DistanceSet::new();
        for partial in partials {
            distances.join(partial);
        }

        // Symmetric runs measured every ordered pair, so the relation must
        // be complete; asymmetric runs hold one direction per pair.
        let build = |relation| {
            MatrixResult::from_relation(
                relation,
                &branches_of_interest,
                self.params.symmetry,
                true,
                true,
                true,
            )
        };
        let line_matrix = build(&distances.line)?;
        let conflict_matrix = build(&distances.conflict)?;
        let file_matrix = build(&distances.file)?;
        let final_branches = line_matrix.sorted_branches.clone();
        self.log.append(format!(
            "matrices built, {} of {} branches survived error trimming",
            final_branches.len(),
            branches_of_interest.len()
        ));

        let line_cloud = Self::embed_matrix(embedder, &line_matrix)?;
        let conflict_cloud = Self::embed_matrix(embedder, &conflict_matrix)?;
        let file_cloud = Self::embed_matrix(embedder, &file_matrix)?;

        reference.delete_repository()?;
        let compare_millis = compare_clock.elapsed().as_millis() as i64;

        let report = DriftReport {
            report_title: self.report_title(),
            analysis_timestamp: timestamp.to_rfc3339(),
            analysis_duration_millis_checkout: checkout_millis,
            analysis_duration_millis_compare: compare_millis,
            number_of_branches_total: all_branches.len(),
            number_of_branches_analyzed: branches_of_interest.len(),
            number_of_final_branches: final_branches.len(),
            analysis_parallelism: self.params.threads,
            sorted_branch_list: branches_of_interest,
            sorted_final_branch_list: final_branches,
            line_drift: line_cloud.drift(),
            conflict_drift: conflict_cloud.drift(),
            file_drift: file_cloud.drift(),
            line_distance_matrix: line_matrix,
            conflict_distance_matrix: conflict_matrix,
            file_distance_matrix: file_matrix,
            line_point_cloud: line_cloud,
            conflict_point_cloud: conflict_cloud,
            file_point_cloud: file_cloud,
        };
        info!(
            line = report.line_drift,
            conflict = report.conflict_drift,
            file = report.file_drift,
            "analysis complete"
        );
        Ok(report)
    }

    /// Check out each analyzed branch on the reference copy, apply the file
    /// filters, and commit the filtered tree so clones carry it.
    ///
    /// Checkout and sanitize failures here are fatal: a branch that cannot
    /// be prepared poisons every pair it takes part in.
    fn prepare_branches(
        &self,
        reference: &mut Repository,
        branches: &[String],
    ) -> Result<(), DriftError> {
        let filters_active = !self.config.file_white_list.is_empty()
            || !self.config.file_black_list.is_empty();
        for branch in branches {
            reference.checkout(branch)?;
            reference.sanitize()?;
            if filters_active {
                reference.apply_whitelist(&self.config.file_white_list)?;
                reference.apply_blacklist(&self.config.file_black_list)?;
                reference.commit_changes("apply analysis file filters")?;
            }
        }
        Ok(())
    }

    /// One exclusive working copy per non-empty batch.
    fn spawn_workers(
        &self,
        reference: &Repository,
        branches_of_interest: &[String],
        batches: Vec<Vec<crate::scheduler::MergePair>>,
    ) -> Result<Vec<MergeWorker>, DriftError> {
        let mut workers = Vec::new();
        for (index, batch) in batches.into_iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            let worker_dir = self.workspace.create_temp_dir()?;
            let mut repository = Repository::clone_from_path(
                reference.location(),
                &worker_dir,
                Some(index),
                Arc::clone(&self.log),
            )?;
            repository.override_branches_of_interest(branches_of_interest);
            workers.push(MergeWorker::new(index, repository, batch));
        }
        Ok(workers)
    }

    /// Run the workers to completion and collect their partial results.
    ///
    /// A single worker runs inline on the calling thread; more run on a
    /// fixed-size pool. The collect is the hard join barrier, so merging
    /// the worker logs afterwards observes every entry.
    fn run_workers(workers: Vec<MergeWorker>, threads: usize) -> Vec<DistanceSet> {
        if workers.len() <= 1 {
            return workers.into_iter().map(MergeWorker::run).collect();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build();
        match pool {
            Ok(pool) => {
                pool.install(|| workers.into_par_iter().map(MergeWorker::run).collect())
            }
            // Pool construction failing leaves sequential execution as a
            // correct fallback.
            Err(_) => workers.into_iter().map(MergeWorker::run).collect(),
        }
    }

    fn embed_matrix(
        embedder: &dyn Embedder,
        matrix: &MatrixResult,
    ) -> Result<PointCloud, DriftError> {
        // Degenerate matrices carry no geometry worth delegating.
        if matrix.dimension() < 2 {
            let mut cloud = PointCloud::new(matrix.sorted_branches.clone());
            for _ in 0..matrix.dimension() {
                cloud.add_point(0.0, 0.0, 0.0);
            }
            return Ok(cloud);
        }
        embedder.embed(matrix)
    }

    fn report_title(&self) -> String {
        match &self.config.report_identifier {
            Some(title) => title.clone(),
            None => format!("drift-analysis-{}", Uuid::new_v4()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct ZeroEmbedder;

    impl Embedder for ZeroEmbedder {
        fn embed(&self, matrix: &MatrixResult) -> Result<PointCloud, DriftError> {
            let mut cloud = PointCloud::new(matrix.sorted_branches.clone());
            for _ in 0..matrix.dimension() {
                cloud.add_point(0.0, 0.0, 0.0);
            }
            Ok(cloud)
        }
    }

    #[test]
    fn test_embed_matrix_short_circuits_degenerate_matrix() {
        let matrix = MatrixResult {
            data: vec![vec![0.0]],
            sorted_branches: vec!["main".to_string()],
        };
        let cloud = Simulation::embed_matrix(&ZeroEmbedder, &matrix).unwrap();
        assert_eq!(cloud.points, vec![(0.0, 0.0, 0.0)]);
        assert_eq!(cloud.sorted_branches, vec!["main"]);
    }

    #[test]
    fn test_embed_matrix_delegates_for_real_matrices() {
        let matrix = MatrixResult {
            data: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            sorted_branches: vec!["a".to_string(), "b".to_string()],
        };
        let cloud = Simulation::embed_matrix(&ZeroEmbedder, &matrix).unwrap();
        assert_eq!(cloud.points.len(), 2);
    }
}
