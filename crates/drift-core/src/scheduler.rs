//! Pair enumeration and worker batches.
//!
//! The full merge workload is the set of branch pairs to measure. Pairs are
//! enumerated once, partitioned round-robin over the workers, and each
//! worker walks its batch strictly sequentially against its own working
//! copy.

use tracing::{debug, info};

use crate::relation::DistanceSet;
use crate::repository::Repository;

/// One directed merge measurement: merge `incoming` into `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePair {
    pub base: String,
    pub incoming: String,
}

impl MergePair {
    pub fn new(base: impl Into<String>, incoming: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            incoming: incoming.into(),
        }
    }
}

/// Enumerate the merge pairs over `branches`.
///
/// Each unordered pair appears once in the order induced by the input list.
/// With `include_symmetric` the reversed direction is added as well; with
/// `include_identity` every self-pair is added. No duplicates either way.
pub fn enumerate_pairs(
    branches: &[String],
    include_symmetric: bool,
    include_identity: bool,
) -> Vec<MergePair> {
    let mut pairs = Vec::new();
    for (i, base) in branches.iter().enumerate() {
        if include_identity {
            pairs.push(MergePair::new(base, base));
        }
        for incoming in branches.iter().skip(i + 1) {
            pairs.push(MergePair::new(base, incoming));
            if include_symmetric {
                pairs.push(MergePair::new(incoming, base));
            }
        }
    }
    pairs
}

/// Distribute `pairs` over exactly `worker_count` batches round-robin.
///
/// Order within each batch follows the input order. Batches may be empty
/// when there are fewer pairs than workers.
pub fn partition(pairs: Vec<MergePair>, worker_count: usize) -> Vec<Vec<MergePair>> {
    let worker_count = worker_count.max(1);
    let mut batches: Vec<Vec<MergePair>> = vec![Vec::new(); worker_count];
    for (idx, pair) in pairs.into_iter().enumerate() {
        batches[idx % worker_count].push(pair);
    }
    batches
}

/// One merge worker: an exclusive working copy plus the batch it measures.
pub struct MergeWorker {
    index: usize,
    repository: Repository,
    batch: Vec<MergePair>,
}

impl MergeWorker {
    pub fn new(index: usize, repository: Repository, batch: Vec<MergePair>) -> Self {
        Self {
            index,
            repository,
            batch,
        }
    }

    /// Measure every pair in the batch and return the accumulated partial
    /// distance set.
    ///
    /// Merge failures for non-conflict reasons (including command timeouts)
    /// are converted into error-sentinel observations on all three metrics;
    /// they never abort the batch. The worker deletes its own working copy
    /// before returning, on success and on the error path alike.
    pub fn run(mut self) -> DistanceSet {
        info!(worker = self.index, pairs = self.batch.len(), "worker starting");
        let mut distances = DistanceSet::new();

        for pair in &self.batch {
            match self
                .repository
                .merge_and_count_conflicts(&pair.base, &pair.incoming)
            {
                Ok(distance) => {
                    debug!(
                        worker = self.index,
                        base = %pair.base,
                        incoming = %pair.incoming,
                        files = distance.file_distance,
                        conflicts = distance.conflict_distance,
                        lines = distance.line_distance,
                        "pair measured"
                    );
                    distances.add_distance(&pair.base, &pair.incoming, distance);
                }
                Err(e) => {
                    debug!(
                        worker = self.index,
                        base = %pair.base,
                        incoming = %pair.incoming,
                        error = %e,
                        "pair failed, recording error sentinel"
                    );
                    distances.add_error(&pair.base, &pair.incoming);
                }
            }
        }

        if let Err(e) = self.repository.delete_repository() {
            debug!(worker = self.index, error = %e, "working copy cleanup failed");
        }
        info!(worker = self.index, "worker finished");
        distances
    }
}

// ============================================================================
// Tests
// ============================================================================
