//! Distance observations and relations.
//!
//! A merge simulation produces one [`Distance`] per ordered branch pair,
//! which is recorded as three [`DistanceObservation`]s, one per metric
//! (conflicting lines, conflict blocks, conflicting files). Workers
//! accumulate partial [`DistanceRelation`]s; the coordinator joins them into
//! one relation per metric before matrix reconciliation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Sentinel distance recorded when a pairwise merge could not be evaluated.
///
/// Error observations feed the branch-trimming step of matrix construction
/// and never appear in a finished matrix.
pub const ERROR_DISTANCE: f32 = -1.0;

/// Whether a distance value is the error sentinel.
///
/// Matches any clearly negative value so float round-trips through joins and
/// serialization cannot unmark an error.
pub fn is_error_value(value: f32) -> bool {
    value < -0.5
}

/// Conflict counts from one simulated merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Distance {
    /// Lines strictly between matched conflict-marker pairs, summed over all
    /// conflicting files.
    pub line_distance: u32,
    /// Number of conflict-marker pairs.
    pub conflict_distance: u32,
    /// Number of files with at least one conflict.
    pub file_distance: u32,
}

/// One directed distance observation `(from, to, value)`.
///
/// Equality and ordering include the value (compared bitwise / by total
/// order), so joining relations collapses exact duplicates while two
/// conflicting measurements for the same pair stay visible as two elements.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceObservation {
    /// Branch the merge was based on.
    pub from: String,
    /// Branch merged in.
    pub to: String,
    /// Metric value, or [`ERROR_DISTANCE`].
    pub value: f32,
}

impl PartialEq for DistanceObservation {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.value.to_bits() == other.value.to_bits()
    }
}

impl Eq for DistanceObservation {}

impl PartialOrd for DistanceObservation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceObservation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| self.to.cmp(&other.to))
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// A set of distance observations for one metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistanceRelation {
    values: BTreeSet<DistanceObservation>,
}

impl DistanceRelation {
    /// Empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one observation. Returns `false` when an identical triple was
    /// already present.
    pub fn add_value(&mut self, from: &str, to: &str, value: f32) -> bool {
        self.values.insert(DistanceObservation {
            from: from.to_string(),
            to: to.to_string(),
            value,
        })
    }

    /// Set-union with another partial relation.
    ///
    /// Associative and commutative, so the order in which worker results
    /// arrive never changes the joined relation.
    pub fn join(&mut self, other: DistanceRelation) {
        self.values.extend(other.values);
    }

    /// Look up the value for a directed pair, if present.
    pub fn get(&self, from: &str, to: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|obs| obs.from == from && obs.to == to)
            .map(|obs| obs.value)
    }

    /// Iterate over all observations.
    pub fn iter(&self) -> impl Iterator<Item = &DistanceObservation> {
        self.values.iter()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the relation has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any observation carries the error sentinel.
    pub fn contains_error_values(&self) -> bool {
        self.values.iter().any(|obs| is_error_value(obs.value))
    }

    /// Sorted set of branches appearing as either endpoint.
    pub fn branches(&self) -> Vec<String> {
        let mut branches = BTreeSet::new();
        for obs in &self.values {
            branches.insert(obs.from.clone());
            branches.insert(obs.to.clone());
        }
        branches.into_iter().collect()
    }

    /// Remove all observations touching the branch with the most error
    /// observations (either endpoint). Ties break to the lexicographically
    /// smallest branch name for reproducibility.
    ///
    /// No-op when the relation carries no error observations.
    pub fn trim_most_erroneous_branch(&mut self) {
        if !self.contains_error_values() {
            return;
        }
        let mut error_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for obs in &self.values {
            if is_error_value(obs.value) {
                *error_counts.entry(obs.from.as_str()).or_insert(0) += 1;
                *error_counts.entry(obs.to.as_str()).or_insert(0) += 1;
            }
        }
        // Reversed name comparison on equal counts makes the smallest name
        // the maximum.
        let Some(worst) = error_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, _)| name.to_string())
        else {
            return;
        };
        self.values
            .retain(|obs| obs.from != worst && obs.to != worst);
    }
}

/// The three metric relations of one (partial) simulation result.
#[derive(Debug, Clone, Default)]
pub struct DistanceSet {
    /// Conflicting-line distances.
    pub line: DistanceRelation,
    /// Conflict-block distances.
    pub conflict: DistanceRelation,
    /// Conflicting-file distances.
    pub file: DistanceRelation,
}

impl DistanceSet {
    /// Empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one merge outcome for the directed pair.
    pub fn add_distance(&mut self, from: &str, to: &str, distance: Distance) {
        self.line.add_value(from, to, distance.line_distance as f32);
        self.conflict
            .add_value(from, to, distance.conflict_distance as f32);
        self.file.add_value(from, to, distance.file_distance as f32);
    }

    /// Record an error sentinel for the directed pair on all three metrics.
    pub fn add_error(&mut self, from: &str, to: &str) {
        self.line.add_value(from, to, ERROR_DISTANCE);
        self.conflict.add_value(from, to, ERROR_DISTANCE);
        self.file.add_value(from, to, ERROR_DISTANCE);
    }

    /// Component-wise join with another partial result.
    pub fn join(&mut self, other: DistanceSet) {
        self.line.join(other.line);
        self.conflict.join(other.conflict);
        self.file.join(other.file);
    }
}

// ============================================================================
// Tests
// ============================================================================
