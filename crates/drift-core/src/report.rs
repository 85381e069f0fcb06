//! The analysis result snapshot.

use serde::Serialize;

use crate::errors::DriftError;
use crate::matrix::MatrixResult;
use crate::point_cloud::PointCloud;

/// Complete result of one drift analysis run.
///
/// Serialized to camelCase JSON for the report file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    /// Title from the configuration, or a generated identifier.
    pub report_title: String,
    /// UTC timestamp the analysis started at, RFC 3339.
    pub analysis_timestamp: String,
    /// Wall time spent preparing branches (checkout, filtering, commits).
    pub analysis_duration_millis_checkout: i64,
    /// Wall time spent measuring merges and reducing results.
    pub analysis_duration_millis_compare: i64,
    /// Branches discovered in the repository.
    pub number_of_branches_total: usize,
    /// Branches selected for analysis after ignore patterns and activity
    /// cutoff.
    pub number_of_branches_analyzed: usize,
    /// Branches surviving error-branch trimming in the line matrix.
    pub number_of_final_branches: usize,
    /// Worker count the run used.
    pub analysis_parallelism: usize,
    /// Analyzed branches, sorted.
    pub sorted_branch_list: Vec<String>,
    /// Surviving branches, sorted.
    pub sorted_final_branch_list: Vec<String>,
    /// Mean distance to the median point of the line-metric cloud.
    pub line_drift: f64,
    /// Mean distance to the median point of the conflict-metric cloud.
    pub conflict_drift: f64,
    /// Mean distance to the median point of the file-metric cloud.
    pub file_drift: f64,
    pub line_distance_matrix: MatrixResult,
    pub conflict_distance_matrix: MatrixResult,
    pub file_distance_matrix: MatrixResult,
    pub line_point_cloud: PointCloud,
    pub conflict_point_cloud: PointCloud,
    pub file_point_cloud: PointCloud,
}

impl DriftReport {
    /// Pretty-printed JSON rendition.
    pub fn to_json(&self) -> Result<String, DriftError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
