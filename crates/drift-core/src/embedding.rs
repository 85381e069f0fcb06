//! Distance-matrix embedding into low-dimensional space.
//!
//! The embedding itself is delegated to an external collaborator (an MDS
//! implementation, typically a Python script) behind the [`Embedder`] trait.
//! The file contract with the collaborator:
//!
//! - input: a JSON file mapping row index strings to distance rows,
//!   `{"0": [0.0, 1.0], "1": [1.0, 0.0]}`
//! - invocation: `<command...> <matrix_json_file> <dimension> <output_file>`
//! - output: one `x;y;z` line per matrix row, in row order

use std::fs;

use tracing::debug;

use crate::errors::DriftError;
use crate::matrix::MatrixResult;
use crate::point_cloud::PointCloud;
use crate::shell::Shell;
use crate::workspace::TempWorkspace;

/// Target dimensionality of every embedding.
pub const EMBEDDING_DIMENSIONS: usize = 3;

/// Turns a symmetric distance matrix into a 3-D point cloud.
///
/// Behind a trait so the simulation can run with an in-process stand-in
/// where no external interpreter is available.
pub trait Embedder {
    /// Embed `matrix` into [`EMBEDDING_DIMENSIONS`] dimensions, one point
    /// per branch, preserving branch order.
    fn embed(&self, matrix: &MatrixResult) -> Result<PointCloud, DriftError>;
}

/// [`Embedder`] that shells out to an external embedding command.
pub struct ScriptEmbedder<'a> {
    command: Vec<String>,
    workspace: &'a TempWorkspace,
}

impl<'a> ScriptEmbedder<'a> {
    /// `command` is the program plus any leading arguments, for example
    /// `["python3", "embedding.py"]`.
    pub fn new(command: Vec<String>, workspace: &'a TempWorkspace) -> Self {
        Self { command, workspace }
    }
}

impl Embedder for ScriptEmbedder<'_> {
    fn embed(&self, matrix: &MatrixResult) -> Result<PointCloud, DriftError> {
        let matrix_file = self.workspace.create_temp_file()?;
        let output_file = self.workspace.create_temp_file()?;

        fs::write(&matrix_file, matrix.to_json_value().to_string())?;

        let dimension = EMBEDDING_DIMENSIONS.to_string();
        let matrix_arg = matrix_file.to_string_lossy().to_string();
        let output_arg = output_file.to_string_lossy().to_string();

        let mut argv: Vec<&str> = self.command.iter().map(String::as_str).collect();
        if argv.is_empty() {
            return Err(DriftError::Embedding(
                "embedding command is empty".to_string(),
            ));
        }
        argv.push(&matrix_arg);
        argv.push(&dimension);
        argv.push(&output_arg);

        debug!(command = %argv.join(" "), "running embedding");
        let result = Shell::run(&argv, None, None)?;
        if !result.is_successful() {
            return Err(DriftError::Embedding(format!(
                "embedding command failed with exit code {}: {}",
                result.exit_code,
                result.stderr.trim()
            )));
        }

        let csv = fs::read_to_string(&output_file)?;
        let cloud = parse_embedding_output(&csv, matrix)?;

        let _ = self.workspace.remove(&matrix_file);
        let _ = self.workspace.remove(&output_file);
        Ok(cloud)
    }
}

/// Parse the collaborator's semicolon CSV into a point cloud.
///
/// Fails when a line has the wrong arity, a coordinate does not parse, or
/// the row count disagrees with the matrix dimension.
pub fn parse_embedding_output(
    csv: &str,
    matrix: &MatrixResult,
) -> Result<PointCloud, DriftError> {
    let mut cloud = PointCloud::new(matrix.sorted_branches.clone());
    for (idx, line) in csv.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let coords: Vec<&str> = line.split(';').collect();
        if coords.len() != EMBEDDING_DIMENSIONS {
            return Err(DriftError::Embedding(format!(
                "embedding row {idx} has {} coordinates, expected {}",
                coords.len(),
                EMBEDDING_DIMENSIONS
            )));
        }
        let mut parsed = [0.0f32; EMBEDDING_DIMENSIONS];
        for (slot, raw) in parsed.iter_mut().zip(&coords) {
            *slot = raw.trim().parse::<f32>().map_err(|e| {
                DriftError::Embedding(format!("embedding row {idx} is not numeric: {e}"))
            })?;
        }
        cloud.add_point(parsed[0], parsed[1], parsed[2]);
    }
    if cloud.points.len() != matrix.dimension() {
        return Err(DriftError::Embedding(format!(
            "embedding produced {} points for a {}-branch matrix",
            cloud.points.len(),
            matrix.dimension()
        )));
    }
    Ok(cloud)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::DistanceRelation;

    fn square_matrix() -> MatrixResult {
        let mut relation = DistanceRelation::new();
        relation.add_value("a", "b", 1.0);
        relation.add_value("b", "a", 1.0);
        MatrixResult::from_relation(
            &relation,
            &["a".to_string(), "b".to_string()],
            true,
            false,
            true,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_embedding_output_happy_path() {
        let matrix = square_matrix();
        let cloud = parse_embedding_output("0.0;0.0;0.0\n1.0;0.0;0.0\n", &matrix).unwrap();
        assert_eq!(cloud.points.len(), 2);
        assert_eq!(cloud.points[1], (1.0, 0.0, 0.0));
        assert_eq!(cloud.sorted_branches, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_embedding_output_skips_blank_lines() {
        let matrix = square_matrix();
        let cloud =
            parse_embedding_output("0.0;0.0;0.0\n\n1.0;0.0;0.0\n\n", &matrix).unwrap();
        assert_eq!(cloud.points.len(), 2);
    }

    #[test]
    fn test_parse_embedding_output_rejects_wrong_arity() {
        let matrix = square_matrix();
        let err = parse_embedding_output("0.0;0.0\n1.0;0.0\n", &matrix).unwrap_err();
        assert!(err.to_string().contains("coordinates"));
    }

    #[test]
    fn test_parse_embedding_output_rejects_non_numeric() {
        let matrix = square_matrix();
        let err = parse_embedding_output("0.0;zero;0.0\n1.0;0.0;0.0\n", &matrix).unwrap_err();
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn test_parse_embedding_output_rejects_row_count_mismatch() {
        let matrix = square_matrix();
        let err = parse_embedding_output("0.0;0.0;0.0\n", &matrix).unwrap_err();
        assert!(err.to_string().contains("1 points"));
    }

    #[test]
    fn test_script_embedder_runs_stub_script() {
        let temp = tempfile::TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp.path()).unwrap();

        // Stub collaborator that ignores the matrix and emits fixed points.
        let script = temp.path().join("embed.sh");
        fs::write(
            &script,
            "#!/bin/sh\nprintf '0.0;0.0;0.0\\n3.0;4.0;0.0\\n' > \"$3\"\n",
        )
        .unwrap();

        let embedder = ScriptEmbedder::new(
            vec!["sh".to_string(), script.to_string_lossy().to_string()],
            &workspace,
        );
        let cloud = embedder.embed(&square_matrix()).unwrap();
        assert_eq!(cloud.points, vec![(0.0, 0.0, 0.0), (3.0, 4.0, 0.0)]);
    }

    #[test]
    fn test_script_embedder_reports_failing_command() {
        let temp = tempfile::TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp.path()).unwrap();
        let embedder = ScriptEmbedder::new(vec!["false".to_string()], &workspace);
        let err = embedder.embed(&square_matrix()).unwrap_err();
        assert!(matches!(err, DriftError::Embedding(_)));
    }
}
