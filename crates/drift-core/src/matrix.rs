//! Matrix reconciliation.
//!
//! Reduces a (possibly sparse, possibly inconsistent) distance relation to a
//! dense square matrix over a fixed, sorted branch ordering. Contract
//! violations (a missing direction in complete mode, both directions in
//! sparse mode) point at an upstream scheduling bug and abort report
//! generation for the affected metric rather than producing a wrong matrix.

use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::DriftError;
use crate::relation::{is_error_value, DistanceRelation};

/// A dense square distance matrix over a sorted branch list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixResult {
    /// Row-major matrix data; `data[i][j]` is the distance from branch `i`
    /// to branch `j` in `sorted_branches` order.
    pub data: Vec<Vec<f32>>,
    /// Branch ordering the matrix is indexed by.
    pub sorted_branches: Vec<String>,
}

impl MatrixResult {
    /// Build a matrix from a distance relation.
    ///
    /// * `zero_identities` injects a 0-valued self-observation per branch
    ///   before anything else.
    /// * `trim_error_branches` repeatedly removes the branch touching the
    ///   most error observations (ties to the lexicographically smallest
    ///   name) until no error observations remain; the branch universe
    ///   shrinks accordingly.
    /// * `is_complete` asserts that every directed pair was measured; a
    ///   missing forward value is then a construction error. With
    ///   `ensure_symmetry` the cell becomes the average of both directions
    ///   and a missing reverse value is also a construction error.
    /// * Without `is_complete` at most one direction may exist per unordered
    ///   pair (both present is a construction error); the present direction
    ///   fills both cells when `ensure_symmetry`, otherwise only the forward
    ///   cell, and a fully absent pair defaults to 0.
    pub fn from_relation(
        relation: &DistanceRelation,
        sorted_branches: &[String],
        is_complete: bool,
        ensure_symmetry: bool,
        zero_identities: bool,
        trim_error_branches: bool,
    ) -> Result<Self, DriftError> {
        let mut relation = relation.clone();
        if zero_identities {
            for branch in sorted_branches {
                relation.add_value(branch, branch, 0.0);
            }
        }

        let mut branches: Vec<String> = sorted_branches.to_vec();
        if trim_error_branches {
            // Terminates: every iteration strictly shrinks the observation
            // set.
            while relation.contains_error_values() {
                relation.trim_most_erroneous_branch();
                branches = relation.branches();
            }
        }

        let n = branches.len();
        let mut data = vec![vec![0.0_f32; n]; n];

        for (from_idx, from) in branches.iter().enumerate() {
            for (to_idx, to) in branches.iter().enumerate() {
                let forward = relation.get(from, to);
                let reverse = relation.get(to, from);

                let cell = if is_complete {
                    let forward = forward.ok_or_else(|| {
                        DriftError::MatrixConstruction(format!(
                            "complete relation is missing value for {from} -> {to}"
                        ))
                    })?;
                    if ensure_symmetry {
                        let reverse = reverse.ok_or_else(|| {
                            DriftError::MatrixConstruction(format!(
                                "complete relation is missing value for {to} -> {from}"
                            ))
                        })?;
                        (forward + reverse) / 2.0
                    } else {
                        forward
                    }
                } else {
                    if forward.is_some() && reverse.is_some() && from != to {
                        return Err(DriftError::MatrixConstruction(format!(
                            "sparse relation contains both directions for {from} <-> {to}"
                        )));
                    }
                    if ensure_symmetry {
                        forward.or(reverse).unwrap_or(0.0)
                    } else {
                        forward.unwrap_or(0.0)
                    }
                };
                if is_error_value(cell) {
                    return Err(DriftError::MatrixConstruction(format!(
                        "unresolved error value for {from} -> {to}"
                    )));
                }
                data[from_idx][to_idx] = cell;
            }
        }

        Ok(Self {
            data,
            sorted_branches: branches,
        })
    }

    /// Join partial relations and build the matrix in one step.
    pub fn from_partial_relations(
        partials: Vec<DistanceRelation>,
        sorted_branches: &[String],
        is_complete: bool,
        ensure_symmetry: bool,
        zero_identities: bool,
        trim_error_branches: bool,
    ) -> Result<Self, DriftError> {
        let mut joined = DistanceRelation::new();
        for partial in partials {
            joined.join(partial);
        }
        Self::from_relation(
            &joined,
            sorted_branches,
            is_complete,
            ensure_symmetry,
            zero_identities,
            trim_error_branches,
        )
    }

    /// Matrix dimension (number of branches after trimming).
    pub fn dimension(&self) -> usize {
        self.sorted_branches.len()
    }

    /// The embedding input shape: a JSON object mapping row-index strings to
    /// row arrays, e.g. `{"0": [0.0, 1.0], "1": [1.0, 0.0]}`.
    pub fn to_json_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (idx, row) in self.data.iter().enumerate() {
            object.insert(idx.to_string(), json!(row));
        }
        Value::Object(object)
    }
}

// ============================================================================
// Tests
// ============================================================================
