//! model::validation — input guards for projection matrices and state vectors.
//!
//! Purpose
//! -------
//! Centralize the fail-fast checks applied when a matrix model is constructed
//! or a state vector is handed to an analysis, so that downstream numerical
//! routines never see malformed input.
//!
//! Key behaviors
//! -------------
//! - Reject empty, non-square, or mismatched matrices with shape errors.
//! - Reject negative or non-finite entries with domain errors.
//! - Check survival column sums and the `A = U + F` decomposition within
//!   [`DECOMPOSITION_TOL`].
//! - Validate state vectors (length, finiteness, non-negativity) and
//!   normalize them by their sum.
//!
//! Conventions
//! -----------
//! - Matrices are scanned row-major; the first offending entry is reported.
//! - Validation never allocates except for the normalized vector returned by
//!   [`normalize_by_sum`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover each error branch and a success path per helper.

use crate::model::{
    errors::{MPMError, MPMResult},
    tolerances::{DECOMPOSITION_TOL, DEGENERATE_SUM_EPS},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Validate that `a` is a non-empty, square matrix of finite, non-negative
/// entries, returning its dimension.
///
/// Errors
/// ------
/// - `MPMError::EmptyMatrix` when either dimension is zero.
/// - `MPMError::NotSquare` when `rows != cols`.
/// - `MPMError::NonFiniteEntry` / `MPMError::NegativeEntry` for the first
///   offending entry in row-major order.
pub fn validate_square_non_negative(a: ArrayView2<f64>) -> MPMResult<usize> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Err(MPMError::EmptyMatrix);
    }
    if rows != cols {
        return Err(MPMError::NotSquare { rows, cols });
    }
    for ((row, col), &value) in a.indexed_iter() {
        if !value.is_finite() {
            return Err(MPMError::NonFiniteEntry { row, col, value });
        }
        if value < 0.0 {
            return Err(MPMError::NegativeEntry { row, col, value });
        }
    }
    Ok(rows)
}

/// Validate that `m` has shape `n×n`.
pub fn validate_dim(m: ArrayView2<f64>, n: usize, what: &'static str) -> MPMResult<()> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(MPMError::NotSquare { rows, cols });
    }
    if rows != n {
        return Err(MPMError::DimensionMismatch { what, expected: n, actual: rows });
    }
    Ok(())
}

/// Validate that every column of the survival matrix sums to at most
/// `1 + DECOMPOSITION_TOL`.
///
/// A violation is a caller error and is reported, never clamped.
pub fn validate_survival_columns(u: ArrayView2<f64>) -> MPMResult<()> {
    for (col, column) in u.axis_iter(Axis(1)).enumerate() {
        let sum = column.sum();
        if sum > 1.0 + DECOMPOSITION_TOL {
            return Err(MPMError::SurvivalColumnExceedsOne { col, sum });
        }
    }
    Ok(())
}

/// Validate that `u + f` reproduces `a` elementwise within
/// [`DECOMPOSITION_TOL`].
pub fn validate_decomposition(
    a: ArrayView2<f64>, u: ArrayView2<f64>, f: ArrayView2<f64>,
) -> MPMResult<()> {
    for ((row, col), &expected) in a.indexed_iter() {
        let actual = u[[row, col]] + f[[row, col]];
        if (actual - expected).abs() > DECOMPOSITION_TOL {
            return Err(MPMError::DecompositionMismatch { row, col, expected, actual });
        }
    }
    Ok(())
}

/// Validate a state vector against the model dimension `n`.
///
/// Errors
/// ------
/// - `MPMError::DimensionMismatch` when `v.len() != n`.
/// - `MPMError::InvalidVectorEntry` for the first negative or non-finite
///   entry.
pub fn validate_state_vector(v: ArrayView1<f64>, n: usize) -> MPMResult<()> {
    if v.len() != n {
        return Err(MPMError::DimensionMismatch {
            what: "state vector",
            expected: n,
            actual: v.len(),
        });
    }
    for (index, &value) in v.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(MPMError::InvalidVectorEntry { index, value });
        }
    }
    Ok(())
}

/// Divide `v` by its sum.
///
/// Errors
/// ------
/// - `MPMError::DegenerateVector` when `|Σ v| ≤ DEGENERATE_SUM_EPS`.
pub fn normalize_by_sum(v: ArrayView1<f64>, what: &'static str) -> MPMResult<Array1<f64>> {
    let sum = v.sum();
    if !sum.is_finite() || sum.abs() <= DEGENERATE_SUM_EPS {
        return Err(MPMError::DegenerateVector { what, sum });
    }
    Ok(v.mapv(|x| x / sum))
}

/// Build an `Array2` from nested rows, rejecting ragged input.
pub fn rows_to_array(rows: &[Vec<f64>]) -> MPMResult<Array2<f64>> {
    let nrows = rows.len();
    if nrows == 0 {
        return Err(MPMError::EmptyMatrix);
    }
    let ncols = rows[0].len();
    for (row, values) in rows.iter().enumerate() {
        if values.len() != ncols {
            return Err(MPMError::RaggedRows { row, expected: ncols, actual: values.len() });
        }
    }
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|_| MPMError::EmptyMatrix)
}
