//! analysis::projection — deterministic projection of stage vectors.
//!
//! Purpose
//! -------
//! Iterate `n(t+1) = A n(t)` from an initial stage vector and record the
//! total population size and stage vector at every step, optionally after
//! normalizing the initial vector and/or dividing `A` by its growth rate.
//!
//! Key behaviors
//! -------------
//! - [`project`] produces a [`ProjectionSeries`] covering `t = 0..=steps`.
//! - [`project_batch`] projects every column of an `n×k` matrix of initial
//!   vectors independently, producing one series per column.
//! - [`ProjectionOptions`] toggles `normalize_initial_vector` (divide by the
//!   sum before the first step) and `scale_matrix_by_growth_rate` (project
//!   with `A / λ` to isolate transient from asymptotic dynamics).
//!
//! Invariants & assumptions
//! ------------------------
//! - The initial vector has length `n` with finite, non-negative entries.
//! - Without scaling, no renormalization happens during projection: totals
//!   grow or decay geometrically, which is what reveals `λ`.
//! - Projection is linear in the initial vector when normalization is off.
//!
//! Conventions
//! -----------
//! - Series rows index time, columns index stages.
//! - `steps = 0` yields a single row equal to the (possibly normalized)
//!   initial vector.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the `steps = 0` rule, linearity, normalization,
//!   growth-rate scaling, batch independence, and input validation.

use crate::{
    analysis::eigen::dominant_eigenvalue,
    model::{
        errors::{MPMError, MPMResult},
        matrix::ProjectionMatrix,
        validation::{normalize_by_sum, validate_state_vector},
    },
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// ProjectionOptions — configuration for [`project`] and [`project_batch`].
///
/// Fields
/// ------
/// - `normalize_initial_vector`: `bool`
///   Divide the initial vector by its sum before the first step.
/// - `scale_matrix_by_growth_rate`: `bool`
///   Project with `A / λ` instead of `A`.
///
/// Notes
/// -----
/// - The default disables both options (plain projection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionOptions {
    pub normalize_initial_vector: bool,
    pub scale_matrix_by_growth_rate: bool,
}

impl ProjectionOptions {
    pub fn new(normalize_initial_vector: bool, scale_matrix_by_growth_rate: bool) -> Self {
        ProjectionOptions { normalize_initial_vector, scale_matrix_by_growth_rate }
    }

    /// Normalized initial vector projected with `A / λ`: the standardized
    /// setting used for transient indices.
    pub fn standardized() -> Self {
        ProjectionOptions::new(true, true)
    }
}

/// ProjectionSeries — totals and stage vectors for `t = 0..=T`.
///
/// Fields
/// ------
/// - `totals`: `Array1<f64>`
///   Total population size `Σ_i n_i(t)`, length `T + 1`.
/// - `stage_vectors`: `Array2<f64>`
///   Row `t` is the stage vector `n(t)`; shape `(T + 1) × n`.
/// - `scaled_by`: `Option<f64>`
///   The growth rate `λ` the matrix was divided by, if any.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionSeries {
    pub totals: Array1<f64>,
    pub stage_vectors: Array2<f64>,
    pub scaled_by: Option<f64>,
}

impl ProjectionSeries {
    /// Number of projected steps `T` (the series holds `T + 1` rows).
    pub fn steps(&self) -> usize {
        self.totals.len().saturating_sub(1)
    }

    pub fn total(&self, t: usize) -> Option<f64> {
        self.totals.get(t).copied()
    }

    pub fn stage_vector(&self, t: usize) -> Option<ArrayView1<'_, f64>> {
        (t < self.stage_vectors.nrows()).then(|| self.stage_vectors.row(t))
    }

    /// Iterate `(total, stage vector)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, ArrayView1<'_, f64>)> + '_ {
        self.totals.iter().copied().zip(self.stage_vectors.axis_iter(Axis(0)))
    }

    /// Realized one-step growth rates `N(t) / N(t−1)` for `t = 1..=T`;
    /// `None` where `N(t−1) = 0`.
    pub fn realized_growth_rates(&self) -> Vec<Option<f64>> {
        self.totals
            .windows(2)
            .into_iter()
            .map(|w| (w[0] > 0.0).then(|| w[1] / w[0]))
            .collect()
    }

    /// Stage proportions `n(t) / N(t)`; rows with zero total stay zero.
    pub fn stage_proportions(&self) -> Array2<f64> {
        let mut out = self.stage_vectors.clone();
        for (mut row, &total) in out.axis_iter_mut(Axis(0)).zip(self.totals.iter()) {
            if total > 0.0 {
                row.mapv_inplace(|x| x / total);
            }
        }
        out
    }
}

/// Project an initial vector forward `steps` time steps.
///
/// Parameters
/// ----------
/// - `matrix`: `&ProjectionMatrix`
/// - `initial`: `ArrayView1<f64>`
///   Length-`n`, finite, non-negative stage vector.
/// - `steps`: `usize`
///   Number of steps; `0` returns only the initial row.
/// - `options`: `&ProjectionOptions`
///
/// Returns
/// -------
/// `MPMResult<ProjectionSeries>`
///
/// Errors
/// ------
/// - `MPMError::DimensionMismatch` / `MPMError::InvalidVectorEntry` for a
///   malformed initial vector.
/// - `MPMError::DegenerateVector` when normalization is requested for a
///   vector summing to zero.
/// - `MPMError::NonPositiveGrowthRate` (and eigenanalysis errors) when
///   scaling is requested and `λ ≤ 0`.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_demography::model::matrix::ProjectionMatrix;
/// # use rust_demography::analysis::projection::{project, ProjectionOptions};
/// let m = ProjectionMatrix::new(array![[0.0, 2.0], [0.5, 0.5]]).unwrap();
/// let series = project(&m, array![10.0, 0.0].view(), 3, &ProjectionOptions::default()).unwrap();
/// assert_eq!(series.totals.len(), 4);
/// assert_eq!(series.total(1), Some(5.0));
/// ```
pub fn project(
    matrix: &ProjectionMatrix, initial: ArrayView1<f64>, steps: usize,
    options: &ProjectionOptions,
) -> MPMResult<ProjectionSeries> {
    let (operator, scaled_by) = projection_operator(matrix, options)?;
    let state0 = initial_state(initial, matrix.dim(), options)?;
    Ok(run_projection(operator.view(), state0, steps, scaled_by))
}

/// Project every column of `initial` independently.
///
/// The operator (and `λ`, when scaling) is computed once and shared
/// read-only; each column's series is built from its own buffers.
///
/// Errors
/// ------
/// - `MPMError::DimensionMismatch` when `initial.nrows() != n`.
/// - Every error of [`project`], reported for the first failing column.
pub fn project_batch(
    matrix: &ProjectionMatrix, initial: ArrayView2<f64>, steps: usize,
    options: &ProjectionOptions,
) -> MPMResult<Vec<ProjectionSeries>> {
    let n = matrix.dim();
    if initial.nrows() != n {
        return Err(MPMError::DimensionMismatch {
            what: "initial vector matrix rows",
            expected: n,
            actual: initial.nrows(),
        });
    }
    let (operator, scaled_by) = projection_operator(matrix, options)?;
    initial
        .axis_iter(Axis(1))
        .map(|column| {
            let state0 = initial_state(column, n, options)?;
            Ok(run_projection(operator.view(), state0, steps, scaled_by))
        })
        .collect()
}

/// The matrix actually iterated (`A` or `A / λ`) and the `λ` used.
fn projection_operator(
    matrix: &ProjectionMatrix, options: &ProjectionOptions,
) -> MPMResult<(Array2<f64>, Option<f64>)> {
    if !options.scale_matrix_by_growth_rate {
        return Ok((matrix.entries().to_owned(), None));
    }
    let lambda = positive_growth_rate(matrix)?;
    Ok((scaled_operator(matrix, lambda)?, Some(lambda)))
}

/// `λ` from the spectrum alone, rejecting `λ ≤ 0` before any eigenvector
/// is computed (a nilpotent `A` has no normalizable `v`).
pub(crate) fn positive_growth_rate(matrix: &ProjectionMatrix) -> MPMResult<f64> {
    let lambda = dominant_eigenvalue(matrix.entries())?;
    if !(lambda.is_finite() && lambda > 0.0) {
        return Err(MPMError::NonPositiveGrowthRate { lambda });
    }
    Ok(lambda)
}

/// `A / λ`, rejecting `λ ≤ 0`.
pub(crate) fn scaled_operator(matrix: &ProjectionMatrix, lambda: f64) -> MPMResult<Array2<f64>> {
    if !(lambda.is_finite() && lambda > 0.0) {
        return Err(MPMError::NonPositiveGrowthRate { lambda });
    }
    Ok(matrix.scaled(lambda.recip())?.entries().to_owned())
}

fn initial_state(
    initial: ArrayView1<f64>, n: usize, options: &ProjectionOptions,
) -> MPMResult<Array1<f64>> {
    validate_state_vector(initial, n)?;
    if options.normalize_initial_vector {
        normalize_by_sum(initial, "initial vector")
    } else {
        Ok(initial.to_owned())
    }
}

/// Iterate `operator` from `state0`; each step allocates a fresh vector.
pub(crate) fn run_projection(
    operator: ArrayView2<f64>, state0: Array1<f64>, steps: usize, scaled_by: Option<f64>,
) -> ProjectionSeries {
    let n = state0.len();
    let mut stage_vectors = Array2::<f64>::zeros((steps + 1, n));
    let mut totals = Array1::<f64>::zeros(steps + 1);

    let mut state = state0;
    for t in 0..=steps {
        if t > 0 {
            state = operator.dot(&state);
        }
        totals[t] = state.sum();
        stage_vectors.row_mut(t).assign(&state);
    }
    ProjectionSeries { totals, stage_vectors, scaled_by }
}
