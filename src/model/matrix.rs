//! model::matrix — validated projection matrices and their U/F decomposition.
//!
//! Purpose
//! -------
//! Represent a matrix population model as a single immutable value that has
//! passed every shape and domain check up front, so analyses never have to
//! re-validate or defer failures to a numerical routine.
//!
//! Key behaviors
//! -------------
//! - Build a [`ProjectionMatrix`] from a full matrix `A`, from nested rows,
//!   from a survival/fecundity pair (`A = U + F`), or from all three (with a
//!   decomposition check).
//! - Carry optional stage labels for diagnostics.
//! - Produce derived matrices functionally ([`ProjectionMatrix::scaled`],
//!   [`ProjectionMatrix::with_entry`]) without mutating the original.
//!
//! Invariants & assumptions
//! ------------------------
//! - `A` is `n×n` with `n ≥ 1`, and every entry is finite and `≥ 0`.
//! - When present, `U` and `F` are `n×n`, finite, non-negative, every column
//!   of `U` sums to at most `1 + DECOMPOSITION_TOL`, and `U + F = A` within
//!   `DECOMPOSITION_TOL`.
//! - Stage labels, when present, number exactly `n`.
//!
//! Conventions
//! -----------
//! - Columns index the stage individuals come *from*, rows the stage they
//!   move *to*: `n(t+1) = A n(t)`.
//! - Entries are stored as owned `ndarray` buffers; cloning a model deep
//!   copies it, so concurrent analyses never share mutable state.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each constructor's success and failure paths and the
//!   functional-update helpers.

use crate::model::{
    errors::{MPMError, MPMResult},
    validation::{
        rows_to_array, validate_decomposition, validate_dim, validate_square_non_negative,
        validate_survival_columns,
    },
};
use ndarray::{Array2, ArrayView2};

/// Survival (`U`) and fecundity (`F`) components of a projection matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixComponents {
    pub survival: Array2<f64>,
    pub fecundity: Array2<f64>,
}

/// ProjectionMatrix — a validated matrix population model.
///
/// Purpose
/// -------
/// Own the projection matrix `A` (and optionally its `U`/`F` split and stage
/// labels) after all invariants have been checked.
///
/// Fields
/// ------
/// - `a`: `Array2<f64>`
///   Full projection matrix.
/// - `components`: `Option<MatrixComponents>`
///   Survival/fecundity split, required by life-history analyses.
/// - `stage_labels`: `Option<Vec<String>>`
///   Diagnostic names of the stages.
///
/// Invariants
/// ----------
/// - See the module documentation; every constructor enforces them.
///
/// Notes
/// -----
/// - The type is immutable; derived models are new values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProjectionMatrix {
    a: Array2<f64>,
    components: Option<MatrixComponents>,
    stage_labels: Option<Vec<String>>,
}

impl ProjectionMatrix {
    /// Construct a model from the full projection matrix `A`.
    ///
    /// Errors
    /// ------
    /// - `MPMError::EmptyMatrix`, `MPMError::NotSquare` (shape).
    /// - `MPMError::NegativeEntry`, `MPMError::NonFiniteEntry` (domain).
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use rust_demography::model::matrix::ProjectionMatrix;
    /// let giraffe = ProjectionMatrix::new(array![
    ///     [0.0, 0.0, 0.24],
    ///     [0.57, 0.0, 0.0],
    ///     [0.0, 0.79, 0.84],
    /// ])
    /// .unwrap();
    /// assert_eq!(giraffe.dim(), 3);
    /// ```
    pub fn new(a: Array2<f64>) -> MPMResult<Self> {
        validate_square_non_negative(a.view())?;
        Ok(ProjectionMatrix { a, components: None, stage_labels: None })
    }

    /// Construct a model from nested rows, as supplied by tabular sources.
    ///
    /// Errors
    /// ------
    /// - `MPMError::RaggedRows` if rows differ in length, plus every error of
    ///   [`ProjectionMatrix::new`].
    pub fn from_rows(rows: &[Vec<f64>]) -> MPMResult<Self> {
        ProjectionMatrix::new(rows_to_array(rows)?)
    }

    /// Construct a model from survival and fecundity matrices; `A = U + F`.
    ///
    /// Errors
    /// ------
    /// - Shape and domain errors for either component.
    /// - `MPMError::DimensionMismatch` when `U` and `F` differ in size.
    /// - `MPMError::SurvivalColumnExceedsOne` when a column of `U` sums to
    ///   more than `1 + DECOMPOSITION_TOL`.
    pub fn from_components(u: Array2<f64>, f: Array2<f64>) -> MPMResult<Self> {
        validate_components(u.view(), f.view())?;
        let a = &u + &f;
        Ok(ProjectionMatrix {
            a,
            components: Some(MatrixComponents { survival: u, fecundity: f }),
            stage_labels: None,
        })
    }

    /// Construct a model from `A` together with its decomposition.
    ///
    /// Errors
    /// ------
    /// - Every error of [`ProjectionMatrix::new`] and
    ///   [`ProjectionMatrix::from_components`].
    /// - `MPMError::DimensionMismatch` when `U`/`F` do not match `A`.
    /// - `MPMError::DecompositionMismatch` when `U + F ≠ A` beyond
    ///   `DECOMPOSITION_TOL`.
    pub fn from_parts(a: Array2<f64>, u: Array2<f64>, f: Array2<f64>) -> MPMResult<Self> {
        let n = validate_square_non_negative(a.view())?;
        validate_dim(u.view(), n, "survival matrix")?;
        validate_components(u.view(), f.view())?;
        validate_decomposition(a.view(), u.view(), f.view())?;
        Ok(ProjectionMatrix {
            a,
            components: Some(MatrixComponents { survival: u, fecundity: f }),
            stage_labels: None,
        })
    }

    /// Attach stage labels (diagnostic only).
    ///
    /// Errors
    /// ------
    /// - `MPMError::DimensionMismatch` when `labels.len() != n`.
    pub fn with_stage_labels<S: Into<String>>(
        mut self, labels: impl IntoIterator<Item = S>,
    ) -> MPMResult<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.dim() {
            return Err(MPMError::DimensionMismatch {
                what: "stage labels",
                expected: self.dim(),
                actual: labels.len(),
            });
        }
        self.stage_labels = Some(labels);
        Ok(self)
    }

    /// Number of stages `n`.
    pub fn dim(&self) -> usize {
        self.a.nrows()
    }

    /// Read-only view of `A`.
    pub fn entries(&self) -> ArrayView2<'_, f64> {
        self.a.view()
    }

    pub fn components(&self) -> Option<&MatrixComponents> {
        self.components.as_ref()
    }

    pub fn survival(&self) -> Option<ArrayView2<'_, f64>> {
        self.components.as_ref().map(|c| c.survival.view())
    }

    pub fn fecundity(&self) -> Option<ArrayView2<'_, f64>> {
        self.components.as_ref().map(|c| c.fecundity.view())
    }

    pub fn stage_labels(&self) -> Option<&[String]> {
        self.stage_labels.as_deref()
    }

    /// Label of stage `i`, falling back to `"stage {i}"`.
    pub fn stage_label(&self, i: usize) -> String {
        self.stage_labels
            .as_ref()
            .and_then(|labels| labels.get(i).cloned())
            .unwrap_or_else(|| format!("stage {i}"))
    }

    /// `A · factor` as a new model; labels are kept, the decomposition is
    /// dropped.
    ///
    /// Errors
    /// ------
    /// - `MPMError::InvalidArgument` when `factor` is negative or non-finite.
    pub fn scaled(&self, factor: f64) -> MPMResult<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(MPMError::invalid_argument(format!(
                "scale factor must be finite and >= 0; got {factor}"
            )));
        }
        Ok(ProjectionMatrix {
            a: &self.a * factor,
            components: None,
            stage_labels: self.stage_labels.clone(),
        })
    }

    /// Copy of the model with `A[row, col]` replaced by `value`.
    ///
    /// The decomposition is dropped because the new entry cannot be
    /// attributed to `U` or `F`.
    ///
    /// Errors
    /// ------
    /// - `MPMError::InvalidArgument` for an out-of-range index.
    /// - Domain errors for a negative or non-finite `value`.
    pub fn with_entry(&self, row: usize, col: usize, value: f64) -> MPMResult<Self> {
        let n = self.dim();
        if row >= n || col >= n {
            return Err(MPMError::invalid_argument(format!(
                "entry ({row}, {col}) is outside a {n}×{n} matrix"
            )));
        }
        let mut a = self.a.clone();
        a[[row, col]] = value;
        let mut out = ProjectionMatrix::new(a)?;
        out.stage_labels = self.stage_labels.clone();
        Ok(out)
    }
}

fn validate_components(u: ArrayView2<f64>, f: ArrayView2<f64>) -> MPMResult<usize> {
    let n = validate_square_non_negative(u)?;
    validate_square_non_negative(f)?;
    validate_dim(f, n, "fecundity matrix")?;
    validate_survival_columns(u)?;
    Ok(n)
}
