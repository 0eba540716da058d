//! model::errors — error taxonomy for matrix population model analyses.
//!
//! Purpose
//! -------
//! Provide the single error enum and result alias shared by every analysis in
//! this crate, together with a coarse classification ([`MPMErrorKind`]) that
//! batch callers can use to decide how to report a failed matrix.
//!
//! Key behaviors
//! -------------
//! - Define [`MPMError`] with struct-like variants that carry the offending
//!   value, index, or shape so diagnostics are meaningful without extra
//!   context.
//! - Map every variant onto the shape / domain / decomposition /
//!   degenerate-vector / singular / generation-time / argument taxonomy via
//!   [`MPMError::kind`].
//! - Implement `From<MPMError> for PyErr` when the `python-bindings` feature
//!   is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All errors are deterministic mathematical or input failures local to a
//!   single matrix; none of them is retryable.
//! - Non-fatal conditions (e.g. a complex dominant eigenvalue) are **not**
//!   errors; they are reported as [`crate::analysis::eigen::EigenWarning`]
//!   values attached to results.
//!
//! Conventions
//! -----------
//! - Indices are 0-based (row, col) pairs, matching `ndarray`.
//! - Messages are phrased in terms of the violated constraint.
//!
//! Testing notes
//! -------------
//! - Unit tests check that `Display` embeds payloads and that `kind()` maps
//!   representative variants to the documented category.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for analyses that may produce [`MPMError`].
pub type MPMResult<T> = Result<T, MPMError>;

/// MPMErrorKind — coarse category of an [`MPMError`].
///
/// Batch callers typically log the kind and continue with the next matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MPMErrorKind {
    /// Non-square, empty, or mismatched-dimension input.
    Shape,
    /// Negative or non-finite entries, invalid survival column sums.
    Domain,
    /// `U + F` does not reproduce `A`.
    Decomposition,
    /// A vector that sums to ~0 where normalization was requested.
    DegenerateVector,
    /// A (pseudo-)inverse could not be computed.
    SingularMatrix,
    /// Generation time is undefined for the supplied matrices.
    UndefinedGenerationTime,
    /// Argument outside the operation's domain (e.g. zero fecundity).
    InvalidArgument,
    /// Iterative decomposition failed or growth rate unusable.
    Numerical,
}

/// Unified error type for matrix population model analyses.
#[derive(Debug, Clone, PartialEq)]
pub enum MPMError {
    // ---- Shape ----
    /// Matrix has zero rows or columns.
    EmptyMatrix,

    /// Matrix is not square.
    NotSquare { rows: usize, cols: usize },

    /// Nested-row input has rows of differing length.
    RaggedRows { row: usize, expected: usize, actual: usize },

    /// A vector, matrix, or label list does not match the model dimension.
    DimensionMismatch { what: &'static str, expected: usize, actual: usize },

    // ---- Domain ----
    /// Matrix entry is negative.
    NegativeEntry { row: usize, col: usize, value: f64 },

    /// Matrix entry is NaN or ±inf.
    NonFiniteEntry { row: usize, col: usize, value: f64 },

    /// Survival column sum exceeds one.
    SurvivalColumnExceedsOne { col: usize, sum: f64 },

    /// State vector entry is negative or non-finite.
    InvalidVectorEntry { index: usize, value: f64 },

    /// Perturbation multiplier is negative or non-finite.
    InvalidMultiplier { value: f64 },

    // ---- Decomposition ----
    /// `U + F` differs from `A` at (row, col).
    DecompositionMismatch { row: usize, col: usize, expected: f64, actual: f64 },

    // ---- Degenerate vectors ----
    /// Vector sums (or pairs) to ~0 and cannot be normalized.
    DegenerateVector { what: &'static str, sum: f64 },

    // ---- Singular matrices ----
    /// Pseudo-inverse computation failed.
    SingularMatrix { context: &'static str },

    // ---- Generation time ----
    /// `ln(R0) / ln(λ)` is undefined.
    UndefinedGenerationTime { lambda: f64, r0: f64, reason: &'static str },

    // ---- Arguments ----
    /// Argument is outside the operation's domain.
    InvalidArgument { reason: String },

    // ---- Numerical ----
    /// Schur or SVD iteration did not converge.
    EigenDecompositionFailed { dim: usize },

    /// Growth rate is not strictly positive where division by λ is needed.
    NonPositiveGrowthRate { lambda: f64 },

    /// A numerical cross-check produced a non-finite value.
    NonFiniteResult { context: &'static str },
}

impl MPMError {
    /// Map the variant onto its [`MPMErrorKind`].
    pub fn kind(&self) -> MPMErrorKind {
        match self {
            MPMError::EmptyMatrix
            | MPMError::NotSquare { .. }
            | MPMError::RaggedRows { .. }
            | MPMError::DimensionMismatch { .. } => MPMErrorKind::Shape,
            MPMError::NegativeEntry { .. }
            | MPMError::NonFiniteEntry { .. }
            | MPMError::SurvivalColumnExceedsOne { .. }
            | MPMError::InvalidVectorEntry { .. }
            | MPMError::InvalidMultiplier { .. } => MPMErrorKind::Domain,
            MPMError::DecompositionMismatch { .. } => MPMErrorKind::Decomposition,
            MPMError::DegenerateVector { .. } => MPMErrorKind::DegenerateVector,
            MPMError::SingularMatrix { .. } => MPMErrorKind::SingularMatrix,
            MPMError::UndefinedGenerationTime { .. } => MPMErrorKind::UndefinedGenerationTime,
            MPMError::InvalidArgument { .. } => MPMErrorKind::InvalidArgument,
            MPMError::EigenDecompositionFailed { .. }
            | MPMError::NonPositiveGrowthRate { .. }
            | MPMError::NonFiniteResult { .. } => MPMErrorKind::Numerical,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        MPMError::InvalidArgument { reason: reason.into() }
    }
}

impl std::error::Error for MPMError {}

impl std::fmt::Display for MPMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shape ----
            MPMError::EmptyMatrix => write!(f, "Matrix must have at least one stage."),
            MPMError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square; got {rows}×{cols}.")
            }
            MPMError::RaggedRows { row, expected, actual } => {
                write!(f, "Row {row} has {actual} entries; expected {expected}.")
            }
            MPMError::DimensionMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, got {actual}.")
            }
            // ---- Domain ----
            MPMError::NegativeEntry { row, col, value } => {
                write!(f, "Entry ({row}, {col}) is negative: {value}")
            }
            MPMError::NonFiniteEntry { row, col, value } => {
                write!(f, "Entry ({row}, {col}) is non-finite: {value}")
            }
            MPMError::SurvivalColumnExceedsOne { col, sum } => {
                write!(f, "Survival column {col} sums to {sum}, which exceeds 1.")
            }
            MPMError::InvalidVectorEntry { index, value } => {
                write!(f, "State vector entry {index} must be finite and >= 0; got {value}")
            }
            MPMError::InvalidMultiplier { value } => {
                write!(f, "Perturbation multiplier must be finite and >= 0; got {value}")
            }
            // ---- Decomposition ----
            MPMError::DecompositionMismatch { row, col, expected, actual } => write!(
                f,
                "U + F does not reproduce A at ({row}, {col}): A = {expected}, U + F = {actual}"
            ),
            // ---- Degenerate vectors ----
            MPMError::DegenerateVector { what, sum } => {
                write!(f, "Cannot normalize {what}: sum is {sum}.")
            }
            // ---- Singular matrices ----
            MPMError::SingularMatrix { context } => {
                write!(f, "Pseudo-inverse could not be computed for {context}.")
            }
            // ---- Generation time ----
            MPMError::UndefinedGenerationTime { lambda, r0, reason } => write!(
                f,
                "Generation time is undefined (lambda = {lambda}, R0 = {r0}): {reason}"
            ),
            // ---- Arguments ----
            MPMError::InvalidArgument { reason } => write!(f, "Invalid argument: {reason}"),
            // ---- Numerical ----
            MPMError::EigenDecompositionFailed { dim } => {
                write!(f, "Eigendecomposition did not converge for a {dim}×{dim} matrix.")
            }
            MPMError::NonPositiveGrowthRate { lambda } => {
                write!(f, "Growth rate must be strictly positive; got {lambda}")
            }
            MPMError::NonFiniteResult { context } => {
                write!(f, "Non-finite value produced while computing {context}.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<MPMError> for PyErr {
    fn from(err: MPMError) -> PyErr {
        PyValueError::new_err(format!("MPMError: {err}"))
    }
}
