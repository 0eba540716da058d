//! analysis::eigen — asymptotic growth rate, stable structure, reproductive value.
//!
//! Purpose
//! -------
//! Perform the eigenanalysis of a projection matrix `A`: the dominant
//! eigenvalue `λ` (asymptotic growth rate), the right eigenvector `w`
//! (stable stage distribution), the left eigenvector `v` (reproductive
//! value), and the damping ratio `|λ₁| / |λ₂|`.
//!
//! Key behaviors
//! -------------
//! - Compute the full spectrum from a real Schur decomposition and select
//!   the dominant eigenvalue by modulus, breaking ties by real part and then
//!   by preferring a real eigenvalue (see `linalg::spectrum`).
//! - Obtain `w` as the null vector of `A − λI` and `v` as the null vector of
//!   `Aᵀ − λI` (the adjoint eigenproblem), then normalize `Σ w = 1` and
//!   `v · w = 1`.
//! - Report a complex or non-unique dominant eigenvalue as an
//!   [`EigenWarning`] on the result (and a `tracing` warning) while
//!   continuing with the real part.
//!
//! Invariants & assumptions
//! ------------------------
//! - For irreducible, primitive matrices the dominant eigenvalue is real,
//!   simple, and strictly dominant (Perron–Frobenius); warnings only appear
//!   for reducible or imprimitive input.
//! - `stable_stage_distribution.sum() == 1` and
//!   `reproductive_value.dot(&stable_stage_distribution) == 1` up to
//!   rounding.
//!
//! Conventions
//! -----------
//! - Damping ratio boundary rules: a 1×1 matrix has damping ratio `1`
//!   (nothing to converge to); a zero subdominant eigenvalue gives
//!   `f64::INFINITY` (convergence in finitely many steps).
//! - Nothing is cached; each call recomputes from the matrix.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against closed-form 2×2 and 3×3 spectra, check the
//!   normalization identities, the n = 1 rule, and the warnings emitted for
//!   an imprimitive Leslie matrix.

use crate::{
    linalg::{
        conversions::{to_array1, to_dmatrix},
        spectrum::{eigenvalues, null_vector},
    },
    model::{
        errors::{MPMError, MPMResult},
        matrix::ProjectionMatrix,
        tolerances::{DEGENERATE_SUM_EPS, EIGEN_TIE_TOL, IMAG_TOL},
    },
};
use nalgebra::{Complex, DMatrix};
use ndarray::{Array1, ArrayView2};
use tracing::{debug, warn};

/// EigenWarning — non-fatal conditions detected during eigenanalysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EigenWarning {
    /// The dominant eigenvalue has a non-negligible imaginary part; only the
    /// real part is used downstream.
    ComplexDominantEigenvalue { re: f64, im: f64 },
    /// Another eigenvalue shares the dominant modulus (imprimitive or
    /// reducible matrix); the tie-breaking convention picked the reported one.
    NonUniqueDominantModulus { modulus: f64, competitor: Complex<f64> },
}

impl std::fmt::Display for EigenWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EigenWarning::ComplexDominantEigenvalue { re, im } => {
                write!(f, "Dominant eigenvalue {re} + {im}i is complex; using its real part.")
            }
            EigenWarning::NonUniqueDominantModulus { modulus, competitor } => write!(
                f,
                "Dominant modulus {modulus} is shared with {} + {}i.",
                competitor.re, competitor.im
            ),
        }
    }
}

/// EigenResult — outcome of [`analyze`].
///
/// Fields
/// ------
/// - `growth_rate`: `f64`
///   Real part of the dominant eigenvalue `λ`.
/// - `stable_stage_distribution`: `Array1<f64>`
///   Dominant right eigenvector `w`, `Σ w = 1`.
/// - `reproductive_value`: `Array1<f64>`
///   Dominant left eigenvector `v`, `v · w = 1`.
/// - `damping_ratio`: `f64`
///   `|λ₁| / |λ₂|`, `≥ 1`.
/// - `eigenvalues`: `Vec<Complex<f64>>`
///   Full spectrum, dominant first, then by decreasing modulus.
/// - `warnings`: `Vec<EigenWarning>`
///   Non-fatal diagnostics; empty for primitive matrices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EigenResult {
    pub growth_rate: f64,
    pub stable_stage_distribution: Array1<f64>,
    pub reproductive_value: Array1<f64>,
    pub damping_ratio: f64,
    pub eigenvalues: Vec<Complex<f64>>,
    pub warnings: Vec<EigenWarning>,
}

impl EigenResult {
    /// Intrinsic rate of increase `r = ln λ`; `None` when `λ ≤ 0`, where
    /// the logarithm is undefined.
    pub fn intrinsic_rate(&self) -> Option<f64> {
        (self.growth_rate > 0.0).then(|| self.growth_rate.ln())
    }

    /// Subdominant eigenvalue `λ₂`, if the matrix has more than one stage.
    pub fn subdominant_eigenvalue(&self) -> Option<Complex<f64>> {
        self.eigenvalues.get(1).copied()
    }

    pub fn has_complex_dominant_eigenvalue(&self) -> bool {
        self.warnings.iter().any(|w| matches!(w, EigenWarning::ComplexDominantEigenvalue { .. }))
    }
}

/// Eigenanalysis of a projection matrix.
///
/// Parameters
/// ----------
/// - `matrix`: `&ProjectionMatrix`
///   Validated model; only `A` is used.
///
/// Returns
/// -------
/// `MPMResult<EigenResult>`
///   Growth rate, stable stage distribution, reproductive value, damping
///   ratio, full spectrum, and warnings.
///
/// Errors
/// ------
/// - `MPMError::EigenDecompositionFailed`
///   Schur or SVD iteration failed to converge.
/// - `MPMError::DegenerateVector`
///   The right eigenvector sums to ~0, or `v · w ≈ 0`. This happens for
///   reducible matrices whose dominant eigenvalue is not associated with a
///   non-negative eigenvector.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_demography::model::matrix::ProjectionMatrix;
/// # use rust_demography::analysis::eigen::analyze;
/// let m = ProjectionMatrix::new(array![[0.0, 4.0, 16.0], [0.5, 0.0, 0.0], [0.0, 0.5, 0.0]])
///     .unwrap();
/// let eig = analyze(&m).unwrap();
/// assert!((eig.growth_rate - 2.0).abs() < 1e-9);
/// assert!((eig.stable_stage_distribution.sum() - 1.0).abs() < 1e-12);
/// ```
pub fn analyze(matrix: &ProjectionMatrix) -> MPMResult<EigenResult> {
    let n = matrix.dim();
    let a = to_dmatrix(matrix.entries());
    let spectrum = eigenvalues(&a)?;
    let dominant = spectrum[0];
    let warnings = dominance_warnings(&spectrum);
    for warning in &warnings {
        warn!(dim = n, ?warning, "using the real part of the dominant eigenvalue");
    }

    let lambda = dominant.re;
    let shift = DMatrix::<f64>::identity(n, n) * lambda;

    let w_raw = to_array1(&null_vector(&a - &shift)?);
    let w_sum = w_raw.sum();
    if !w_sum.is_finite() || w_sum.abs() <= DEGENERATE_SUM_EPS {
        return Err(MPMError::DegenerateVector { what: "stable stage distribution", sum: w_sum });
    }
    let w = w_raw.mapv(|x| x / w_sum);

    let v_raw = to_array1(&null_vector(a.transpose() - &shift)?);
    let vw = v_raw.dot(&w);
    if !vw.is_finite() || vw.abs() <= DEGENERATE_SUM_EPS {
        return Err(MPMError::DegenerateVector { what: "reproductive value", sum: vw });
    }
    let v = v_raw.mapv(|x| x / vw);

    let damping_ratio = damping_ratio(&spectrum);
    debug!(dim = n, growth_rate = lambda, damping_ratio, "eigenanalysis complete");

    Ok(EigenResult {
        growth_rate: lambda,
        stable_stage_distribution: w,
        reproductive_value: v,
        damping_ratio,
        eigenvalues: spectrum,
        warnings,
    })
}

/// Real part of the dominant eigenvalue of `a` (no eigenvectors).
///
/// Used wherever only `λ` is needed: perturbation sweeps, net reproductive
/// rate, generation time. `a` need not be a validated projection matrix.
///
/// Errors
/// ------
/// - `MPMError::EmptyMatrix` / `MPMError::NotSquare` for malformed shapes.
/// - `MPMError::EigenDecompositionFailed` when the Schur iteration fails.
pub fn dominant_eigenvalue(a: ArrayView2<f64>) -> MPMResult<f64> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Err(MPMError::EmptyMatrix);
    }
    if rows != cols {
        return Err(MPMError::NotSquare { rows, cols });
    }
    let spectrum = eigenvalues(&to_dmatrix(a))?;
    Ok(spectrum[0].re)
}

fn dominance_warnings(spectrum: &[Complex<f64>]) -> Vec<EigenWarning> {
    let dominant = spectrum[0];
    let scale = dominant.norm().max(1.0);
    let mut warnings = Vec::new();
    if dominant.im.abs() > IMAG_TOL * scale {
        warnings.push(EigenWarning::ComplexDominantEigenvalue { re: dominant.re, im: dominant.im });
    }
    if let Some(&competitor) = spectrum.get(1) {
        if dominant.norm() - competitor.norm() <= EIGEN_TIE_TOL * scale {
            warnings.push(EigenWarning::NonUniqueDominantModulus {
                modulus: dominant.norm(),
                competitor,
            });
        }
    }
    warnings
}

fn damping_ratio(spectrum: &[Complex<f64>]) -> f64 {
    match spectrum.get(1) {
        None => 1.0,
        Some(second) if second.norm() <= f64::EPSILON * spectrum[0].norm().max(1.0) => {
            f64::INFINITY
        }
        Some(second) => spectrum[0].norm() / second.norm(),
    }
}
