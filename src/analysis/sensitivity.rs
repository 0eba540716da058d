//! analysis::sensitivity — how λ responds to changes in matrix entries.
//!
//! Purpose
//! -------
//! Compute the sensitivity matrix `S[i, j] = ∂λ/∂A[i, j] = v_i w_j` and the
//! elasticity matrix `E[i, j] = S[i, j] · A[i, j] / λ`, with two independent
//! cross-checks: a multiplier sweep that recomputes `λ` for perturbed
//! matrices, and central finite differences of `λ`.
//!
//! Key behaviors
//! -------------
//! - [`sensitivity`] / [`elasticity`] use the normalized eigenvectors from
//!   `analysis::eigen` (`v · w = 1`).
//! - [`SensitivityOptions::zero_structural_zeros`] zeroes entries where
//!   `A[i, j] == 0`, so transitions that do not exist report no sensitivity.
//! - [`sensitivity_by_simulation`] rescales every non-zero transition by
//!   each multiplier and records the resulting growth rates.
//! - [`numerical_sensitivity`] differentiates `λ` numerically with
//!   `finitediff`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Elasticities sum to 1 (Euler's theorem: `λ` is homogeneous of degree
//!   one in `A`).
//! - Elasticity requires `λ > 0`.
//!
//! Conventions
//! -----------
//! - Transitions in [`SimulatedSensitivity`] are listed in row-major order.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against reference values for the giraffe matrix and
//!   check the analytic, simulated, and numerical routes against each other.

use std::cell::RefCell;

use crate::{
    analysis::{
        eigen::{analyze, dominant_eigenvalue},
        projection::positive_growth_rate,
    },
    model::{
        errors::{MPMError, MPMResult},
        matrix::ProjectionMatrix,
    },
};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// SensitivityOptions — configuration for sensitivity and elasticity.
///
/// Fields
/// ------
/// - `zero_structural_zeros`: `bool`
///   Report `0` wherever `A[i, j] == 0` (default `true`). With `false` the
///   raw value is reported for every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensitivityOptions {
    pub zero_structural_zeros: bool,
}

impl SensitivityOptions {
    pub fn new(zero_structural_zeros: bool) -> Self {
        SensitivityOptions { zero_structural_zeros }
    }
}

impl Default for SensitivityOptions {
    fn default() -> Self {
        SensitivityOptions { zero_structural_zeros: true }
    }
}

/// SimulatedSensitivity — growth rates under multiplicative perturbation.
///
/// Fields
/// ------
/// - `transitions`: `Vec<(usize, usize)>`
///   `(row, col)` of every non-zero entry, row-major.
/// - `multipliers`: `Array1<f64>`
/// - `growth_rates`: `Array2<f64>`
///   `growth_rates[[k, m]]` is `λ` after scaling `transitions[k]` by
///   `multipliers[m]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulatedSensitivity {
    pub transitions: Vec<(usize, usize)>,
    pub multipliers: Array1<f64>,
    pub growth_rates: Array2<f64>,
}

impl SimulatedSensitivity {
    /// Growth rates for one transition across all multipliers.
    pub fn for_transition(&self, row: usize, col: usize) -> Option<ArrayView1<'_, f64>> {
        self.transitions
            .iter()
            .position(|&t| t == (row, col))
            .map(|k| self.growth_rates.row(k))
    }
}

/// Sensitivity matrix `S = v wᵀ`.
///
/// Errors
/// ------
/// - Eigenanalysis errors from [`analyze`].
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_demography::model::matrix::ProjectionMatrix;
/// # use rust_demography::analysis::sensitivity::{sensitivity, SensitivityOptions};
/// let m = ProjectionMatrix::new(array![[0.0, 2.0], [0.5, 0.0]]).unwrap();
/// let s = sensitivity(&m, &SensitivityOptions::default()).unwrap();
/// assert_eq!(s[[0, 0]], 0.0);
/// assert!(s[[0, 1]] > 0.0);
/// ```
pub fn sensitivity(
    matrix: &ProjectionMatrix, options: &SensitivityOptions,
) -> MPMResult<Array2<f64>> {
    let eig = analyze(matrix)?;
    let v = &eig.reproductive_value;
    let w = &eig.stable_stage_distribution;
    let mut s = Array2::from_shape_fn((matrix.dim(), matrix.dim()), |(i, j)| v[i] * w[j]);
    if options.zero_structural_zeros {
        mask_structural_zeros(&mut s, matrix.entries());
    }
    Ok(s)
}

/// Elasticity matrix `E = S ∘ A / λ`.
///
/// Errors
/// ------
/// - `MPMError::NonPositiveGrowthRate` when `λ ≤ 0`.
/// - Eigenanalysis errors from [`analyze`].
pub fn elasticity(
    matrix: &ProjectionMatrix, options: &SensitivityOptions,
) -> MPMResult<Array2<f64>> {
    let lambda = positive_growth_rate(matrix)?;
    let eig = analyze(matrix)?;
    let v = &eig.reproductive_value;
    let w = &eig.stable_stage_distribution;
    let a = matrix.entries();
    let mut e = Array2::from_shape_fn(a.dim(), |(i, j)| v[i] * w[j] * a[[i, j]] / lambda);
    if options.zero_structural_zeros {
        mask_structural_zeros(&mut e, a);
    }
    Ok(e)
}

/// Growth rates after scaling each non-zero transition by each multiplier.
///
/// Parameters
/// ----------
/// - `matrix`: `&ProjectionMatrix`
/// - `multipliers`: `&[f64]`
///   Finite, non-negative scale factors (e.g. `0.9, 1.0, 1.1`).
///
/// Errors
/// ------
/// - `MPMError::InvalidMultiplier` for a negative or non-finite multiplier.
/// - `MPMError::InvalidArgument` for an empty multiplier list.
/// - Eigenvalue errors for any perturbed matrix.
pub fn sensitivity_by_simulation(
    matrix: &ProjectionMatrix, multipliers: &[f64],
) -> MPMResult<SimulatedSensitivity> {
    if multipliers.is_empty() {
        return Err(MPMError::invalid_argument("at least one multiplier is required"));
    }
    if let Some(&value) = multipliers.iter().find(|m| !(m.is_finite() && **m >= 0.0)) {
        return Err(MPMError::InvalidMultiplier { value });
    }

    let a = matrix.entries();
    let transitions: Vec<(usize, usize)> =
        a.indexed_iter().filter(|&(_, &x)| x != 0.0).map(|(idx, _)| idx).collect();

    let mut growth_rates = Array2::<f64>::zeros((transitions.len(), multipliers.len()));
    for (k, &(i, j)) in transitions.iter().enumerate() {
        for (m, &factor) in multipliers.iter().enumerate() {
            let perturbed = matrix.with_entry(i, j, a[[i, j]] * factor)?;
            growth_rates[[k, m]] = dominant_eigenvalue(perturbed.entries())?;
        }
    }

    Ok(SimulatedSensitivity {
        transitions,
        multipliers: Array1::from(multipliers.to_vec()),
        growth_rates,
    })
}

/// Sensitivity of `λ` by central finite differences over every entry.
///
/// Entries are perturbed in both directions, including structural zeros,
/// so the result is directly comparable to [`sensitivity`] with the same
/// options.
///
/// Errors
/// ------
/// - The first eigenvalue error raised while evaluating a perturbed matrix.
/// - `MPMError::NonFiniteResult` if the difference quotient is not finite.
pub fn numerical_sensitivity(
    matrix: &ProjectionMatrix, options: &SensitivityOptions,
) -> MPMResult<Array2<f64>> {
    let n = matrix.dim();
    let theta: Array1<f64> = matrix.entries().iter().copied().collect();

    let closure_err: RefCell<Option<MPMError>> = RefCell::new(None);
    let growth_rate = |theta: &Array1<f64>| -> f64 {
        let lambda = theta
            .view()
            .into_shape((n, n))
            .map_err(|_| MPMError::DimensionMismatch {
                what: "flattened matrix",
                expected: n * n,
                actual: theta.len(),
            })
            .and_then(dominant_eigenvalue);
        match lambda {
            Ok(val) => val,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let grad = theta.central_diff(&growth_rate);
    if let Some(e) = closure_err.into_inner() {
        return Err(e);
    }
    if grad.iter().any(|g| !g.is_finite()) {
        return Err(MPMError::NonFiniteResult { context: "numerical sensitivity" });
    }

    let mut s = grad.into_shape((n, n)).map_err(|_| MPMError::DimensionMismatch {
        what: "sensitivity gradient",
        expected: n * n,
        actual: theta.len(),
    })?;
    if options.zero_structural_zeros {
        mask_structural_zeros(&mut s, matrix.entries());
    }
    Ok(s)
}

fn mask_structural_zeros(values: &mut Array2<f64>, a: ArrayView2<f64>) {
    values.zip_mut_with(&a, |x, &aij| {
        if aij == 0.0 {
            *x = 0.0;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sensitivity and elasticity reference values for the giraffe matrix.
    // - The structural-zero option.
    // - Elasticities summing to one.
    // - Agreement of the simulated and numerical routes with S.
    // - Multiplier validation.
    // -------------------------------------------------------------------------

    fn giraffe() -> ProjectionMatrix {
        ProjectionMatrix::new(array![[0.0, 0.0, 0.24], [0.57, 0.0, 0.0], [0.0, 0.79, 0.84]])
            .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Check S = v wᵀ against reference values.
    //
    // Given
    // -----
    // - Giraffe matrix, `zero_structural_zeros = false` and `true`.
    //
    // Expect
    // ------
    // - Raw outer product matches the reference matrix.
    // - With masking, entries where A = 0 are exactly zero.
    fn sensitivity_matches_reference_values() {
        // Arrange
        let m = giraffe();
        let expected = array![
            [0.09871191035663082, 0.058744576874960854, 0.39394441480300935],
            [0.16587133254863554, 0.0987119103566308, 0.6619675862556964],
            [0.2011040768371736, 0.1196793158895218, 0.8025761792867384]
        ];

        // Act
        let raw = sensitivity(&m, &SensitivityOptions::new(false)).unwrap();
        let masked = sensitivity(&m, &SensitivityOptions::default()).unwrap();

        // Assert
        for ((i, j), &x) in expected.indexed_iter() {
            assert_relative_eq!(raw[[i, j]], x, epsilon = 1e-9);
            if m.entries()[[i, j]] == 0.0 {
                assert_eq!(masked[[i, j]], 0.0);
            } else {
                assert_relative_eq!(masked[[i, j]], x, epsilon = 1e-9);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Elasticities match reference values and sum to one.
    //
    // Given
    // -----
    // - Giraffe matrix.
    //
    // Expect
    // ------
    // - E[2, 2] ≈ 0.70386, the three cycle entries ≈ 0.09871.
    // - Σ E = 1 with either option.
    fn elasticity_matches_reference_and_sums_to_one() {
        // Arrange
        let m = giraffe();

        // Act
        let e = elasticity(&m, &SensitivityOptions::default()).unwrap();
        let e_raw = elasticity(&m, &SensitivityOptions::new(false)).unwrap();

        // Assert
        assert_relative_eq!(e[[2, 2]], 0.7038642689301076, epsilon = 1e-9);
        assert_relative_eq!(e[[0, 2]], 0.09871191035663081, epsilon = 1e-9);
        assert_relative_eq!(e[[1, 0]], 0.09871191035663082, epsilon = 1e-9);
        assert_relative_eq!(e[[2, 1]], 0.0987119103566308, epsilon = 1e-9);
        assert_relative_eq!(e.sum(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(e_raw.sum(), 1.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // A matrix with λ = 0 has no elasticity.
    //
    // Given
    // -----
    // - Nilpotent matrix [[0, 1], [0, 0]].
    //
    // Expect
    // ------
    // - `NonPositiveGrowthRate`.
    fn elasticity_rejects_zero_growth_rate() {
        let m = ProjectionMatrix::new(array![[0.0, 1.0], [0.0, 0.0]]).unwrap();
        assert!(matches!(
            elasticity(&m, &SensitivityOptions::default()),
            Err(MPMError::NonPositiveGrowthRate { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Finite differences reproduce the analytic sensitivities.
    //
    // Given
    // -----
    // - Giraffe matrix, unmasked.
    //
    // Expect
    // ------
    // - Every entry agrees to 1e-6.
    fn numerical_sensitivity_agrees_with_analytic() {
        // Arrange
        let m = giraffe();
        let opts = SensitivityOptions::new(false);

        // Act
        let analytic = sensitivity(&m, &opts).unwrap();
        let numeric = numerical_sensitivity(&m, &opts).unwrap();

        // Assert
        for (a, b) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // The multiplier sweep is consistent with λ and with S.
    //
    // Given
    // -----
    // - Giraffe matrix, multipliers (0.99, 1.0, 1.01).
    //
    // Expect
    // ------
    // - Four transitions; the 1.0 column equals λ everywhere.
    // - The centered slope for (2, 2) approximates S[2, 2] · A[2, 2].
    fn simulation_sweep_is_consistent_with_sensitivity() {
        // Arrange
        let m = giraffe();
        let lambda = analyze(&m).unwrap().growth_rate;
        let s = sensitivity(&m, &SensitivityOptions::default()).unwrap();

        // Act
        let sim = sensitivity_by_simulation(&m, &[0.99, 1.0, 1.01]).unwrap();

        // Assert
        assert_eq!(sim.transitions, vec![(0, 2), (1, 0), (2, 1), (2, 2)]);
        for k in 0..sim.transitions.len() {
            assert_relative_eq!(sim.growth_rates[[k, 1]], lambda, epsilon = 1e-12);
            assert!(sim.growth_rates[[k, 2]] > sim.growth_rates[[k, 0]]);
        }
        let row = sim.for_transition(2, 2).unwrap();
        let slope = (row[2] - row[0]) / (0.02 * 0.84);
        assert_relative_eq!(slope, s[[2, 2]], max_relative = 1e-3);
        assert!(sim.for_transition(0, 0).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Reject invalid multipliers.
    //
    // Given
    // -----
    // - A negative multiplier, a NaN multiplier, and an empty list.
    //
    // Expect
    // ------
    // - `InvalidMultiplier`, `InvalidMultiplier`, `InvalidArgument`.
    fn simulation_rejects_invalid_multipliers() {
        let m = giraffe();
        assert!(matches!(
            sensitivity_by_simulation(&m, &[1.0, -0.5]),
            Err(MPMError::InvalidMultiplier { .. })
        ));
        assert!(matches!(
            sensitivity_by_simulation(&m, &[f64::NAN]),
            Err(MPMError::InvalidMultiplier { .. })
        ));
        assert!(matches!(
            sensitivity_by_simulation(&m, &[]),
            Err(MPMError::InvalidArgument { .. })
        ));
    }
}
