//! analysis::transient — short-term amplification and attenuation.
//!
//! Purpose
//! -------
//! Measure how far a population started from a given stage structure
//! departs from its asymptotic trajectory before the dominant eigenvalue
//! takes over. Every index here is computed on the *standardized*
//! projection: the initial vector is divided by its sum and `A` by `λ`, so
//! a population already at the stable structure keeps total size `1`.
//!
//! Key behaviors
//! -------------
//! - [`max_amplification`] / [`max_attenuation`] scan the standardized
//!   totals over `t = 0..=horizon` and report the extreme and the time step
//!   at which it first occurs.
//! - [`transient_summary`] bundles the first-step ratio (reactivity or
//!   first-step attenuation), both extremes, and the population inertia
//!   `v · n̂₀`.
//! - [`first_step_bounds`] gives the largest and smallest column sums of
//!   `A / λ`, which bound the first-step ratio over all initial vectors.
//! - [`stage_biased_bounds`] repeats the extremes for every single-stage
//!   initial vector and keeps the most extreme stage.
//!
//! Invariants & assumptions
//! ------------------------
//! - The standardized total at `t = 0` is exactly `1`, so
//!   `max_amplification ≥ 1` and `max_attenuation ≤ 1` always hold.
//! - A later value displaces the current extreme only if it beats it by more
//!   than `TRANSIENT_TOL` (relative). Rounding drift along an equilibrium
//!   trajectory therefore cannot move the report away from `t = 0`.
//!
//! Conventions
//! -----------
//! - The horizon defaults to `10 × n` steps and must be positive.
//! - "No amplification" is the neutral value `1` at `t = 0`, never an error.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the equilibrium regression (stable distribution in,
//!   `1` at `t = 0` out), closed-form Leslie trajectories, the inertia
//!   identity, and horizon validation.

use crate::{
    analysis::{
        eigen::analyze,
        projection::{positive_growth_rate, run_projection, scaled_operator},
    },
    model::{
        errors::{MPMError, MPMResult},
        matrix::ProjectionMatrix,
        tolerances::TRANSIENT_TOL,
        validation::{normalize_by_sum, validate_state_vector},
    },
};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

/// TransientOptions — projection horizon for transient indices.
///
/// Fields
/// ------
/// - `horizon`: `Option<usize>`
///   Number of steps to scan; `None` means `10 × n`. `Some(0)` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientOptions {
    pub horizon: Option<usize>,
}

impl TransientOptions {
    pub fn new(horizon: Option<usize>) -> Self {
        TransientOptions { horizon }
    }

    pub fn with_horizon(horizon: usize) -> Self {
        TransientOptions { horizon: Some(horizon) }
    }

    /// Effective horizon for an `n`-stage matrix.
    ///
    /// Errors
    /// ------
    /// - `MPMError::InvalidArgument` for an explicit horizon of `0`.
    pub fn resolve(&self, n: usize) -> MPMResult<usize> {
        match self.horizon {
            Some(0) => Err(MPMError::invalid_argument("transient horizon must be positive")),
            Some(h) => Ok(h),
            None => Ok((10 * n).max(1)),
        }
    }
}

/// TransientExtreme — an extreme standardized total and when it occurs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientExtreme {
    pub value: f64,
    pub time_step: usize,
}

/// TransientSummary — the transient indices of one initial vector.
///
/// Fields
/// ------
/// - `first_step`: `f64`
///   Standardized total at `t = 1`. Above one it is the reactivity, below
///   one the first-step attenuation.
/// - `max_amplification`, `max_attenuation`: `TransientExtreme`
/// - `inertia`: `f64`
///   Asymptotic ratio of the population to one started at the stable
///   structure with the same total, `v · n̂₀` with `v · w = 1`.
/// - `horizon`: `usize`
///   Number of steps scanned.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientSummary {
    pub first_step: f64,
    pub max_amplification: TransientExtreme,
    pub max_attenuation: TransientExtreme,
    pub inertia: f64,
    pub horizon: usize,
}

impl TransientSummary {
    pub fn is_reactive(&self) -> bool {
        self.first_step > 1.0
    }
}

/// FirstStepBounds — column-sum bounds of `A / λ`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirstStepBounds {
    /// Largest column sum: upper bound on reactivity.
    pub reactivity: f64,
    /// Smallest column sum: lower bound on first-step attenuation.
    pub first_step_attenuation: f64,
}

/// StageBiasedBounds — most extreme transients over single-stage vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageBiasedBounds {
    pub max_amplification: TransientExtreme,
    pub amplifying_stage: usize,
    pub max_attenuation: TransientExtreme,
    pub attenuating_stage: usize,
}

/// Maximum standardized total over the horizon.
///
/// Parameters
/// ----------
/// - `matrix`: `&ProjectionMatrix`
/// - `vector`: `ArrayView1<f64>`
///   Initial stage vector; any positive total, normalized internally.
/// - `options`: `&TransientOptions`
///
/// Returns
/// -------
/// `MPMResult<TransientExtreme>`
///   `value ≥ 1`; `time_step = 0` when the population never amplifies.
///
/// Errors
/// ------
/// - `MPMError::DimensionMismatch` / `MPMError::InvalidVectorEntry` for a
///   malformed vector; `MPMError::DegenerateVector` for a zero vector.
/// - `MPMError::NonPositiveGrowthRate` when `λ ≤ 0`.
/// - `MPMError::InvalidArgument` for a zero horizon.
pub fn max_amplification(
    matrix: &ProjectionMatrix, vector: ArrayView1<f64>, options: &TransientOptions,
) -> MPMResult<TransientExtreme> {
    let horizon = options.resolve(matrix.dim())?;
    let lambda = positive_growth_rate(matrix)?;
    let totals = standardized_totals(matrix, lambda, vector, horizon)?;
    Ok(scan_max(totals.view()))
}

/// Minimum standardized total over the horizon; `value ≤ 1`.
///
/// Errors
/// ------
/// - Same as [`max_amplification`].
pub fn max_attenuation(
    matrix: &ProjectionMatrix, vector: ArrayView1<f64>, options: &TransientOptions,
) -> MPMResult<TransientExtreme> {
    let horizon = options.resolve(matrix.dim())?;
    let lambda = positive_growth_rate(matrix)?;
    let totals = standardized_totals(matrix, lambda, vector, horizon)?;
    Ok(scan_min(totals.view()))
}

/// All transient indices of one initial vector from a single eigenanalysis
/// and a single projection.
///
/// Errors
/// ------
/// - Same as [`max_amplification`].
pub fn transient_summary(
    matrix: &ProjectionMatrix, vector: ArrayView1<f64>, options: &TransientOptions,
) -> MPMResult<TransientSummary> {
    let horizon = options.resolve(matrix.dim())?;
    let lambda = positive_growth_rate(matrix)?;
    let totals = standardized_totals(matrix, lambda, vector, horizon)?;
    let eig = analyze(matrix)?;

    let n0 = normalize_by_sum(vector, "initial vector")?;
    let summary = TransientSummary {
        first_step: totals[1],
        max_amplification: scan_max(totals.view()),
        max_attenuation: scan_min(totals.view()),
        inertia: eig.reproductive_value.dot(&n0),
        horizon,
    };
    debug!(
        dim = matrix.dim(),
        horizon,
        first_step = summary.first_step,
        inertia = summary.inertia,
        "transient summary"
    );
    Ok(summary)
}

/// Largest and smallest column sums of `A / λ`.
///
/// Errors
/// ------
/// - `MPMError::NonPositiveGrowthRate` when `λ ≤ 0`, plus eigenanalysis
///   errors.
pub fn first_step_bounds(matrix: &ProjectionMatrix) -> MPMResult<FirstStepBounds> {
    let lambda = positive_growth_rate(matrix)?;
    let scaled = scaled_operator(matrix, lambda)?;
    let col_sums = scaled.sum_axis(Axis(0));
    Ok(FirstStepBounds {
        reactivity: col_sums.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x)),
        first_step_attenuation: col_sums.fold(f64::INFINITY, |acc, &x| acc.min(x)),
    })
}

/// Extremes over every stage-biased initial vector `e_i`.
///
/// Stages within the `TRANSIENT_TOL` band of the current extreme count as
/// ties; ties keep the lowest stage index.
///
/// Errors
/// ------
/// - `MPMError::NonPositiveGrowthRate` when `λ ≤ 0`.
/// - `MPMError::InvalidArgument` for a zero horizon.
pub fn stage_biased_bounds(
    matrix: &ProjectionMatrix, options: &TransientOptions,
) -> MPMResult<StageBiasedBounds> {
    let n = matrix.dim();
    let horizon = options.resolve(n)?;
    let lambda = positive_growth_rate(matrix)?;
    let operator = scaled_operator(matrix, lambda)?;

    let identity = Array2::<f64>::eye(n);
    let per_stage = identity.axis_iter(Axis(0)).map(|unit| {
        let totals = run_projection(operator.view(), unit.to_owned(), horizon, None).totals;
        (scan_max(totals.view()), scan_min(totals.view()))
    });
    select_stage_extremes(per_stage).ok_or(MPMError::EmptyMatrix)
}

/// Fold per-stage `(amplification, attenuation)` pairs into the overall
/// extremes; a later stage must clear the tolerance band to replace one.
fn select_stage_extremes(
    per_stage: impl Iterator<Item = (TransientExtreme, TransientExtreme)>,
) -> Option<StageBiasedBounds> {
    let mut best: Option<StageBiasedBounds> = None;
    for (stage, (amp, att)) in per_stage.enumerate() {
        best = Some(match best {
            None => StageBiasedBounds {
                max_amplification: amp,
                amplifying_stage: stage,
                max_attenuation: att,
                attenuating_stage: stage,
            },
            Some(mut b) => {
                let amp_bar = b.max_amplification.value;
                let att_bar = b.max_attenuation.value;
                if amp.value > amp_bar + tolerance_band(amp_bar) {
                    b.max_amplification = amp;
                    b.amplifying_stage = stage;
                }
                if att.value < att_bar - tolerance_band(att_bar) {
                    b.max_attenuation = att;
                    b.attenuating_stage = stage;
                }
                b
            }
        });
    }
    best
}

/// Totals of the standardized projection for `t = 0..=horizon`.
fn standardized_totals(
    matrix: &ProjectionMatrix, lambda: f64, vector: ArrayView1<f64>, horizon: usize,
) -> MPMResult<Array1<f64>> {
    validate_state_vector(vector, matrix.dim())?;
    let n0 = normalize_by_sum(vector, "initial vector")?;
    let operator = scaled_operator(matrix, lambda)?;
    Ok(run_projection(operator.view(), n0, horizon, Some(lambda)).totals)
}

fn tolerance_band(reference: f64) -> f64 {
    TRANSIENT_TOL * reference.abs().max(1.0)
}

fn scan_max(totals: ArrayView1<f64>) -> TransientExtreme {
    let mut best = TransientExtreme { value: totals[0], time_step: 0 };
    for (t, &x) in totals.iter().enumerate().skip(1) {
        if x > best.value + tolerance_band(best.value) {
            best = TransientExtreme { value: x, time_step: t };
        }
    }
    best
}

fn scan_min(totals: ArrayView1<f64>) -> TransientExtreme {
    let mut best = TransientExtreme { value: totals[0], time_step: 0 };
    for (t, &x) in totals.iter().enumerate().skip(1) {
        if x < best.value - tolerance_band(best.value) {
            best = TransientExtreme { value: x, time_step: t };
        }
    }
    best
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
    // - Equilibrium input reporting the neutral value at t = 0.
    // - Closed-form extremes for a Leslie matrix with λ = 2.
    // - Inertia, first-step bounds, and stage-biased bounds.
    // - Horizon validation and the tolerance band of the scans.
    // - Stage ties within the tolerance band.
    // - Rejection of a matrix with λ = 0 before any eigenvector is needed.
    // -------------------------------------------------------------------------

    fn leslie() -> ProjectionMatrix {
        ProjectionMatrix::new(array![[0.0, 4.0, 16.0], [0.5, 0.0, 0.0], [0.0, 0.5, 0.0]])
            .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A vector at the stable structure has no transient dynamics.
    //
    // Given
    // -----
    // - The Leslie matrix and its own stable stage distribution.
    //
    // Expect
    // ------
    // - Both extremes equal 1 at t = 0; inertia equals 1.
    fn stable_distribution_has_neutral_transients() {
        // Arrange
        let m = leslie();
        let w = analyze(&m).unwrap().stable_stage_distribution;

        // Act
        let summary = transient_summary(&m, w.view(), &TransientOptions::default()).unwrap();

        // Assert
        assert_eq!(summary.max_amplification.time_step, 0);
        assert_eq!(summary.max_attenuation.time_step, 0);
        assert_relative_eq!(summary.max_amplification.value, 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.max_attenuation.value, 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.inertia, 1.0, epsilon = 1e-9);
        assert_eq!(summary.horizon, 30);
    }

    #[test]
    // Purpose
    // -------
    // Check extremes against hand-projected standardized totals.
    //
    // Given
    // -----
    // - Leslie matrix with λ = 2.
    // - e₁: totals 1, 0.25, 0.5625, 0.625, ...
    // - e₃: totals 1, 8, 2, 4.5, ...
    //
    // Expect
    // ------
    // - Attenuation 0.25 at t = 1 from e₁; amplification 8 at t = 1 from e₃.
    // - Inertia of e₃ is v₃ = 4.2 with v ∝ (1, 4, 8) and v · w = 1.
    fn leslie_extremes_match_hand_projection() {
        // Arrange
        let m = leslie();
        let opts = TransientOptions::default();

        // Act
        let att = max_attenuation(&m, array![1.0, 0.0, 0.0].view(), &opts).unwrap();
        let amp = max_amplification(&m, array![0.0, 0.0, 3.0].view(), &opts).unwrap();
        let summary = transient_summary(&m, array![0.0, 0.0, 1.0].view(), &opts).unwrap();

        // Assert
        assert_eq!(att.time_step, 1);
        assert_relative_eq!(att.value, 0.25, epsilon = 1e-9);
        assert_eq!(amp.time_step, 1);
        assert_relative_eq!(amp.value, 8.0, epsilon = 1e-9);
        assert!(summary.is_reactive());
        assert_relative_eq!(summary.first_step, 8.0, epsilon = 1e-9);
        assert_relative_eq!(summary.inertia, 4.2, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Amplification never falls below 1 and attenuation never exceeds 1.
    //
    // Given
    // -----
    // - The giraffe matrix and several initial vectors.
    //
    // Expect
    // ------
    // - `max_amplification ≥ 1 ≥ max_attenuation` for each vector.
    fn extremes_bracket_one() {
        let m = ProjectionMatrix::new(array![
            [0.0, 0.0, 0.24],
            [0.57, 0.0, 0.0],
            [0.0, 0.79, 0.84]
        ])
        .unwrap();
        let opts = TransientOptions::with_horizon(50);
        for v in [array![1.0, 0.0, 0.0], array![0.0, 1.0, 0.0], array![2.0, 5.0, 1.0]] {
            let amp = max_amplification(&m, v.view(), &opts).unwrap();
            let att = max_attenuation(&m, v.view(), &opts).unwrap();
            assert!(amp.value >= 1.0);
            assert!(att.value <= 1.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Column-sum bounds and stage-biased extremes agree with the Leslie
    // trajectories.
    //
    // Given
    // -----
    // - Column sums of A / 2: (0.25, 2.25, 8).
    //
    // Expect
    // ------
    // - Reactivity bound 8, attenuation bound 0.25.
    // - Stage-biased amplification 8 from stage 2, attenuation 0.25 from
    //   stage 0.
    fn first_step_and_stage_biased_bounds() {
        // Arrange
        let m = leslie();

        // Act
        let first = first_step_bounds(&m).unwrap();
        let biased = stage_biased_bounds(&m, &TransientOptions::default()).unwrap();

        // Assert
        assert_relative_eq!(first.reactivity, 8.0, epsilon = 1e-9);
        assert_relative_eq!(first.first_step_attenuation, 0.25, epsilon = 1e-9);
        assert_eq!(biased.amplifying_stage, 2);
        assert_relative_eq!(biased.max_amplification.value, 8.0, epsilon = 1e-9);
        assert_eq!(biased.attenuating_stage, 0);
        assert_relative_eq!(biased.max_attenuation.value, 0.25, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Reject a zero horizon and a zero vector.
    //
    // Given
    // -----
    // - `horizon = Some(0)`; an all-zero initial vector.
    //
    // Expect
    // ------
    // - `InvalidArgument` and `DegenerateVector` respectively.
    fn transient_rejects_invalid_input() {
        let m = leslie();
        let v = array![1.0, 1.0, 1.0];
        assert!(matches!(
            max_amplification(&m, v.view(), &TransientOptions::with_horizon(0)),
            Err(MPMError::InvalidArgument { .. })
        ));
        assert!(matches!(
            max_attenuation(&m, array![0.0, 0.0, 0.0].view(), &TransientOptions::default()),
            Err(MPMError::DegenerateVector { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Values inside the tolerance band do not displace the t = 0 extreme.
    //
    // Given
    // -----
    // - Totals 1, 1 + 1e-12, 1 − 1e-12, 1.5.
    //
    // Expect
    // ------
    // - Max at t = 3; min stays at t = 0.
    fn scans_ignore_rounding_drift() {
        let totals = array![1.0, 1.0 + 1e-12, 1.0 - 1e-12, 1.5];
        assert_eq!(scan_max(totals.view()), TransientExtreme { value: 1.5, time_step: 3 });
        assert_eq!(scan_min(totals.view()), TransientExtreme { value: 1.0, time_step: 0 });
    }

    #[test]
    // Purpose
    // -------
    // Stages whose extremes differ only by rounding keep the lower index.
    //
    // Given
    // -----
    // - Stage 0: amplification 2, attenuation 0.5.
    // - Stage 1: amplification 2 + 1e-13, attenuation 0.5 − 1e-13.
    // - Stage 2: amplification 2.5, attenuation 0.5.
    //
    // Expect
    // ------
    // - Amplification from stage 2; attenuation stays with stage 0.
    fn stage_extremes_ignore_rounding_ties() {
        // Arrange
        let pairs = vec![
            (
                TransientExtreme { value: 2.0, time_step: 1 },
                TransientExtreme { value: 0.5, time_step: 2 },
            ),
            (
                TransientExtreme { value: 2.0 + 1e-13, time_step: 1 },
                TransientExtreme { value: 0.5 - 1e-13, time_step: 2 },
            ),
            (
                TransientExtreme { value: 2.5, time_step: 3 },
                TransientExtreme { value: 0.5, time_step: 1 },
            ),
        ];

        // Act
        let bounds = select_stage_extremes(pairs.into_iter()).unwrap();

        // Assert
        assert_eq!(bounds.amplifying_stage, 2);
        assert_eq!(bounds.max_amplification, TransientExtreme { value: 2.5, time_step: 3 });
        assert_eq!(bounds.attenuating_stage, 0);
        assert_eq!(bounds.max_attenuation, TransientExtreme { value: 0.5, time_step: 2 });
        let none: Vec<(TransientExtreme, TransientExtreme)> = Vec::new();
        assert!(select_stage_extremes(none.into_iter()).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Transient indices report a zero growth rate as such.
    //
    // Given
    // -----
    // - Nilpotent matrix [[0, 1], [0, 0]] and initial vector (1, 1).
    //
    // Expect
    // ------
    // - `NonPositiveGrowthRate` from every transient entry point.
    fn transients_reject_zero_growth_rate() {
        // Arrange
        let m = ProjectionMatrix::new(array![[0.0, 1.0], [0.0, 0.0]]).unwrap();
        let v = array![1.0, 1.0];
        let opts = TransientOptions::default();
        let is_rejected = |r: &MPMError| matches!(r, MPMError::NonPositiveGrowthRate { .. });

        // Act & Assert
        assert!(max_amplification(&m, v.view(), &opts).is_err_and(|e| is_rejected(&e)));
        assert!(max_attenuation(&m, v.view(), &opts).is_err_and(|e| is_rejected(&e)));
        assert!(transient_summary(&m, v.view(), &opts).is_err_and(|e| is_rejected(&e)));
        assert!(first_step_bounds(&m).is_err_and(|e| is_rejected(&e)));
        assert!(stage_biased_bounds(&m, &opts).is_err_and(|e| is_rejected(&e)));
    }
}
