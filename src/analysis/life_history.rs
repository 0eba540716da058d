//! analysis::life_history — life-history traits from absorbing Markov chains.
//!
//! Purpose
//! -------
//! Derive life-history traits from the survival (`U`) and fecundity (`F`)
//! components of a projection matrix by treating `U` as the transient part
//! of an absorbing Markov chain (death absorbs) and, for maturation traits,
//! by adding a second absorbing state entered on first reproduction.
//!
//! Key behaviors
//! -------------
//! - [`life_history_metrics`]: probability of surviving to reproduce, mean
//!   age at first reproduction, life expectancy from the start stage and
//!   from the first reproductive stage, and remaining mature life
//!   expectancy.
//! - [`generation_time`]: `ln R0 / ln λ` with `R = F N`.
//! - [`fundamental_matrix`], [`life_expectancy`], [`net_reproductive_matrix`]
//!   and [`net_reproductive_rate`] expose the intermediate quantities.
//!
//! Invariants & assumptions
//! ------------------------
//! - Reproductive stages are the columns of `F` with positive sum.
//! - The maturation chain `U'` is `U` with reproductive columns zeroed, so
//!   entering a reproductive stage ends the transient phase.
//! - Every inverse goes through `linalg::inverse::solve_fundamental`; singular
//!   systems fall back to the pseudo-inverse and the path is recorded in
//!   [`LifeHistorySolvePaths`].
//!
//! Conventions
//! -----------
//! - Ages count the time step spent in the reproductive stage itself, so an
//!   individual starting in a reproductive stage has age at first
//!   reproduction `1`.
//! - When the start stage can never reach reproduction the age and the
//!   remaining mature life expectancy are `None`.
//! - When `U` has a closed class (a set of stages never left) expected
//!   lifetimes are unbounded; every life-expectancy value is then `None`
//!   instead of the pseudo-inverse column sum.
//!
//! Testing notes
//! -------------
//! - Unit tests use a two-stage hand-solved model and cover the error paths
//!   (zero fecundity, bad start stage, missing components, `λ = 1`).

use crate::{
    analysis::eigen::dominant_eigenvalue,
    linalg::{
        conversions::{to_array2, to_dmatrix},
        inverse::{solve_fundamental, SolvePath},
    },
    model::{
        errors::{MPMError, MPMResult},
        matrix::ProjectionMatrix,
        tolerances::{PINV_EPS, UNIT_GROWTH_TOL},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

/// How each fundamental matrix behind [`LifeHistoryMetrics`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifeHistorySolvePaths {
    /// `(I − U')⁻¹` for the maturation chain.
    pub maturation: SolvePath,
    /// `(I − U_c)⁻¹` for the chain conditioned on reproducing; `None` when
    /// reproduction is unreachable from the start stage.
    pub conditioned: Option<SolvePath>,
    /// `(I − U)⁻¹` for survival.
    pub survival: SolvePath,
}

/// LifeHistoryMetrics — outcome of [`life_history_metrics`].
///
/// Fields
/// ------
/// - `start_stage`: `usize`
/// - `reproductive_stages`: `Vec<usize>`
///   Stages whose fecundity column has a positive sum, ascending.
/// - `probability_of_reproduction`: `f64`
///   Probability of reaching a reproductive stage before death.
/// - `age_at_first_reproduction`: `Option<f64>`
///   Mean number of steps until first reproduction, conditional on
///   reproducing.
/// - `mean_life_expectancy`: `Option<f64>`
///   Expected steps alive from `start_stage`; `None` when the survival
///   chain has a closed class.
/// - `life_expectancy_at_maturity`: `Option<f64>`
///   Expected steps alive from the first reproductive stage; `None` under
///   the same condition.
/// - `remaining_mature_life_expectancy`: `Option<f64>`
///   `mean_life_expectancy − age_at_first_reproduction` when both exist.
/// - `solve_paths`: [`LifeHistorySolvePaths`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifeHistoryMetrics {
    pub start_stage: usize,
    pub reproductive_stages: Vec<usize>,
    pub probability_of_reproduction: f64,
    pub age_at_first_reproduction: Option<f64>,
    pub mean_life_expectancy: Option<f64>,
    pub life_expectancy_at_maturity: Option<f64>,
    pub remaining_mature_life_expectancy: Option<f64>,
    pub solve_paths: LifeHistorySolvePaths,
}

impl LifeHistoryMetrics {
    pub fn used_pseudo_inverse(&self) -> bool {
        let p = &self.solve_paths;
        p.maturation.used_pseudo_inverse()
            || p.survival.used_pseudo_inverse()
            || p.conditioned.is_some_and(|c| c.used_pseudo_inverse())
    }
}

/// Life-history traits of an individual starting in `start_stage`.
///
/// Parameters
/// ----------
/// - `matrix`: `&ProjectionMatrix`
///   Must carry survival and fecundity components.
/// - `start_stage`: `usize`
///   Stage index in `0..n` (typically the newborn stage).
///
/// Returns
/// -------
/// `MPMResult<LifeHistoryMetrics>`
///
/// Errors
/// ------
/// - `MPMError::InvalidArgument` when the components are missing, `F` is
///   entirely zero, or `start_stage >= n`.
/// - `MPMError::SingularMatrix` if a pseudo-inverse fallback fails.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_demography::model::matrix::ProjectionMatrix;
/// # use rust_demography::analysis::life_history::life_history_metrics;
/// let m = ProjectionMatrix::from_components(
///     array![[0.5, 0.0], [0.3, 0.8]],
///     array![[0.0, 1.0], [0.0, 0.0]],
/// )
/// .unwrap();
/// let lh = life_history_metrics(&m, 0).unwrap();
/// assert!((lh.probability_of_reproduction - 0.6).abs() < 1e-12);
/// ```
pub fn life_history_metrics(
    matrix: &ProjectionMatrix, start_stage: usize,
) -> MPMResult<LifeHistoryMetrics> {
    let (u, f) = components(matrix)?;
    let n = matrix.dim();
    if start_stage >= n {
        return Err(MPMError::invalid_argument(format!(
            "start stage {start_stage} is out of range for {n} stages"
        )));
    }
    let reproductive_stages = reproductive_stages(f)?;

    // Maturation chain: reproductive stages absorb.
    let mut u_prime = u.to_owned();
    for &r in &reproductive_stages {
        u_prime.column_mut(r).fill(0.0);
    }
    let (n_prime, maturation) = solve_fundamental(&to_dmatrix(u_prime.view()), "maturation chain")?;
    let reach: Vec<f64> = (0..n)
        .map(|j| reproductive_stages.iter().map(|&r| n_prime[(r, j)]).sum())
        .collect();
    let probability_of_reproduction = reach[start_stage];

    let (age_at_first_reproduction, conditioned) = if probability_of_reproduction > PINV_EPS {
        let (age, path) = conditioned_age(&u_prime, &reach, start_stage)?;
        (Some(age), Some(path))
    } else {
        debug!(start_stage, "reproduction unreachable from start stage");
        (None, None)
    };

    let (n_survival, survival) = solve_fundamental(&to_dmatrix(u), "survival chain")?;
    let expectancy = n_survival.row_sum();
    let bounded = !survival.hit_closed_class();
    if !bounded {
        debug!(start_stage, "survival chain has a closed class; life expectancy unbounded");
    }
    let mean_life_expectancy = bounded.then(|| expectancy[start_stage]);
    let life_expectancy_at_maturity = bounded.then(|| expectancy[reproductive_stages[0]]);

    Ok(LifeHistoryMetrics {
        start_stage,
        probability_of_reproduction,
        remaining_mature_life_expectancy: mean_life_expectancy
            .zip(age_at_first_reproduction)
            .map(|(life, age)| life - age),
        age_at_first_reproduction,
        mean_life_expectancy,
        life_expectancy_at_maturity,
        reproductive_stages,
        solve_paths: LifeHistorySolvePaths { maturation, conditioned, survival },
    })
}

/// Generation time `T = ln R0 / ln λ`.
///
/// Errors
/// ------
/// - `MPMError::InvalidArgument` when the components are missing.
/// - `MPMError::UndefinedGenerationTime` when `λ ≤ 0`, `|λ − 1| ≤
///   UNIT_GROWTH_TOL`, or `R0 ≤ 0`.
pub fn generation_time(matrix: &ProjectionMatrix) -> MPMResult<f64> {
    let r0 = net_reproductive_rate(matrix)?;
    let lambda = dominant_eigenvalue(matrix.entries())?;
    let undefined = |reason| MPMError::UndefinedGenerationTime { lambda, r0, reason };
    if !(lambda > 0.0) {
        return Err(undefined("growth rate is not positive"));
    }
    if (lambda - 1.0).abs() <= UNIT_GROWTH_TOL {
        return Err(undefined("growth rate equals one"));
    }
    if !(r0 > 0.0) {
        return Err(undefined("net reproductive rate is not positive"));
    }
    Ok(r0.ln() / lambda.ln())
}

/// Fundamental matrix `N = (I − U)⁻¹`: `N[i, j]` is the expected number of
/// steps spent in stage `i` by an individual starting in stage `j`.
///
/// A singular `I − U` returns the pseudo-inverse; with a closed class its
/// entries are not expected visit counts.
///
/// Errors
/// ------
/// - `MPMError::InvalidArgument` when the components are missing.
/// - `MPMError::SingularMatrix` if a pseudo-inverse fallback fails.
pub fn fundamental_matrix(matrix: &ProjectionMatrix) -> MPMResult<Array2<f64>> {
    let (u, _) = components(matrix)?;
    let (n, _) = solve_fundamental(&to_dmatrix(u), "survival chain")?;
    Ok(to_array2(&n))
}

/// Mean life expectancy from `start_stage`: column sum of `N`, or `None`
/// when `U` has a closed class and lifetimes are unbounded.
///
/// Errors
/// ------
/// - Every error of [`fundamental_matrix`].
/// - `MPMError::InvalidArgument` for `start_stage >= n`.
pub fn life_expectancy(
    matrix: &ProjectionMatrix, start_stage: usize,
) -> MPMResult<Option<f64>> {
    let (u, _) = components(matrix)?;
    if start_stage >= matrix.dim() {
        return Err(MPMError::invalid_argument(format!(
            "start stage {start_stage} is out of range for {} stages",
            matrix.dim()
        )));
    }
    let (n, path) = solve_fundamental(&to_dmatrix(u), "survival chain")?;
    Ok((!path.hit_closed_class()).then(|| n.column(start_stage).sum()))
}

/// Net reproductive matrix `R = F N`.
///
/// Errors
/// ------
/// - Every error of [`fundamental_matrix`].
pub fn net_reproductive_matrix(matrix: &ProjectionMatrix) -> MPMResult<Array2<f64>> {
    let (_, f) = components(matrix)?;
    let n = fundamental_matrix(matrix)?;
    Ok(f.dot(&n))
}

/// Net reproductive rate `R0`: dominant eigenvalue of `R = F N`.
///
/// Errors
/// ------
/// - Every error of [`net_reproductive_matrix`].
pub fn net_reproductive_rate(matrix: &ProjectionMatrix) -> MPMResult<f64> {
    let r = net_reproductive_matrix(matrix)?;
    dominant_eigenvalue(r.view())
}

fn components(matrix: &ProjectionMatrix) -> MPMResult<(ArrayView2<'_, f64>, ArrayView2<'_, f64>)> {
    match (matrix.survival(), matrix.fecundity()) {
        (Some(u), Some(f)) => Ok((u, f)),
        _ => Err(MPMError::invalid_argument(
            "life-history analysis requires survival and fecundity components",
        )),
    }
}

fn reproductive_stages(f: ArrayView2<f64>) -> MPMResult<Vec<usize>> {
    let stages: Vec<usize> = f
        .sum_axis(Axis(0))
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > 0.0)
        .map(|(j, _)| j)
        .collect();
    if stages.is_empty() {
        return Err(MPMError::invalid_argument("fecundity matrix is entirely zero"));
    }
    Ok(stages)
}

/// Mean steps to first reproduction from `start`, conditional on reproducing.
///
/// Uses `U_c = D U' D⁺` with `D = diag(reach)`; `D⁺` inverts the non-zero
/// diagonal entries only.
fn conditioned_age(
    u_prime: &Array2<f64>, reach: &[f64], start: usize,
) -> MPMResult<(f64, SolvePath)> {
    let n = reach.len();
    let u_c = DMatrix::from_fn(n, n, |i, j| {
        if reach[j] > PINV_EPS {
            reach[i] * u_prime[[i, j]] / reach[j]
        } else {
            0.0
        }
    });
    let (n_c, path) = solve_fundamental(&u_c, "conditioned maturation chain")?;
    Ok((n_c.column(start).sum(), path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::inverse::SingularityCause;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Every metric on a two-stage model solved by hand.
    // - Unreachable reproduction yielding `None` ages.
    // - Generation time and its undefined cases.
    // - Error paths and the pseudo-inverse fallback record.
    // - Closed classes suppressing life expectancy.
    // -------------------------------------------------------------------------

    // U = [[0.5, 0], [0.3, 0.8]], F = [[0, 1], [0, 0]].
    // U' = [[0.5, 0], [0.3, 0]], (I − U')⁻¹ = [[2, 0], [0.6, 1]]: reach = (0.6, 1).
    // U_c = [[0.5, 0], [0.5, 0]], (I − U_c)⁻¹ = [[2, 0], [1, 1]]: age = 3.
    // N = [[2, 0], [3, 5]]: life expectancy (5, 5).
    fn two_stage() -> ProjectionMatrix {
        ProjectionMatrix::from_components(
            array![[0.5, 0.0], [0.3, 0.8]],
            array![[0.0, 1.0], [0.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify every metric against the hand solution.
    //
    // Given
    // -----
    // - The two-stage model, start stage 0.
    //
    // Expect
    // ------
    // - prob = 0.6, age = 3, life expectancy 5 from both stages,
    //   remaining mature life expectancy 2, all solves direct.
    fn life_history_metrics_match_hand_solution() {
        // Arrange
        let m = two_stage();

        // Act
        let lh = life_history_metrics(&m, 0).unwrap();

        // Assert
        assert_eq!(lh.reproductive_stages, vec![1]);
        assert_relative_eq!(lh.probability_of_reproduction, 0.6, epsilon = 1e-12);
        assert_relative_eq!(lh.age_at_first_reproduction.unwrap(), 3.0, epsilon = 1e-10);
        assert_relative_eq!(lh.mean_life_expectancy.unwrap(), 5.0, epsilon = 1e-10);
        assert_relative_eq!(lh.life_expectancy_at_maturity.unwrap(), 5.0, epsilon = 1e-10);
        assert_relative_eq!(lh.remaining_mature_life_expectancy.unwrap(), 2.0, epsilon = 1e-10);
        assert!(!lh.used_pseudo_inverse());
    }

    #[test]
    // Purpose
    // -------
    // Starting in a reproductive stage reproduces with certainty.
    //
    // Given
    // -----
    // - The two-stage model, start stage 1.
    //
    // Expect
    // ------
    // - prob = 1 and age = 1.
    fn starting_in_reproductive_stage_counts_one_step() {
        let lh = life_history_metrics(&two_stage(), 1).unwrap();
        assert_relative_eq!(lh.probability_of_reproduction, 1.0, epsilon = 1e-12);
        assert_relative_eq!(lh.age_at_first_reproduction.unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Unreachable reproduction is reported, not an error.
    //
    // Given
    // -----
    // - U = diag(0.5, 0.5): stage 0 never moves to reproductive stage 1.
    //
    // Expect
    // ------
    // - prob = 0; age and remaining mature life expectancy are `None`.
    fn unreachable_reproduction_yields_none() {
        let m = ProjectionMatrix::from_components(
            array![[0.5, 0.0], [0.0, 0.5]],
            array![[0.0, 1.0], [0.0, 0.0]],
        )
        .unwrap();

        let lh = life_history_metrics(&m, 0).unwrap();

        assert_relative_eq!(lh.probability_of_reproduction, 0.0, epsilon = 1e-12);
        assert_eq!(lh.age_at_first_reproduction, None);
        assert_eq!(lh.remaining_mature_life_expectancy, None);
        assert_eq!(lh.solve_paths.conditioned, None);
    }

    #[test]
    // Purpose
    // -------
    // Reject inputs for which the metrics are undefined.
    //
    // Given
    // -----
    // - An all-zero F, an out-of-range start stage, and a matrix without
    //   components.
    //
    // Expect
    // ------
    // - `InvalidArgument` in every case.
    fn life_history_rejects_invalid_arguments() {
        let zero_f = ProjectionMatrix::from_components(
            array![[0.5, 0.0], [0.3, 0.8]],
            Array2::<f64>::zeros((2, 2)),
        )
        .unwrap();
        let bare = ProjectionMatrix::new(array![[0.5, 1.0], [0.3, 0.8]]).unwrap();

        for result in [
            life_history_metrics(&zero_f, 0),
            life_history_metrics(&two_stage(), 2),
            life_history_metrics(&bare, 0),
        ] {
            assert!(matches!(result, Err(MPMError::InvalidArgument { .. })));
        }
        assert!(matches!(generation_time(&bare), Err(MPMError::InvalidArgument { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check R, R0, and T on the hand model.
    //
    // Given
    // -----
    // - R = F N = [[3, 5], [0, 0]] so R0 = 3.
    // - λ of A = [[0.5, 1], [0.3, 0.8]] is (1.3 + √1.29) / 2.
    //
    // Expect
    // ------
    // - T = ln 3 / ln λ.
    fn generation_time_matches_closed_form() {
        // Arrange
        let m = two_stage();
        let lambda = (1.3 + 1.29_f64.sqrt()) / 2.0;

        // Act
        let r = net_reproductive_matrix(&m).unwrap();
        let r0 = net_reproductive_rate(&m).unwrap();
        let t = generation_time(&m).unwrap();

        // Assert
        assert_relative_eq!(r[[0, 0]], 3.0, epsilon = 1e-10);
        assert_relative_eq!(r[[0, 1]], 5.0, epsilon = 1e-10);
        assert_relative_eq!(r0, 3.0, epsilon = 1e-10);
        assert_relative_eq!(t, 3.0_f64.ln() / lambda.ln(), epsilon = 1e-9);
        assert_relative_eq!(life_expectancy(&m, 1).unwrap().unwrap(), 5.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Generation time is undefined at λ = 1.
    //
    // Given
    // -----
    // - U = [[0]], F = [[1]]: A = [[1]].
    //
    // Expect
    // ------
    // - `UndefinedGenerationTime`.
    fn generation_time_undefined_at_unit_growth() {
        let m = ProjectionMatrix::from_components(array![[0.0]], array![[1.0]]).unwrap();
        assert!(matches!(
            generation_time(&m),
            Err(MPMError::UndefinedGenerationTime { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A stage that is never left forces the pseudo-inverse for N.
    //
    // Given
    // -----
    // - U = [[0.5, 0], [0.3, 1.0]]: reproductive stage 1 survives forever.
    //
    // Expect
    // ------
    // - Maturation solve is direct; survival solve records a closed class.
    // - Every life expectancy is `None`; age at first reproduction survives.
    fn immortal_stage_records_pseudo_inverse() {
        let m = ProjectionMatrix::from_components(
            array![[0.5, 0.0], [0.3, 1.0]],
            array![[0.0, 1.0], [0.0, 0.0]],
        )
        .unwrap();

        let lh = life_history_metrics(&m, 0).unwrap();

        assert_eq!(lh.solve_paths.maturation, SolvePath::Direct);
        assert!(matches!(
            lh.solve_paths.survival,
            SolvePath::PseudoInverse { cause: SingularityCause::ClosedClass { .. } }
        ));
        assert!(lh.used_pseudo_inverse());
        assert_relative_eq!(lh.probability_of_reproduction, 0.6, epsilon = 1e-12);
        assert!(lh.age_at_first_reproduction.is_some());
        assert_eq!(lh.mean_life_expectancy, None);
        assert_eq!(lh.life_expectancy_at_maturity, None);
        assert_eq!(lh.remaining_mature_life_expectancy, None);
        assert_eq!(life_expectancy(&m, 0).unwrap(), None);
    }

    #[test]
    // Purpose
    // -------
    // A closed class that the start stage can enter never yields a finite
    // or negative lifetime.
    //
    // Given
    // -----
    // - U = [[0.5, 0, 0], [0.3, 1, 0], [0.2, 0, 0]]: stage 1 is never left.
    // - Stage 2 reproduces.
    //
    // Expect
    // ------
    // - Both the maturation and survival solves record the closed class.
    // - Mean, mature, and remaining life expectancy all `None`.
    fn closed_class_suppresses_life_expectancy() {
        // Arrange
        let m = ProjectionMatrix::from_components(
            array![[0.5, 0.0, 0.0], [0.3, 1.0, 0.0], [0.2, 0.0, 0.0]],
            array![[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
        )
        .unwrap();

        // Act
        let lh = life_history_metrics(&m, 0).unwrap();

        // Assert
        assert!(lh.solve_paths.maturation.hit_closed_class());
        assert!(lh.solve_paths.survival.hit_closed_class());
        assert_eq!(lh.mean_life_expectancy, None);
        assert_eq!(lh.life_expectancy_at_maturity, None);
        assert_eq!(lh.remaining_mature_life_expectancy, None);
    }
}
