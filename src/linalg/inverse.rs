//! linalg::inverse — fundamental matrices with an explicit singularity policy.
//!
//! Purpose
//! -------
//! Compute `(I − Q)⁻¹` for a transient (sub-stochastic) transition matrix `Q`
//! and record *how* it was obtained. Absorbing-chain analyses routinely hit
//! an exactly singular `I − Q` (a set of stages that is never left, i.e.
//! individuals that neither die nor progress), and this module separates
//! that structural case from a merely ill-conditioned one.
//!
//! Key behaviors
//! -------------
//! - [`solve_fundamental`] inverts `I − Q` by LU decomposition when the
//!   spectral radius of `Q` is safely below one, otherwise falls back to the
//!   Moore–Penrose pseudo-inverse and reports a [`SolvePath::PseudoInverse`]
//!   with its [`SingularityCause`].
//! - [`pseudo_inverse`] wraps the SVD-based pseudo-inverse with bounded
//!   iterations.
//!
//! Invariants & assumptions
//! ------------------------
//! - `Q` is square with non-negative entries. Column sums above one are
//!   rejected upstream by `model::validation`, so the spectral radius of `Q`
//!   never exceeds one for well-formed survival matrices.
//!
//! Conventions
//! -----------
//! - Every fallback is logged at `debug` level through `tracing`; the library
//!   never installs a subscriber.
//! - Only a failing pseudo-inverse is fatal (`MPMError::SingularMatrix`).

use crate::{
    linalg::spectrum::spectral_radius,
    model::{
        errors::{MPMError, MPMResult},
        tolerances::{ITERATION_EPS, MAX_ITERATIONS, PINV_EPS, UNIT_RADIUS_TOL},
    },
};
use nalgebra::DMatrix;
use tracing::debug;

/// Why `I − Q` could not be inverted directly.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SingularityCause {
    /// `ρ(Q) ≈ 1`: some stages form a closed class that individuals never
    /// leave. Expected for absorbing-state overlays; not an input error.
    ClosedClass { spectral_radius: f64 },
    /// `ρ(Q) < 1` but LU factorization failed; indicates badly scaled or
    /// malformed input.
    RankDeficient,
}

/// How a fundamental matrix was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolvePath {
    Direct,
    PseudoInverse { cause: SingularityCause },
}

impl SolvePath {
    pub fn used_pseudo_inverse(&self) -> bool {
        matches!(self, SolvePath::PseudoInverse { .. })
    }

    /// True when the system was singular because some stages are never left.
    /// The pseudo-inverse result then does not count expected visits.
    pub fn hit_closed_class(&self) -> bool {
        matches!(self, SolvePath::PseudoInverse { cause: SingularityCause::ClosedClass { .. } })
    }
}

/// Moore–Penrose pseudo-inverse of `m`.
///
/// Errors
/// ------
/// - `MPMError::SingularMatrix` when the SVD does not converge or the
///   pseudo-inverse cannot be formed.
pub fn pseudo_inverse(m: DMatrix<f64>, context: &'static str) -> MPMResult<DMatrix<f64>> {
    let svd = m
        .try_svd(true, true, ITERATION_EPS, MAX_ITERATIONS)
        .ok_or(MPMError::SingularMatrix { context })?;
    let pinv = svd.pseudo_inverse(PINV_EPS).map_err(|_| MPMError::SingularMatrix { context })?;
    if pinv.iter().any(|x| !x.is_finite()) {
        return Err(MPMError::SingularMatrix { context });
    }
    Ok(pinv)
}

/// Fundamental matrix `(I − Q)⁻¹` and the path used to compute it.
///
/// Parameters
/// ----------
/// - `q`: `&DMatrix<f64>`
///   Square transient transition matrix.
/// - `context`: `&'static str`
///   Label used in logs and in `MPMError::SingularMatrix`.
///
/// Returns
/// -------
/// `MPMResult<(DMatrix<f64>, SolvePath)>`
///   The (pseudo-)inverse and how it was obtained.
///
/// Errors
/// ------
/// - `MPMError::EigenDecompositionFailed` if the spectral radius of `q`
///   cannot be computed.
/// - `MPMError::SingularMatrix` if the pseudo-inverse fallback fails.
pub fn solve_fundamental(
    q: &DMatrix<f64>, context: &'static str,
) -> MPMResult<(DMatrix<f64>, SolvePath)> {
    let n = q.nrows();
    let i_minus_q = DMatrix::<f64>::identity(n, n) - q;

    let rho = spectral_radius(q)?;
    if rho >= 1.0 - UNIT_RADIUS_TOL {
        debug!(
            context,
            spectral_radius = rho,
            "closed class in transient chain; using pseudo-inverse"
        );
        let cause = SingularityCause::ClosedClass { spectral_radius: rho };
        return Ok((pseudo_inverse(i_minus_q, context)?, SolvePath::PseudoInverse { cause }));
    }

    match i_minus_q.clone().try_inverse() {
        Some(inv) if inv.iter().all(|x| x.is_finite()) => Ok((inv, SolvePath::Direct)),
        _ => {
            debug!(context, spectral_radius = rho, "LU inverse failed; using pseudo-inverse");
            let cause = SingularityCause::RankDeficient;
            Ok((pseudo_inverse(i_minus_q, context)?, SolvePath::PseudoInverse { cause }))
        }
    }
}
