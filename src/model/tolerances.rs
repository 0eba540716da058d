//! Numerical tolerances shared by the analysis modules.
//!
//! Matrices arising in population biology are small (typically n ≤ 30) and
//! well scaled, so absolute tolerances close to machine precision are
//! adequate. Keeping them in one place lets every module agree on what
//! "zero", "equal", and "real" mean.

/// Maximum elementwise discrepancy accepted between `U + F` and `A`, and the
/// slack allowed on survival column sums (`Σ_i U[i, j] ≤ 1 + ε`).
pub const DECOMPOSITION_TOL: f64 = 1e-8;

/// A vector whose entries sum to at most this (in magnitude) cannot be
/// normalized.
pub const DEGENERATE_SUM_EPS: f64 = 1e-12;

/// Imaginary parts at or below this magnitude (relative to `max(1, |λ|)`)
/// are treated as zero when classifying the dominant eigenvalue.
pub const IMAG_TOL: f64 = 1e-10;

/// Relative tolerance for deciding that two eigenvalue moduli are tied.
pub const EIGEN_TIE_TOL: f64 = 1e-10;

/// Convergence threshold passed to the Schur and SVD iterations.
pub const ITERATION_EPS: f64 = f64::EPSILON;

/// Iteration cap for the Schur and SVD iterations.
pub const MAX_ITERATIONS: usize = 10_000;

/// Singular values at or below this threshold are dropped by the
/// Moore–Penrose pseudo-inverse.
pub const PINV_EPS: f64 = 1e-12;

/// Relative slack used when scanning a projection for its extremes.
///
/// Values within this band of the current extreme do not displace it, so
/// floating-point drift along an equilibrium trajectory cannot move the
/// reported time step away from `t = 0`.
pub const TRANSIENT_TOL: f64 = 1e-9;

/// `|λ − 1|` at or below this value makes `ln λ` unusable as a divisor.
pub const UNIT_GROWTH_TOL: f64 = 1e-12;

/// A transient sub-chain whose spectral radius is within this distance of 1
/// is treated as containing a closed class (stages that are never left), so
/// `I − U` is singular by structure rather than by rounding.
pub const UNIT_RADIUS_TOL: f64 = 1e-10;
