//! linalg — the small set of dense decompositions the analyses rely on.
//!
//! Purpose
//! -------
//! Bridge the `ndarray`-based public surface to `nalgebra` decompositions
//! (real Schur, SVD, LU) and wrap them with bounded iteration counts and
//! crate errors. This is not a general linear-algebra layer: it exposes only
//! what eigenanalysis and absorbing-chain calculations need.
//!
//! Key behaviors
//! -------------
//! - [`conversions`]: copy matrices and vectors between the two libraries.
//! - [`spectrum`]: dominant-first eigenvalue spectra, null vectors, spectral
//!   radius.
//! - [`inverse`]: fundamental matrices `(I − Q)⁻¹` with a recorded
//!   [`SolvePath`] and Moore–Penrose fallback.
//!
//! Conventions
//! -----------
//! - All routines are pure; failures are reported as `MPMError` values.

pub mod conversions;
pub mod inverse;
pub mod spectrum;

pub use self::inverse::{SingularityCause, SolvePath, solve_fundamental, pseudo_inverse};
pub use self::spectrum::{eigenvalues, null_vector, spectral_radius};
