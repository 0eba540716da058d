//! model — validated matrix population models.
//!
//! Purpose
//! -------
//! Own everything about *what* a matrix population model is before any
//! analysis runs: the validated [`ProjectionMatrix`] (with optional survival
//! and fecundity components), the crate error type, input guards, and the
//! shared numerical tolerances.
//!
//! Key behaviors
//! -------------
//! - [`matrix`]: construction and accessors for [`ProjectionMatrix`].
//! - [`validation`]: fail-fast shape, domain, survival, decomposition and
//!   state-vector checks.
//! - [`errors`]: [`MPMError`], [`MPMErrorKind`], and [`MPMResult`].
//! - [`tolerances`]: the constants every module compares against.
//!
//! Invariants & assumptions
//! ------------------------
//! - A `ProjectionMatrix` that exists is valid; analyses do not re-check it.
//!
//! Downstream usage
//! ----------------
//! - Build one `ProjectionMatrix` per analysed population and pass it by
//!   reference to the functions in `crate::analysis`.

pub mod errors;
pub mod matrix;
pub mod tolerances;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{MPMError, MPMErrorKind, MPMResult};
pub use self::matrix::{MatrixComponents, ProjectionMatrix};
