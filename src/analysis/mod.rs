//! analysis — asymptotic, transient, sensitivity, and life-history analyses.
//!
//! Purpose
//! -------
//! Collect every computation performed on a validated
//! [`ProjectionMatrix`](crate::model::ProjectionMatrix) under one namespace.
//! This is the surface most consumers (including the Python bindings)
//! depend on.
//!
//! Key behaviors
//! -------------
//! - [`eigen`]: growth rate `λ`, stable stage distribution `w`, reproductive
//!   value `v`, damping ratio, and eigen warnings.
//! - [`projection`]: deterministic projections `n(t+1) = A n(t)`, single or
//!   batched, with optional normalization and `λ`-scaling.
//! - [`transient`]: amplification, attenuation, reactivity, inertia, and
//!   their bounds on the standardized projection.
//! - [`sensitivity`]: analytic sensitivities and elasticities plus
//!   simulation and finite-difference cross-checks.
//! - [`life_history`]: absorbing-chain traits (probability of and age at
//!   first reproduction, life expectancy, `R0`, generation time).
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated once, at `ProjectionMatrix` construction; state
//!   vectors and options are validated by the operation receiving them.
//! - Every function is pure: no caching, no shared mutable state. Analyses
//!   of different matrices can run concurrently without coordination.
//!
//! Conventions
//! -----------
//! - `w` is normalized to `Σ w = 1` and `v` to `v · w = 1` everywhere.
//! - Non-fatal numerical conditions are returned as data (`EigenWarning`,
//!   `SolvePath`) and logged through `tracing`; fatal ones are `MPMError`.
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. Build a `ProjectionMatrix` (from `A`, or from `U` and `F`).
//!   2. Call [`analyze`] for the asymptotic summary.
//!   3. Call [`project`], [`transient_summary`], [`elasticity`], or
//!      [`life_history_metrics`] as needed.
//! - Batch callers should handle each matrix's `MPMResult` independently so
//!   one malformed matrix does not abort the rest.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests against closed-form or reference
//!   values; `tests/integration_mpm_pipeline.rs` runs complete pipelines.

pub mod eigen;
pub mod life_history;
pub mod projection;
pub mod sensitivity;
pub mod transient;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::eigen::{analyze, dominant_eigenvalue, EigenResult, EigenWarning};
pub use self::life_history::{
    fundamental_matrix, generation_time, life_expectancy, life_history_metrics,
    net_reproductive_matrix, net_reproductive_rate, LifeHistoryMetrics, LifeHistorySolvePaths,
};
pub use self::projection::{project, project_batch, ProjectionOptions, ProjectionSeries};
pub use self::sensitivity::{
    elasticity, numerical_sensitivity, sensitivity, sensitivity_by_simulation,
    SensitivityOptions, SimulatedSensitivity,
};
pub use self::transient::{
    first_step_bounds, max_amplification, max_attenuation, stage_biased_bounds,
    transient_summary, FirstStepBounds, StageBiasedBounds, TransientExtreme, TransientOptions,
    TransientSummary,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_demography::analysis::prelude::*;
//
// to import the model type, the error surface, and every analysis in one line.

pub mod prelude {
    pub use super::{
        analyze, elasticity, generation_time, life_history_metrics, max_amplification,
        max_attenuation, project, project_batch, sensitivity, transient_summary, EigenResult,
        EigenWarning, LifeHistoryMetrics, ProjectionOptions, ProjectionSeries,
        SensitivityOptions, TransientExtreme, TransientOptions, TransientSummary,
    };
    pub use crate::model::{MPMError, MPMErrorKind, MPMResult, MatrixComponents, ProjectionMatrix};
}
