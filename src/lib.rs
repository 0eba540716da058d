//! rust_demography — matrix population model analyses with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the matrix population model engine to Python via the
//! `_rust_demography` extension module. When the `python-bindings` feature
//! is enabled, this module defines the Python-facing classes and the
//! `mpm` submodule used by the `rust_demography` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`model`, `linalg`, `analysis`) as the
//!   public crate surface.
//! - Define `#[pyclass]` wrappers (`MatrixModel`, `EigenAnalysis`,
//!   `LifeHistory`) and the `#[pymodule]` initializer for `_rust_demography`.
//! - Register the `mpm` submodule under `rust_demography` so that
//!   dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input conversion, and error mapping.
//! - Python-visible methods mirror the signatures and defaults of their Rust
//!   counterparts (`ProjectionOptions`, `TransientOptions`,
//!   `SensitivityOptions`).
//!
//! Conventions
//! -----------
//! - Matrices and vectors cross the boundary as `numpy.float64` arrays;
//!   nested Python sequences and pandas objects are accepted on input.
//! - `MPMError` values are converted to `ValueError` at the PyO3 boundary.
//! - The library never installs a `tracing` subscriber; binaries and tests
//!   choose their own.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`analysis`] (or
//!   [`analysis::prelude`]) and can ignore the PyO3 items guarded by the
//!   `python-bindings` feature.
//! - The Python packaging layer imports `_rust_demography` and wraps its
//!   classes in user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and
//!   by `tests/integration_mpm_pipeline.rs`.

pub mod analysis;
pub mod linalg;
pub mod model;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{PyArray1, PyArray2, ToPyArray};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    analysis::{
        eigen::{analyze, EigenResult},
        life_history::{
            generation_time, life_history_metrics, net_reproductive_rate, LifeHistoryMetrics,
        },
        projection::{project, ProjectionOptions},
        sensitivity::{elasticity, sensitivity, SensitivityOptions},
        transient::{max_amplification, max_attenuation, TransientOptions},
    },
    model::matrix::ProjectionMatrix,
    utils::{build_projection_matrix, extract_f64_array},
};

/// EigenAnalysis — Python-facing view of an [`EigenResult`].
///
/// Fields
/// ------
/// - `inner`: [`EigenResult`]
///   Rust-side result backing the read-only properties.
///
/// Notes
/// -----
/// - Eigenvalues are exposed as `(re, im)` pairs, dominant first.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_demography.mpm")]
pub struct EigenAnalysis {
    inner: EigenResult,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl EigenAnalysis {
    /// Asymptotic growth rate λ.
    #[getter]
    pub fn growth_rate(&self) -> f64 {
        self.inner.growth_rate
    }

    /// Intrinsic rate of increase r = ln λ; `None` when λ ≤ 0.
    #[getter]
    pub fn intrinsic_rate(&self) -> Option<f64> {
        self.inner.intrinsic_rate()
    }

    #[getter]
    pub fn damping_ratio(&self) -> f64 {
        self.inner.damping_ratio
    }

    /// Stable stage distribution w, summing to 1.
    #[getter]
    pub fn stable_stage_distribution<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.stable_stage_distribution.to_pyarray(py)
    }

    /// Reproductive value v, scaled so that v · w = 1.
    #[getter]
    pub fn reproductive_value<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.reproductive_value.to_pyarray(py)
    }

    #[getter]
    pub fn eigenvalues(&self) -> Vec<(f64, f64)> {
        self.inner.eigenvalues.iter().map(|z| (z.re, z.im)).collect()
    }

    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings.iter().map(ToString::to_string).collect()
    }
}

/// LifeHistory — Python-facing view of [`LifeHistoryMetrics`].
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_demography.mpm")]
pub struct LifeHistory {
    inner: LifeHistoryMetrics,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LifeHistory {
    #[getter]
    pub fn start_stage(&self) -> usize {
        self.inner.start_stage
    }

    #[getter]
    pub fn reproductive_stages(&self) -> Vec<usize> {
        self.inner.reproductive_stages.clone()
    }

    #[getter]
    pub fn probability_of_reproduction(&self) -> f64 {
        self.inner.probability_of_reproduction
    }

    /// `None` when reproduction is unreachable from the start stage.
    #[getter]
    pub fn age_at_first_reproduction(&self) -> Option<f64> {
        self.inner.age_at_first_reproduction
    }

    #[getter]
    pub fn mean_life_expectancy(&self) -> Option<f64> {
        self.inner.mean_life_expectancy
    }

    #[getter]
    pub fn life_expectancy_at_maturity(&self) -> Option<f64> {
        self.inner.life_expectancy_at_maturity
    }

    #[getter]
    pub fn remaining_mature_life_expectancy(&self) -> Option<f64> {
        self.inner.remaining_mature_life_expectancy
    }

    /// True if any fundamental matrix needed the pseudo-inverse.
    #[getter]
    pub fn used_pseudo_inverse(&self) -> bool {
        self.inner.used_pseudo_inverse()
    }
}

/// MatrixModel — Python-facing wrapper around [`ProjectionMatrix`].
///
/// Parameters
/// ----------
/// Constructed from Python via `MatrixModel(a=None, *, u=None, f=None,
/// stage_labels=None)`:
/// - `a`: projection matrix, or
/// - `u`, `f`: survival and fecundity matrices (`A = U + F`), optionally
///   together with `a` for a consistency check.
/// - `stage_labels`: optional list of `n` stage names.
///
/// Notes
/// -----
/// - Every analysis method forwards to the matching function in
///   [`analysis`]; errors surface as `ValueError`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_demography.mpm")]
pub struct MatrixModel {
    inner: ProjectionMatrix,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MatrixModel {
    #[new]
    #[pyo3(
        signature = (a = None, *, u = None, f = None, stage_labels = None),
        text_signature = "(a=None, *, u=None, f=None, stage_labels=None)"
    )]
    pub fn new<'py>(
        py: Python<'py>, a: Option<&Bound<'py, PyAny>>, u: Option<&Bound<'py, PyAny>>,
        f: Option<&Bound<'py, PyAny>>, stage_labels: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let inner = build_projection_matrix(py, a, u, f, stage_labels)?;
        Ok(MatrixModel { inner })
    }

    #[getter]
    pub fn dim(&self) -> usize {
        self.inner.dim()
    }

    /// Projection matrix A.
    #[getter]
    pub fn a<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.entries().to_pyarray(py)
    }

    #[getter]
    pub fn stage_labels(&self) -> Option<Vec<String>> {
        self.inner.stage_labels().map(<[String]>::to_vec)
    }

    /// Asymptotic eigenanalysis (λ, w, v, damping ratio).
    pub fn eigen(&self) -> PyResult<EigenAnalysis> {
        Ok(EigenAnalysis { inner: analyze(&self.inner)? })
    }

    /// Project `initial` forward; returns `(totals, stage_vectors)`.
    #[pyo3(signature = (initial, steps, normalize = false, scale = false))]
    pub fn project<'py>(
        &self, py: Python<'py>, initial: &Bound<'py, PyAny>, steps: usize, normalize: bool,
        scale: bool,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray2<f64>>)> {
        let arr = extract_f64_array(py, initial)?;
        let opts = ProjectionOptions::new(normalize, scale);
        let series = project(&self.inner, arr.as_array(), steps, &opts)?;
        Ok((series.totals.to_pyarray(py), series.stage_vectors.to_pyarray(py)))
    }

    /// Maximum amplification as `(value, time_step)`.
    #[pyo3(signature = (vector, horizon = None))]
    pub fn max_amplification<'py>(
        &self, py: Python<'py>, vector: &Bound<'py, PyAny>, horizon: Option<usize>,
    ) -> PyResult<(f64, usize)> {
        let arr = extract_f64_array(py, vector)?;
        let opts = TransientOptions::new(horizon);
        let extreme = max_amplification(&self.inner, arr.as_array(), &opts)?;
        Ok((extreme.value, extreme.time_step))
    }

    /// Maximum attenuation as `(value, time_step)`.
    #[pyo3(signature = (vector, horizon = None))]
    pub fn max_attenuation<'py>(
        &self, py: Python<'py>, vector: &Bound<'py, PyAny>, horizon: Option<usize>,
    ) -> PyResult<(f64, usize)> {
        let arr = extract_f64_array(py, vector)?;
        let opts = TransientOptions::new(horizon);
        let extreme = max_attenuation(&self.inner, arr.as_array(), &opts)?;
        Ok((extreme.value, extreme.time_step))
    }

    #[pyo3(signature = (zero_structural_zeros = true))]
    pub fn sensitivity<'py>(
        &self, py: Python<'py>, zero_structural_zeros: bool,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let s = sensitivity(&self.inner, &SensitivityOptions::new(zero_structural_zeros))?;
        Ok(s.to_pyarray(py))
    }

    #[pyo3(signature = (zero_structural_zeros = true))]
    pub fn elasticity<'py>(
        &self, py: Python<'py>, zero_structural_zeros: bool,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let e = elasticity(&self.inner, &SensitivityOptions::new(zero_structural_zeros))?;
        Ok(e.to_pyarray(py))
    }

    /// Life-history traits; requires the model to be built from `u` and `f`.
    #[pyo3(signature = (start_stage = 0))]
    pub fn life_history(&self, start_stage: usize) -> PyResult<LifeHistory> {
        Ok(LifeHistory { inner: life_history_metrics(&self.inner, start_stage)? })
    }

    pub fn generation_time(&self) -> PyResult<f64> {
        Ok(generation_time(&self.inner)?)
    }

    pub fn net_reproductive_rate(&self) -> PyResult<f64> {
        Ok(net_reproductive_rate(&self.inner)?)
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_demography<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let mpm_mod = PyModule::new(_py, "mpm")?;
    mpm(_py, m, &mpm_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_demography.mpm", mpm_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn mpm<'py>(
    _py: Python, rust_demography: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<MatrixModel>()?;
    m.add_class::<EigenAnalysis>()?;
    m.add_class::<LifeHistory>()?;
    rust_demography.add_submodule(m)?;
    Ok(())
}
