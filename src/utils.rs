//! utils — conversions between Python objects and crate types.
//!
//! Only compiled with the `python-bindings` feature. Array-likes are accepted
//! as contiguous `numpy` arrays, pandas objects (via `to_numpy`), or nested
//! Python sequences, in that order of preference.

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::model::{matrix::ProjectionMatrix, validation::rows_to_array};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Array → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method0("to_numpy") {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(series_ro);
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw_data.call_method0("to_numpy") {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro);
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    Ok(rows_to_array(&rows)?.into_pyarray(py).readonly())
}

/// Build a [`ProjectionMatrix`] from whichever of `A`, `U`, `F` were passed.
///
/// `A` alone, `U` and `F` together, or all three are accepted; any other
/// combination is a `TypeError`.
#[cfg(feature = "python-bindings")]
pub fn build_projection_matrix<'py>(
    py: Python<'py>, a: Option<&Bound<'py, PyAny>>, u: Option<&Bound<'py, PyAny>>,
    f: Option<&Bound<'py, PyAny>>, stage_labels: Option<Vec<String>>,
) -> PyResult<ProjectionMatrix> {
    let to_owned = |raw: &Bound<'py, PyAny>| -> PyResult<ndarray::Array2<f64>> {
        Ok(extract_f64_matrix(py, raw)?.as_array().to_owned())
    };

    let matrix = match (a, u, f) {
        (Some(a), None, None) => ProjectionMatrix::new(to_owned(a)?)?,
        (None, Some(u), Some(f)) => ProjectionMatrix::from_components(to_owned(u)?, to_owned(f)?)?,
        (Some(a), Some(u), Some(f)) => {
            ProjectionMatrix::from_parts(to_owned(a)?, to_owned(u)?, to_owned(f)?)?
        }
        _ => {
            return Err(PyTypeError::new_err(
                "pass either A, or both U and F (optionally together with A)",
            ));
        }
    };

    match stage_labels {
        Some(labels) => Ok(matrix.with_stage_labels(labels)?),
        None => Ok(matrix),
    }
}
