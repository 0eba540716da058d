//! linalg::conversions — copy matrices between `ndarray` and `nalgebra`.
//!
//! The public API speaks `ndarray`; decompositions (Schur, SVD, LU) run on
//! `nalgebra::DMatrix`. These helpers are the only place the two layouts
//! meet.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView2};

/// Copy an `ndarray` matrix into a freshly allocated `DMatrix`.
///
/// The copy proceeds column by column, matching `DMatrix`'s column-major
/// storage.
pub fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

/// Copy a `DMatrix` back into a row-major `Array2`.
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

pub fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(v.iter().copied())
}
