//! linalg::spectrum — eigenvalues and null vectors of small dense matrices.
//!
//! Purpose
//! -------
//! Supply the two decompositions the eigenanalysis needs: the full complex
//! spectrum of a real (non-symmetric) matrix, obtained from a real Schur
//! decomposition, and the null vector of a (numerically) singular matrix,
//! obtained from its SVD.
//!
//! Key behaviors
//! -------------
//! - [`eigenvalues`] returns the spectrum ordered with the dominant
//!   eigenvalue first (see [`order_by_dominance`]) and the remainder sorted
//!   by decreasing modulus.
//! - [`null_vector`] returns the right singular vector for the smallest
//!   singular value, which spans the null space of `A − λI` when `λ` is an
//!   eigenvalue.
//!
//! Conventions
//! -----------
//! - Iterations are bounded by [`MAX_ITERATIONS`]; non-convergence is an
//!   `MPMError::EigenDecompositionFailed`, never a panic.
//! - Null vectors are returned with arbitrary sign and unit 2-norm; callers
//!   normalize them for their own purposes.

use crate::model::{
    errors::{MPMError, MPMResult},
    tolerances::{EIGEN_TIE_TOL, ITERATION_EPS, MAX_ITERATIONS},
};
use nalgebra::{Complex, DMatrix, DVector, Schur};

/// Full spectrum of `a`, dominant eigenvalue first.
///
/// Errors
/// ------
/// - `MPMError::EigenDecompositionFailed` when the Schur iteration does not
///   converge within [`MAX_ITERATIONS`].
pub fn eigenvalues(a: &DMatrix<f64>) -> MPMResult<Vec<Complex<f64>>> {
    let n = a.nrows();
    let mut values: Vec<Complex<f64>> = if n == 1 {
        vec![Complex::new(a[(0, 0)], 0.0)]
    } else {
        let schur = Schur::try_new(a.clone(), ITERATION_EPS, MAX_ITERATIONS)
            .ok_or(MPMError::EigenDecompositionFailed { dim: n })?;
        schur.complex_eigenvalues().iter().copied().collect()
    };
    if values.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
        return Err(MPMError::EigenDecompositionFailed { dim: n });
    }
    order_by_dominance(&mut values);
    Ok(values)
}

/// Sort by decreasing modulus and move the dominant eigenvalue to the front.
///
/// The dominant eigenvalue has the largest modulus; moduli within a relative
/// [`EIGEN_TIE_TOL`] are tied, and ties go to the largest real part and then
/// to the smallest imaginary magnitude (a real eigenvalue wins over a
/// complex one of equal modulus and real part).
pub fn order_by_dominance(values: &mut Vec<Complex<f64>>) {
    values.sort_by(|a, b| {
        b.norm()
            .total_cmp(&a.norm())
            .then(b.re.total_cmp(&a.re))
            .then(a.im.abs().total_cmp(&b.im.abs()))
    });
    let Some(max_modulus) = values.first().map(|z| z.norm()) else {
        return;
    };
    let tie_floor = max_modulus - EIGEN_TIE_TOL * max_modulus.max(1.0);
    let mut best = 0;
    for (idx, z) in values.iter().enumerate().skip(1) {
        if z.norm() < tie_floor {
            break;
        }
        let current = values[best];
        let better_re = z.re > current.re + EIGEN_TIE_TOL * max_modulus.max(1.0);
        let same_re = (z.re - current.re).abs() <= EIGEN_TIE_TOL * max_modulus.max(1.0);
        if better_re || (same_re && z.im.abs() < current.im.abs()) {
            best = idx;
        }
    }
    if best != 0 {
        let dominant = values.remove(best);
        values.insert(0, dominant);
    }
}

/// Right singular vector of `m` for its smallest singular value.
///
/// Errors
/// ------
/// - `MPMError::EigenDecompositionFailed` when the SVD does not converge.
pub fn null_vector(m: DMatrix<f64>) -> MPMResult<DVector<f64>> {
    let n = m.nrows();
    let svd = m
        .try_svd(false, true, ITERATION_EPS, MAX_ITERATIONS)
        .ok_or(MPMError::EigenDecompositionFailed { dim: n })?;
    let v_t = svd.v_t.ok_or(MPMError::EigenDecompositionFailed { dim: n })?;
    let (idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .ok_or(MPMError::EigenDecompositionFailed { dim: n })?;
    Ok(v_t.row(idx).transpose())
}

/// Spectral radius (largest eigenvalue modulus) of `a`.
pub fn spectral_radius(a: &DMatrix<f64>) -> MPMResult<f64> {
    let values = eigenvalues(a)?;
    Ok(values.iter().map(|z| z.norm()).fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Spectrum ordering for real, complex, and tied eigenvalues.
    // - Null vectors of singular matrices.
    //
    // They intentionally DO NOT cover:
    // - Eigenvector normalization, which lives in `analysis::eigen`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check the spectrum of a triangular matrix, whose eigenvalues are its
    // diagonal.
    //
    // Given
    // -----
    // - Lower-triangular matrix with diagonal (0.5, 0.7, 0.9).
    //
    // Expect
    // ------
    // - Eigenvalues ordered 0.9, 0.7, 0.5 with zero imaginary parts.
    fn eigenvalues_of_triangular_matrix_are_its_diagonal() {
        // Arrange
        let a = DMatrix::from_row_slice(3, 3, &[0.5, 0.0, 0.0, 0.3, 0.7, 0.0, 0.0, 0.2, 0.9]);

        // Act
        let values = eigenvalues(&a).unwrap();

        // Assert
        let expected = [0.9, 0.7, 0.5];
        for (z, e) in values.iter().zip(expected) {
            assert_relative_eq!(z.re, e, epsilon = 1e-12);
            assert!(z.im.abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Prefer the real eigenvalue among eigenvalues of equal modulus.
    //
    // Given
    // -----
    // - The cube roots of unity as an unordered list.
    //
    // Expect
    // ------
    // - `1 + 0i` is moved to the front.
    fn order_by_dominance_prefers_real_positive_eigenvalue_among_ties() {
        // Arrange
        let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
        let mut values = vec![
            Complex::new(-0.5, half_sqrt3),
            Complex::new(-0.5, -half_sqrt3),
            Complex::new(1.0, 0.0),
        ];

        // Act
        order_by_dominance(&mut values);

        // Assert
        assert_eq!(values[0], Complex::new(1.0, 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that `null_vector` spans the kernel of a rank-deficient matrix.
    //
    // Given
    // -----
    // - A 2×2 matrix with rows (1, -2) and (2, -4); kernel spanned by (2, 1).
    //
    // Expect
    // ------
    // - `M x ≈ 0` and `x` is parallel to (2, 1).
    fn null_vector_spans_kernel() {
        // Arrange
        let m = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, 2.0, -4.0]);

        // Act
        let x = null_vector(m.clone()).unwrap();

        // Assert
        let residual = &m * &x;
        assert!(residual.norm() < 1e-12);
        assert_relative_eq!(x[0] / x[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Confirm the 1×1 shortcut.
    //
    // Given
    // -----
    // - The matrix [[0.8]].
    //
    // Expect
    // ------
    // - A single eigenvalue 0.8 and spectral radius 0.8.
    fn eigenvalues_of_scalar_matrix() {
        let a = DMatrix::from_element(1, 1, 0.8);
        assert_eq!(eigenvalues(&a).unwrap(), vec![Complex::new(0.8, 0.0)]);
        assert_relative_eq!(spectral_radius(&a).unwrap(), 0.8);
    }
}
