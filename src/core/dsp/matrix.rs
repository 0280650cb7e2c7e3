//! 3x3 covariance algebra for (Vp, Vs, density) on top of `nalgebra`
//!
//! Covariance and filter matrices are always 3x3, so they are stack-allocated
//! `Copy` values. Index order is Vp = 0, Vs = 1, density = 2 in every matrix
//! of the crate.

use nalgebra::{Cholesky, SymmetricEigen, Vector3};
use num_complex::Complex64;

/// Real 3x3 matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Complex 3x3 matrix, used for cross-spectral covariances at one frequency.
pub type CMatrix3 = nalgebra::Matrix3<Complex64>;

/// Symmetric matrix from its diagonal and upper triangle.
pub fn symmetric_matrix(d: [f64; 3], c01: f64, c02: f64, c12: f64) -> Matrix3 {
    Matrix3::new(d[0], c01, c02, c01, d[1], c12, c02, c12, d[2])
}

/// Diagonal as a plain array.
pub fn diag(m: &Matrix3) -> [f64; 3] {
    [m[(0, 0)], m[(1, 1)], m[(2, 2)]]
}

/// Copy of `m` with each diagonal entry raised to at least `floor[d]`.
pub fn floor_diagonal(m: &Matrix3, floor: [f64; 3]) -> Matrix3 {
    let mut out = *m;
    for (d, f) in floor.iter().enumerate() {
        out[(d, d)] = out[(d, d)].max(*f);
    }
    out
}

pub fn is_symmetric(m: &Matrix3, tol: f64) -> bool {
    (m - m.transpose()).amax() <= tol
}

/// `vᵀ A v`
pub fn quadratic_form(a: &Matrix3, v: [f64; 3]) -> f64 {
    let v = Vector3::from(v);
    v.dot(&(a * v))
}

/// Lower Cholesky factor `L` with `A = L Lᵀ`, or `None` unless `A` is
/// positive definite with a finite factor.
pub fn cholesky_lower(a: &Matrix3) -> Option<Matrix3> {
    let l = Cholesky::new(*a)?.unpack();
    l.iter().all(|v| v.is_finite()).then_some(l)
}

/// Inverse of a symmetric positive definite matrix through its Cholesky factor.
pub fn spd_inverse(a: &Matrix3) -> Option<Matrix3> {
    let chol = Cholesky::new(*a)?;
    chol.l_dirty().iter().all(|v| v.is_finite()).then(|| chol.inverse())
}

/// Principal square root of a symmetric positive semi-definite matrix,
/// `V √D Vᵀ`, with negative eigenvalues clipped to zero.
pub fn psd_sqrt(a: &Matrix3) -> Matrix3 {
    let mut eig = SymmetricEigen::new(*a);
    eig.eigenvalues = eig.eigenvalues.map(|ev| if ev > 0.0 { ev.sqrt() } else { 0.0 });
    eig.recompose()
}

/// Lift a real matrix into the complex field.
pub fn to_complex(m: &Matrix3) -> CMatrix3 {
    m.map(|v| Complex64::new(v, 0.0))
}

/// `L⁻¹ B L⁻ᴴ` for a real lower-triangular `L` with non-zero diagonal.
pub fn whiten(l: &Matrix3, b: &CMatrix3) -> Option<CMatrix3> {
    let lc = to_complex(l);
    let half = lc.solve_lower_triangular(b)?;
    Some(lc.solve_lower_triangular(&half.adjoint())?.adjoint())
}
