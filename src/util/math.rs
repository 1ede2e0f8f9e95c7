//! Numeric helpers shared by the spectral and fitting stages.

use nalgebra::{DMatrix, DVector};
use std::f64::consts::{PI, TAU};

/// Wraps an angle in radians to the range (-pi, pi].
pub(crate) fn wrap_phase(angle: f64) -> f64 {
    let mut wrapped = angle % TAU;
    if wrapped <= -PI {
        wrapped += TAU;
    }
    if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Solves the dense system `a * x = b` by LU decomposition.
///
/// `a` is an `n x n` matrix in row-major order. On success the solution is
/// written into `b`. Returns `None` for a singular or non-finite system.
pub(crate) fn solve_dense(a: &[f64], b: &mut [f64]) -> Option<()> {
    let n = b.len();
    debug_assert_eq!(a.len(), n * n);

    let matrix = DMatrix::from_row_slice(n, n, a);
    let rhs = DVector::from_column_slice(b);
    let x = matrix.lu().solve(&rhs)?;
    if !x.iter().all(|v| v.is_finite()) {
        return None;
    }
    b.copy_from_slice(x.as_slice());
    Some(())
}
