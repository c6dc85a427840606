//! Inter-level transfer of residuals and corrections.

use crate::matrix::FixedSparseMatrix;
use num_traits::Float;

/// Restrict the residual of `A x = b` to the next coarser level:
/// `b_coarse = R (b - A x)`.
pub fn restrict_residual<T: Float + Send + Sync>(
    r_op: &FixedSparseMatrix<T>,
    a: &FixedSparseMatrix<T>,
    x: &[T],
    b: &[T],
    b_coarse: &mut [T],
) {
    let mut residual = b.to_vec();
    a.multiply_and_subtract(x, &mut residual);
    r_op.multiply(&residual, b_coarse);
}

/// Add the interpolated coarse correction to the fine iterate: `x += P x_coarse`.
pub fn prolongate_add<T: Float + Send + Sync>(p: &FixedSparseMatrix<T>, x_coarse: &[T], x: &mut [T]) {
    p.multiply_and_add(x_coarse, x);
}
