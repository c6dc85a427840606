//! Red-black Gauss-Seidel relaxation.
//!
//! One sweep is two passes, one per color. Every unknown of the active color is
//! relaxed against the current `x`:
//!
//! `x[i] = (b[i] - Σ_{j≠i} A[i,j]·x[j]) / A[i,i]`, or `0` when `A[i,i] == 0`.
//!
//! Within a pass the updates only read unknowns of the other color (checked by
//! [`verify_two_coloring`](crate::utils::coloring::verify_two_coloring) when the
//! hierarchy is built), so with the `rayon` feature each pass is computed in parallel
//! into a scratch buffer and then written back. Writes of the first pass are visible
//! to the second: this is Gauss-Seidel, not Jacobi.

use crate::matrix::FixedSparseMatrix;
use crate::utils::coloring::Coloring;
use num_traits::Float;

/// Which color is relaxed first in every sweep.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorOrder {
    RedFirst,
    BlackFirst,
}

impl ColorOrder {
    fn passes(self) -> [bool; 2] {
        match self {
            ColorOrder::RedFirst => [true, false],
            ColorOrder::BlackFirst => [false, true],
        }
    }
}

/// New value of unknown `row` given the current iterate.
#[inline]
fn relax_row<T: Float + Send + Sync>(a: &FixedSparseMatrix<T>, b: &[T], x: &[T], row: usize) -> T {
    let (cols, vals) = a.row(row);
    let mut sum = T::zero();
    let mut diag = T::zero();
    for (&col, &v) in cols.iter().zip(vals) {
        if col == row {
            diag = v;
        } else {
            sum = sum + v * x[col];
        }
    }
    if diag != T::zero() {
        (b[row] - sum) / diag
    } else {
        T::zero()
    }
}

/// `sweeps` red-black Gauss-Seidel sweeps on `A x = b`, updating `x` in place.
pub fn red_black_gauss_seidel<T: Float + Send + Sync>(
    a: &FixedSparseMatrix<T>,
    b: &[T],
    x: &mut [T],
    coloring: &Coloring,
    sweeps: usize,
    order: ColorOrder,
) {
    let n = a.nrows();
    assert_eq!(b.len(), n, "right-hand side has incorrect length");
    assert_eq!(x.len(), n, "iterate has incorrect length");
    assert_eq!(coloring.len(), n, "coloring has incorrect length");
    if sweeps == 0 || n == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        let mut scratch = vec![T::zero(); n];
        for _ in 0..sweeps {
            for red in order.passes() {
                {
                    let x_ro: &[T] = x;
                    scratch.par_iter_mut().enumerate().for_each(|(row, out)| {
                        if coloring.is_red(row) == red {
                            *out = relax_row(a, b, x_ro, row);
                        }
                    });
                }
                let scratch_ro: &[T] = &scratch;
                x.par_iter_mut().enumerate().for_each(|(row, xi)| {
                    if coloring.is_red(row) == red {
                        *xi = scratch_ro[row];
                    }
                });
            }
        }
    }
    #[cfg(not(feature = "rayon"))]
    {
        for _ in 0..sweeps {
            for red in order.passes() {
                for row in 0..n {
                    if coloring.is_red(row) == red {
                        x[row] = relax_row(a, b, x, row);
                    }
                }
            }
        }
    }
}
