//! Dense direct solve of the coarsest multigrid level using Faer.
//!
//! The coarsest operator is small by construction, so it is densified and factored
//! once when the hierarchy is built: Cholesky first, since Galerkin levels of an SPD
//! operator stay SPD, and partial-pivoting LU when Cholesky meets a non-positive pivot.
//! The factorization is kept in double precision whatever the working scalar type is.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations

use crate::error::KError;
use crate::matrix::FixedSparseMatrix;
use faer::linalg::solvers::{Llt, PartialPivLu, SolveCore};
use faer::{Conj, MatMut, Side};
use log::debug;
use num_traits::Float;

enum Factor {
    Cholesky(Llt<f64>),
    Lu(PartialPivLu<f64>),
}

impl Factor {
    fn solve_in_place(&self, rhs: MatMut<'_, f64>) {
        match self {
            Factor::Cholesky(llt) => llt.solve_in_place_with_conj(Conj::No, rhs),
            Factor::Lu(lu) => lu.solve_in_place_with_conj(Conj::No, rhs),
        }
    }
}

/// Factorization of a coarse operator.
pub struct CoarseLu {
    factor: Factor,
    n: usize,
}

impl std::fmt::Debug for CoarseLu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.factor {
            Factor::Cholesky(_) => "llt",
            Factor::Lu(_) => "lu",
        };
        write!(f, "CoarseLu(n={}, {})", self.n, kind)
    }
}

impl CoarseLu {
    /// Factor `a` and check that the factorization solves a unit right-hand side to a
    /// finite result; a singular operator is a [`KError::FactorError`].
    pub fn factor<T: Float + Send + Sync>(a: &FixedSparseMatrix<T>) -> Result<Self, KError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(KError::FactorError(format!(
                "coarse operator is {}x{}, not square",
                n,
                a.ncols()
            )));
        }
        let dense = a.to_dense();
        if (0..n).any(|i| (0..n).any(|j| !dense[(i, j)].is_finite())) {
            return Err(KError::FactorError("coarse operator has non-finite entries".into()));
        }
        let factor = match Llt::new(dense.as_ref(), Side::Lower) {
            Ok(llt) => Factor::Cholesky(llt),
            Err(e) => {
                debug!("coarse Cholesky failed ({e}), using partial-pivoting LU");
                Factor::Lu(PartialPivLu::new(dense.as_ref()))
            }
        };
        let lu = Self { factor, n };

        let mut check = vec![1.0f64; n];
        lu.factor.solve_in_place(MatMut::from_column_major_slice_mut(&mut check, n, 1));
        if check.iter().any(|v| !v.is_finite()) {
            return Err(KError::FactorError(format!(
                "coarse operator ({n} unknowns) is singular"
            )));
        }
        Ok(lu)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// x = A⁻¹ b.
    ///
    /// A finite `b` that solves to a non-finite `x` is a [`KError::FactorError`]; a
    /// non-finite `b` passes through so the Krylov loop sees it as a breakdown.
    pub fn solve<T: Float>(&self, b: &[T], x: &mut [T]) -> Result<(), KError> {
        assert_eq!(b.len(), self.n);
        assert_eq!(x.len(), self.n);
        let mut work: Vec<f64> = b.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect();
        let finite_rhs = work.iter().all(|v| v.is_finite());
        self.factor
            .solve_in_place(MatMut::from_column_major_slice_mut(&mut work, self.n, 1));
        if finite_rhs && work.iter().any(|v| !v.is_finite()) {
            return Err(KError::FactorError("coarse solve produced a non-finite value".into()));
        }
        for (xi, &wi) in x.iter_mut().zip(&work) {
            *xi = num_traits::cast(wi).unwrap_or_else(T::nan);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DynamicSparseMatrix;
    use approx::assert_abs_diff_eq;

    fn tridiag(n: usize, d: f64, off: f64) -> FixedSparseMatrix<f64> {
        let mut m = DynamicSparseMatrix::new(n);
        for i in 0..n {
            m.set_element(i, i, d);
            if i > 0 {
                m.set_element(i, i - 1, off);
            }
            if i + 1 < n {
                m.set_element(i, i + 1, off);
            }
        }
        FixedSparseMatrix::from_dynamic(&m)
    }

    #[test]
    fn lu_solves_small_spd_system() {
        // [[4,1,0],[1,3,1],[0,1,2]] x = [6,10,8], x = [1,2,3]
        let m = DynamicSparseMatrix::from_triplets(
            3,
            &[
                (0, 0, 4.0),
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 1, 3.0),
                (1, 2, 1.0),
                (2, 1, 1.0),
                (2, 2, 2.0),
            ],
        );
        let lu = CoarseLu::factor(&FixedSparseMatrix::from_dynamic(&m)).unwrap();
        let mut x = vec![0.0; 3];
        lu.solve(&[6.0, 10.0, 8.0], &mut x).unwrap();
        for (xi, ei) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*xi, ei, epsilon = 1e-12);
        }
    }

    #[test]
    fn factors_every_size_up_to_default_coarsest() {
        for n in [1, 2, 15, 16, 60, 128, 512] {
            let a = tridiag(n, 2.1, -1.0);
            let lu = CoarseLu::factor(&a).unwrap();
            let expected: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin()).collect();
            let mut b = vec![0.0; n];
            a.multiply(&expected, &mut b);
            let mut x = vec![0.0; n];
            lu.solve(&b, &mut x).unwrap();
            for (xi, ei) in x.iter().zip(&expected) {
                assert_abs_diff_eq!(*xi, *ei, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn indefinite_operator_falls_back_to_lu() {
        // symmetric, indefinite, non-singular: Cholesky fails, LU succeeds
        let a = tridiag(6, 0.5, -1.0);
        let lu = CoarseLu::factor(&a).unwrap();
        assert!(format!("{lu:?}").ends_with("lu)"));
        let mut b = vec![0.0; 6];
        a.multiply(&[1.0; 6], &mut b);
        let mut x = vec![0.0; 6];
        lu.solve(&b, &mut x).unwrap();
        for xi in x {
            assert_abs_diff_eq!(xi, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn singular_operator_is_rejected() {
        let a = FixedSparseMatrix::<f64>::from_csr(3, 3, vec![0, 1, 1, 2], vec![0, 2], vec![1.0, 1.0])
            .unwrap();
        assert!(matches!(CoarseLu::factor(&a), Err(KError::FactorError(_))));
    }

    #[test]
    fn non_finite_rhs_passes_through() {
        let lu = CoarseLu::factor(&tridiag(4, 2.0, -1.0)).unwrap();
        let mut x = vec![0.0; 4];
        lu.solve(&[1.0, f64::NAN, 0.0, 0.0], &mut x).unwrap();
        assert!(x.iter().any(|v| v.is_nan()));
    }

    #[test]
    fn lu_rejects_rectangular_operator() {
        let a = FixedSparseMatrix::<f64>::from_csr(1, 2, vec![0, 1], vec![1], vec![1.0]).unwrap();
        assert!(matches!(CoarseLu::factor(&a), Err(KError::FactorError(_))));
    }
}
