//! Multigrid-preconditioned CG for SPD systems on structured, masked and sparse
//! cell domains.
//!
//! Every solve rebuilds the fixed operator and the hierarchy from the assembled matrix,
//! preconditions [`PcgSolver`] with one V-cycle per application, and releases the
//! operator and level storage before returning, on success and failure alike.
//!
//! # Usage
//! ```rust,ignore
//! let mut solver = AmgPcgSolver::new(1e-8, 100);
//! let stats = solver.solve(&a, &rhs, &Domain::Regular(GridDims::new(32, 32, 32)), &mut x)?;
//! ```

use crate::config::options::MgOptions;
use crate::context::mg_context::{MgContext, ReleaseOnExit};
use crate::error::KError;
use crate::levels::{Domain, generate_levels};
use crate::matrix::{DynamicSparseMatrix, FixedSparseMatrix};
use crate::parallel::SolvePool;
use crate::preconditioner::Preconditioner;
use crate::preconditioner::amg::MultigridPreconditioner;
use crate::solver::LinearSolver;
use crate::solver::pcg::PcgSolver;
use crate::utils::convergence::SolveStats;
use log::debug;
use num_traits::Float;

pub struct AmgPcgSolver<T> {
    pcg: PcgSolver<T>,
    pub options: MgOptions,
    pool: SolvePool,
}

impl<T: Float + Send + Sync> AmgPcgSolver<T> {
    /// `tol` is relative to the max-norm of the right-hand side.
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            pcg: PcgSolver::new(tol, max_iters),
            options: MgOptions::default(),
            pool: SolvePool::new(),
        }
    }

    pub fn with_options(mut self, options: MgOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + Send + 'static,
    {
        self.pcg = self.pcg.with_monitor(f);
        self
    }

    pub fn residual_history(&self) -> &[T] {
        &self.pcg.residual_history
    }

    /// Solve `A·result = rhs` with storage that lives only for this call.
    pub fn solve(
        &mut self,
        matrix: &DynamicSparseMatrix<T>,
        rhs: &[T],
        domain: &Domain<'_>,
        result: &mut Vec<T>,
    ) -> Result<SolveStats<T>, KError> {
        let mut ctx = MgContext::new();
        self.solve_with_context(&mut ctx, matrix, rhs, domain, result)
    }

    /// Solve `A·result = rhs`, building the operator and hierarchy in the buffers of
    /// `ctx`. The buffers keep their capacity between calls; their contents are
    /// released when this returns.
    pub fn solve_with_context(
        &mut self,
        ctx: &mut MgContext<T>,
        matrix: &DynamicSparseMatrix<T>,
        rhs: &[T],
        domain: &Domain<'_>,
        result: &mut Vec<T>,
    ) -> Result<SolveStats<T>, KError> {
        let n = matrix.n();
        if rhs.len() != n {
            return Err(KError::DimensionMismatch {
                what: "right-hand side",
                expected: n,
                got: rhs.len(),
            });
        }
        let Self { pcg, options, pool } = self;
        let options = &*options;
        pool.run(options.num_threads, move || {
            let mut guard = ReleaseOnExit::new(ctx);
            let ctx: &mut MgContext<T> = &mut guard;
            ctx.fine.construct_from_matrix(matrix);
            generate_levels(&ctx.fine, domain, options, &mut ctx.hierarchy)?;
            debug!(
                "solving {} unknowns with {} levels on {} threads",
                n,
                ctx.hierarchy.depth(),
                rayon_threads()
            );
            let mg = MultigridPreconditioner::new(&ctx.hierarchy, options.clone());
            let pc: &dyn Preconditioner<FixedSparseMatrix<T>, Vec<T>> = &mg;
            let b = rhs.to_vec();
            pcg.solve(&ctx.fine, Some(pc), &b, result)
        })?
    }
}

#[cfg(feature = "rayon")]
fn rayon_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "rayon"))]
fn rayon_threads() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::GridDims;
    use crate::utils::convergence::StopReason;

    fn laplacian_1d(n: usize) -> DynamicSparseMatrix<f64> {
        let mut m = DynamicSparseMatrix::new(n);
        for i in 0..n {
            m.set_element(i, i, 2.0);
            if i > 0 {
                m.set_element(i, i - 1, -1.0);
            }
            if i + 1 < n {
                m.set_element(i, i + 1, -1.0);
            }
        }
        m
    }

    #[test]
    fn rhs_length_is_checked() {
        let mut solver = AmgPcgSolver::new(1e-8, 10);
        let mut x = Vec::new();
        let err = solver
            .solve(&laplacian_1d(4), &[1.0; 3], &Domain::Regular(GridDims::new(4, 1, 1)), &mut x)
            .unwrap_err();
        assert_eq!(err, KError::DimensionMismatch { what: "right-hand side", expected: 4, got: 3 });
    }

    #[test]
    fn context_is_released_after_success_and_error() {
        let mut solver = AmgPcgSolver::new(1e-10, 50);
        let mut ctx = MgContext::new();
        let mut x = Vec::new();
        let a = laplacian_1d(16);
        let stats = solver
            .solve_with_context(&mut ctx, &a, &[1.0; 16], &Domain::Regular(GridDims::new(16, 1, 1)), &mut x)
            .unwrap();
        assert_eq!(stats.reason, StopReason::Converged);
        assert!(ctx.is_released());

        let bad = Domain::Regular(GridDims::new(5, 1, 1));
        assert!(solver.solve_with_context(&mut ctx, &a, &[1.0; 16], &bad, &mut x).is_err());
        assert!(ctx.is_released());
    }
}
