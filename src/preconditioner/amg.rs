//! Geometric-aggregation multigrid V-cycle used as a preconditioner.
//!
//! The cycle walks a [`Hierarchy`] built by
//! [`generate_levels`](crate::levels::generate_levels):
//!
//! 1. on every level but the coarsest, `pre_sweeps` red-black sweeps (red first), then
//!    the residual is restricted to the right-hand side of the next level, whose
//!    iterate starts at zero;
//! 2. the coarsest level is relaxed with `coarse_sweeps` sweeps, or solved exactly
//!    when the hierarchy carries a [`CoarseLu`](crate::solver::direct_lu::CoarseLu);
//! 3. back up, the coarse iterate is prolongated and added, then `post_sweeps`
//!    sweeps run with the colors in reverse order.
//!
//! Reversing the color order on the way up makes the cycle a symmetric operator
//! whenever the coarsest level is solved exactly.

use crate::config::options::MgOptions;
use crate::error::KError;
use crate::levels::Hierarchy;
use crate::matrix::FixedSparseMatrix;
use crate::preconditioner::rbgs::{ColorOrder, red_black_gauss_seidel};
use crate::preconditioner::transfer::{prolongate_add, restrict_residual};
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Improve `x` towards the solution of `A_0 x = b` with one V-cycle over `hierarchy`.
pub fn v_cycle<T: Float + Send + Sync>(
    hierarchy: &Hierarchy<T>,
    options: &MgOptions,
    b: &[T],
    x: &mut [T],
) -> Result<(), KError> {
    let levels = hierarchy.levels();
    let Some(coarsest) = levels.len().checked_sub(1) else {
        return Err(KError::EmptyHierarchy);
    };
    let n = levels[0].unknowns();
    if b.len() != n {
        return Err(KError::DimensionMismatch { what: "V-cycle right-hand side", expected: n, got: b.len() });
    }
    if x.len() != n {
        return Err(KError::DimensionMismatch { what: "V-cycle iterate", expected: n, got: x.len() });
    }

    // Working vectors of the coarse levels; level 0 uses the caller's buffers.
    let mut xs: Vec<Vec<T>> = levels[1..].iter().map(|l| vec![T::zero(); l.unknowns()]).collect();
    let mut bs: Vec<Vec<T>> = xs.clone();

    for i in 0..coarsest {
        let level = &levels[i];
        let (x_i, b_i, b_next) = if i == 0 {
            (&mut *x, b, &mut bs[0])
        } else {
            let (lo, hi) = bs.split_at_mut(i);
            (&mut xs[i - 1][..], &lo[i - 1][..], &mut hi[0])
        };
        red_black_gauss_seidel(&level.a, b_i, x_i, &level.coloring, options.pre_sweeps, ColorOrder::RedFirst);
        restrict_residual(&level.r, &level.a, x_i, b_i, b_next);
    }

    {
        let level = &levels[coarsest];
        let (x_c, b_c) = if coarsest == 0 {
            (&mut *x, b)
        } else {
            (&mut xs[coarsest - 1][..], &bs[coarsest - 1][..])
        };
        match hierarchy.coarse_lu() {
            Some(lu) => lu.solve(b_c, x_c)?,
            None => red_black_gauss_seidel(
                &level.a,
                b_c,
                x_c,
                &level.coloring,
                options.coarse_sweeps,
                ColorOrder::RedFirst,
            ),
        }
    }

    for i in (0..coarsest).rev() {
        let level = &levels[i];
        let (x_i, b_i, x_next) = if i == 0 {
            (&mut *x, b, &xs[0][..])
        } else {
            let (lo, hi) = xs.split_at_mut(i);
            (&mut lo[i - 1][..], &bs[i - 1][..], &hi[0][..])
        };
        prolongate_add(&level.p, x_next, x_i);
        red_black_gauss_seidel(&level.a, b_i, x_i, &level.coloring, options.post_sweeps, ColorOrder::BlackFirst);
    }
    Ok(())
}

/// `z = M⁻¹ r` as one V-cycle from a zero initial guess.
pub struct MultigridPreconditioner<'h, T> {
    hierarchy: &'h Hierarchy<T>,
    options: MgOptions,
}

impl<'h, T: Float + Send + Sync> MultigridPreconditioner<'h, T> {
    pub fn new(hierarchy: &'h Hierarchy<T>, options: MgOptions) -> Self {
        Self { hierarchy, options }
    }

    pub fn hierarchy(&self) -> &Hierarchy<T> {
        self.hierarchy
    }
}

impl<T: Float + Send + Sync> Preconditioner<FixedSparseMatrix<T>, Vec<T>> for MultigridPreconditioner<'_, T> {
    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        z.clear();
        z.resize(r.len(), T::zero());
        v_cycle(self.hierarchy, &self.options, r, z)
    }
}

impl<T: Float + Send + Sync> std::fmt::Display for MultigridPreconditioner<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MG V-cycle: {} levels, pre={}, post={}, coarse={:?}/{}",
            self.hierarchy.depth(),
            self.options.pre_sweeps,
            self.options.post_sweeps,
            self.options.coarse_solver,
            self.options.coarse_sweeps
        )
    }
}
