//! Krylov solver interface, the PCG loop, the multigrid-preconditioned driver and the
//! dense coarse-level factorization.

use crate::preconditioner::Preconditioner;
use crate::utils::convergence::SolveStats;

/// Common interface for an iterative solver.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd;
    /// Solve A·x = b, writing result into `x`.
    /// Returns iteration stats (including convergence info).
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<Self::Scalar>, Self::Error>;
}

pub mod amg_pcg;
pub mod direct_lu;
pub mod pcg;

pub use amg_pcg::AmgPcgSolver;
pub use direct_lu::CoarseLu;
pub use pcg::PcgSolver;
