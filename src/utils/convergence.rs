//! Convergence tracking & tolerance checks for iterative solvers.

/// Stopping criteria.
///
/// `tol` is a factor relative to the initial residual max-norm: the solve stops once
/// `max|r| <= tol * max|r0|`.
#[derive(Clone, Debug)]
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

/// Why an iteration stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The right-hand side was exactly zero; the zero vector was returned.
    ZeroRhs,
    /// Relative tolerance reached.
    Converged,
    /// A preconditioned inner product was zero or NaN.
    Breakdown,
    /// Iteration cap reached; the best available iterate was returned.
    MaxIterations,
}

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    /// Max-norm of the final residual.
    pub final_residual: T,
    pub converged: bool,
    pub reason: StopReason,
}

impl<T: Copy + num_traits::Float> Convergence<T> {
    /// Absolute threshold for an initial residual max-norm.
    pub fn threshold(&self, res0: T) -> T {
        self.tol * res0
    }

    /// Returns true once `res_norm` is within the threshold.
    pub fn check(&self, res_norm: T, threshold: T) -> bool {
        res_norm <= threshold
    }
}

impl<T: Copy> SolveStats<T> {
    pub fn new(iterations: usize, final_residual: T, reason: StopReason) -> Self {
        let converged = matches!(reason, StopReason::ZeroRhs | StopReason::Converged);
        Self {
            iterations,
            final_residual,
            converged,
            reason,
        }
    }
}
