//! Options for the multigrid hierarchy and V-cycle.
//!
//! `MgOptions` carries the sweep counts of the V-cycle, the coarse-level
//! strategy, the coarsening limits, which preconditions are verified when the
//! hierarchy is built, and the size of the thread pool used by a solve.

use bitflags::bitflags;

bitflags! {
    /// Preconditions verified while the hierarchy is built.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Checks: u32 {
        /// Mask, index table and coordinate list agree and form a dense index range.
        const DOMAIN   = 0b001;
        /// No off-diagonal entry couples two unknowns of the same color, on any level.
        const COLORING = 0b010;
        /// Every level operator is symmetric.
        const SYMMETRY = 0b100;
    }
}

impl Default for Checks {
    fn default() -> Self {
        Checks::DOMAIN | Checks::COLORING
    }
}

/// How the coarsest level is handled inside the V-cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CoarseSolver {
    /// `coarse_sweeps` red-black Gauss-Seidel sweeps.
    #[default]
    Smoothing,
    /// Dense LU factorization of the coarsest operator, computed once per hierarchy.
    DirectLu,
}

/// Multigrid parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MgOptions {
    /// Red-black sweeps before restriction, per level.
    pub pre_sweeps: usize,
    /// Red-black sweeps after prolongation, per level.
    pub post_sweeps: usize,
    /// Sweeps on the coarsest level when `coarse_solver` is `Smoothing`.
    pub coarse_sweeps: usize,
    pub coarse_solver: CoarseSolver,
    /// Upper bound on the hierarchy depth, finest level included.
    pub max_levels: usize,
    /// Coarsening stops once a level has at most this many unknowns.
    pub coarsest_unknowns: usize,
    pub checks: Checks,
    /// Relative tolerance of the symmetry check.
    pub symmetry_tol: f64,
    /// Threads for the solve; `None` runs on the ambient rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for MgOptions {
    fn default() -> Self {
        Self {
            pre_sweeps: 4,
            post_sweeps: 4,
            coarse_sweeps: 200,
            coarse_solver: CoarseSolver::Smoothing,
            max_levels: 16,
            coarsest_unknowns: 512,
            checks: Checks::default(),
            symmetry_tol: 1e-10,
            num_threads: None,
        }
    }
}

impl MgOptions {
    pub fn with_sweeps(mut self, pre: usize, post: usize) -> Self {
        self.pre_sweeps = pre;
        self.post_sweeps = post;
        self
    }
    pub fn with_coarse_sweeps(mut self, sweeps: usize) -> Self {
        self.coarse_sweeps = sweeps;
        self
    }
    pub fn with_coarse_solver(mut self, coarse_solver: CoarseSolver) -> Self {
        self.coarse_solver = coarse_solver;
        self
    }
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels.max(1);
        self
    }
    pub fn with_coarsest_unknowns(mut self, n: usize) -> Self {
        self.coarsest_unknowns = n.max(1);
        self
    }
    pub fn with_checks(mut self, checks: Checks) -> Self {
        self.checks = checks;
        self
    }
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }
}
