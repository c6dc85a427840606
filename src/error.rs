use thiserror::Error;

// Unified error type for mgpcg.
//
// Only invalid input and violated preconditions are errors. Breakdown and
// non-convergence are reported through `SolveStats`.

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KError {
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    #[error("red-black coloring conflict on level {level}: rows {row} and {col} share a color but are coupled")]
    ColoringConflict { level: usize, row: usize, col: usize },
    #[error("operator on level {level} is not symmetric at ({row}, {col})")]
    NotSymmetric { level: usize, row: usize, col: usize },
    #[error("factorization error: {0}")]
    FactorError(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    #[error("multigrid hierarchy is empty")]
    EmptyHierarchy,
}
