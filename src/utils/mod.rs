//! Coloring and convergence utilities.

pub mod coloring;
pub mod convergence;

pub use coloring::{Coloring, verify_two_coloring};
pub use convergence::{Convergence, SolveStats, StopReason};
