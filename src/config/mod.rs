//! Solver and hierarchy configuration.

pub mod options;
pub use options::{Checks, CoarseSolver, MgOptions};
