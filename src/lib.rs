//! mgpcg: multigrid-preconditioned Conjugate Gradient for sparse SPD systems
//!
//! The crate solves the large symmetric positive-definite systems produced by
//! discretized elliptic operators (pressure, viscosity) on cell grids. A hierarchy of
//! Galerkin-coarsened operators is built per solve, one V-cycle with parallel
//! red-black Gauss-Seidel smoothing serves as the preconditioner, and an outer PCG loop
//! iterates to a tolerance relative to the initial residual. The active cells can be a
//! full box, a masked subset of one, or an explicit coordinate list.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod levels;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use crate::core::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use levels::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;
pub use utils::*;
