//! Preconditioners for linear solvers.
//!
//! This module defines the Preconditioner trait and the multigrid V-cycle built on
//! red-black Gauss-Seidel smoothing and aggregation transfer operators.

use crate::error::KError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
}

pub mod amg;
pub mod rbgs;
pub mod transfer;

pub use amg::{MultigridPreconditioner, v_cycle};
pub use rbgs::{ColorOrder, red_black_gauss_seidel};
pub use transfer::{prolongate_add, restrict_residual};
