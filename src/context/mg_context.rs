//! Caller-owned storage for the fixed fine operator and the multigrid hierarchy.
//!
//! A context can be handed to repeated solves so the level buffers are allocated once
//! and reused. A solve takes the context by `&mut`, so one context serves one solve at
//! a time; share it across threads behind a `Mutex`.

use crate::levels::Hierarchy;
use crate::matrix::FixedSparseMatrix;
use num_traits::Float;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Default)]
pub struct MgContext<T> {
    pub(crate) fine: FixedSparseMatrix<T>,
    pub(crate) hierarchy: Hierarchy<T>,
}

impl<T: Float + Send + Sync> MgContext<T> {
    pub fn new() -> Self {
        Self {
            fine: FixedSparseMatrix::new(),
            hierarchy: Hierarchy::new(),
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy<T> {
        &self.hierarchy
    }

    /// True when no operator or level data is held (the state after every solve).
    pub fn is_released(&self) -> bool {
        self.hierarchy.is_empty() && self.fine.nnz() == 0
    }

    pub fn release(&mut self) {
        self.fine.clear();
        self.hierarchy.clear();
    }
}

/// Releases the context contents when dropped, whichever way the solve exits.
pub(crate) struct ReleaseOnExit<'c, T: Float + Send + Sync> {
    ctx: &'c mut MgContext<T>,
}

impl<'c, T: Float + Send + Sync> ReleaseOnExit<'c, T> {
    pub(crate) fn new(ctx: &'c mut MgContext<T>) -> Self {
        Self { ctx }
    }
}

impl<T: Float + Send + Sync> Deref for ReleaseOnExit<'_, T> {
    type Target = MgContext<T>;
    fn deref(&self) -> &MgContext<T> {
        self.ctx
    }
}

impl<T: Float + Send + Sync> DerefMut for ReleaseOnExit<'_, T> {
    fn deref_mut(&mut self) -> &mut MgContext<T> {
        self.ctx
    }
}

impl<T: Float + Send + Sync> Drop for ReleaseOnExit<'_, T> {
    fn drop(&mut self) {
        self.ctx.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;

    #[test]
    fn guard_releases_on_early_return() {
        fn failing(ctx: &mut MgContext<f64>) -> Result<(), ()> {
            let mut guard = ReleaseOnExit::new(ctx);
            guard.fine = FixedSparseMatrix::from_csr(1, 1, vec![0, 1], vec![0], vec![2.0]).map_err(|_| ())?;
            let level: &mut Level<f64> = guard.hierarchy.push_slot();
            level.a = FixedSparseMatrix::from_csr(1, 1, vec![0, 1], vec![0], vec![2.0]).map_err(|_| ())?;
            Err(())
        }
        let mut ctx = MgContext::new();
        assert!(failing(&mut ctx).is_err());
        assert!(ctx.is_released());
        assert_eq!(ctx.hierarchy().depth(), 0);
    }
}
