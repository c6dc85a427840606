//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2
//!
//! The iterate always starts from zero and convergence is measured on the max-norm of
//! the true recursive residual, relative to the max-norm of the right-hand side.
//!
//! Numerical failures are reported through [`StopReason`], never as errors: on
//! breakdown or when the iteration cap is hit the caller still gets the best iterate.

use crate::core::traits::{InnerProduct, MatVec};
use crate::core::wrappers::{add_scaled, scale_and_add};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats, StopReason};
use log::{info, trace, warn};
use num_traits::Float;

pub struct PcgSolver<T> {
    pub conv: Convergence<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T) + Send>>,
    /// Residual max-norms of the last solve, starting with the initial one.
    pub residual_history: Vec<T>,
}

impl<T: Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            conv: Convergence { tol, max_iters },
            monitor: None,
            residual_history: Vec::new(),
        }
    }

    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + Send + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    fn record(&mut self, it: usize, res: T) {
        trace!("pcg it {:4}: max|r| = {:e}", it, res.to_f64().unwrap_or(f64::NAN));
        if let Some(ref mut monitor) = self.monitor {
            monitor(it, res);
        }
        self.residual_history.push(res);
    }
}

fn precondition<M, V>(pc: Option<&dyn Preconditioner<M, V>>, r: &V, z: &mut V) -> Result<(), KError>
where
    V: Clone,
{
    match pc {
        Some(pc) => pc.apply(r, z),
        None => {
            z.clone_from(r);
            Ok(())
        }
    }
}

#[inline]
fn degenerate<T: Float>(v: T) -> bool {
    v == T::zero() || v.is_nan()
}

impl<M, V, T> LinearSolver<M, V> for PcgSolver<T>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone,
    T: Float + Send + Sync,
{
    type Error = KError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<T>, KError> {
        let n = b.as_ref().len();
        let ip = ();
        self.residual_history.clear();
        *x = V::from(vec![T::zero(); n]);

        let mut r = b.clone();
        let res0 = ip.abs_max(&r);
        if res0 == T::zero() {
            self.record(0, res0);
            info!("pcg: zero right-hand side, returning the zero vector");
            return Ok(SolveStats::new(0, res0, StopReason::ZeroRhs));
        }
        let threshold = self.conv.threshold(res0);
        self.record(0, res0);

        let mut z = V::from(vec![T::zero(); n]);
        precondition(pc, &r, &mut z)?;
        let mut rho = ip.dot(&z, &r);
        if degenerate(rho) {
            warn!("pcg: breakdown before the first iteration (rho = {:?})", rho.to_f64());
            return Ok(SolveStats::new(0, res0, StopReason::Breakdown));
        }
        let mut s = z.clone();
        let mut res = res0;

        for i in 0..self.conv.max_iters {
            a.matvec(&s, &mut z);
            let s_dot_z = ip.dot(&s, &z);
            if degenerate(s_dot_z) {
                warn!("pcg: breakdown at iteration {} (s·As = {:?})", i, s_dot_z.to_f64());
                return Ok(SolveStats::new(i, res, StopReason::Breakdown));
            }
            let alpha = rho / s_dot_z;
            add_scaled(alpha, s.as_ref(), x.as_mut());
            add_scaled(-alpha, z.as_ref(), r.as_mut());
            res = ip.abs_max(&r);
            self.record(i + 1, res);
            if self.conv.check(res, threshold) {
                info!(
                    "pcg: converged in {} iterations, max|r| = {:e}",
                    i + 1,
                    res.to_f64().unwrap_or(f64::NAN)
                );
                return Ok(SolveStats::new(i + 1, res, StopReason::Converged));
            }
            precondition(pc, &r, &mut z)?;
            let rho_new = ip.dot(&z, &r);
            let beta = rho_new / rho;
            scale_and_add(beta, s.as_mut(), z.as_ref());
            rho = rho_new;
        }
        warn!(
            "pcg: no convergence after {} iterations, max|r| = {:e}",
            self.conv.max_iters,
            res.to_f64().unwrap_or(f64::NAN)
        );
        Ok(SolveStats::new(self.conv.max_iters, res, StopReason::MaxIterations))
    }
}
