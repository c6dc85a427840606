//! Thread pool used by a solve.
//!
//! With the `rayon` feature every data-parallel kernel (smoother passes, spmv, dot
//! products) runs on the current rayon pool. [`SolvePool`] optionally pins a solve to a
//! dedicated pool of fixed size, so repeated solves use the same reduction order.

use crate::error::KError;
use log::debug;

#[derive(Default)]
pub struct SolvePool {
    #[cfg(feature = "rayon")]
    pool: Option<(usize, rayon::ThreadPool)>,
}

impl std::fmt::Debug for SolvePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolvePool(threads={:?})", self.threads())
    }
}

impl SolvePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the dedicated pool, if one has been built.
    pub fn threads(&self) -> Option<usize> {
        #[cfg(feature = "rayon")]
        {
            self.pool.as_ref().map(|(n, _)| *n)
        }
        #[cfg(not(feature = "rayon"))]
        {
            None
        }
    }

    /// Run `f` on a pool of `num_threads` threads (`Some(0)` means one per CPU), or on
    /// the caller's pool when `num_threads` is `None`. The dedicated pool is kept for
    /// later calls asking for the same size.
    pub fn run<R, F>(&mut self, num_threads: Option<usize>, f: F) -> Result<R, KError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        #[cfg(feature = "rayon")]
        {
            let Some(requested) = num_threads else {
                return Ok(f());
            };
            let n = if requested == 0 { num_cpus::get() } else { requested };
            if self.threads() != Some(n) {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| KError::ThreadPool(e.to_string()))?;
                debug!("built solve pool with {} threads", n);
                self.pool = Some((n, pool));
            }
            match &self.pool {
                Some((_, pool)) => Ok(pool.install(f)),
                None => Ok(f()),
            }
        }
        #[cfg(not(feature = "rayon"))]
        {
            if num_threads.is_some_and(|n| n != 1) {
                debug!("rayon disabled, running serially");
            }
            Ok(f())
        }
    }
}
