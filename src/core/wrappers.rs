//! Vector kernels used by the Krylov loop and the multigrid cycle.
//!
//! `()` implements [`InnerProduct`] for `Vec<T>`, so solvers can stay generic over the
//! vector type the same way they stay generic over the operator. With the `rayon` feature
//! enabled the reductions and updates run on the current rayon pool, so the accumulation
//! order (and therefore the last bits of the result) depends on the pool size.
//!
//! # References
//! - [num-traits crate documentation](https://docs.rs/num-traits)

use crate::core::traits::InnerProduct;
use num_traits::Float;

/// NaN-propagating maximum: a NaN anywhere makes the result NaN.
#[inline]
fn nan_max<T: Float>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else if b > a {
        b
    } else {
        a
    }
}

impl<T: Float + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the max-norm of a vector. NaN entries propagate.
    fn abs_max(&self, x: &Vec<T>) -> T {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .map(|xi| xi.abs())
                .reduce(|| T::zero(), nan_max)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter().map(|xi| xi.abs()).fold(T::zero(), nan_max)
        }
    }
}

/// `y += alpha * x`.
pub fn add_scaled<T: Float + Send + Sync>(alpha: T, x: &[T], y: &mut [T]) {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        y.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(yi, xi)| *yi = *yi + alpha * *xi);
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi = *yi + alpha * *xi;
        }
    }
}

/// `s = beta * s + z`, the PCG search-direction update.
pub fn scale_and_add<T: Float + Send + Sync>(beta: T, s: &mut [T], z: &[T]) {
    assert_eq!(s.len(), z.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        s.par_iter_mut()
            .zip(z.par_iter())
            .for_each(|(si, zi)| *si = beta * *si + *zi);
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (si, zi) in s.iter_mut().zip(z) {
            *si = beta * *si + *zi;
        }
    }
}
