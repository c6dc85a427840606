//! Core linear-algebra traits for mgpcg.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products and the max-norm.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖∞ = max |xᵢ|.
    fn abs_max(&self, x: &V) -> Self::Scalar;
}
