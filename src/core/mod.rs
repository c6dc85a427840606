//! Core traits and vector kernels.

pub mod traits;
pub mod wrappers;

pub use traits::{InnerProduct, MatVec};
pub use wrappers::{add_scaled, scale_and_add};
