//! Matrix module: assembly-time and fixed sparse operators.

pub mod sparse;
pub use sparse::{DynamicSparseMatrix, FixedSparseMatrix, SparseMatrix};
