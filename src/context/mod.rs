//! Solver contexts.
//!
//! - [`mg_context`]: the reusable storage of a multigrid-preconditioned solve.

pub mod mg_context;
pub use mg_context::MgContext;
