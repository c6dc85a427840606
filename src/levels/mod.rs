//! Multigrid hierarchy: domain descriptors, level storage and the Galerkin level generator.

pub mod domain;
pub mod generator;
pub mod hierarchy;

pub use domain::{Domain, GridDims, LevelCells};
pub use generator::generate_levels;
pub use hierarchy::{Hierarchy, Level};
