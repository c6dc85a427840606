//! Red-black two-coloring of the unknowns of a hierarchy level.
//!
//! A structured level colors unknown `(i, j, k)` by `(i + j + k) mod 2`; a masked or
//! sparse level carries an explicit boolean pattern. Parallel Gauss-Seidel is only a
//! Gauss-Seidel iteration if no two unknowns of one color are coupled, which
//! [`verify_two_coloring`] checks against the level operator.

use crate::error::KError;
use crate::levels::domain::GridDims;
use crate::matrix::FixedSparseMatrix;
use num_traits::Float;

/// Color assignment of one level. `true` / odd parity is "red".
#[derive(Clone, Debug, PartialEq)]
pub enum Coloring {
    /// Every cell of the box is an unknown; color from grid parity.
    Grid(GridDims),
    /// One entry per unknown.
    Pattern(Vec<bool>),
}

impl Coloring {
    /// Pattern coloring from per-unknown cell coordinates.
    pub fn from_coords(coords: &[[usize; 3]]) -> Self {
        Coloring::Pattern(coords.iter().map(|c| (c[0] + c[1] + c[2]) % 2 == 1).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Coloring::Grid(dims) => dims.cells(),
            Coloring::Pattern(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_red(&self, idx: usize) -> bool {
        match self {
            Coloring::Grid(dims) => {
                let [i, j, k] = dims.coords(idx);
                (i + j + k) % 2 == 1
            }
            Coloring::Pattern(p) => p[idx],
        }
    }

    /// Number of (red, black) unknowns.
    pub fn color_counts(&self) -> (usize, usize) {
        let red = (0..self.len()).filter(|&i| self.is_red(i)).count();
        (red, self.len() - red)
    }
}

/// Fails with the first off-diagonal nonzero that couples two unknowns of the same color.
pub fn verify_two_coloring<T: Float + Send + Sync>(
    a: &FixedSparseMatrix<T>,
    coloring: &Coloring,
    level: usize,
) -> Result<(), KError> {
    if coloring.len() != a.nrows() {
        return Err(KError::DimensionMismatch {
            what: "coloring length",
            expected: a.nrows(),
            got: coloring.len(),
        });
    }
    let conflict_in_row = |row: usize| {
        let (cols, vals) = a.row(row);
        let red = coloring.is_red(row);
        cols.iter()
            .zip(vals)
            .find(|&(&col, &v)| col != row && v != T::zero() && coloring.is_red(col) == red)
            .map(|(&col, _)| (row, col))
    };
    #[cfg(feature = "rayon")]
    let conflict = {
        use rayon::prelude::*;
        (0..a.nrows()).into_par_iter().find_map_first(conflict_in_row)
    };
    #[cfg(not(feature = "rayon"))]
    let conflict = (0..a.nrows()).find_map(conflict_in_row);

    match conflict {
        Some((row, col)) => Err(KError::ColoringConflict { level, row, col }),
        None => Ok(()),
    }
}
