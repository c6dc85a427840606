//! Domain descriptors: which grid cells carry unknowns, and in what order.

use crate::error::KError;
use std::collections::HashSet;

/// Extents `(ni, nj, nk)` of a cell grid; linear index `i + ni * (j + nj * k)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl GridDims {
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self { ni, nj, nk }
    }

    pub fn cells(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.ni * (j + self.nj * k)
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let slice = self.ni * self.nj;
        [idx % self.ni, (idx % slice) / self.ni, idx / slice]
    }

    pub fn contains(&self, c: [usize; 3]) -> bool {
        c[0] < self.ni && c[1] < self.nj && c[2] < self.nk
    }

    /// Extents after 2×2×2 aggregation; odd extents round up.
    pub fn coarsen(&self) -> Self {
        Self::new(self.ni.div_ceil(2), self.nj.div_ceil(2), self.nk.div_ceil(2))
    }
}

/// The three ways unknowns can be laid out over a grid.
#[derive(Clone, Copy, Debug)]
pub enum Domain<'a> {
    /// Every cell of the box is an unknown, in linear-index order.
    Regular(GridDims),
    /// Cells with `mask[cell]` set are unknowns; `index_table[cell]` is their compact
    /// index. Entries of inactive cells are ignored.
    Masked {
        mask: &'a [bool],
        index_table: &'a [usize],
        dims: GridDims,
    },
    /// Unknown `u` lives in cell `coords[u]`.
    Sparse {
        coords: &'a [[usize; 3]],
        dims: GridDims,
    },
}

/// Cell layout of one hierarchy level.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelCells {
    Grid(GridDims),
    Compact { dims: GridDims, coords: Vec<[usize; 3]> },
}

impl LevelCells {
    pub fn dims(&self) -> GridDims {
        match self {
            LevelCells::Grid(dims) => *dims,
            LevelCells::Compact { dims, .. } => *dims,
        }
    }

    pub fn unknowns(&self) -> usize {
        match self {
            LevelCells::Grid(dims) => dims.cells(),
            LevelCells::Compact { coords, .. } => coords.len(),
        }
    }
}

impl Domain<'_> {
    pub fn dims(&self) -> GridDims {
        match self {
            Domain::Regular(dims) => *dims,
            Domain::Masked { dims, .. } => *dims,
            Domain::Sparse { dims, .. } => *dims,
        }
    }

    /// Resolve the finest-level layout for an operator with `n` unknowns.
    ///
    /// Lengths, bounds and the unknown count are always checked. With `strict` the
    /// compact index range must also be a bijection onto `0..n` (no duplicate indices,
    /// no duplicate coordinates), so every later per-unknown access is in range.
    pub fn resolve(&self, n: usize, strict: bool) -> Result<LevelCells, KError> {
        match *self {
            Domain::Regular(dims) => {
                if dims.cells() != n {
                    return Err(KError::DimensionMismatch {
                        what: "regular grid cells",
                        expected: n,
                        got: dims.cells(),
                    });
                }
                Ok(LevelCells::Grid(dims))
            }
            Domain::Masked { mask, index_table, dims } => {
                resolve_masked(mask, index_table, dims, n, strict)
            }
            Domain::Sparse { coords, dims } => resolve_sparse(coords, dims, n, strict),
        }
    }
}

fn resolve_masked(
    mask: &[bool],
    index_table: &[usize],
    dims: GridDims,
    n: usize,
    strict: bool,
) -> Result<LevelCells, KError> {
    if mask.len() != dims.cells() {
        return Err(KError::DimensionMismatch {
            what: "mask length",
            expected: dims.cells(),
            got: mask.len(),
        });
    }
    if index_table.len() != dims.cells() {
        return Err(KError::DimensionMismatch {
            what: "index table length",
            expected: dims.cells(),
            got: index_table.len(),
        });
    }
    let active = mask.iter().filter(|&&m| m).count();
    if active != n {
        return Err(KError::DimensionMismatch {
            what: "active cells",
            expected: n,
            got: active,
        });
    }
    let mut coords = vec![[0usize; 3]; n];
    let mut seen = if strict { vec![false; n] } else { Vec::new() };
    for (cell, _) in mask.iter().enumerate().filter(|(_, m)| **m) {
        let idx = index_table[cell];
        if idx >= n {
            return Err(KError::InvalidDomain(format!(
                "cell {cell} maps to unknown {idx}, but there are only {n} unknowns"
            )));
        }
        if strict {
            if seen[idx] {
                return Err(KError::InvalidDomain(format!(
                    "unknown {idx} is claimed by more than one active cell"
                )));
            }
            seen[idx] = true;
        }
        coords[idx] = dims.coords(cell);
    }
    Ok(LevelCells::Compact { dims, coords })
}

fn resolve_sparse(
    coords: &[[usize; 3]],
    dims: GridDims,
    n: usize,
    strict: bool,
) -> Result<LevelCells, KError> {
    if coords.len() != n {
        return Err(KError::DimensionMismatch {
            what: "coordinate list length",
            expected: n,
            got: coords.len(),
        });
    }
    if let Some((u, c)) = coords.iter().enumerate().find(|(_, c)| !dims.contains(**c)) {
        return Err(KError::InvalidDomain(format!(
            "unknown {u} at {c:?} lies outside {}x{}x{}",
            dims.ni, dims.nj, dims.nk
        )));
    }
    if strict {
        let mut seen = HashSet::with_capacity(n);
        if let Some(c) = coords.iter().find(|c| !seen.insert(**c)) {
            return Err(KError::InvalidDomain(format!(
                "cell {c:?} carries more than one unknown"
            )));
        }
    }
    Ok(LevelCells::Compact { dims, coords: coords.to_vec() })
}
