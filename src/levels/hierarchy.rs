//! Storage of a multigrid hierarchy.

use crate::matrix::FixedSparseMatrix;
use crate::solver::direct_lu::CoarseLu;
use crate::utils::coloring::Coloring;

/// One level of the hierarchy. Level 0 is the finest.
#[derive(Clone, Debug)]
pub struct Level<T> {
    /// Operator `A_i`.
    pub a: FixedSparseMatrix<T>,
    /// Restriction `R_i` to level `i + 1`; empty on the coarsest level.
    pub r: FixedSparseMatrix<T>,
    /// Prolongation `P_i` from level `i + 1`; empty on the coarsest level.
    pub p: FixedSparseMatrix<T>,
    pub coloring: Coloring,
}

impl<T> Default for Level<T> {
    fn default() -> Self {
        Self {
            a: FixedSparseMatrix::default(),
            r: FixedSparseMatrix::default(),
            p: FixedSparseMatrix::default(),
            coloring: Coloring::Pattern(Vec::new()),
        }
    }
}

impl<T: num_traits::Float + Send + Sync> Level<T> {
    pub fn unknowns(&self) -> usize {
        self.a.nrows()
    }

    fn clear(&mut self) {
        self.a.clear();
        self.r.clear();
        self.p.clear();
        match &mut self.coloring {
            Coloring::Pattern(p) => p.clear(),
            grid => *grid = Coloring::Pattern(Vec::new()),
        }
    }
}

/// Levels `0..depth`, plus the optional factorization of the coarsest one.
///
/// Slots beyond `depth` are kept around with cleared contents so a cached hierarchy
/// can be rebuilt without reallocating every buffer.
#[derive(Debug, Default)]
pub struct Hierarchy<T> {
    slots: Vec<Level<T>>,
    depth: usize,
    pub(crate) coarse_lu: Option<CoarseLu>,
}

impl<T: num_traits::Float + Send + Sync> Hierarchy<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            depth: 0,
            coarse_lu: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    pub fn levels(&self) -> &[Level<T>] {
        &self.slots[..self.depth]
    }

    pub fn level(&self, i: usize) -> &Level<T> {
        &self.levels()[i]
    }

    pub fn coarse_lu(&self) -> Option<&CoarseLu> {
        self.coarse_lu.as_ref()
    }

    /// Append a level slot, reusing a cleared one when available.
    pub(crate) fn push_slot(&mut self) -> &mut Level<T> {
        if self.depth == self.slots.len() {
            self.slots.push(Level::default());
        }
        self.depth += 1;
        &mut self.slots[self.depth - 1]
    }

    /// Mutable access to two adjacent levels `(i, i + 1)`.
    pub(crate) fn pair_mut(&mut self, i: usize) -> (&mut Level<T>, &mut Level<T>) {
        let (lo, hi) = self.slots[..self.depth].split_at_mut(i + 1);
        (&mut lo[i], &mut hi[0])
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Level<T>> {
        self.slots[..self.depth].last_mut()
    }

    /// Release every level's contents; buffers stay allocated for reuse.
    pub fn clear(&mut self) {
        for level in &mut self.slots {
            level.clear();
        }
        self.depth = 0;
        self.coarse_lu = None;
    }

    /// Total stored nonzeros over all operators.
    pub fn nnz(&self) -> usize {
        self.levels()
            .iter()
            .map(|l| l.a.nnz() + l.r.nnz() + l.p.nnz())
            .sum()
    }
}
