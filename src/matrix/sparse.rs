//! Sparse operators: a mutable row-list matrix used during assembly and an
//! immutable CSR matrix used by every kernel of the solve.

use crate::core::traits::MatVec;
use crate::error::KError;
use num_traits::Float;

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Square assembly-time matrix with sorted per-row `(column, value)` lists.
///
/// Cheap to insert into, slow to multiply with; convert it into a
/// [`FixedSparseMatrix`] before solving.
#[derive(Clone, Debug)]
pub struct DynamicSparseMatrix<T> {
    n: usize,
    index: Vec<Vec<usize>>,
    value: Vec<Vec<T>>,
}

impl<T: Float> DynamicSparseMatrix<T> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            index: vec![Vec::new(); n],
            value: vec![Vec::new(); n],
        }
    }

    /// Build from `(row, col, value)` triplets; duplicates are summed.
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, T)]) -> Self {
        let mut m = Self::new(n);
        for &(i, j, v) in triplets {
            m.add_to_element(i, j, v);
        }
        m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn resize(&mut self, n: usize) {
        self.n = n;
        self.index.resize(n, Vec::new());
        self.value.resize(n, Vec::new());
    }

    /// Drop every entry but keep the dimension.
    pub fn zero(&mut self) {
        for (idx, val) in self.index.iter_mut().zip(self.value.iter_mut()) {
            idx.clear();
            val.clear();
        }
    }

    pub fn clear(&mut self) {
        self.n = 0;
        self.index.clear();
        self.value.clear();
    }

    pub fn nnz(&self) -> usize {
        self.index.iter().map(Vec::len).sum()
    }

    /// Stored value at `(i, j)`, zero if absent.
    pub fn get(&self, i: usize, j: usize) -> T {
        match self.index[i].binary_search(&j) {
            Ok(pos) => self.value[i][pos],
            Err(_) => T::zero(),
        }
    }

    pub fn set_element(&mut self, i: usize, j: usize, v: T) {
        assert!(i < self.n && j < self.n, "entry ({i}, {j}) outside {0}x{0}", self.n);
        match self.index[i].binary_search(&j) {
            Ok(pos) => self.value[i][pos] = v,
            Err(pos) => {
                self.index[i].insert(pos, j);
                self.value[i].insert(pos, v);
            }
        }
    }

    pub fn add_to_element(&mut self, i: usize, j: usize, v: T) {
        assert!(i < self.n && j < self.n, "entry ({i}, {j}) outside {0}x{0}", self.n);
        match self.index[i].binary_search(&j) {
            Ok(pos) => self.value[i][pos] = self.value[i][pos] + v,
            Err(pos) => {
                self.index[i].insert(pos, j);
                self.value[i].insert(pos, v);
            }
        }
    }

    /// Row `i` as parallel column / value slices, columns ascending.
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        (&self.index[i], &self.value[i])
    }
}

impl<T: Float> SparseMatrix<T> for DynamicSparseMatrix<T> {
    fn nrows(&self) -> usize {
        self.n
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.n);
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.index[i]
                .iter()
                .zip(&self.value[i])
                .fold(T::zero(), |acc, (&j, &v)| acc + v * x[j]);
        }
    }
}

/// Immutable compressed-row operator.
///
/// Built once per solve from a [`DynamicSparseMatrix`] (or from raw CSR arrays for
/// transfer operators) and only read afterwards. `clear` keeps the allocations so a
/// cached operator can be rebuilt in place on the next solve.
#[derive(Clone, Debug)]
pub struct FixedSparseMatrix<T> {
    nrows: usize,
    ncols: usize,
    pub row_start: Vec<usize>,
    pub col_index: Vec<usize>,
    pub value: Vec<T>,
}

impl<T> Default for FixedSparseMatrix<T> {
    fn default() -> Self {
        Self {
            nrows: 0,
            ncols: 0,
            row_start: vec![0],
            col_index: Vec::new(),
            value: Vec::new(),
        }
    }
}

impl<T: Float + Send + Sync> FixedSparseMatrix<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a CSR from raw row‐start, column-index and value arrays.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_start: Vec<usize>,
        col_index: Vec<usize>,
        value: Vec<T>,
    ) -> Result<Self, KError> {
        if row_start.len() != nrows + 1 {
            return Err(KError::DimensionMismatch {
                what: "CSR row_start",
                expected: nrows + 1,
                got: row_start.len(),
            });
        }
        if col_index.len() != value.len() {
            return Err(KError::DimensionMismatch {
                what: "CSR values",
                expected: col_index.len(),
                got: value.len(),
            });
        }
        if row_start[0] != 0
            || row_start.windows(2).any(|w| w[0] > w[1])
            || row_start[nrows] != col_index.len()
        {
            return Err(KError::InvalidDomain("CSR row_start is not a monotone prefix".into()));
        }
        if let Some(&bad) = col_index.iter().find(|&&c| c >= ncols) {
            return Err(KError::DimensionMismatch {
                what: "CSR column index",
                expected: ncols,
                got: bad,
            });
        }
        Ok(Self { nrows, ncols, row_start, col_index, value })
    }

    pub fn from_dynamic(m: &DynamicSparseMatrix<T>) -> Self {
        let mut fixed = Self::new();
        fixed.construct_from_matrix(m);
        fixed
    }

    /// Rebuild from an assembly matrix, reusing this matrix's allocations.
    pub fn construct_from_matrix(&mut self, m: &DynamicSparseMatrix<T>) {
        self.nrows = m.n();
        self.ncols = m.n();
        self.row_start.clear();
        self.col_index.clear();
        self.value.clear();
        self.row_start.reserve(m.n() + 1);
        self.col_index.reserve(m.nnz());
        self.value.reserve(m.nnz());
        self.row_start.push(0);
        for i in 0..m.n() {
            let (cols, vals) = m.row(i);
            self.col_index.extend_from_slice(cols);
            self.value.extend_from_slice(vals);
            self.row_start.push(self.col_index.len());
        }
    }

    /// Overwrite with a copy of `other`, reusing this matrix's allocations.
    pub fn copy_from(&mut self, other: &Self) {
        self.nrows = other.nrows;
        self.ncols = other.ncols;
        self.row_start.clone_from(&other.row_start);
        self.col_index.clone_from(&other.col_index);
        self.value.clone_from(&other.value);
    }

    /// Rebuild from `(row, col, value)` triplets sorted by `(row, col)`.
    /// Duplicate positions are summed; rows without triplets stay empty.
    pub fn rebuild_from_sorted(&mut self, nrows: usize, ncols: usize, triplets: &[(usize, usize, T)]) {
        self.clear();
        self.nrows = nrows;
        self.ncols = ncols;
        self.row_start.reserve(nrows);
        let mut row = 0;
        for &(i, j, v) in triplets {
            debug_assert!(i < nrows && j < ncols);
            while row < i {
                self.row_start.push(self.col_index.len());
                row += 1;
            }
            let start = self.row_start[row];
            if self.col_index.len() > start && self.col_index.last() == Some(&j) {
                if let Some(last) = self.value.last_mut() {
                    *last = *last + v;
                }
            } else {
                self.col_index.push(j);
                self.value.push(v);
            }
        }
        while row < nrows {
            self.row_start.push(self.col_index.len());
            row += 1;
        }
    }

    /// Release the contents, keep the buffers.
    pub fn clear(&mut self) {
        self.nrows = 0;
        self.ncols = 0;
        self.row_start.clear();
        self.row_start.push(0);
        self.col_index.clear();
        self.value.clear();
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.value.len()
    }

    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let range = self.row_start[i]..self.row_start[i + 1];
        (&self.col_index[range.clone()], &self.value[range])
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        let (cols, vals) = self.row(i);
        cols.iter()
            .zip(vals)
            .filter(|(c, _)| **c == j)
            .fold(T::zero(), |acc, (_, &v)| acc + v)
    }

    /// Diagonal entry of row `i` (zero when not stored).
    pub fn diagonal(&self, i: usize) -> T {
        self.get(i, i)
    }

    /// y = A·x.
    pub fn multiply(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols, "Input vector x has incorrect length");
        assert_eq!(y.len(), self.nrows, "Output vector y has incorrect length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }

    /// y -= A·x.
    pub fn multiply_and_subtract(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols, "Input vector x has incorrect length");
        assert_eq!(y.len(), self.nrows, "Output vector y has incorrect length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = *yi - self.row_dot(i, x));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = *yi - self.row_dot(i, x);
            }
        }
    }

    /// y += A·x.
    pub fn multiply_and_add(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols, "Input vector x has incorrect length");
        assert_eq!(y.len(), self.nrows, "Output vector y has incorrect length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = *yi + self.row_dot(i, x));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = *yi + self.row_dot(i, x);
            }
        }
    }

    #[inline]
    fn row_dot(&self, i: usize, x: &[T]) -> T {
        let (cols, vals) = self.row(i);
        cols.iter()
            .zip(vals)
            .fold(T::zero(), |acc, (&j, &v)| acc + v * x[j])
    }

    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.ncols + 1];
        for &c in &self.col_index {
            counts[c + 1] += 1;
        }
        for c in 0..self.ncols {
            counts[c + 1] += counts[c];
        }
        let row_start = counts.clone();
        let mut next = counts;
        let mut col_index = vec![0; self.nnz()];
        let mut value = vec![T::zero(); self.nnz()];
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            for (&c, &v) in cols.iter().zip(vals) {
                col_index[next[c]] = i;
                value[next[c]] = v;
                next[c] += 1;
            }
        }
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            row_start,
            col_index,
            value,
        }
    }

    /// First `(row, col)` with `|A[row,col] - A[col,row]| > tol·max(|A[row,col]|, 1)`.
    pub fn find_asymmetry(&self, tol: T) -> Option<(usize, usize)> {
        if self.nrows != self.ncols {
            return Some((self.nrows, self.ncols));
        }
        (0..self.nrows).find_map(|i| {
            let (cols, vals) = self.row(i);
            cols.iter().zip(vals).find_map(|(&j, &v)| {
                let scale = v.abs().max(T::one());
                ((v - self.get(j, i)).abs() > tol * scale).then_some((i, j))
            })
        })
    }

    /// Dense copy in double precision.
    pub fn to_dense(&self) -> faer::Mat<f64> {
        let mut dense = faer::Mat::<f64>::zeros(self.nrows, self.ncols);
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[(i, j)] += v.to_f64().unwrap_or(f64::NAN);
            }
        }
        dense
    }
}

impl<T: Float + Send + Sync> SparseMatrix<T> for FixedSparseMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        self.multiply(x, y);
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for FixedSparseMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.multiply(x, y);
    }
}
