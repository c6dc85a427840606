//! Operators and helpers shared by the integration tests.
#![allow(dead_code)]

use mgpcg::levels::GridDims;
use mgpcg::matrix::{DynamicSparseMatrix, FixedSparseMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Every cell of `dims` in linear-index order.
pub fn all_cells(dims: GridDims) -> Vec<[usize; 3]> {
    (0..dims.cells()).map(|idx| dims.coords(idx)).collect()
}

/// 7-point Laplacian (diagonal 6, off-diagonal -1) over the listed cells, with
/// homogeneous Dirichlet conditions towards every missing neighbour.
pub fn laplacian_on_cells(cells: &[[usize; 3]]) -> DynamicSparseMatrix<f64> {
    let index: HashMap<[usize; 3], usize> = cells.iter().enumerate().map(|(u, c)| (*c, u)).collect();
    let mut m = DynamicSparseMatrix::new(cells.len());
    for (u, &[i, j, k]) in cells.iter().enumerate() {
        m.set_element(u, u, 6.0);
        let neighbours = [
            i.checked_sub(1).map(|i| [i, j, k]),
            Some([i + 1, j, k]),
            j.checked_sub(1).map(|j| [i, j, k]),
            Some([i, j + 1, k]),
            k.checked_sub(1).map(|k| [i, j, k]),
            Some([i, j, k + 1]),
        ];
        for c in neighbours.into_iter().flatten() {
            if let Some(&v) = index.get(&c) {
                m.set_element(u, v, -1.0);
            }
        }
    }
    m
}

pub fn laplacian(dims: GridDims) -> DynamicSparseMatrix<f64> {
    laplacian_on_cells(&all_cells(dims))
}

pub fn random_rhs(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.r#gen::<f64>() - 0.5).collect()
}

/// max |b - A x|
pub fn residual_max(a: &DynamicSparseMatrix<f64>, b: &[f64], x: &[f64]) -> f64 {
    let fixed = FixedSparseMatrix::from_dynamic(a);
    let mut r = b.to_vec();
    fixed.multiply_and_subtract(x, &mut r);
    r.iter().fold(0.0, |m, v| m.max(v.abs()))
}

pub fn abs_max(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}
