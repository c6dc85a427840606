//! Red-black smoothing and the Galerkin hierarchy checked against dense faer solves.
//!
//! The operators are 7-point stencils with random symmetric weights, so they are SPD and
//! red-black colorable but have no constant coefficients to hide behind.

use approx::assert_abs_diff_eq;
use faer::linalg::solvers::SolveCore;
use mgpcg::config::{Checks, MgOptions};
use mgpcg::levels::{Domain, GridDims, Hierarchy, generate_levels};
use mgpcg::matrix::{DynamicSparseMatrix, FixedSparseMatrix};
use mgpcg::preconditioner::{ColorOrder, prolongate_add, red_black_gauss_seidel, restrict_residual};
use mgpcg::utils::Coloring;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-weight 7-point operator on `dims`, diagonally dominant by `shift`.
fn random_stencil(dims: GridDims, shift: f64, seed: u64) -> FixedSparseMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = DynamicSparseMatrix::new(dims.cells());
    for idx in 0..dims.cells() {
        let [i, j, k] = dims.coords(idx);
        let forward = [
            (i + 1 < dims.ni).then(|| dims.index(i + 1, j, k)),
            (j + 1 < dims.nj).then(|| dims.index(i, j + 1, k)),
            (k + 1 < dims.nk).then(|| dims.index(i, j, k + 1)),
        ];
        for other in forward.into_iter().flatten() {
            let w: f64 = rng.gen_range(0.5..1.5);
            m.add_to_element(idx, idx, w);
            m.add_to_element(other, other, w);
            m.add_to_element(idx, other, -w);
            m.add_to_element(other, idx, -w);
        }
        m.add_to_element(idx, idx, shift);
    }
    FixedSparseMatrix::from_dynamic(&m)
}

fn direct_solve(a: &FixedSparseMatrix<f64>, b: &[f64]) -> Vec<f64> {
    let dense = a.to_dense();
    let mut x = b.to_vec();
    let n = x.len();
    let lu = faer::linalg::solvers::PartialPivLu::new(dense.as_ref());
    let x_mat = faer::MatMut::from_column_major_slice_mut(&mut x, n, 1);
    lu.solve_in_place_with_conj(faer::Conj::No, x_mat);
    x
}

#[test]
fn smoothing_reaches_the_direct_solution() {
    let dims = GridDims::new(5, 4, 3);
    let a = random_stencil(dims, 0.1, 1);
    let mut rng = StdRng::seed_from_u64(2);
    let b: Vec<f64> = (0..dims.cells()).map(|_| rng.r#gen::<f64>()).collect();
    let x_direct = direct_solve(&a, &b);

    for order in [ColorOrder::RedFirst, ColorOrder::BlackFirst] {
        let mut x = vec![0.0; dims.cells()];
        red_black_gauss_seidel(&a, &b, &mut x, &Coloring::Grid(dims), 2000, order);
        for (xi, di) in x.iter().zip(&x_direct) {
            assert_abs_diff_eq!(*xi, *di, epsilon = 1e-9);
        }
    }
}

#[test]
fn compact_pattern_smoothing_matches_grid_smoothing() {
    let dims = GridDims::new(4, 4, 4);
    let a = random_stencil(dims, 0.5, 3);
    let b: Vec<f64> = (0..dims.cells()).map(|i| (i as f64 * 0.7).sin()).collect();
    let coords: Vec<[usize; 3]> = (0..dims.cells()).map(|u| dims.coords(u)).collect();

    let mut x_grid = vec![0.0; dims.cells()];
    let mut x_pattern = vec![0.0; dims.cells()];
    red_black_gauss_seidel(&a, &b, &mut x_grid, &Coloring::Grid(dims), 3, ColorOrder::RedFirst);
    red_black_gauss_seidel(&a, &b, &mut x_pattern, &Coloring::from_coords(&coords), 3, ColorOrder::RedFirst);
    assert_eq!(x_grid, x_pattern);
}

#[test]
fn galerkin_levels_stay_symmetric_and_colorable() {
    let dims = GridDims::new(9, 7, 6);
    let a = random_stencil(dims, 0.01, 4);
    let opts = MgOptions::default()
        .with_coarsest_unknowns(4)
        .with_checks(Checks::all());
    let mut h = Hierarchy::new();
    generate_levels(&a, &Domain::Regular(dims), &opts, &mut h).unwrap();
    assert!(h.depth() >= 3);
    for level in h.levels() {
        let n = level.unknowns();
        // positive definiteness survives coarsening: a dense solve of every level works
        let x = direct_solve(&level.a, &vec![1.0; n]);
        assert!(x.iter().all(|v| v.is_finite() && *v > 0.0));
    }
}

#[test]
fn zero_correction_after_restriction_keeps_iterate() {
    let dims = GridDims::new(6, 6, 6);
    let a = random_stencil(dims, 0.2, 5);
    let opts = MgOptions::default().with_coarsest_unknowns(8);
    let mut h = Hierarchy::new();
    generate_levels(&a, &Domain::Regular(dims), &opts, &mut h).unwrap();
    let fine = h.level(0);
    let coarse_n = h.level(1).unknowns();

    let x: Vec<f64> = (0..dims.cells()).map(|i| (i as f64).cos()).collect();
    let b = vec![1.0; dims.cells()];
    let mut b_coarse = vec![0.0; coarse_n];
    restrict_residual(&fine.r, &fine.a, &x, &b, &mut b_coarse);
    assert!(b_coarse.iter().any(|&v| v != 0.0));

    let mut x_after = x.clone();
    prolongate_add(&fine.p, &vec![0.0; coarse_n], &mut x_after);
    assert_eq!(x_after, x);
}
