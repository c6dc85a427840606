//! Galerkin level generation by 2×2×2 cell aggregation.
//!
//! Every coarse unknown is the union of the (active) fine cells that share the cell
//! `(i/2, j/2, k/2)`. Prolongation is piecewise constant, restriction is its
//! transpose, and the coarse operator is `A_{i+1} = R_i · A_i · P_i`. Summing a
//! nearest-neighbour stencil over aggregates yields a nearest-neighbour stencil again,
//! so the red-black coloring of every coarse grid stays valid.

use crate::config::options::{Checks, CoarseSolver, MgOptions};
use crate::error::KError;
use crate::levels::domain::{Domain, LevelCells};
use crate::levels::hierarchy::Hierarchy;
use crate::matrix::FixedSparseMatrix;
use crate::solver::direct_lu::CoarseLu;
use crate::utils::coloring::{Coloring, verify_two_coloring};
use log::debug;
use num_traits::Float;
use std::collections::HashMap;

/// Build the hierarchy for `fine` over `domain` into `out`, reusing its storage.
pub fn generate_levels<T: Float + Send + Sync>(
    fine: &FixedSparseMatrix<T>,
    domain: &Domain<'_>,
    options: &MgOptions,
    out: &mut Hierarchy<T>,
) -> Result<(), KError> {
    out.clear();
    let n = fine.nrows();
    if fine.ncols() != n {
        return Err(KError::DimensionMismatch {
            what: "operator columns",
            expected: n,
            got: fine.ncols(),
        });
    }
    let mut cells = domain.resolve(n, options.checks.contains(Checks::DOMAIN))?;
    {
        let finest = out.push_slot();
        finest.a.copy_from(fine);
        assign_coloring(&mut finest.coloring, &cells);
    }
    debug!("level 0: {} unknowns, {} nonzeros", n, fine.nnz());

    let mut agg = Vec::with_capacity(n);
    let mut triplets: Vec<(usize, usize, T)> = Vec::new();
    while out.depth() < options.max_levels.max(1) && cells.unknowns() > options.coarsest_unknowns {
        let Some(coarse) = aggregate(&cells, &mut agg) else {
            break;
        };
        let i = out.depth() - 1;
        out.push_slot();
        let (fine_level, coarse_level) = out.pair_mut(i);
        let nc = coarse.unknowns();
        build_transfer(&agg, nc, &mut fine_level.p, &mut fine_level.r, &mut triplets);
        galerkin_aggregate(&fine_level.a, &agg, nc, &mut coarse_level.a, &mut triplets);
        assign_coloring(&mut coarse_level.coloring, &coarse);
        debug!(
            "level {}: {} unknowns, {} nonzeros",
            i + 1,
            nc,
            coarse_level.a.nnz()
        );
        cells = coarse;
    }

    for (i, level) in out.levels().iter().enumerate() {
        if options.checks.contains(Checks::COLORING) {
            verify_two_coloring(&level.a, &level.coloring, i)?;
        }
        if options.checks.contains(Checks::SYMMETRY) {
            let tol = num_traits::cast(options.symmetry_tol).unwrap_or_else(T::epsilon);
            if let Some((row, col)) = level.a.find_asymmetry(tol) {
                return Err(KError::NotSymmetric { level: i, row, col });
            }
        }
    }

    if options.coarse_solver == CoarseSolver::DirectLu {
        let coarsest = out.last_mut().ok_or(KError::EmptyHierarchy)?;
        let lu = CoarseLu::factor(&coarsest.a)?;
        debug!("coarsest level factored densely ({} unknowns)", lu.n());
        out.coarse_lu = Some(lu);
    }
    debug!("hierarchy built: {} levels, {} stored nonzeros", out.depth(), out.nnz());
    Ok(())
}

fn assign_coloring(coloring: &mut Coloring, cells: &LevelCells) {
    match cells {
        LevelCells::Grid(dims) => *coloring = Coloring::Grid(*dims),
        LevelCells::Compact { coords, .. } => {
            let mut pattern = match std::mem::replace(coloring, Coloring::Pattern(Vec::new())) {
                Coloring::Pattern(p) => p,
                Coloring::Grid(_) => Vec::new(),
            };
            pattern.clear();
            pattern.extend(coords.iter().map(|c| (c[0] + c[1] + c[2]) % 2 == 1));
            *coloring = Coloring::Pattern(pattern);
        }
    }
}

/// Fill `agg[fine] = coarse` and return the coarse layout, or `None` when the level
/// cannot be reduced any further.
fn aggregate(cells: &LevelCells, agg: &mut Vec<usize>) -> Option<LevelCells> {
    agg.clear();
    match cells {
        LevelCells::Grid(dims) => {
            let cdims = dims.coarsen();
            if cdims == *dims {
                return None;
            }
            agg.extend((0..dims.cells()).map(|idx| {
                let [i, j, k] = dims.coords(idx);
                cdims.index(i / 2, j / 2, k / 2)
            }));
            Some(LevelCells::Grid(cdims))
        }
        LevelCells::Compact { dims, coords } => {
            let cdims = dims.coarsen();
            let mut slot: HashMap<[usize; 3], usize> = HashMap::with_capacity(coords.len() / 4 + 1);
            let mut ccoords = Vec::new();
            for c in coords {
                let key = [c[0] / 2, c[1] / 2, c[2] / 2];
                let idx = *slot.entry(key).or_insert_with(|| {
                    ccoords.push(key);
                    ccoords.len() - 1
                });
                agg.push(idx);
            }
            if ccoords.len() == coords.len() {
                return None;
            }
            Some(LevelCells::Compact { dims: cdims, coords: ccoords })
        }
    }
}

/// P[f, agg[f]] = 1 and R = Pᵀ.
fn build_transfer<T: Float + Send + Sync>(
    agg: &[usize],
    nc: usize,
    p: &mut FixedSparseMatrix<T>,
    r: &mut FixedSparseMatrix<T>,
    triplets: &mut Vec<(usize, usize, T)>,
) {
    triplets.clear();
    triplets.extend(agg.iter().enumerate().map(|(f, &c)| (f, c, T::one())));
    p.rebuild_from_sorted(agg.len(), nc, triplets);
    for t in triplets.iter_mut() {
        *t = (t.1, t.0, t.2);
    }
    triplets.sort_unstable_by_key(|t| (t.0, t.1));
    r.rebuild_from_sorted(nc, agg.len(), triplets);
}

/// Coarse[agg[f], agg[g]] = Σ A[f, g], which equals `Pᵀ A P` for the aggregation P.
fn galerkin_aggregate<T: Float + Send + Sync>(
    a: &FixedSparseMatrix<T>,
    agg: &[usize],
    nc: usize,
    coarse: &mut FixedSparseMatrix<T>,
    triplets: &mut Vec<(usize, usize, T)>,
) {
    triplets.clear();
    for (f, &cf) in agg.iter().enumerate() {
        let (cols, vals) = a.row(f);
        triplets.extend(cols.iter().zip(vals).map(|(&g, &v)| (cf, agg[g], v)));
    }
    triplets.sort_unstable_by_key(|t| (t.0, t.1));
    coarse.rebuild_from_sorted(nc, nc, triplets);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::domain::GridDims;
    use crate::matrix::DynamicSparseMatrix;
    use approx::assert_abs_diff_eq;

    fn laplacian(dims: GridDims) -> FixedSparseMatrix<f64> {
        let mut m = DynamicSparseMatrix::new(dims.cells());
        for idx in 0..dims.cells() {
            let [i, j, k] = dims.coords(idx);
            m.set_element(idx, idx, 6.0);
            let mut link = |c: [usize; 3]| m.set_element(idx, dims.index(c[0], c[1], c[2]), -1.0);
            if i > 0 { link([i - 1, j, k]); }
            if i + 1 < dims.ni { link([i + 1, j, k]); }
            if j > 0 { link([i, j - 1, k]); }
            if j + 1 < dims.nj { link([i, j + 1, k]); }
            if k > 0 { link([i, j, k - 1]); }
            if k + 1 < dims.nk { link([i, j, k + 1]); }
        }
        FixedSparseMatrix::from_dynamic(&m)
    }

    #[test]
    fn regular_grid_coarsens_to_limit() {
        let dims = GridDims::new(9, 8, 8);
        let a = laplacian(dims);
        let opts = MgOptions::default().with_coarsest_unknowns(8);
        let mut h = Hierarchy::new();
        generate_levels(&a, &Domain::Regular(dims), &opts, &mut h).unwrap();
        let sizes: Vec<usize> = h.levels().iter().map(|l| l.unknowns()).collect();
        assert_eq!(sizes, vec![576, 80, 12, 2]);
        assert_eq!(h.level(0).p.ncols(), 80);
        assert_eq!(h.level(0).r.nrows(), 80);
        assert_eq!(h.level(3).r.nnz(), 0);
    }

    #[test]
    fn coarse_operator_is_galerkin_product() {
        let dims = GridDims::new(4, 4, 2);
        let a = laplacian(dims);
        let opts = MgOptions::default().with_coarsest_unknowns(4).with_max_levels(2);
        let mut h = Hierarchy::new();
        generate_levels(&a, &Domain::Regular(dims), &opts, &mut h).unwrap();
        let l0 = h.level(0);
        let (r, ad, p) = (l0.r.to_dense(), a.to_dense(), l0.p.to_dense());
        let rap = &r * &ad * &p;
        let coarse = h.level(1).a.to_dense();
        for i in 0..coarse.nrows() {
            for j in 0..coarse.ncols() {
                assert_abs_diff_eq!(coarse[(i, j)], rap[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn masked_levels_carry_patterns_and_stay_two_colorable() {
        let dims = GridDims::new(6, 6, 1);
        // L-shaped active region
        let mask: Vec<bool> = (0..dims.cells())
            .map(|c| {
                let [i, j, _] = dims.coords(c);
                i < 3 || j < 3
            })
            .collect();
        let mut table = vec![0; dims.cells()];
        let mut coords = Vec::new();
        for c in 0..dims.cells() {
            if mask[c] {
                table[c] = coords.len();
                coords.push(dims.coords(c));
            }
        }
        let n = coords.len();
        let mut m = DynamicSparseMatrix::new(n);
        for (u, c) in coords.iter().enumerate() {
            m.set_element(u, u, 4.0);
            for (di, dj) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                let (ni, nj) = (c[0] as i64 + di, c[1] as i64 + dj);
                if ni < 0 || nj < 0 || ni >= 6 || nj >= 6 {
                    continue;
                }
                let cell = dims.index(ni as usize, nj as usize, 0);
                if mask[cell] {
                    m.set_element(u, table[cell], -1.0);
                }
            }
        }
        let a = FixedSparseMatrix::from_dynamic(&m);
        let opts = MgOptions::default().with_coarsest_unknowns(1);
        let mut h = Hierarchy::new();
        let domain = Domain::Masked { mask: &mask, index_table: &table, dims };
        generate_levels(&a, &domain, &opts, &mut h).unwrap();
        assert_eq!(h.level(0).unknowns(), 27);
        assert_eq!(h.level(1).unknowns(), 8);
        assert!(h.levels().iter().all(|l| matches!(l.coloring, Coloring::Pattern(_))));
        assert!(h.levels().iter().all(|l| l.coloring.len() == l.unknowns()));
    }

    #[test]
    fn rebuild_into_cached_hierarchy_resets_depth() {
        let mut h = Hierarchy::new();
        let opts = MgOptions::default().with_coarsest_unknowns(1);
        let big = GridDims::new(8, 8, 8);
        generate_levels(&laplacian(big), &Domain::Regular(big), &opts, &mut h).unwrap();
        assert_eq!(h.depth(), 4);
        let small = GridDims::new(2, 2, 2);
        generate_levels(&laplacian(small), &Domain::Regular(small), &opts, &mut h).unwrap();
        assert_eq!(h.depth(), 2);
        h.clear();
        assert!(h.is_empty());
    }

    #[test]
    fn direct_lu_is_built_for_coarsest_level() {
        let dims = GridDims::new(4, 4, 4);
        let opts = MgOptions::default()
            .with_coarsest_unknowns(8)
            .with_coarse_solver(CoarseSolver::DirectLu);
        let mut h = Hierarchy::new();
        generate_levels(&laplacian(dims), &Domain::Regular(dims), &opts, &mut h).unwrap();
        assert_eq!(h.coarse_lu().map(|lu| lu.n()), Some(8));
    }

    #[test]
    fn symmetry_check_reports_first_offender() {
        let m = DynamicSparseMatrix::from_triplets(2, &[(0, 0, 2.0), (1, 1, 2.0), (0, 1, -1.0)]);
        let a = FixedSparseMatrix::from_dynamic(&m);
        let opts = MgOptions::default().with_checks(Checks::SYMMETRY);
        let mut h = Hierarchy::new();
        let err = generate_levels(&a, &Domain::Regular(GridDims::new(2, 1, 1)), &opts, &mut h)
            .unwrap_err();
        assert_eq!(err, KError::NotSymmetric { level: 0, row: 0, col: 1 });
    }
}
