/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for input validation, distance-matrix assembly, evaluation, and centre selection.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    errors::{GeodesicRbfError, Result},
    geodesic::{GeodesicMetric, SurfacePoint},
};
use faer::{Mat, MatRef};
use geodesic_rbf_utils::KernelParams;
use rand::rngs::StdRng;
use rand::{SeedableRng, seq::index};
use rayon::prelude::*;

/// Picks `k` distinct vertex indices out of `num_vertices`, in ascending order.
///
/// # Parameters
/// - `num_vertices`: Number of vertices to choose from.
/// - `k`: Number of indices wanted.
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same subset is chosen on every run
///     (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Panics
/// If `k > num_vertices`.
///
/// # Example
/// ```
/// use geodesic_rbf::random_vertex_subset;
///
/// let centres = random_vertex_subset(100, 10, Some(42));
/// assert_eq!(centres.len(), 10);
/// ```
pub fn random_vertex_subset(num_vertices: usize, k: usize, seed: Option<u64>) -> Vec<usize> {
    assert!(
        k <= num_vertices,
        "cannot choose {} vertices out of {}",
        k,
        num_vertices
    );

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut subset = index::sample(&mut rng, num_vertices, k).into_vec();
    subset.sort_unstable();
    subset
}

/// Perform farthest point sampling over the mesh vertices using geodesic distance.
///
/// Starting from `seed_index`, iteratively selects the vertex that maximises
/// the minimum geodesic distance to the vertices already selected. Ties go to
/// the lowest vertex index. Unreachable vertices are never preferred over
/// reachable ones.
///
/// # Returns
/// `num_wanted` vertex indices, in selection order.
///
/// ### Errors
/// - `OutOfRange` if `seed_index` is not a vertex.
/// - `InvalidConfig` if more vertices are wanted than the mesh has.
pub fn farthest_vertex_sampling(
    metric: &GeodesicMetric,
    num_wanted: usize,
    seed_index: usize,
) -> Result<Vec<usize>> {
    let num_vertices = metric.num_vertices();
    metric.mesh().check_vertex(seed_index)?;
    if num_wanted > num_vertices {
        return Err(GeodesicRbfError::invalid_config(format!(
            "cannot choose {} vertices out of {}",
            num_wanted, num_vertices
        )));
    }

    let mut selected = Vec::with_capacity(num_wanted);
    let mut is_selected = vec![false; num_vertices];
    let mut min_dists = vec![f64::INFINITY; num_vertices];

    if num_wanted == 0 {
        return Ok(selected);
    }

    selected.push(seed_index);
    is_selected[seed_index] = true;
    let mut last = seed_index;

    for _ in 1..num_wanted {
        for i in 0..num_vertices {
            if is_selected[i] {
                continue;
            }
            let dist = metric.distance(last, i)?;
            if dist < min_dists[i] {
                min_dists[i] = dist;
            }
        }

        let mut next = None;
        for i in 0..num_vertices {
            if is_selected[i] {
                continue;
            }
            let d = min_dists[i];
            // Unreachable vertices rank below every reachable one.
            let key = if d.is_finite() { d } else { -1.0 };
            match next {
                Some((_, best)) if key <= best => {}
                _ => next = Some((i, key)),
            }
        }

        match next {
            Some((i, _)) => {
                selected.push(i);
                is_selected[i] = true;
                last = i;
            }
            None => break,
        }
    }

    Ok(selected)
}

/// Checks a centre index subset: non-empty, in range and free of duplicates.
pub(crate) fn check_center_indices(indices: &[usize], num_vertices: usize) -> Result<()> {
    if indices.is_empty() {
        return Err(GeodesicRbfError::invalid_config(
            "at least one centre index is required",
        ));
    }

    let mut seen = vec![false; num_vertices];
    for (position, &index) in indices.iter().enumerate() {
        if index >= num_vertices {
            return Err(GeodesicRbfError::invalid_config(format!(
                "centre index {} at position {} is out of range for a mesh with {} vertices",
                index, position, num_vertices
            )));
        }
        if seen[index] {
            return Err(GeodesicRbfError::invalid_config(format!(
                "centre index {} appears more than once",
                index
            )));
        }
        seen[index] = true;
    }

    Ok(())
}

/// Rejects NaN and infinite entries.
pub(crate) fn check_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(GeodesicRbfError::invalid_config(format!(
            "{} entry {} is not finite",
            what, i
        ))),
        None => Ok(()),
    }
}

pub(crate) fn check_finite_mat(values: MatRef<'_, f64>, what: &str) -> Result<()> {
    for j in 0..values.ncols() {
        for i in 0..values.nrows() {
            if !values[(i, j)].is_finite() {
                return Err(GeodesicRbfError::invalid_config(format!(
                    "{} entry ({}, {}) is not finite",
                    what, i, j
                )));
            }
        }
    }
    Ok(())
}

/// Column vector holding `values[indices[i]]` in row `i`.
pub(crate) fn select_values(values: &[f64], indices: &[usize]) -> Mat<f64> {
    Mat::from_fn(indices.len(), 1, |i, _| values[indices[i]])
}

/// Pairwise geodesic distances between the given vertices.
///
/// Only the lower triangle (diagonal included) is computed; the strict upper
/// triangle is left at zero and must not be read.
pub(crate) fn lower_distance_matrix(metric: &GeodesicMetric, indices: &[usize]) -> Result<Mat<f64>> {
    let n = indices.len();
    let mut distances = Mat::<f64>::zeros(n, n);

    for i in 0..n {
        for j in 0..=i {
            distances[(i, j)] = metric.distance(indices[i], indices[j])?;
        }
    }

    Ok(distances)
}

/// Pairwise geodesic distances between all `n` leading vertices, every entry
/// computed, with rows filled in parallel.
pub(crate) fn full_distance_matrix(metric: &GeodesicMetric, n: usize) -> Result<Mat<f64>> {
    let rows = (0..n)
        .into_par_iter()
        .map(|i| (0..n).map(|j| metric.distance(i, j)).collect::<Result<Vec<f64>>>())
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Mat::from_fn(n, n, |i, j| rows[i][j]))
}

/// Evaluates `sum_i phi(d(point, centres[i])) * weights[i]`.
///
/// The terms are accumulated in centre order.
pub(crate) fn evaluate_point(
    metric: &GeodesicMetric,
    params: &KernelParams,
    centers: &[usize],
    weights: MatRef<'_, f64>,
    point: &SurfacePoint,
) -> Result<f64> {
    let mut value = 0.0;
    for (i, &center) in centers.iter().enumerate() {
        let r = metric.distance_to(point, center)?;
        value += params.phi(r) * weights[(i, 0)];
    }
    Ok(value)
}

/// Evaluates many points in parallel into a column vector.
pub(crate) fn evaluate_points(
    metric: &GeodesicMetric,
    params: &KernelParams,
    centers: &[usize],
    weights: MatRef<'_, f64>,
    points: &[SurfacePoint],
) -> Result<Mat<f64>> {
    let values = points
        .par_iter()
        .map(|point| evaluate_point(metric, params, centers, weights, point))
        .collect::<Result<Vec<f64>>>()?;

    Ok(Mat::from_fn(values.len(), 1, |i, _| values[i]))
}
