/////////////////////////////////////////////////////////////////////////////////////////////
//
// Dense direct solves with singular-matrix detection, and operator application for collocation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! The collocation systems assembled by this crate are small enough to be
//! solved directly. [`solve_dense`] factorises with faer's partial pivot LU
//! (the factorisation LAPACK's `gesv` uses) and reports a rank-deficient
//! coefficient matrix as [`SolveOutcome::Singular`] instead of returning a
//! solution full of infinities.

use crate::errors::{GeodesicRbfError, Result};
use faer::{Mat, MatRef, prelude::*};

/// Result of a dense solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// The system was solved; holds the solution.
    Solved(Mat<f64>),

    /// The coefficient matrix is not of full rank (or the solution is not finite).
    Singular,
}

impl SolveOutcome {
    pub fn is_singular(&self) -> bool {
        matches!(self, SolveOutcome::Singular)
    }

    /// The solution, if the system could be solved.
    pub fn solution(&self) -> Option<&Mat<f64>> {
        match self {
            SolveOutcome::Solved(x) => Some(x),
            SolveOutcome::Singular => None,
        }
    }
}

/// Solves `a · x = b` for square `a` with a partial pivot LU factorisation.
///
/// Each row of `a` (and of `b`) is first divided by its largest absolute
/// entry, so the rank test does not depend on how rows are scaled. The
/// system is reported as [`SolveOutcome::Singular`] when
/// - a row of `a` is entirely zero,
/// - a pivot of the equilibrated `U` is zero or not finite,
/// - a pivot is negligible, `|u_kk| <= n · ε · max_k |u_kk|`,
/// - or the computed solution contains non-finite values.
///
/// ### Errors
/// - `InvalidConfig` if `a` is not square or `b` has the wrong number of rows.
pub fn solve_dense(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> Result<SolveOutcome> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "coefficient matrix must be square, got {}x{}",
            n,
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "right-hand side has {} rows but the coefficient matrix has {}",
            b.nrows(),
            n
        )));
    }

    if n == 0 {
        return Ok(SolveOutcome::Solved(Mat::zeros(0, b.ncols())));
    }

    let mut row_scale = vec![0.0f64; n];
    for (i, scale) in row_scale.iter_mut().enumerate() {
        let largest = (0..n).fold(0.0f64, |m, j| m.max(a[(i, j)].abs()));
        if largest == 0.0 || !largest.is_finite() {
            return Ok(SolveOutcome::Singular);
        }
        *scale = largest;
    }
    let a = Mat::<f64>::from_fn(n, n, |i, j| a[(i, j)] / row_scale[i]);
    let b = Mat::<f64>::from_fn(n, b.ncols(), |i, j| b[(i, j)] / row_scale[i]);

    let lu = a.as_ref().partial_piv_lu();

    let u = lu.U();
    let mut max_pivot = 0.0f64;
    for k in 0..n {
        let pivot = u[(k, k)];
        if pivot == 0.0 || !pivot.is_finite() {
            return Ok(SolveOutcome::Singular);
        }
        max_pivot = max_pivot.max(pivot.abs());
    }

    let tolerance = n as f64 * f64::EPSILON * max_pivot;
    if (0..n).any(|k| u[(k, k)].abs() <= tolerance) {
        return Ok(SolveOutcome::Singular);
    }

    let x = lu.solve(b.as_ref());

    let finite = (0..x.ncols()).all(|j| (0..x.nrows()).all(|i| x[(i, j)].is_finite()));
    match finite {
        true => Ok(SolveOutcome::Solved(x)),
        false => Ok(SolveOutcome::Singular),
    }
}

/// Assembles a collocation matrix whose first `n_i` rows apply a linear
/// operator to the kernel matrix:
///
/// - rows `0..n_i` hold `coef · (L · K)`,
/// - rows `n_i..N` hold the matching rows of `K` unchanged.
///
/// `l` is `n_i × N` and `k` is `N × N`.
///
/// ### Errors
/// - `InvalidConfig` if the shapes do not line up or `n_i > N`.
pub fn apply_operator(
    l: MatRef<'_, f64>,
    k: MatRef<'_, f64>,
    coef: f64,
    n_i: usize,
) -> Result<Mat<f64>> {
    let n = k.nrows();
    if k.ncols() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "kernel matrix must be square, got {}x{}",
            n,
            k.ncols()
        )));
    }
    if n_i > n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "{} operator rows requested for a {}x{} system",
            n_i, n, n
        )));
    }
    if l.nrows() != n_i || l.ncols() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "operator matrix must be {}x{}, got {}x{}",
            n_i,
            n,
            l.nrows(),
            l.ncols()
        )));
    }

    let mut coef_mat = k.to_owned();
    if n_i == 0 {
        return Ok(coef_mat);
    }

    let upper = l * k;
    for j in 0..n {
        for i in 0..n_i {
            coef_mat[(i, j)] = coef * upper[(i, j)];
        }
    }

    Ok(coef_mat)
}
