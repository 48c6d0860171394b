/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides test functions sampled at mesh vertices for validating and demonstrating interpolation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Test data sampled at the vertices of a [`TriangleMesh`].
//!
//! Vertex coordinates are first mapped onto the unit square using the mesh's
//! `x`/`y` bounding box, so every function behaves the same regardless of the
//! mesh's extent.
use crate::mesh::TriangleMesh;

/// Struct that implements functions to generate per-vertex values for testing
/// geodesic interpolation.
pub struct RBFTestFunctions;

impl RBFTestFunctions {
    /// Franke's two-dimensional test function evaluated at each vertex's
    /// normalised `(x, y)` position:
    /// <div>
    /// $$
    /// \begin{aligned}
    /// F(x,y) &=
    /// \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x-2)^2 + (9y-2)^2}{4}
    /// \right]
    /// + \tfrac{3}{4}\exp\!\left[
    ///     -\frac{(9x+1)^2}{49}
    ///     -\frac{(9y+1)^2}{10}
    /// \right] \\[6pt]
    /// &\quad+ \tfrac{1}{2}\exp\!\left[
    ///     -\frac{(9x-7)^2 + (9y-3)^2}{4}
    /// \right]
    /// - \tfrac{1}{5}\exp\!\left[
    ///     -(9x-4)^2 - (9y-7)^2
    /// \right]
    /// \end{aligned}
    /// $$
    /// </div>
    pub fn franke_on_vertices(mesh: &TriangleMesh) -> Vec<f64> {
        normalised_xy(mesh)
            .into_iter()
            .map(|[x, y]| franke(x, y))
            .collect()
    }

    /// A single Gaussian bump centred on the middle of the mesh:
    /// $$ F(x,y) = \exp\!\left[-8\left((x - \tfrac{1}{2})^2 + (y - \tfrac{1}{2})^2\right)\right] $$
    pub fn smooth_bump(mesh: &TriangleMesh) -> Vec<f64> {
        normalised_xy(mesh)
            .into_iter()
            .map(|[x, y]| (-8.0 * ((x - 0.5).powi(2) + (y - 0.5).powi(2))).exp())
            .collect()
    }
}

fn franke(x: f64, y: f64) -> f64 {
    let nx = 9.0 * x;
    let ny = 9.0 * y;

    let term1 = 0.75 * (-((nx - 2.0).powi(2) + (ny - 2.0).powi(2)) / 4.0).exp();
    let term2 = 0.75 * (-(nx + 1.0).powi(2) / 49.0 - (ny + 1.0).powi(2) / 10.0).exp();
    let term3 = 0.5 * (-((nx - 7.0).powi(2) + (ny - 3.0).powi(2)) / 4.0).exp();
    let term4 = -0.2 * (-(nx - 4.0).powi(2) - (ny - 7.0).powi(2)).exp();

    term1 + term2 + term3 + term4
}

/// Vertex `(x, y)` mapped onto `[0, 1]²`. A flat extent maps to zero.
fn normalised_xy(mesh: &TriangleMesh) -> Vec<[f64; 2]> {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for v in mesh.vertices() {
        for d in 0..2 {
            min[d] = min[d].min(v[d]);
            max[d] = max[d].max(v[d]);
        }
    }

    let scale = |value: f64, d: usize| {
        let extent = max[d] - min[d];
        if extent > 0.0 {
            (value - min[d]) / extent
        } else {
            0.0
        }
    };

    mesh.vertices()
        .iter()
        .map(|v| [scale(v[0], 0), scale(v[1], 1)])
        .collect()
}
