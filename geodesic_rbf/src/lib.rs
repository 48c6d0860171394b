/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for geodesic RBF interpolation on meshes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Radial Basis Function (RBF) interpolation over triangle meshes using geodesic distance.
//!
//! Classical RBF interpolation measures distance in a straight line. On a
//! curved or folded surface that is the wrong notion of "near": two points on
//! either side of a thin ridge are close in space but far apart along the
//! surface. This crate replaces the Euclidean distance with the geodesic
//! (surface-following) distance between mesh vertices and feeds it through the
//! usual radial kernels from [`geodesic_rbf_utils`].
//!
//! Two interpolation strategies are provided:
//!
//! - [`GeodesicRBFInterpolator`] - a direct RBF interpolant over an ordered
//!   subset of mesh vertices, solving the symmetric collocation system
//!   `phi(d(c_i, c_j)) w = f(c_i)`.
//! - [`KansaSolver`] - Kansa's unsymmetric collocation over every vertex,
//!   where the leading rows enforce a supplied linear operator (for example a
//!   discrete Laplacian) and the remaining rows enforce values.
//!
//! Both assemble a dense system and solve it with faer's partial-pivot LU.
//! A system that is not of full rank is not an error: the interpolant
//! records it ([`GeodesicRBFInterpolator::is_singular`]) and keeps zero
//! weights.
//!
//! Geodesic distances come from a [`GeodesicDistance`] service. The default
//! [`EdgeGraphGeodesic`] runs Dijkstra over the mesh edges, which
//! overestimates true geodesics across faces but is exact along edges and
//! fully deterministic. An exact service can be plugged in through the
//! builders.
//!
//! # Features
//! - Seven kernel families, selectable by name
//! - Evaluation at vertices or at arbitrary positions on the surface
//! - Parallel matrix assembly and batch evaluation with rayon
//! - Progress reporting through a [`ProgressSink`](progress::ProgressSink)
//! - Versioned JSON persistence of solved models
//!
//! # Examples
//!
//! ```
//! use geodesic_rbf::{
//!     GeodesicRBFInterpolator,
//!     RBFTestFunctions,
//!     SurfacePoint,
//!     TriangleMesh,
//!     interpolant_config::InterpolantSettings,
//!     random_vertex_subset,
//! };
//! use geodesic_rbf_utils::KernelType;
//! use std::sync::Arc;
//!
//! // A flat 6x6 grid of vertices spanning 5x5 units
//! let mesh = Arc::new(TriangleMesh::grid(6, 6, 5.0, 5.0));
//!
//! // Assign values to every vertex using Franke's function
//! let values = RBFTestFunctions::franke_on_vertices(&mesh);
//!
//! // Use a reproducible random subset of the vertices as centres
//! let centres = random_vertex_subset(mesh.num_vertices(), 12, Some(42));
//!
//! let settings = InterpolantSettings::builder(KernelType::Gaussian)
//!     .epsilon(2.0)
//!     .build();
//!
//! let rbfi = GeodesicRBFInterpolator::builder(mesh, values.clone(), centres.clone(), settings)
//!     .build()
//!     .unwrap();
//! assert!(!rbfi.is_singular());
//!
//! // The interpolant reproduces the data at the centres
//! for &c in &centres {
//!     let fitted = rbfi.evaluate(SurfacePoint::Vertex(c)).unwrap();
//!     assert!((fitted - values[c]).abs() < 1e-8);
//! }
//!
//! // and can be evaluated anywhere on the surface
//! let _ = rbfi.evaluate(SurfacePoint::Position([2.5, 1.2, 0.0])).unwrap();
//! ```
//!
//! # References
//! 1.  Kansa, E. J. (1990). Multiquadrics - A scattered data approximation scheme with
//!     applications to computational fluid-dynamics. Computers & Mathematics with
//!     Applications, 19(8-9), 147-161.
//! 2.  Fasshauer, G., 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.
pub mod interpolant_config;

mod common;

mod errors;

mod geodesic;

pub mod linalg;

mod mesh;

mod model_io;

pub mod progress;

mod rbf;

mod kansa;

mod rtree;

mod rbf_test_functions;

pub use {
    common::{farthest_vertex_sampling, random_vertex_subset},
    errors::{GeodesicRbfError, Result},
    geodesic::{EdgeGraphGeodesic, GeodesicDistance, GeodesicMetric, GeodesicPath, SurfacePoint},
    kansa::{KansaSolver, KansaSolverBuilder},
    linalg::SolveOutcome,
    mesh::TriangleMesh,
    model_io::{ModelIOError, ModelIOResult},
    rbf::{GeodesicRBFInterpolator, GeodesicRBFInterpolatorBuilder},
    rbf_test_functions::RBFTestFunctions,
    rtree::{FaceHit, FaceLocator},
};
