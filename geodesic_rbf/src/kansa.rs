/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements Kansa collocation over every mesh vertex with operator and value constrained rows.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Kansa's unsymmetric collocation method on a triangle mesh.
//!
//! Every vertex is a centre. The first `N_i` vertices are "interior" points
//! where a supplied linear operator `L` (an `N_i × N` matrix, for example a
//! discrete Laplacian) must map the interpolant onto the right-hand side; the
//! remaining vertices are value constrained. The collocation matrix is
//!
//! ```text
//! [ coef · (L · K) ]   rows 0..N_i
//! [ K[N_i..N, :]   ]   rows N_i..N
//! ```
//!
//! with `K[i, j] = phi(d(i, j))` over geodesic distance.

use crate::{
    common,
    errors::{GeodesicRbfError, Result},
    geodesic::{GeodesicDistance, GeodesicMetric, GeodesicPath, SurfacePoint},
    interpolant_config::KansaSettings,
    linalg::{self, SolveOutcome},
    mesh::TriangleMesh,
    model_io::{self, ModelIOResult, ModelKind, ModelSnapshot},
    progress::{self, ProgressMsg, ProgressSink},
};
use faer::{Mat, MatRef};
use geodesic_rbf_utils::{self, KernelParams};
use std::{path::Path, sync::Arc, time::Instant};

/// Convenience builder for constructing a [`KansaSolver`].
///
/// The builder should be called via the [`KansaSolver::builder`] method.
pub struct KansaSolverBuilder {
    mesh: Arc<TriangleMesh>,
    operator: Mat<f64>,
    rhs: Vec<f64>,
    num_operator_rows: usize,
    kansa_settings: KansaSettings,
    geodesic_service: Option<Arc<dyn GeodesicDistance>>,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl KansaSolverBuilder {
    fn new(
        mesh: Arc<TriangleMesh>,
        operator: Mat<f64>,
        rhs: Vec<f64>,
        num_operator_rows: usize,
        kansa_settings: KansaSettings,
    ) -> Self {
        Self {
            mesh,
            operator,
            rhs,
            num_operator_rows,
            kansa_settings,
            geodesic_service: None,
            progress_callback: None,
        }
    }

    /// Uses a caller-supplied shortest-path service instead of the default
    /// [`EdgeGraphGeodesic`](crate::EdgeGraphGeodesic).
    pub fn geodesic_service(mut self, service: Arc<dyn GeodesicDistance>) -> Self {
        self.geodesic_service = Some(service);
        self
    }

    /// Optional callback for reporting construction progress.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Assembles and solves the collocation system.
    ///
    /// ### Errors
    /// - `InvalidConfig` if the operator, right-hand side and operator row
    ///   count do not match the mesh, or contain non-finite values.
    /// - `OutOfRange` if the geodesic service is asked about a vertex it does
    ///   not know.
    pub fn build(self) -> Result<KansaSolver> {
        KansaSolver::new(self)
    }
}

/// Kansa collocation solver over every vertex of a triangle mesh.
#[derive(Debug)]
pub struct KansaSolver {
    metric: Arc<GeodesicMetric>,
    kansa_settings: KansaSettings,
    kernel_params: KernelParams,
    num_operator_rows: usize,
    centers: Vec<usize>,
    rhs: Mat<f64>,

    /// Not available on a model loaded from disk.
    coefficient_matrix: Option<Mat<f64>>,
    weights: Mat<f64>,
    is_singular: bool,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl KansaSolver {
    /// Creates a new [`KansaSolverBuilder`].
    ///
    /// - `operator`: the `N_i × N` operator matrix `L`.
    /// - `rhs`: the right-hand side `F`, one entry per vertex.
    /// - `num_operator_rows`: `N_i`, the number of leading vertices whose rows
    ///   are operator constrained.
    pub fn builder(
        mesh: Arc<TriangleMesh>,
        operator: Mat<f64>,
        rhs: Vec<f64>,
        num_operator_rows: usize,
        kansa_settings: KansaSettings,
    ) -> KansaSolverBuilder {
        KansaSolverBuilder::new(mesh, operator, rhs, num_operator_rows, kansa_settings)
    }

    fn new(builder: KansaSolverBuilder) -> Result<Self> {
        let solver_start = Instant::now();

        let KansaSolverBuilder {
            mesh,
            operator,
            rhs,
            num_operator_rows,
            kansa_settings,
            geodesic_service,
            progress_callback,
        } = builder;

        let n = mesh.num_vertices();
        check_inputs(n, operator.as_ref(), &rhs, num_operator_rows, &kansa_settings)?;

        progress::report(&progress_callback, ProgressMsg::Interpolating { num_points: n });

        let metric = Arc::new(match geodesic_service {
            Some(service) => GeodesicMetric::with_service(mesh, service),
            None => GeodesicMetric::new(mesh),
        });

        let kernel_params: KernelParams = kansa_settings.into();

        let distances = common::full_distance_matrix(&metric, n)?;
        let kernel_matrix = geodesic_rbf_utils::get_kernel_matrix(&distances, &kernel_params);
        let coefficient_matrix = linalg::apply_operator(
            operator.as_ref(),
            kernel_matrix.as_ref(),
            kansa_settings.coef,
            num_operator_rows,
        )?;

        progress::report(
            &progress_callback,
            ProgressMsg::MatrixAssembled { nrows: n, ncols: n },
        );

        let rhs = Mat::from_fn(n, 1, |i, _| rhs[i]);
        let outcome = linalg::solve_dense(coefficient_matrix.as_ref(), rhs.as_ref())?;
        let (weights, is_singular) = match outcome {
            SolveOutcome::Solved(weights) => {
                progress::report(&progress_callback, ProgressMsg::SystemSolved);
                (weights, false)
            }
            SolveOutcome::Singular => {
                progress::report(&progress_callback, ProgressMsg::SingularSystem);
                (Mat::zeros(n, 1), true)
            }
        };

        let solver = Self {
            metric,
            kansa_settings,
            kernel_params,
            num_operator_rows,
            centers: (0..n).collect(),
            rhs,
            coefficient_matrix: Some(coefficient_matrix),
            weights,
            is_singular,
            progress_callback,
        };

        if let Some(sink) = &solver.progress_callback {
            let msg = format!(
                "Took {:?} to solve Kansa collocation for {} vertices ({} operator rows) \
                using the following settings:\n\
                Kernel: {}, Epsilon: {}, Coef: {}",
                solver_start.elapsed(),
                n,
                num_operator_rows,
                kansa_settings.kernel_type,
                kansa_settings.epsilon,
                kansa_settings.coef,
            );
            sink.emit(ProgressMsg::Message { message: msg });
        }

        Ok(solver)
    }

    /// `true` if the collocation matrix was not of full rank.
    ///
    /// The weights of a singular solver are all zero.
    pub fn is_singular(&self) -> bool {
        self.is_singular
    }

    pub fn solve_outcome(&self) -> SolveOutcome {
        match self.is_singular {
            true => SolveOutcome::Singular,
            false => SolveOutcome::Solved(self.weights.clone()),
        }
    }

    /// The `N × N` collocation matrix, or `None` for a model loaded from disk.
    pub fn coefficient_matrix(&self) -> Option<MatRef<'_, f64>> {
        self.coefficient_matrix.as_ref().map(|m| m.as_ref())
    }

    /// Weights as an `N × 1` column, in vertex order.
    pub fn weights(&self) -> MatRef<'_, f64> {
        self.weights.as_ref()
    }

    /// The right-hand side `F` as an `N × 1` column.
    pub fn rhs(&self) -> MatRef<'_, f64> {
        self.rhs.as_ref()
    }

    /// `N_i`, the number of operator constrained rows.
    pub fn num_operator_rows(&self) -> usize {
        self.num_operator_rows
    }

    pub fn kansa_settings(&self) -> &KansaSettings {
        &self.kansa_settings
    }

    pub fn metric(&self) -> &Arc<GeodesicMetric> {
        &self.metric
    }

    /// Evaluates `sum_j phi(d(point, j)) * w_j` over every vertex `j`.
    ///
    /// There is no guard against a singular system: a singular solver
    /// evaluates to zero everywhere. Check [`is_singular`](Self::is_singular)
    /// first.
    pub fn evaluate(&self, point: SurfacePoint) -> Result<f64> {
        common::evaluate_point(
            &self.metric,
            &self.kernel_params,
            &self.centers,
            self.weights.as_ref(),
            &point,
        )
    }

    /// Evaluates many points in parallel, returning an `m × 1` column.
    pub fn evaluate_many(&self, points: &[SurfacePoint]) -> Result<Mat<f64>> {
        let start = Instant::now();
        let values = common::evaluate_points(
            &self.metric,
            &self.kernel_params,
            &self.centers,
            self.weights.as_ref(),
            points,
        )?;

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::Message {
                message: format!("Took {:?} to evaluate {} points", start.elapsed(), points.len()),
            });
        }

        Ok(values)
    }

    /// Evaluates the solution at every mesh vertex.
    pub fn evaluate_at_vertices(&self) -> Result<Mat<f64>> {
        let points = self
            .centers
            .iter()
            .map(|&v| SurfacePoint::Vertex(v))
            .collect::<Vec<_>>();
        self.evaluate_many(&points)
    }

    /// Shortest path from `point` to vertex `target`.
    pub fn geodesic_path(&self, point: SurfacePoint, target: usize) -> Result<GeodesicPath> {
        self.metric.geodesic_path(&point, target)
    }

    /// Save this solver to a **JSON envelope** `{ format, version, ... }`.
    ///
    /// The operator matrix and the collocation matrix are not stored.
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Create, Serialize, Flush}` on I/O or serialization
    ///   failures.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> ModelIOResult<()> {
        let snapshot = ModelSnapshot {
            kind: ModelKind::Kansa {
                coef: self.kansa_settings.coef,
                num_operator_rows: self.num_operator_rows,
            },
            mesh: self.metric.mesh().as_ref().clone(),
            kernel_params: self.kernel_params,
            center_indices: self.centers.clone(),
            weights: model_io::column_to_vec(&self.weights),
            is_singular: self.is_singular,
            reduced_values: model_io::column_to_vec(&self.rhs),
        };
        model_io::write_snapshot(path.as_ref(), &snapshot)
    }

    /// Load a solver from a versioned **JSON envelope**, validating format,
    /// version and contents.
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Open, Parse, FormatMismatch, VersionMismatch, Rebuild}`
    ///   as appropriate.
    pub fn load_model<P: AsRef<Path>>(
        path: P,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> ModelIOResult<Self> {
        let expected = ModelKind::Kansa {
            coef: 1.0,
            num_operator_rows: 0,
        };
        let snapshot = model_io::read_snapshot(path.as_ref(), expected)?;

        let weights = snapshot.weights_mat();
        let rhs = snapshot.reduced_values_mat();
        let (coef, num_operator_rows) = match snapshot.kind {
            ModelKind::Kansa {
                coef,
                num_operator_rows,
            } => (coef, num_operator_rows),
            ModelKind::Rbf => (1.0, 0),
        };
        let kernel_params = snapshot.kernel_params;

        Ok(Self {
            metric: Arc::new(GeodesicMetric::new(Arc::new(snapshot.mesh))),
            kansa_settings: KansaSettings::builder(kernel_params.kernel_type)
                .epsilon(kernel_params.epsilon)
                .coef(coef)
                .build(),
            kernel_params,
            num_operator_rows,
            centers: snapshot.center_indices,
            rhs,
            coefficient_matrix: None,
            weights,
            is_singular: snapshot.is_singular,
            progress_callback: progress,
        })
    }
}

fn check_inputs(
    n: usize,
    operator: MatRef<'_, f64>,
    rhs: &[f64],
    num_operator_rows: usize,
    kansa_settings: &KansaSettings,
) -> Result<()> {
    kansa_settings.validate()?;

    if n == 0 {
        return Err(GeodesicRbfError::invalid_config(
            "the mesh has no vertices to collocate at",
        ));
    }
    if rhs.len() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "right-hand side has {} entries for a mesh with {} vertices",
            rhs.len(),
            n
        )));
    }
    if num_operator_rows > n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "{} operator rows requested for a mesh with {} vertices",
            num_operator_rows, n
        )));
    }
    if operator.nrows() != num_operator_rows || operator.ncols() != n {
        return Err(GeodesicRbfError::invalid_config(format!(
            "operator matrix must be {}x{}, got {}x{}",
            num_operator_rows,
            n,
            operator.nrows(),
            operator.ncols()
        )));
    }

    common::check_finite(rhs, "right-hand side")?;
    common::check_finite_mat(operator, "operator")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RBFTestFunctions;
    use equator::assert;
    use faer::{mat, utils::approx::*};
    use geodesic_rbf_utils::{KernelType, kernel_phi};

    fn triangle() -> Arc<TriangleMesh> {
        Arc::new(
            TriangleMesh::new(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![[0, 1, 2]],
            )
            .unwrap(),
        )
    }

    /// Uniform-weight graph Laplacian rows for the first `n_i` vertices.
    fn graph_laplacian(mesh: &TriangleMesh, n_i: usize) -> Mat<f64> {
        let mut l = Mat::<f64>::zeros(n_i, mesh.num_vertices());
        for (a, b) in mesh.edges() {
            for (row, other) in [(a, b), (b, a)] {
                if row < n_i {
                    l[(row, row)] -= 1.0;
                    l[(row, other)] += 1.0;
                }
            }
        }
        l
    }

    #[test]
    fn unit_operator_row_gives_plain_kernel_matrix() {
        let mesh = triangle();
        let solver = KansaSolver::builder(
            mesh.clone(),
            mat![[1.0, 0.0, 0.0f64]],
            vec![1.0, 2.0, 3.0],
            1,
            KansaSettings::default(),
        )
        .build()
        .unwrap();

        let params = KernelParams::builder(KernelType::Multiquadric).build();
        let metric = GeodesicMetric::new(mesh);
        let k = solver.coefficient_matrix().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = kernel_phi(metric.distance(i, j).unwrap(), &params);
                assert!(k[(i, j)] == expected);
            }
        }

        assert!(!solver.is_singular());
        for (i, f) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            assert!((solver.evaluate(SurfacePoint::Vertex(i)).unwrap() - f).abs() < 1e-10);
        }
    }

    #[test]
    fn operator_rows_are_scaled() {
        let mesh = Arc::new(TriangleMesh::grid(4, 4, 3.0, 3.0));
        let n = mesh.num_vertices();
        let n_i = 4;
        let l = graph_laplacian(&mesh, n_i);
        let rhs = RBFTestFunctions::smooth_bump(&mesh);

        let settings = KansaSettings::builder(KernelType::Gaussian)
            .epsilon(0.9)
            .coef(-2.5)
            .build();
        let solver = KansaSolver::builder(mesh.clone(), l.clone(), rhs, n_i, settings)
            .build()
            .unwrap();

        let metric = GeodesicMetric::new(mesh);
        let params: KernelParams = settings.into();
        let k = Mat::<f64>::from_fn(n, n, |i, j| kernel_phi(metric.distance(i, j).unwrap(), &params));
        let upper = &l * &k;

        let c = solver.coefficient_matrix().unwrap();
        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        let expected_upper = Mat::<f64>::from_fn(n_i, n, |i, j| -2.5 * upper[(i, j)]);
        assert!(c.subrows(0, n_i).to_owned() ~ expected_upper);
        for i in n_i..n {
            for j in 0..n {
                assert!(c[(i, j)] == k[(i, j)]);
            }
        }
    }

    #[test]
    fn value_rows_are_reproduced() {
        let mesh = Arc::new(TriangleMesh::grid(5, 5, 4.0, 4.0));
        let n_i = 3;
        let l = graph_laplacian(&mesh, n_i);
        let rhs = RBFTestFunctions::franke_on_vertices(&mesh);

        let settings = KansaSettings::builder(KernelType::Gaussian).epsilon(2.0).build();
        let solver = KansaSolver::builder(mesh.clone(), l, rhs.clone(), n_i, settings)
            .build()
            .unwrap();
        assert!(!solver.is_singular());

        let values = solver.evaluate_at_vertices().unwrap();
        for i in n_i..mesh.num_vertices() {
            assert!((values[(i, 0)] - rhs[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn no_operator_rows_is_plain_interpolation() {
        let mesh = triangle();
        let solver = KansaSolver::builder(
            mesh,
            Mat::<f64>::zeros(0, 3),
            vec![1.0, 2.0, 3.0],
            0,
            KansaSettings::builder(KernelType::InverseQuadric).build(),
        )
        .build()
        .unwrap();

        assert!(!solver.is_singular());
        assert!((solver.evaluate(SurfacePoint::Vertex(2)).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_operator_rows_are_singular() {
        let solver = KansaSolver::builder(
            triangle(),
            Mat::<f64>::zeros(1, 3),
            vec![0.0, 2.0, 3.0],
            1,
            KansaSettings::default(),
        )
        .build()
        .unwrap();

        assert!(solver.is_singular());
        assert!(solver.solve_outcome() == SolveOutcome::Singular);
        assert!(solver.evaluate(SurfacePoint::Vertex(1)).unwrap() == 0.0);
    }

    #[test]
    fn shape_mismatches_fail_fast() {
        let build = |l: Mat<f64>, rhs: Vec<f64>, n_i: usize| {
            KansaSolver::builder(triangle(), l, rhs, n_i, KansaSettings::default()).build()
        };

        for result in [
            // operator rows != N_i
            build(Mat::zeros(2, 3), vec![1.0, 2.0, 3.0], 1),
            // operator columns != N
            build(Mat::zeros(1, 2), vec![1.0, 2.0, 3.0], 1),
            // F too short
            build(Mat::zeros(1, 3), vec![1.0, 2.0], 1),
            // N_i > N
            build(Mat::zeros(4, 3), vec![1.0, 2.0, 3.0], 4),
            // non-finite F
            build(Mat::zeros(1, 3), vec![1.0, f64::NAN, 3.0], 1),
        ] {
            assert!(matches!(result, Err(GeodesicRbfError::InvalidConfig { .. })));
        }

        let bad_coef = KansaSolver::builder(
            triangle(),
            Mat::zeros(1, 3),
            vec![1.0, 2.0, 3.0],
            1,
            KansaSettings::builder(KernelType::Multiquadric)
                .coef(f64::NAN)
                .build(),
        )
        .build();
        assert!(bad_coef.is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let mesh = Arc::new(TriangleMesh::grid(4, 3, 3.0, 2.0));
        let n = mesh.num_vertices();
        let n_i = 2;
        let settings = KansaSettings::builder(KernelType::Gaussian)
            .epsilon(1.7)
            .coef(0.5)
            .build();
        let solver = KansaSolver::builder(
            mesh.clone(),
            graph_laplacian(&mesh, n_i),
            RBFTestFunctions::smooth_bump(&mesh),
            n_i,
            settings,
        )
        .build()
        .unwrap();

        let path = std::env::temp_dir().join(format!(
            "geodesic_rbf_kansa_round_trip_{}.json",
            std::process::id()
        ));
        solver.save_model(&path).unwrap();
        let loaded = KansaSolver::load_model(&path, None).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(loaded.coefficient_matrix().is_none());
        assert!(*loaded.kansa_settings() == settings);
        assert!(loaded.num_operator_rows() == n_i);

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * (n as f64));
        let before = solver.evaluate_at_vertices().unwrap();
        let after = loaded.evaluate_at_vertices().unwrap();
        assert!(after ~ before);

        // An RBF loader must refuse a Kansa file.
        solver.save_model(&path).unwrap();
        let err = crate::GeodesicRBFInterpolator::load_model(&path, None).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, crate::ModelIOError::Rebuild { .. }));
    }

    #[test]
    fn widely_scaled_operator_rows_still_solve() {
        let solver = KansaSolver::builder(
            triangle(),
            mat![[1.0, 0.0, 0.0f64]],
            vec![1.0, 2.0, 3.0],
            1,
            KansaSettings::builder(KernelType::Multiquadric)
                .coef(1e16)
                .build(),
        )
        .build()
        .unwrap();

        assert!(!solver.is_singular());
        assert!((solver.evaluate(SurfacePoint::Vertex(1)).unwrap() - 2.0).abs() < 1e-9);
        assert!((solver.evaluate(SurfacePoint::Vertex(2)).unwrap() - 3.0).abs() < 1e-9);
    }

    /// Claims every vertex pair is out of range.
    #[derive(Debug)]
    struct ShrunkenService;

    impl GeodesicDistance for ShrunkenService {
        fn geodesic_path(&self, _source: &SurfacePoint, target: usize) -> Result<GeodesicPath> {
            Err(GeodesicRbfError::OutOfRange {
                index: target,
                num_vertices: 0,
            })
        }
    }

    #[test]
    fn service_out_of_range_aborts_construction() {
        let result = KansaSolver::builder(
            triangle(),
            mat![[1.0, 0.0, 0.0f64]],
            vec![1.0, 2.0, 3.0],
            1,
            KansaSettings::default(),
        )
        .geodesic_service(Arc::new(ShrunkenService))
        .build();

        assert!(matches!(result, Err(GeodesicRbfError::OutOfRange { .. })));
    }
}
