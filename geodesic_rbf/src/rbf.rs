/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the geodesic RBF interpolator: a builder, system assembly and solve, evaluation, and persistence.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    common,
    errors::{GeodesicRbfError, Result},
    geodesic::{GeodesicDistance, GeodesicMetric, GeodesicPath, SurfacePoint},
    interpolant_config::InterpolantSettings,
    linalg::{self, SolveOutcome},
    mesh::TriangleMesh,
    model_io::{self, ModelIOResult, ModelKind, ModelSnapshot},
    progress::{self, ProgressMsg, ProgressSink},
};
use faer::{Mat, MatRef};
use geodesic_rbf_utils::{self, KernelParams};
use std::{path::Path, sync::Arc, time::Instant};

/// Convenience builder for constructing a [`GeodesicRBFInterpolator`].
///
/// The builder should be called via the [`GeodesicRBFInterpolator::builder`] method.
pub struct GeodesicRBFInterpolatorBuilder {
    mesh: Arc<TriangleMesh>,
    values: Vec<f64>,
    center_indices: Vec<usize>,
    interpolant_settings: InterpolantSettings,
    geodesic_service: Option<Arc<dyn GeodesicDistance>>,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl GeodesicRBFInterpolatorBuilder {
    /// Creates a new builder with the required inputs:
    /// - `mesh`: the surface the field lives on.
    /// - `values`: one target value per mesh vertex.
    /// - `center_indices`: the vertices used as collocation centres, in order.
    /// - `interpolant_settings`: kernel family and shape parameter.
    fn new(
        mesh: Arc<TriangleMesh>,
        values: Vec<f64>,
        center_indices: Vec<usize>,
        interpolant_settings: InterpolantSettings,
    ) -> Self {
        Self {
            mesh,
            values,
            center_indices,
            interpolant_settings,
            geodesic_service: None,
            progress_callback: None,
        }
    }

    /// Uses a caller-supplied shortest-path service instead of the default
    /// [`EdgeGraphGeodesic`](crate::EdgeGraphGeodesic). The service must have
    /// been built over the same mesh.
    pub fn geodesic_service(mut self, service: Arc<dyn GeodesicDistance>) -> Self {
        self.geodesic_service = Some(service);
        self
    }

    /// Optional callback for reporting construction progress.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Assembles and solves the interpolation system.
    ///
    /// ### Errors
    /// - `InvalidConfig` for inconsistent inputs, detected before any distance
    ///   is computed.
    /// - `OutOfRange` if the geodesic service is asked about a vertex it does
    ///   not know.
    ///
    /// A singular system is not an error, see [`GeodesicRBFInterpolator::is_singular`].
    pub fn build(self) -> Result<GeodesicRBFInterpolator> {
        GeodesicRBFInterpolator::new(
            self.mesh,
            self.values,
            self.center_indices,
            self.interpolant_settings,
            self.geodesic_service,
            self.progress_callback,
        )
    }
}

/// Radial basis function interpolant over a triangle mesh, using geodesic
/// distance between vertices.
///
/// Given target values on every vertex and an ordered subset of vertices as
/// centres, the interpolant is
///
/// `s(x) = sum_i phi(d(x, c_i)) * w_i`
///
/// where `d` is geodesic distance and the weights solve the symmetric system
/// `phi(d(c_i, c_j)) w = f(c_i)`.
#[derive(Debug)]
pub struct GeodesicRBFInterpolator {
    metric: Arc<GeodesicMetric>,
    interpolant_settings: InterpolantSettings,
    kernel_params: KernelParams,
    center_indices: Vec<usize>,
    reduced_values: Mat<f64>,

    /// Not available on a model loaded from disk.
    coefficient_matrix: Option<Mat<f64>>,
    weights: Mat<f64>,
    is_singular: bool,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl GeodesicRBFInterpolator {
    /// Creates a new [`GeodesicRBFInterpolatorBuilder`] for the given mesh,
    /// vertex values, centres and kernel settings.
    ///
    /// This is the way to construct an interpolator.
    pub fn builder(
        mesh: Arc<TriangleMesh>,
        values: Vec<f64>,
        center_indices: Vec<usize>,
        interpolant_settings: InterpolantSettings,
    ) -> GeodesicRBFInterpolatorBuilder {
        GeodesicRBFInterpolatorBuilder::new(mesh, values, center_indices, interpolant_settings)
    }

    fn new(
        mesh: Arc<TriangleMesh>,
        values: Vec<f64>,
        center_indices: Vec<usize>,
        interpolant_settings: InterpolantSettings,
        geodesic_service: Option<Arc<dyn GeodesicDistance>>,
        progress_callback: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Self> {
        let solver_start = Instant::now();

        interpolant_settings.validate()?;
        if values.len() != mesh.num_vertices() {
            return Err(GeodesicRbfError::invalid_config(format!(
                "got {} values for a mesh with {} vertices",
                values.len(),
                mesh.num_vertices()
            )));
        }
        common::check_finite(&values, "values")?;
        common::check_center_indices(&center_indices, mesh.num_vertices())?;

        let n = center_indices.len();
        progress::report(&progress_callback, ProgressMsg::Interpolating { num_points: n });

        let metric = Arc::new(match geodesic_service {
            Some(service) => GeodesicMetric::with_service(mesh, service),
            None => GeodesicMetric::new(mesh),
        });

        let kernel_params: KernelParams = interpolant_settings.into();
        let reduced_values = common::select_values(&values, &center_indices);

        let distances = common::lower_distance_matrix(&metric, &center_indices)?;
        let coefficient_matrix =
            geodesic_rbf_utils::get_kernel_matrix_symmetric(&distances, &kernel_params);

        progress::report(
            &progress_callback,
            ProgressMsg::MatrixAssembled { nrows: n, ncols: n },
        );

        let outcome = linalg::solve_dense(coefficient_matrix.as_ref(), reduced_values.as_ref())?;
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

        let interpolator = Self {
            metric,
            interpolant_settings,
            kernel_params,
            center_indices,
            reduced_values,
            coefficient_matrix: Some(coefficient_matrix),
            weights,
            is_singular,
            progress_callback,
        };

        if let Some(sink) = &interpolator.progress_callback {
            let msg = format!(
                "Took {:?} to solve geodesic RBF for {} centres using the following settings:\n\
                Kernel: {}, Epsilon: {}",
                solver_start.elapsed(),
                n,
                interpolator.interpolant_settings.kernel_type,
                interpolator.interpolant_settings.epsilon,
            );
            sink.emit(ProgressMsg::Message { message: msg });
        }

        Ok(interpolator)
    }

    /// `true` if the collocation matrix was not of full rank.
    ///
    /// The weights of a singular interpolant are all zero.
    pub fn is_singular(&self) -> bool {
        self.is_singular
    }

    /// The solve outcome: the weights, or [`SolveOutcome::Singular`].
    pub fn solve_outcome(&self) -> SolveOutcome {
        match self.is_singular {
            true => SolveOutcome::Singular,
            false => SolveOutcome::Solved(self.weights.clone()),
        }
    }

    /// The symmetric `n × n` collocation matrix, or `None` for a model loaded
    /// from disk.
    pub fn coefficient_matrix(&self) -> Option<MatRef<'_, f64>> {
        self.coefficient_matrix.as_ref().map(|m| m.as_ref())
    }

    /// Weights as an `n × 1` column, in centre order.
    pub fn weights(&self) -> MatRef<'_, f64> {
        self.weights.as_ref()
    }

    pub fn center_indices(&self) -> &[usize] {
        &self.center_indices
    }

    /// Target values at the centres, in centre order.
    pub fn reduced_values(&self) -> MatRef<'_, f64> {
        self.reduced_values.as_ref()
    }

    pub fn interpolant_settings(&self) -> &InterpolantSettings {
        &self.interpolant_settings
    }

    pub fn metric(&self) -> &Arc<GeodesicMetric> {
        &self.metric
    }

    /// Evaluates the interpolant at a point on the mesh.
    ///
    /// There is no guard against a singular system: a singular interpolant
    /// evaluates to zero everywhere. Check [`is_singular`](Self::is_singular)
    /// first.
    pub fn evaluate(&self, point: SurfacePoint) -> Result<f64> {
        common::evaluate_point(
            &self.metric,
            &self.kernel_params,
            &self.center_indices,
            self.weights.as_ref(),
            &point,
        )
    }

    /// Evaluates the interpolant at many points in parallel, returning an
    /// `m × 1` column.
    pub fn evaluate_many(&self, points: &[SurfacePoint]) -> Result<Mat<f64>> {
        let start = Instant::now();
        let values = common::evaluate_points(
            &self.metric,
            &self.kernel_params,
            &self.center_indices,
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

    /// Evaluates the interpolant at every mesh vertex.
    pub fn evaluate_at_vertices(&self) -> Result<Mat<f64>> {
        let points = (0..self.metric.num_vertices())
            .map(SurfacePoint::Vertex)
            .collect::<Vec<_>>();
        self.evaluate_many(&points)
    }

    /// Shortest path from `point` to vertex `target`.
    pub fn geodesic_path(&self, point: SurfacePoint, target: usize) -> Result<GeodesicPath> {
        self.metric.geodesic_path(&point, target)
    }

    /// Save this interpolator to a **JSON envelope** `{ format, version, ... }`.
    ///
    /// The mesh, kernel, centres and solved weights are stored; the
    /// collocation matrix and the geodesic service are not.
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Create, Serialize, Flush}` on I/O or serialization
    ///   failures.
    ///
    /// ### Example
    /// ```no_run
    /// # use geodesic_rbf::GeodesicRBFInterpolator;
    /// # let rbfi: GeodesicRBFInterpolator = unimplemented!();
    /// rbfi.save_model("geodesic_rbf_model.json")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> ModelIOResult<()> {
        model_io::write_snapshot(path.as_ref(), &self.snapshot())
    }

    /// Load an interpolator from a versioned **JSON envelope**, validating
    /// format, version and contents.
    ///
    /// The default geodesic service is rebuilt over the stored mesh. If
    /// `progress` is `Some`, the sink is attached to the returned model.
    ///
    /// ### Errors
    /// - Returns `ModelIOError::{Open, Parse, FormatMismatch, VersionMismatch, Rebuild}`
    ///   as appropriate.
    pub fn load_model<P: AsRef<Path>>(
        path: P,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> ModelIOResult<Self> {
        let snapshot = model_io::read_snapshot(path.as_ref(), ModelKind::Rbf)?;
        Ok(Self::from_snapshot(snapshot, progress))
    }

    fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            kind: ModelKind::Rbf,
            mesh: self.metric.mesh().as_ref().clone(),
            kernel_params: self.kernel_params,
            center_indices: self.center_indices.clone(),
            weights: model_io::column_to_vec(&self.weights),
            is_singular: self.is_singular,
            reduced_values: model_io::column_to_vec(&self.reduced_values),
        }
    }

    fn from_snapshot(snapshot: ModelSnapshot, progress: Option<Arc<dyn ProgressSink>>) -> Self {
        let weights = snapshot.weights_mat();
        let reduced_values = snapshot.reduced_values_mat();
        let ModelSnapshot {
            mesh,
            kernel_params,
            center_indices,
            is_singular,
            ..
        } = snapshot;

        Self {
            metric: Arc::new(GeodesicMetric::new(Arc::new(mesh))),
            interpolant_settings: InterpolantSettings::builder(kernel_params.kernel_type)
                .epsilon(kernel_params.epsilon)
                .build(),
            kernel_params,
            center_indices,
            reduced_values,
            coefficient_matrix: None,
            weights,
            is_singular,
            progress_callback: progress,
        }
    }
}
