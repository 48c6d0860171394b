/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the geodesic distance seam, the default edge-graph service, and the caching metric.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # geodesic
//!
//! Surface-following distances between points of a [`TriangleMesh`].
//!
//! The shortest-path computation sits behind the [`GeodesicDistance`] trait so
//! an exact geodesic solver can be plugged in. The crate ships
//! [`EdgeGraphGeodesic`], which measures shortest paths along mesh edges
//! (Dijkstra over edge lengths). On a reasonably fine, regular mesh it is a
//! close upper bound of the true geodesic distance.
//!
//! [`GeodesicMetric`] is what the interpolants talk to: it validates indices,
//! answers vertex-to-vertex queries through a symmetric pair cache and passes
//! point queries through to the service.

use crate::{
    errors::{GeodesicRbfError, Result},
    mesh::{TriangleMesh, euclidean},
    rtree::FaceLocator,
};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    fmt::{self, Debug},
    sync::{Arc, Mutex, RwLock},
};

/// A location on the mesh surface used as the source of a distance query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfacePoint {
    /// A mesh vertex, by index.
    Vertex(usize),

    /// An arbitrary position assumed to lie on (or very near) the surface.
    Position([f64; 3]),
}

impl From<usize> for SurfacePoint {
    fn from(i: usize) -> Self {
        SurfacePoint::Vertex(i)
    }
}

impl From<[f64; 3]> for SurfacePoint {
    fn from(p: [f64; 3]) -> Self {
        SurfacePoint::Position(p)
    }
}

/// Length of a shortest path and the polyline that realises it.
///
/// `path` runs from the source to the target. It is empty when the target
/// cannot be reached, in which case `length` is `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicPath {
    pub length: f64,
    pub path: Vec<[f64; 3]>,
}

impl GeodesicPath {
    fn unreachable() -> Self {
        Self {
            length: f64::INFINITY,
            path: Vec::new(),
        }
    }
}

/// A shortest-path service over a fixed mesh.
///
/// Implementations must be total over valid vertex indices and should be
/// deterministic, since interpolants are assembled from their answers.
pub trait GeodesicDistance: Send + Sync + Debug {
    /// Shortest path from `source` to vertex `target`.
    fn geodesic_path(&self, source: &SurfacePoint, target: usize) -> Result<GeodesicPath>;

    /// Shortest path length from `source` to vertex `target`.
    fn distance(&self, source: &SurfacePoint, target: usize) -> Result<f64> {
        Ok(self.geodesic_path(source, target)?.length)
    }
}

const NO_PREDECESSOR: usize = usize::MAX;

/// Single-source Dijkstra result.
#[derive(Debug)]
struct ShortestPathTree {
    distances: Vec<f64>,
    predecessors: Vec<usize>,
}

impl ShortestPathTree {
    /// Vertex indices from `target` back to the tree's source.
    fn walk_back(&self, target: usize) -> Vec<usize> {
        let mut walk = vec![target];
        let mut current = target;
        while self.predecessors[current] != NO_PREDECESSOR {
            current = self.predecessors[current];
            walk.push(current);
        }
        walk
    }
}

/// Entry of the Dijkstra frontier.
#[derive(Debug, PartialEq)]
struct Frontier {
    distance: f64,
    vertex: usize,
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for a min-heap; ties settle the lower vertex first.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Shortest paths along the edges of a triangle mesh.
///
/// One shortest-path tree is computed per source vertex and kept for the
/// lifetime of the service. Vertex pairs are always resolved from the lower
/// index, so `d(i, j)` and `d(j, i)` are the same floating point value.
pub struct EdgeGraphGeodesic {
    mesh: Arc<TriangleMesh>,
    adjacency: Vec<Vec<(usize, f64)>>,
    locator: FaceLocator,
    trees: RwLock<HashMap<usize, Arc<ShortestPathTree>>>,
}

impl Debug for EdgeGraphGeodesic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.trees.read().map(|t| t.len()).unwrap_or(0);
        f.debug_struct("EdgeGraphGeodesic")
            .field("num_vertices", &self.mesh.num_vertices())
            .field("num_faces", &self.mesh.num_faces())
            .field("cached_trees", &cached)
            .finish()
    }
}

impl EdgeGraphGeodesic {
    /// Builds the edge graph and face locator for `mesh`.
    pub fn new(mesh: Arc<TriangleMesh>) -> Self {
        let mut adjacency = vec![Vec::new(); mesh.num_vertices()];
        for (a, b) in mesh.edges() {
            let length = euclidean(mesh.vertex(a), mesh.vertex(b));
            adjacency[a].push((b, length));
            adjacency[b].push((a, length));
        }

        let locator = FaceLocator::new(&mesh);

        Self {
            mesh,
            adjacency,
            locator,
            trees: RwLock::new(HashMap::new()),
        }
    }

    pub fn mesh(&self) -> &Arc<TriangleMesh> {
        &self.mesh
    }

    fn tree(&self, source: usize) -> Arc<ShortestPathTree> {
        if let Ok(trees) = self.trees.read() {
            if let Some(tree) = trees.get(&source) {
                return tree.clone();
            }
        }

        let tree = Arc::new(self.dijkstra(source));

        match self.trees.write() {
            Ok(mut trees) => trees.entry(source).or_insert(tree).clone(),
            Err(_) => tree,
        }
    }

    fn dijkstra(&self, source: usize) -> ShortestPathTree {
        let n = self.adjacency.len();
        let mut distances = vec![f64::INFINITY; n];
        let mut predecessors = vec![NO_PREDECESSOR; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();

        distances[source] = 0.0;
        heap.push(Frontier {
            distance: 0.0,
            vertex: source,
        });

        while let Some(Frontier { distance, vertex }) = heap.pop() {
            if settled[vertex] {
                continue;
            }
            settled[vertex] = true;

            for &(next, length) in &self.adjacency[vertex] {
                let candidate = distance + length;
                if candidate < distances[next] {
                    distances[next] = candidate;
                    predecessors[next] = vertex;
                    heap.push(Frontier {
                        distance: candidate,
                        vertex: next,
                    });
                }
            }
        }

        ShortestPathTree {
            distances,
            predecessors,
        }
    }

    fn vertex_path(&self, source: usize, target: usize) -> GeodesicPath {
        if source == target {
            return GeodesicPath {
                length: 0.0,
                path: vec![*self.mesh.vertex(source)],
            };
        }

        let (lo, hi) = (source.min(target), source.max(target));
        let tree = self.tree(lo);
        let length = tree.distances[hi];
        if !length.is_finite() {
            return GeodesicPath::unreachable();
        }

        // walk_back runs hi -> lo
        let mut walk = tree.walk_back(hi);
        if source == lo {
            walk.reverse();
        }

        GeodesicPath {
            length,
            path: walk.into_iter().map(|v| *self.mesh.vertex(v)).collect(),
        }
    }

    fn position_path(&self, position: &[f64; 3], target: usize) -> Result<GeodesicPath> {
        if position.iter().any(|c| !c.is_finite()) {
            return Err(GeodesicRbfError::invalid_config(
                "query position has a non-finite coordinate",
            ));
        }

        let hit = self
            .locator
            .closest_face(&self.mesh, position)
            .ok_or_else(|| {
                GeodesicRbfError::invalid_config("cannot locate a position on a mesh without faces")
            })?;

        let mut best: Option<(f64, usize)> = None;
        for &corner in self.mesh.face(hit.face) {
            let to_corner = euclidean(&hit.projected, self.mesh.vertex(corner));
            let length = to_corner + self.vertex_path(corner, target).length;
            match best {
                Some((shortest, _)) if length >= shortest => {}
                _ => best = Some((length, corner)),
            }
        }

        match best {
            Some((length, corner)) if length.is_finite() => {
                let mut path = vec![hit.projected];
                let tail = self.vertex_path(corner, target).path;
                // Drop the corner when the projection already sits on it.
                let skip = usize::from(tail.first() == Some(&hit.projected));
                path.extend(tail.into_iter().skip(skip));
                Ok(GeodesicPath { length, path })
            }
            _ => Ok(GeodesicPath::unreachable()),
        }
    }
}

impl GeodesicDistance for EdgeGraphGeodesic {
    fn geodesic_path(&self, source: &SurfacePoint, target: usize) -> Result<GeodesicPath> {
        self.mesh.check_vertex(target)?;
        match source {
            SurfacePoint::Vertex(i) => {
                self.mesh.check_vertex(*i)?;
                Ok(self.vertex_path(*i, target))
            }
            SurfacePoint::Position(p) => self.position_path(p, target),
        }
    }
}

/// Geodesic distances between points of a fixed mesh.
///
/// Vertex pairs are memoised symmetrically: once `(i, j)` has been asked for,
/// `(j, i)` is answered from the cache. The cache is shared safely between the
/// threads of a parallel matrix fill.
pub struct GeodesicMetric {
    mesh: Arc<TriangleMesh>,
    service: Arc<dyn GeodesicDistance>,
    pair_cache: Mutex<HashMap<(usize, usize), f64>>,
}

impl Debug for GeodesicMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeodesicMetric")
            .field("num_vertices", &self.mesh.num_vertices())
            .field("service", &self.service)
            .field("cached_pairs", &self.cached_pairs())
            .finish()
    }
}

impl GeodesicMetric {
    /// Creates a metric backed by an [`EdgeGraphGeodesic`] service.
    pub fn new(mesh: Arc<TriangleMesh>) -> Self {
        let service = Arc::new(EdgeGraphGeodesic::new(mesh.clone()));
        Self::with_service(mesh, service)
    }

    /// Creates a metric backed by a caller-supplied service, which must have
    /// been built over the same mesh.
    pub fn with_service(mesh: Arc<TriangleMesh>, service: Arc<dyn GeodesicDistance>) -> Self {
        Self {
            mesh,
            service,
            pair_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn mesh(&self) -> &Arc<TriangleMesh> {
        &self.mesh
    }

    pub fn service(&self) -> &Arc<dyn GeodesicDistance> {
        &self.service
    }

    pub fn num_vertices(&self) -> usize {
        self.mesh.num_vertices()
    }

    /// Number of vertex pairs held in the cache.
    pub fn cached_pairs(&self) -> usize {
        self.pair_cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Geodesic distance between vertices `i` and `j`.
    ///
    /// ### Errors
    /// - `OutOfRange` if either index is not a vertex of the mesh.
    pub fn distance(&self, i: usize, j: usize) -> Result<f64> {
        self.mesh.check_vertex(i)?;
        self.mesh.check_vertex(j)?;

        if i == j {
            return Ok(0.0);
        }

        let key = (i.min(j), i.max(j));
        let cached = self.pair_cache.lock().ok().and_then(|c| c.get(&key).copied());
        if let Some(d) = cached {
            return Ok(d);
        }

        // The lock is not held while the service runs.
        let d = self.service.distance(&SurfacePoint::Vertex(key.0), key.1)?;

        if let Ok(mut cache) = self.pair_cache.lock() {
            cache.insert(key, d);
        }
        Ok(d)
    }

    /// Geodesic distance from an arbitrary surface point to vertex `j`.
    pub fn distance_to(&self, point: &SurfacePoint, j: usize) -> Result<f64> {
        match point {
            SurfacePoint::Vertex(i) => self.distance(*i, j),
            SurfacePoint::Position(_) => {
                self.mesh.check_vertex(j)?;
                self.service.distance(point, j)
            }
        }
    }

    /// Shortest path from `point` to vertex `j`, including its polyline.
    pub fn geodesic_path(&self, point: &SurfacePoint, j: usize) -> Result<GeodesicPath> {
        self.mesh.check_vertex(j)?;
        if let SurfacePoint::Vertex(i) = point {
            self.mesh.check_vertex(*i)?;
        }
        self.service.geodesic_path(point, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn triangle() -> Arc<TriangleMesh> {
        Arc::new(
            TriangleMesh::new(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![[0, 1, 2]],
            )
            .unwrap(),
        )
    }

    /// Edge path length on a grid whose cells are split along the rising diagonal.
    fn lattice_distance(a: (usize, usize), b: (usize, usize), h: f64) -> f64 {
        let dx = b.0 as f64 - a.0 as f64;
        let dy = b.1 as f64 - a.1 as f64;
        if dx * dy > 0.0 {
            let diag = dx.abs().min(dy.abs());
            diag * h * 2f64.sqrt() + (dx.abs() - dy.abs()).abs() * h
        } else {
            (dx.abs() + dy.abs()) * h
        }
    }

    #[test]
    fn triangle_edge_lengths() {
        let metric = GeodesicMetric::new(triangle());
        assert!(metric.distance(0, 1).unwrap() == 1.0);
        assert!(metric.distance(0, 2).unwrap() == 1.0);
        assert!(metric.distance(1, 2).unwrap() == 2f64.sqrt());
        assert!(metric.distance(2, 2).unwrap() == 0.0);
    }

    #[test]
    fn grid_distances_follow_lattice_paths() {
        let (nx, ny) = (5, 4);
        let mesh = Arc::new(TriangleMesh::grid(nx, ny, 4.0, 3.0));
        let metric = GeodesicMetric::new(mesh);

        for i in 0..nx * ny {
            for j in 0..nx * ny {
                let expected = lattice_distance((i % nx, i / nx), (j % nx, j / nx), 1.0);
                let d = metric.distance(i, j).unwrap();
                assert!((d - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn distances_are_bitwise_symmetric() {
        let mesh = Arc::new(TriangleMesh::grid(4, 4, 1.7, 2.3));
        let service = EdgeGraphGeodesic::new(mesh.clone());

        for i in 0..mesh.num_vertices() {
            for j in 0..mesh.num_vertices() {
                let dij = service.distance(&SurfacePoint::Vertex(i), j).unwrap();
                let dji = service.distance(&SurfacePoint::Vertex(j), i).unwrap();
                assert!(dij.to_bits() == dji.to_bits());
            }
        }
    }

    #[test]
    fn path_runs_from_source_to_target() {
        let mesh = Arc::new(TriangleMesh::grid(4, 3, 3.0, 2.0));
        let metric = GeodesicMetric::new(mesh.clone());

        for (i, j) in [(0, 11), (11, 0), (3, 8), (8, 3)] {
            let path = metric.geodesic_path(&SurfacePoint::Vertex(i), j).unwrap();
            assert!(path.path.first() == Some(mesh.vertex(i)));
            assert!(path.path.last() == Some(mesh.vertex(j)));

            let walked: f64 = path
                .path
                .windows(2)
                .map(|w| euclidean(&w[0], &w[1]))
                .sum();
            assert!((walked - path.length).abs() < 1e-12);
        }
    }

    #[test]
    fn position_at_vertex_matches_vertex_distance() {
        let mesh = Arc::new(TriangleMesh::grid(4, 4, 3.0, 3.0));
        let metric = GeodesicMetric::new(mesh.clone());

        for i in [0, 5, 10, 15] {
            let position = SurfacePoint::Position(*mesh.vertex(i));
            for j in 0..mesh.num_vertices() {
                let by_position = metric.distance_to(&position, j).unwrap();
                let by_vertex = metric.distance(i, j).unwrap();
                assert!((by_position - by_vertex).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn position_on_an_edge() {
        let mesh = Arc::new(TriangleMesh::grid(3, 2, 2.0, 1.0));
        let metric = GeodesicMetric::new(mesh);

        let point = SurfacePoint::Position([0.5, 0.0, 0.0]);
        assert!((metric.distance_to(&point, 2).unwrap() - 1.5).abs() < 1e-12);
        assert!((metric.distance_to(&point, 0).unwrap() - 0.5).abs() < 1e-12);

        let path = metric.geodesic_path(&point, 2).unwrap();
        assert!(path.path.first() == Some(&[0.5, 0.0, 0.0]));
        assert!(path.path.last() == Some(&[2.0, 0.0, 0.0]));
    }

    #[test]
    fn disconnected_vertices_are_unreachable() {
        let mesh = Arc::new(
            TriangleMesh::new(
                vec![
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [5.0, 0.0, 0.0],
                    [6.0, 0.0, 0.0],
                    [5.0, 1.0, 0.0],
                ],
                vec![[0, 1, 2], [3, 4, 5]],
            )
            .unwrap(),
        );
        let metric = GeodesicMetric::new(mesh);

        let path = metric.geodesic_path(&SurfacePoint::Vertex(0), 4).unwrap();
        assert!(path.length == f64::INFINITY);
        assert!(path.path.is_empty());
        assert!(metric.distance(4, 0).unwrap() == f64::INFINITY);
    }

    #[test]
    fn out_of_range_queries_fail() {
        let metric = GeodesicMetric::new(triangle());
        assert!(
            metric.distance(0, 3)
                == Err(GeodesicRbfError::OutOfRange {
                    index: 3,
                    num_vertices: 3
                })
        );
        assert!(metric.distance(7, 0).is_err());
        assert!(
            metric
                .distance_to(&SurfacePoint::Position([0.2, 0.2, 0.0]), 9)
                .is_err()
        );
    }

    #[derive(Debug)]
    struct CountingService {
        inner: EdgeGraphGeodesic,
        calls: AtomicUsize,
    }

    impl GeodesicDistance for CountingService {
        fn geodesic_path(&self, source: &SurfacePoint, target: usize) -> Result<GeodesicPath> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.geodesic_path(source, target)
        }
    }

    #[test]
    fn pair_cache_is_symmetric() {
        let mesh = triangle();
        let service = Arc::new(CountingService {
            inner: EdgeGraphGeodesic::new(mesh.clone()),
            calls: AtomicUsize::new(0),
        });
        let metric = GeodesicMetric::with_service(mesh, service.clone());

        let d01 = metric.distance(0, 1).unwrap();
        let d10 = metric.distance(1, 0).unwrap();
        assert!(d01 == d10);
        assert!(service.calls.load(AtomicOrdering::SeqCst) == 1);
        assert!(metric.cached_pairs() == 1);
    }
}
