/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the immutable triangle mesh shared by the geodesic metric and the interpolants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # mesh
//!
//! A triangulated surface described by an ordered list of vertex positions and
//! an ordered list of faces (vertex index triples). The mesh is only checked
//! for index bounds and finite coordinates; manifoldness and orientation are
//! the responsibility of whoever produced it.

use crate::errors::{GeodesicRbfError, Result};
use serde::{Deserialize, Serialize};

/// An immutable triangle mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    vertices: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh from vertex positions and faces.
    ///
    /// ### Errors
    /// - `InvalidConfig` if a face references a vertex that does not exist, or
    ///   if a vertex coordinate is not finite.
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(v) = vertices
            .iter()
            .position(|v| v.iter().any(|c| !c.is_finite()))
        {
            return Err(GeodesicRbfError::invalid_config(format!(
                "vertex {} has a non-finite coordinate",
                v
            )));
        }

        let num_vertices = vertices.len();
        for (f, face) in faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v >= num_vertices) {
                return Err(GeodesicRbfError::invalid_config(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    f, bad, num_vertices
                )));
            }
        }

        Ok(Self { vertices, faces })
    }

    /// Re-runs the construction checks, e.g. on a mesh read back from disk.
    pub(crate) fn validated(self) -> Result<Self> {
        Self::new(self.vertices, self.faces)
    }

    /// Generates a flat, regularly triangulated grid in the `z = 0` plane.
    ///
    /// The grid has `nx` vertices along x spanning `[0, width]` and `ny` vertices
    /// along y spanning `[0, height]`. Vertex `(col, row)` has index
    /// `row * nx + col`. Every cell is split along its rising diagonal.
    ///
    /// ### Panics
    /// If `nx < 2` or `ny < 2`.
    pub fn grid(nx: usize, ny: usize, width: f64, height: f64) -> Self {
        assert!(nx >= 2 && ny >= 2, "a grid needs at least 2x2 vertices");

        let dx = width / (nx - 1) as f64;
        let dy = height / (ny - 1) as f64;

        let vertices = (0..ny)
            .flat_map(|row| (0..nx).map(move |col| [col as f64 * dx, row as f64 * dy, 0.0]))
            .collect::<Vec<_>>();

        let mut faces = Vec::with_capacity(2 * (nx - 1) * (ny - 1));
        for row in 0..ny - 1 {
            for col in 0..nx - 1 {
                let v00 = row * nx + col;
                let v10 = v00 + 1;
                let v01 = v00 + nx;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        Self { vertices, faces }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Position of vertex `i`.
    ///
    /// ### Panics
    /// If `i` is out of range; use [`TriangleMesh::check_vertex`] first when the
    /// index is untrusted.
    #[inline]
    pub fn vertex(&self, i: usize) -> &[f64; 3] {
        &self.vertices[i]
    }

    #[inline]
    pub fn face(&self, f: usize) -> &[usize; 3] {
        &self.faces[f]
    }

    /// Returns `OutOfRange` unless `i` names a vertex of this mesh.
    #[inline]
    pub fn check_vertex(&self, i: usize) -> Result<()> {
        match i < self.vertices.len() {
            true => Ok(()),
            false => Err(GeodesicRbfError::OutOfRange {
                index: i,
                num_vertices: self.vertices.len(),
            }),
        }
    }

    /// Unique undirected edges `(a, b)` with `a < b`, sorted.
    ///
    /// Edges shared by two faces are reported once; degenerate face edges
    /// joining a vertex to itself are skipped.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = self
            .faces
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect::<Vec<_>>();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Axis aligned bounding box of face `f`, as `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub fn face_extents(&self, f: usize) -> [f64; 6] {
        let mut extents = [
            f64::INFINITY,
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ];
        for &v in &self.faces[f] {
            let p = self.vertices[v];
            for d in 0..3 {
                extents[d] = extents[d].min(p[d]);
                extents[d + 3] = extents[d + 3].max(p[d]);
            }
        }
        extents
    }
}

/// Euclidean distance between two points in 3D.
#[inline(always)]
pub(crate) fn euclidean(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let mut dist = 0.0;
    for (t, s) in a.iter().zip(b.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;

    fn single_triangle() -> TriangleMesh {
        TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_face_index_out_of_bounds() {
        let err = TriangleMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 3]],
        )
        .unwrap_err();
        assert!(matches!(err, GeodesicRbfError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_non_finite_vertices() {
        let err = TriangleMesh::new(vec![[0.0, f64::NAN, 0.0]], vec![]).unwrap_err();
        assert!(matches!(err, GeodesicRbfError::InvalidConfig { .. }));
    }

    #[test]
    fn triangle_has_three_edges() {
        let mesh = single_triangle();
        assert!(mesh.edges() == vec![(0, 1), (0, 2), (1, 2)]);
        assert!(mesh.face_extents(0) == [0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn grid_counts() {
        let mesh = TriangleMesh::grid(4, 3, 3.0, 2.0);
        assert!(mesh.num_vertices() == 12);
        assert!(mesh.num_faces() == 2 * 3 * 2);

        // horizontal + vertical + one diagonal per cell
        let expected_edges = 3 * 3 + 4 * 2 + 3 * 2;
        assert!(mesh.edges().len() == expected_edges);

        assert!(*mesh.vertex(5) == [1.0, 1.0, 0.0]);
        assert!(*mesh.vertex(11) == [3.0, 2.0, 0.0]);
    }

    #[test]
    fn check_vertex_reports_out_of_range() {
        let mesh = single_triangle();
        assert!(mesh.check_vertex(2).is_ok());
        assert!(
            mesh.check_vertex(3)
                == Err(GeodesicRbfError::OutOfRange {
                    index: 3,
                    num_vertices: 3
                })
        );
    }

    #[test]
    fn euclidean_distance() {
        assert!(euclidean(&[1.0, 2.0, 2.0], &[0.0, 0.0, 0.0]) == 3.0);
    }
}
