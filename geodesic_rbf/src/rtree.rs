/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to locate the mesh face closest to a query point.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # rtree
//!
//! Wrapper module for the rstar crate.
//!
//! Builds an R-tree over the bounding boxes of the mesh faces so that a point
//! lying on (or very near) the surface can be resolved to the face that holds
//! it, together with its projection onto that face.

use crate::mesh::{TriangleMesh, euclidean};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use std::fmt;

/// A wrapper that holds a face bounding box and the face index.
type IndexedFace = GeomWithData<Rectangle<[f64; 3]>, usize>;

/// Relative size of the search envelope placed around a query point.
const ENVELOPE_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Resolves surface points to mesh faces.
pub struct FaceLocator {
    tree: RTree<IndexedFace>,
    tolerance: f64,
}

impl fmt::Debug for FaceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceLocator")
            .field("num_faces", &self.tree.size())
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

/// The face holding a query point and the closest point on that face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: usize,
    pub projected: [f64; 3],
    pub distance: f64,
}

impl FaceLocator {
    /// Bulk loads an R-tree of face bounding boxes.
    pub fn new(mesh: &TriangleMesh) -> Self {
        let items = (0..mesh.num_faces())
            .map(|f| {
                let extents = mesh.face_extents(f);
                let rect = rectangle_from_extents(&extents);
                GeomWithData::new(rect, f)
            })
            .collect::<Vec<_>>();

        let scale = mesh_diagonal(mesh).max(1.0);

        Self {
            tree: RTree::bulk_load(items),
            tolerance: ENVELOPE_RELATIVE_TOLERANCE * scale,
        }
    }

    /// Finds the face closest to `point`.
    ///
    /// Faces whose boxes intersect a small envelope around the point are
    /// examined first; if none do (the point is off the surface), every face
    /// is examined. The best hit is then confirmed by a second query with an
    /// envelope as wide as its distance, since a face whose box misses the
    /// first envelope can still be closer. Ties are broken by the lowest face
    /// index. Returns `None` only for a mesh without faces.
    pub fn closest_face(&self, mesh: &TriangleMesh, point: &[f64; 3]) -> Option<FaceHit> {
        let candidates = self.faces_near(point, self.tolerance);
        let first = match candidates.is_empty() {
            true => best_hit(mesh, point, 0..mesh.num_faces()),
            false => best_hit(mesh, point, candidates.into_iter()),
        }?;

        if first.distance <= self.tolerance {
            return Some(first);
        }

        let radius = first.distance + self.tolerance;
        best_hit(mesh, point, self.faces_near(point, radius).into_iter())
    }

    /// Faces whose bounding boxes intersect the cube of half-width `radius`
    /// around `point`.
    fn faces_near(&self, point: &[f64; 3], radius: f64) -> Vec<usize> {
        let envelope = AABB::from_corners(
            [point[0] - radius, point[1] - radius, point[2] - radius],
            [point[0] + radius, point[1] + radius, point[2] + radius],
        );

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| item.data)
            .collect()
    }
}

fn best_hit<I>(mesh: &TriangleMesh, point: &[f64; 3], faces: I) -> Option<FaceHit>
where
    I: Iterator<Item = usize>,
{
    faces
        .map(|f| {
            let [a, b, c] = *mesh.face(f);
            let projected =
                closest_point_on_triangle(point, mesh.vertex(a), mesh.vertex(b), mesh.vertex(c));
            FaceHit {
                face: f,
                projected,
                distance: euclidean(point, &projected),
            }
        })
        .min_by(|x, y| {
            x.distance
                .total_cmp(&y.distance)
                .then_with(|| x.face.cmp(&y.face))
        })
}

/// `extents = [mins..., maxs...]`
fn rectangle_from_extents(extents: &[f64; 6]) -> Rectangle<[f64; 3]> {
    Rectangle::from_corners(
        [extents[0], extents[1], extents[2]],
        [extents[3], extents[4], extents[5]],
    )
}

fn mesh_diagonal(mesh: &TriangleMesh) -> f64 {
    let mut mins = [f64::INFINITY; 3];
    let mut maxs = [f64::NEG_INFINITY; 3];
    for p in mesh.vertices() {
        for d in 0..3 {
            mins[d] = mins[d].min(p[d]);
            maxs[d] = maxs[d].max(p[d]);
        }
    }
    match mesh.num_vertices() {
        0 => 0.0,
        _ => euclidean(&mins, &maxs),
    }
}

#[inline(always)]
fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline(always)]
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline(always)]
fn offset(a: &[f64; 3], u: &[f64; 3], s: f64, v: &[f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + s * u[0] + t * v[0],
        a[1] + s * u[1] + t * v[1],
        a[2] + s * u[2] + t * v[2],
    ]
}

/// Closest point to `p` on triangle `abc`, found by classifying `p` against
/// the Voronoi regions of the triangle's vertices, edges and interior.
pub(crate) fn closest_point_on_triangle(
    p: &[f64; 3],
    a: &[f64; 3],
    b: &[f64; 3],
    c: &[f64; 3],
) -> [f64; 3] {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(p, a);

    let d1 = dot(&ab, &ap);
    let d2 = dot(&ac, &ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = sub(p, b);
    let d3 = dot(&ab, &bp);
    let d4 = dot(&ac, &bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let s = d1 / (d1 - d3);
        return offset(a, &ab, s, &ac, 0.0);
    }

    let cp = sub(p, c);
    let d5 = dot(&ab, &cp);
    let d6 = dot(&ac, &cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return offset(a, &ab, 0.0, &ac, t);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let bc = sub(c, b);
        return offset(b, &bc, t, &bc, 0.0);
    }

    // Degenerate (zero area) faces land here with a zero denominator.
    let denom = va + vb + vc;
    if denom == 0.0 {
        return *a;
    }
    let v = vb / denom;
    let w = vc / denom;
    offset(a, &ab, v, &ac, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;

    fn approx(a: &[f64; 3], b: &[f64; 3]) -> bool {
        euclidean(a, b) < 1e-12
    }

    #[test]
    fn closest_point_regions() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];

        // interior, lifted off the plane
        assert!(approx(&closest_point_on_triangle(&[0.25, 0.25, 2.0], &a, &b, &c), &[0.25, 0.25, 0.0]));
        // vertex regions
        assert!(approx(&closest_point_on_triangle(&[-1.0, -1.0, 0.0], &a, &b, &c), &a));
        assert!(approx(&closest_point_on_triangle(&[2.0, -0.5, 0.0], &a, &b, &c), &b));
        assert!(approx(&closest_point_on_triangle(&[-0.5, 2.0, 0.0], &a, &b, &c), &c));
        // edge regions
        assert!(approx(&closest_point_on_triangle(&[0.5, -1.0, 0.0], &a, &b, &c), &[0.5, 0.0, 0.0]));
        assert!(approx(&closest_point_on_triangle(&[-1.0, 0.5, 0.0], &a, &b, &c), &[0.0, 0.5, 0.0]));
        assert!(approx(&closest_point_on_triangle(&[1.0, 1.0, 0.0], &a, &b, &c), &[0.5, 0.5, 0.0]));
    }

    #[test]
    fn locates_face_on_grid() {
        let mesh = TriangleMesh::grid(3, 3, 2.0, 2.0);
        let locator = FaceLocator::new(&mesh);

        // Below the rising diagonal of the first cell -> face 0 ([v00, v10, v11]).
        let hit = locator.closest_face(&mesh, &[0.75, 0.25, 0.0]).unwrap();
        assert!(hit.face == 0);
        assert!(hit.distance < 1e-12);

        // Above the diagonal of the last cell -> its second face.
        let hit = locator.closest_face(&mesh, &[1.25, 1.75, 0.0]).unwrap();
        assert!(hit.face == 7);
    }

    #[test]
    fn off_surface_points_fall_back_to_full_scan() {
        let mesh = TriangleMesh::grid(3, 3, 2.0, 2.0);
        let locator = FaceLocator::new(&mesh);

        let hit = locator.closest_face(&mesh, &[0.75, 0.25, 5.0]).unwrap();
        assert!(hit.face == 0);
        assert!(approx(&hit.projected, &[0.75, 0.25, 0.0]));
        assert!((hit.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn nearby_box_does_not_hide_a_closer_face() {
        // Face 0 is a large tilted triangle whose box contains the query
        // point while the triangle itself is several units away. Face 1 sits
        // just below the point, outside face 0's box.
        let mesh = TriangleMesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [10.0, 0.0, 0.0],
                [0.0, 10.0, 10.0],
                [9.0, 9.0, -0.5],
                [9.5, 9.0, -0.5],
                [9.0, 9.5, -0.5],
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .unwrap();
        let locator = FaceLocator::new(&mesh);

        let hit = locator.closest_face(&mesh, &[9.0, 9.0, 0.0]).unwrap();
        assert!(hit.face == 1);
        assert!(approx(&hit.projected, &[9.0, 9.0, -0.5]));
        assert!((hit.distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_mesh_has_no_faces() {
        let mesh = TriangleMesh::new(vec![[0.0, 0.0, 0.0]], vec![]).unwrap();
        let locator = FaceLocator::new(&mesh);
        assert!(locator.closest_face(&mesh, &[0.0, 0.0, 0.0]).is_none());
    }
}
